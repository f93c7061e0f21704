//! Counter and histogram instruments.
//!
//! An instrument is a named telemetry channel created once at registry
//! construction. Each instrument keeps one series per attribute set; series
//! state is atomic, so recording from concurrent produce/consume loops never
//! loses updates and never blocks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use mqtel_proto::{BucketCount, DataPoint, InstrumentKind, MetricPayload, PointValue};

use crate::attrs::AttributeSet;

/// Default histogram bucket boundaries in milliseconds.
///
/// Sized for client-observed produce/consume latencies: sub-millisecond to
/// ten seconds, with resolution concentrated where broker round trips live.
pub const DEFAULT_BUCKETS_MS: &[f64] = &[
    1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1_000.0, 2_500.0, 5_000.0, 10_000.0,
];

/// A monotonic counter with per-attribute-set series.
#[derive(Clone)]
pub struct Counter {
    inner: Arc<CounterInner>,
}

struct CounterInner {
    name: String,
    description: String,
    series: DashMap<AttributeSet, AtomicU64>,
}

impl Counter {
    pub(crate) fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(CounterInner {
                name: name.into(),
                description: description.into(),
                series: DashMap::new(),
            }),
        }
    }

    /// Add `value` to the series identified by `attrs`.
    ///
    /// Fire-and-forget: no return value, no error, O(1). The attribute set is
    /// cloned only when this is the first observation for the series.
    pub fn add(&self, value: u64, attrs: &AttributeSet) {
        if let Some(series) = self.inner.series.get(attrs) {
            series.fetch_add(value, Ordering::Relaxed);
            return;
        }
        self.inner
            .series
            .entry(attrs.clone())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(value, Ordering::Relaxed);
    }

    /// Cumulative total for the series identified by `attrs`.
    pub fn value(&self, attrs: &AttributeSet) -> u64 {
        self.inner
            .series
            .get(attrs)
            .map(|s| s.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Exported instrument name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of live series.
    pub fn series_count(&self) -> usize {
        self.inner.series.len()
    }

    pub(crate) fn payload(&self) -> MetricPayload {
        let mut payload = MetricPayload::new(
            &self.inner.name,
            InstrumentKind::Counter,
            &self.inner.description,
        );
        for entry in self.inner.series.iter() {
            payload.points.push(DataPoint {
                attributes: entry.key().to_attributes(),
                value: PointValue::Counter {
                    total: entry.value().load(Ordering::Relaxed),
                },
            });
        }
        payload
    }
}

/// A fixed-bucket histogram with per-attribute-set series.
///
/// Observations are milliseconds. Sum and max are tracked in integer
/// microseconds so series state stays lock-free.
#[derive(Clone)]
pub struct Histogram {
    inner: Arc<HistogramInner>,
}

struct HistogramInner {
    name: String,
    description: String,
    buckets_ms: Vec<f64>,
    series: DashMap<AttributeSet, HistogramSeries>,
}

struct HistogramSeries {
    counts: Vec<AtomicU64>,
    count: AtomicU64,
    sum_us: AtomicU64,
    max_us: AtomicU64,
}

impl HistogramSeries {
    fn new(bucket_count: usize) -> Self {
        Self {
            counts: (0..bucket_count).map(|_| AtomicU64::new(0)).collect(),
            count: AtomicU64::new(0),
            sum_us: AtomicU64::new(0),
            max_us: AtomicU64::new(0),
        }
    }

    fn observe(&self, value_ms: f64, buckets_ms: &[f64]) {
        // Negative inputs have no defined meaning; they clamp to zero rather
        // than panicking, and the observation still counts.
        let value_us = (value_ms.max(0.0) * 1_000.0).round() as u64;

        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum_us.fetch_add(value_us, Ordering::Relaxed);

        let mut current_max = self.max_us.load(Ordering::Relaxed);
        while value_us > current_max {
            match self.max_us.compare_exchange_weak(
                current_max,
                value_us,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current_max = actual,
            }
        }

        for (i, &boundary) in buckets_ms.iter().enumerate() {
            if value_ms <= boundary {
                self.counts[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Beyond the largest boundary: count in the last bucket.
        if let Some(last) = self.counts.last() {
            last.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Histogram {
    pub(crate) fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(HistogramInner {
                name: name.into(),
                description: description.into(),
                buckets_ms: DEFAULT_BUCKETS_MS.to_vec(),
                series: DashMap::new(),
            }),
        }
    }

    /// Record one observation in milliseconds for the series identified by `attrs`.
    ///
    /// Same fire-and-forget contract as [`Counter::add`]. The caller computes
    /// the elapsed time; the instrument performs no timing itself.
    pub fn record(&self, value_ms: f64, attrs: &AttributeSet) {
        if let Some(series) = self.inner.series.get(attrs) {
            series.observe(value_ms, &self.inner.buckets_ms);
            return;
        }
        self.inner
            .series
            .entry(attrs.clone())
            .or_insert_with(|| HistogramSeries::new(self.inner.buckets_ms.len()))
            .observe(value_ms, &self.inner.buckets_ms);
    }

    /// Number of observations for the series identified by `attrs`.
    pub fn count(&self, attrs: &AttributeSet) -> u64 {
        self.inner
            .series
            .get(attrs)
            .map(|s| s.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Sum of observations in milliseconds for the series identified by `attrs`.
    pub fn sum_ms(&self, attrs: &AttributeSet) -> f64 {
        self.inner
            .series
            .get(attrs)
            .map(|s| s.sum_us.load(Ordering::Relaxed) as f64 / 1_000.0)
            .unwrap_or(0.0)
    }

    /// Largest observation in milliseconds for the series identified by `attrs`.
    pub fn max_ms(&self, attrs: &AttributeSet) -> f64 {
        self.inner
            .series
            .get(attrs)
            .map(|s| s.max_us.load(Ordering::Relaxed) as f64 / 1_000.0)
            .unwrap_or(0.0)
    }

    /// Exported instrument name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of live series.
    pub fn series_count(&self) -> usize {
        self.inner.series.len()
    }

    pub(crate) fn payload(&self) -> MetricPayload {
        let mut payload = MetricPayload::new(
            &self.inner.name,
            InstrumentKind::Histogram,
            &self.inner.description,
        );
        for entry in self.inner.series.iter() {
            let series = entry.value();
            let buckets = self
                .inner
                .buckets_ms
                .iter()
                .zip(series.counts.iter())
                .map(|(&upper_bound_ms, count)| BucketCount {
                    upper_bound_ms,
                    count: count.load(Ordering::Relaxed),
                })
                .collect();
            payload.points.push(DataPoint {
                attributes: entry.key().to_attributes(),
                value: PointValue::Histogram {
                    count: series.count.load(Ordering::Relaxed),
                    sum_ms: series.sum_us.load(Ordering::Relaxed) as f64 / 1_000.0,
                    max_ms: series.max_us.load(Ordering::Relaxed) as f64 / 1_000.0,
                    buckets,
                },
            });
        }
        payload
    }
}

/// An entry in the pipeline's instrument catalog.
#[derive(Clone)]
pub(crate) enum Instrument {
    Counter(Counter),
    Histogram(Histogram),
}

impl Instrument {
    pub(crate) fn name(&self) -> &str {
        match self {
            Instrument::Counter(c) => c.name(),
            Instrument::Histogram(h) => h.name(),
        }
    }

    pub(crate) fn payload(&self) -> MetricPayload {
        match self {
            Instrument::Counter(c) => c.payload(),
            Instrument::Histogram(h) => h.payload(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::keys;

    fn orders() -> AttributeSet {
        AttributeSet::new().with(keys::QUEUE, "orders")
    }

    #[test]
    fn test_counter_additivity() {
        let counter = Counter::new("pubsub_client_bytes_in", "Bytes in by consumer");
        let attrs = orders();

        counter.add(128, &attrs);
        counter.add(128, &attrs);

        assert_eq!(counter.value(&attrs), 256);
    }

    #[test]
    fn test_counter_series_isolated_by_attrs() {
        let counter = Counter::new("pubsub_client_bytes_in", "");
        let a = orders();
        let b = AttributeSet::new().with(keys::QUEUE, "payments");

        counter.add(10, &a);
        counter.add(99, &b);

        assert_eq!(counter.value(&a), 10);
        assert_eq!(counter.value(&b), 99);
        assert_eq!(counter.series_count(), 2);
    }

    #[test]
    fn test_counter_unrecorded_series_is_zero() {
        let counter = Counter::new("pubsub_client_bytes_out", "");
        assert_eq!(counter.value(&orders()), 0);
        assert_eq!(counter.series_count(), 0);
    }

    #[test]
    fn test_counter_concurrent_adds() {
        let counter = Counter::new("pubsub_client_record_consumed", "");
        let attrs = orders();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..1_000 {
                        counter.add(1, &attrs);
                    }
                });
            }
        });

        assert_eq!(counter.value(&attrs), 4_000);
    }

    #[test]
    fn test_histogram_count_matches_calls() {
        let hist = Histogram::new("pubsub_client_consumer_latency", "");
        let attrs = orders();

        hist.record(12.5, &attrs);
        hist.record(0.2, &attrs);
        hist.record(9_999.0, &attrs);

        assert_eq!(hist.count(&attrs), 3);
        assert!((hist.sum_ms(&attrs) - 10_011.7).abs() < 0.01);
        assert!((hist.max_ms(&attrs) - 9_999.0).abs() < 0.01);
    }

    #[test]
    fn test_histogram_overflow_lands_in_last_bucket() {
        let hist = Histogram::new("pubsub_client_rebalancing_time", "");
        let attrs = orders();

        hist.record(60_000.0, &attrs);

        let payload = hist.payload();
        let PointValue::Histogram { ref buckets, .. } = payload.points[0].value else {
            panic!("expected histogram point");
        };
        assert_eq!(buckets.last().unwrap().count, 1);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<u64>(), 1);
    }

    #[test]
    fn test_histogram_negative_value_counts_as_zero() {
        let hist = Histogram::new("pubsub_client_producer_latency", "");
        let attrs = orders();

        hist.record(-5.0, &attrs);

        assert_eq!(hist.count(&attrs), 1);
        assert_eq!(hist.sum_ms(&attrs), 0.0);
    }

    #[test]
    fn test_counter_payload_one_point_per_series() {
        let counter = Counter::new("pubsub_client_record_published", "Records");
        counter.add(1, &orders());
        counter.add(2, &AttributeSet::new().with(keys::QUEUE, "payments"));

        let payload = counter.payload();
        assert_eq!(payload.name, "pubsub_client_record_published");
        assert_eq!(payload.kind, InstrumentKind::Counter);
        assert_eq!(payload.points.len(), 2);
    }

    #[test]
    fn test_histogram_payload_carries_attribute_map() {
        let hist = Histogram::new("pubsub_client_consumer_latency", "");
        let attrs = AttributeSet::new()
            .with(keys::QUEUE, "orders")
            .with(keys::PARTITION, "2");
        hist.record(3.0, &attrs);

        let payload = hist.payload();
        assert_eq!(payload.points.len(), 1);
        let labels = &payload.points[0].attributes;
        assert!(labels.iter().any(|a| a.key == "queue" && a.value == "orders"));
        assert!(labels.iter().any(|a| a.key == "partition" && a.value == "2"));
    }
}
