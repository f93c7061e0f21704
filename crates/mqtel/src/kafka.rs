//! Kafka driver extension.
//!
//! Kafka's consumer-group lifecycle has one event the common vocabulary
//! cannot express: rebalances. This variant adds a rebalance counter and a
//! rebalance-duration histogram on top of the common catalog, flushing
//! through the same pipeline.

use crate::attrs::AttributeSet;
use crate::config::ExportConfig;
use crate::instrument::{Counter, Histogram};
use crate::pipeline::Meter;
use crate::registry::{prefixed, DriverInstruments, MetricRegistry};

/// Kafka-only instruments.
pub struct KafkaInstruments {
    rebalances: Counter,
    rebalancing_time: Histogram,
}

impl DriverInstruments for KafkaInstruments {
    const DRIVER: &'static str = "kafka";

    fn init(meter: &Meter) -> Self {
        Self {
            rebalances: meter.counter(
                prefixed("rebalances"),
                "Number of consumer group rebalances",
            ),
            rebalancing_time: meter.histogram(
                prefixed("rebalancing_time"),
                "Time spent rebalancing (in ms)",
            ),
        }
    }
}

/// A metric registry specialized for Kafka clients.
pub type KafkaMetrics = MetricRegistry<KafkaInstruments>;

impl MetricRegistry<KafkaInstruments> {
    /// Create a Kafka registry pushing to `endpoint`.
    ///
    /// Fixes the driver identity to `"kafka"`; the driver initializer runs as
    /// part of base construction, so the rebalance instruments exist as soon
    /// as this returns.
    pub fn connect(endpoint: impl Into<String>) -> Self {
        Self::new(ExportConfig::new(endpoint))
    }

    /// Count consumer-group rebalance events.
    pub fn record_rebalances(&self, value: u64, attrs: &AttributeSet) {
        self.driver().rebalances.add(value, attrs);
    }

    /// Record how long one rebalance took, in milliseconds.
    pub fn record_rebalancing_time(&self, value_ms: f64, attrs: &AttributeSet) {
        self.driver().rebalancing_time.record(value_ms, attrs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::keys;
    use crate::exporter::MetricExporter;
    use crate::registry::METRICS_PREFIX;

    fn kafka() -> KafkaMetrics {
        KafkaMetrics::with_exporter(ExportConfig::localhost(), MetricExporter::log())
    }

    #[test]
    fn test_kafka_catalog_is_strict_superset_of_common() {
        let registry = kafka();
        let names = registry.pipeline().instrument_names();

        // 11 common + 2 kafka-only.
        assert_eq!(names.len(), 13);
        assert!(names.contains(&prefixed("rebalances")));
        assert!(names.contains(&prefixed("rebalancing_time")));
        assert!(names.contains(&prefixed("bytes_in")));
        assert!(names.contains(&prefixed("consumer_error")));
        assert!(names.iter().all(|n| n.starts_with(METRICS_PREFIX)));
    }

    #[test]
    fn test_driver_identity_is_kafka() {
        let registry = kafka();
        assert_eq!(registry.pipeline().driver(), "kafka");
        assert_eq!(registry.snapshot().driver, "kafka");
    }

    #[test]
    fn test_rebalance_recording() {
        let registry = kafka();
        let attrs = AttributeSet::new()
            .with(keys::QUEUE, "orders")
            .with(keys::PARTITION, "2");

        registry.record_rebalances(1, &attrs);
        registry.record_rebalances(1, &attrs);
        registry.record_rebalancing_time(250.0, &attrs);

        assert_eq!(registry.driver().rebalances.value(&attrs), 2);
        assert_eq!(registry.driver().rebalancing_time.count(&attrs), 1);
        assert!((registry.driver().rebalancing_time.max_ms(&attrs) - 250.0).abs() < 0.01);
    }

    #[test]
    fn test_common_recording_still_works_on_kafka_variant() {
        let registry = kafka();
        let attrs = AttributeSet::new().with(keys::QUEUE, "orders");

        registry.record_bytes_in(128, &attrs);
        registry.record_consumed_records(1, &attrs);

        let batch = registry.snapshot();
        assert_eq!(batch.point_count(), 2);
    }
}
