//! Export payload types.
//!
//! An [`ExportBatch`] is the unit pushed to the collector: resource identity
//! (the driver name), a timestamp, and one [`MetricPayload`] per instrument,
//! each carrying one [`DataPoint`] per live attribute set. Values use
//! cumulative temporality — a counter point is the running total since the
//! registry was constructed, not the delta since the previous flush.

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// One metrics flush pushed to the collector.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct ExportBatch {
    /// Wire version, see [`crate::WIRE_VERSION`].
    pub version: u32,
    /// Resource attribute: the queue driver this registry instruments.
    pub driver: String,
    /// Flush timestamp, milliseconds since the Unix epoch.
    pub exported_at_ms: i64,
    /// One payload per instrument in the catalog.
    pub metrics: Vec<MetricPayload>,
}

/// Instrument kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub enum InstrumentKind {
    /// Monotonic cumulative counter.
    Counter,
    /// Fixed-bucket latency histogram, milliseconds.
    Histogram,
}

/// All data points for one named instrument.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct MetricPayload {
    /// Exported instrument name, globally unique per registry.
    pub name: String,
    /// Counter or histogram.
    pub kind: InstrumentKind,
    /// Human-readable description.
    pub description: String,
    /// One point per attribute set that has recorded at least once.
    pub points: Vec<DataPoint>,
}

/// A single observation series at flush time.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct DataPoint {
    /// Label set supplied at the call site, sorted by key.
    pub attributes: Vec<Attribute>,
    /// Cumulative value of the series.
    pub value: PointValue,
}

/// A single label.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct Attribute {
    /// Label name.
    pub key: String,
    /// Label value.
    pub value: String,
}

/// Cumulative series value.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub enum PointValue {
    /// Running counter total.
    Counter {
        /// Sum of all recorded values.
        total: u64,
    },
    /// Histogram state.
    Histogram {
        /// Number of observations.
        count: u64,
        /// Sum of all observed values in milliseconds.
        sum_ms: f64,
        /// Largest observed value in milliseconds.
        max_ms: f64,
        /// Cumulative bucket counts.
        buckets: Vec<BucketCount>,
    },
}

/// One histogram bucket at flush time.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct BucketCount {
    /// Inclusive upper boundary in milliseconds.
    pub upper_bound_ms: f64,
    /// Observations at or below the boundary (non-cumulative across buckets).
    /// The last bucket is a catch-all: observations beyond its boundary
    /// count there too.
    pub count: u64,
}

impl ExportBatch {
    /// Create an empty batch for the given driver, stamped with the current time.
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            version: crate::WIRE_VERSION,
            driver: driver.into(),
            exported_at_ms: unix_time_ms(),
            metrics: Vec::new(),
        }
    }

    /// Add an instrument payload.
    pub fn with_metric(mut self, metric: MetricPayload) -> Self {
        self.metrics.push(metric);
        self
    }

    /// True when no instrument has any live series.
    pub fn is_empty(&self) -> bool {
        self.metrics.iter().all(|m| m.points.is_empty())
    }

    /// Total number of data points across all instruments.
    pub fn point_count(&self) -> usize {
        self.metrics.iter().map(|m| m.points.len()).sum()
    }
}

impl MetricPayload {
    /// Create a payload with no points yet.
    pub fn new(
        name: impl Into<String>,
        kind: InstrumentKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            points: Vec::new(),
        }
    }

    /// Add a data point.
    pub fn with_point(mut self, point: DataPoint) -> Self {
        self.points.push(point);
        self
    }
}

impl Attribute {
    /// Create a label.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Milliseconds since the Unix epoch.
pub fn unix_time_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
