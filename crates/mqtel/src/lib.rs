//! MQTEL - Telemetry instrumentation for message-queue clients.
//!
//! A thin layer that wraps producer and consumer loops with a standard metric
//! vocabulary — throughput, latency, retries, errors, rebalances — tagged
//! with driver/cluster/queue/consumer identity and pushed to a collector on a
//! periodic cadence. The queue client itself, the collector, and the timing
//! of operations all stay with the caller: this crate only decides which
//! values, under which names and attributes, get forwarded.
//!
//! # Quick Start
//!
//! ```ignore
//! use mqtel::{AttributeSet, ErrorKind, KafkaMetrics, keys};
//!
//! #[tokio::main]
//! async fn main() {
//!     // One registry per process, built at startup. Construction is eager
//!     // and never touches the network.
//!     let metrics = KafkaMetrics::connect("localhost:4317");
//!
//!     let attrs = AttributeSet::new()
//!         .with(keys::CLUSTER, "pubsub-kraft-cluster")
//!         .with(keys::QUEUE, "orders");
//!
//!     // Inline with the consume loop; fire-and-forget, never fails.
//!     metrics.record_bytes_in(128, &attrs);
//!     metrics.record_consumer_latency(12.5, &attrs);
//!     metrics.record_rebalances(1, &attrs);
//!     metrics.record_error(ErrorKind::Consumer, 1, &attrs);
//! }
//! ```
//!
//! # Drivers
//!
//! The common catalog is driver-agnostic. Driver-specific instruments hang
//! off the [`DriverInstruments`] trait: implement it (possibly with an empty
//! initializer) and `MetricRegistry<YourDriver>` carries the common set plus
//! your additions through one shared export pipeline.

pub mod attrs;
pub mod config;
pub mod error;
pub mod exporter;
pub mod instrument;
pub mod kafka;
pub mod pipeline;
pub mod registry;

pub use attrs::{keys, AttributeSet};
pub use config::ExportConfig;
pub use error::Error;
pub use exporter::{LogExporter, MetricExporter, PushExporter};
pub use instrument::{Counter, Histogram};
pub use kafka::{KafkaInstruments, KafkaMetrics};
pub use pipeline::{ExportPipeline, Meter};
pub use registry::{DriverInstruments, ErrorKind, MetricRegistry, METRICS_PREFIX};

/// Re-export payload types.
pub use mqtel_proto as proto;
