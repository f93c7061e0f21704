//! MQTEL export payload types and framing.
//!
//! This crate defines the structured representation of one metrics flush —
//! the batch a registry pushes to its collector on every export tick — using
//! rkyv for zero-copy serialization on the wire and serde for debugging and
//! JSON sinks.
//!
//! # Modules
//!
//! - [`export`] - Batch, instrument, and data point payload types
//! - [`framing`] - Length-prefix framing for the push transport
//! - [`error`] - Payload error types
//!
//! # Serialization
//!
//! ```ignore
//! use mqtel_proto::{ExportBatch, export::ArchivedExportBatch};
//!
//! let batch = ExportBatch::new("kafka");
//! let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&batch).unwrap();
//! let archived = rkyv::access::<ArchivedExportBatch, rkyv::rancor::Error>(&bytes).unwrap();
//! let decoded: ExportBatch =
//!     rkyv::deserialize::<ExportBatch, rkyv::rancor::Error>(archived).unwrap();
//! ```

pub mod error;
pub mod export;
pub mod framing;

pub use error::Error;
pub use export::{
    Attribute, BucketCount, DataPoint, ExportBatch, InstrumentKind, MetricPayload, PointValue,
};

/// Wire version for push compatibility.
///
/// Included in every [`ExportBatch`] so a collector can reject payloads it
/// does not understand. Incremented on incompatible payload changes.
pub const WIRE_VERSION: u32 = 1;
