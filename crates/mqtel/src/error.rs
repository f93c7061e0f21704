//! Exporter error types.
//!
//! These errors never reach recording call sites; the `record_*` API is
//! infallible. They exist for the export pipeline internals, which log and
//! drop failed flushes.

use thiserror::Error;

/// Export pipeline errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Export transport failed.
    #[error("export error: {0}")]
    Export(String),

    /// Payload encoding failed.
    #[error("payload error: {0}")]
    Payload(#[from] mqtel_proto::Error),

    /// Export send timed out.
    #[error("export timed out")]
    Timeout,
}
