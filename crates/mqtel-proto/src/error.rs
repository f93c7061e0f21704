//! Payload error types.

use thiserror::Error;

/// Payload-level errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Invalid frame on the push transport.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}
