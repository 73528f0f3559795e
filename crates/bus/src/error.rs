//! Bus error types.

use thiserror::Error;

/// Errors that can occur when talking to the message bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus rejected the publish because it is shut down.
    #[error("message bus is closed")]
    Closed,

    /// The envelope could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for bus results.
pub type Result<T> = std::result::Result<T, BusError>;
