//! Saga error types.

use thiserror::Error;

/// Errors that can occur while coordinating a saga.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Publishing a command failed.
    #[error("bus error: {0}")]
    Bus(#[from] bus::BusError),

    /// Appending to the history log failed.
    #[error("history error: {0}")]
    History(#[from] history::HistoryError),

    /// The saga instance store rejected the update.
    #[error("saga store error: {0}")]
    Store(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
