//! History log error types.

use thiserror::Error;

/// Errors that can occur when appending to the history log.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The underlying store rejected the append.
    #[error("history store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for history results.
pub type Result<T> = std::result::Result<T, HistoryError>;
