//! Error types for the listing engine.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors a listing request can fail with.
///
/// A failed request returns none of the records accumulated before the
/// failure. Undecodable cursors are never an error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request cannot be served at all (missing partition key).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A store fetch failed. Not retried.
    #[error("storage query failed: {0}")]
    StorageQueryFailed(String),

    /// A stored item could not be read through the listing's field layout.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// The caller's cancellation token fired before the scan finished.
    #[error("listing cancelled")]
    Cancelled,
}
