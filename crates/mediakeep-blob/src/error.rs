use std::time::Duration;

use mediakeep_types::BlobKey;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The requested blob does not exist.
    #[error("blob not found: {0}")]
    NotFound(BlobKey),

    /// I/O failure in the underlying storage backend.
    #[error("blob I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation exceeded its time budget.
    ///
    /// Part of the store contract so callers can tell a slow backend from
    /// a broken one; backends that cannot bound their calls never produce
    /// this variant.
    #[error("blob {op} timed out after {elapsed:?}")]
    Timeout { op: &'static str, elapsed: Duration },

    /// Backend-specific failure that is not plain I/O.
    #[error("blob backend error: {0}")]
    Backend(String),
}

/// Result alias for blob store operations.
pub type BlobResult<T> = Result<T, BlobError>;
