use std::time::Duration;

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The referenced record does not exist.
    #[error("record not found: {id}")]
    NotFound { id: String },

    /// A record with this identifier already exists.
    #[error("duplicate record: {id}")]
    Duplicate { id: String },

    /// A storage constraint was violated.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// Concurrent modification detected.
    #[error("conflicting update: {0}")]
    Conflict(String),

    /// The named query is not registered in the catalog.
    #[error("unknown named query: {0}")]
    UnknownQuery(String),

    /// The operation exceeded its time budget.
    ///
    /// Part of the store contract; backends that cannot bound their
    /// calls never produce this variant.
    #[error("record {op} timed out after {elapsed:?}")]
    Timeout { op: &'static str, elapsed: Duration },

    /// Backend-specific failure (connectivity, serialization, ...).
    #[error("record backend error: {0}")]
    Backend(String),
}

/// Result alias for record store operations.
pub type RecordResult<T> = Result<T, RecordError>;
