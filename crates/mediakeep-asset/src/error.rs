use mediakeep_blob::BlobError;
use mediakeep_record::RecordError;
use mediakeep_types::AssetId;

/// Errors from asset lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// Malformed or missing input. Never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced asset does not exist.
    #[error("asset not found: {0}")]
    NotFound(AssetId),

    /// Blob store failure. On the create path this is raised before any
    /// record exists; nothing needs cleanup.
    #[error("binary store failure: {0}")]
    Storage(#[from] BlobError),

    /// Record store failure. On the create path the orphaned payload has
    /// already been handed to compensation by the time this surfaces.
    #[error("record store failure: {0}")]
    Persistence(RecordError),

    /// Operation invoked in an invalid lifecycle state.
    #[error("invalid lifecycle state: {0}")]
    State(String),
}

impl AssetError {
    /// Map a record store error, resolving `NotFound` to the typed asset
    /// id the caller asked for.
    pub(crate) fn from_record(id: AssetId, e: RecordError) -> Self {
        match e {
            RecordError::NotFound { .. } => AssetError::NotFound(id),
            other => AssetError::Persistence(other),
        }
    }
}
