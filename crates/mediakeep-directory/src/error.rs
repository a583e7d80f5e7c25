use mediakeep_record::RecordError;
use mediakeep_types::{AssetId, DirectoryId};

/// Errors from directory ordering operations.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// Malformed or missing input. Never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The referenced directory does not exist.
    #[error("directory not found: {0}")]
    NotFound(DirectoryId),

    /// The referenced asset does not exist.
    #[error("asset not found: {0}")]
    AssetNotFound(AssetId),

    /// The asset is already a member of the directory.
    #[error("{asset} is already contained in {directory}")]
    Duplicate {
        directory: DirectoryId,
        asset: AssetId,
    },

    /// The asset is not a member of the directory.
    #[error("{asset} is not contained in {directory}")]
    NotMember {
        directory: DirectoryId,
        asset: AssetId,
    },

    /// The requested index lies outside the member sequence.
    #[error("index {index} out of bounds for directory of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Record store failure.
    #[error("record store failure: {0}")]
    Persistence(RecordError),
}

impl DirectoryError {
    pub(crate) fn from_directory_record(id: DirectoryId, e: RecordError) -> Self {
        match e {
            RecordError::NotFound { .. } => DirectoryError::NotFound(id),
            other => DirectoryError::Persistence(other),
        }
    }

    pub(crate) fn from_asset_record(id: AssetId, e: RecordError) -> Self {
        match e {
            RecordError::NotFound { .. } => DirectoryError::AssetNotFound(id),
            other => DirectoryError::Persistence(other),
        }
    }
}
