use mediakeep_asset::AssetError;

/// Errors from the expiration sweeper.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    /// A required named query is not registered in the catalog.
    /// Raised at construction, before any sweep runs.
    #[error("required named query is not registered: {0}")]
    MissingQuery(String),

    /// A lifecycle transition or batch query failed mid-pass.
    /// The sweep is safe to retry; completed transitions stay committed.
    #[error("sweep pass failed: {0}")]
    Asset(#[from] AssetError),
}
