use std::time::Duration;

use mediakeep_record::{QueryName, ASSETS_EXPIRING, ASSETS_UNEXPIRING};

/// Configuration for the expiration sweeper.
#[derive(Clone, Debug)]
pub struct SweepConfig {
    /// Delay between periodic sweep passes.
    pub interval: Duration,
    /// Named query yielding the assets to expire.
    pub query_expiring: QueryName,
    /// Named query yielding the assets to unexpire.
    pub query_unexpiring: QueryName,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            query_expiring: ASSETS_EXPIRING,
            query_unexpiring: ASSETS_UNEXPIRING,
        }
    }
}
