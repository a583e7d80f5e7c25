use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use mediakeep_asset::{AssetError, AssetService};
use mediakeep_blob::BlobStore;
use mediakeep_record::{RecordError, RecordStore};
use mediakeep_types::Asset;

use crate::config::SweepConfig;
use crate::error::SweepError;

/// Outcome of one sweep invocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Assets transitioned to expired.
    pub expired: usize,
    /// Assets transitioned out of expired.
    pub unexpired: usize,
}

impl SweepReport {
    /// Returns `true` if the sweep changed nothing.
    pub fn is_empty(&self) -> bool {
        self.expired == 0 && self.unexpired == 0
    }
}

/// Batch driver for the asset expiration state machine.
///
/// Construction fails fast when either named query is missing. Each
/// sweep runs two passes -- expiring, then unexpiring -- and each
/// transition commits in its own transaction, so a failure mid-pass
/// leaves earlier transitions committed and the remainder re-derivable
/// on the next invocation.
pub struct ExpirationSweeper<R, B> {
    service: Arc<AssetService<R, B>>,
    config: SweepConfig,
}

impl<R, B> ExpirationSweeper<R, B>
where
    R: RecordStore<Asset>,
    B: BlobStore,
{
    /// Create a sweeper, verifying both named queries are registered.
    pub fn new(
        service: Arc<AssetService<R, B>>,
        config: SweepConfig,
    ) -> Result<Self, SweepError> {
        let sweeper = Self { service, config };
        sweeper.verify_queries()?;
        Ok(sweeper)
    }

    /// Check that both lookup queries resolve in the catalog.
    pub fn verify_queries(&self) -> Result<(), SweepError> {
        for query in [self.config.query_expiring, self.config.query_unexpiring] {
            debug!(%query, "checking for presence of named query");
            self.service.verify_query(query).map_err(|e| match e {
                AssetError::Persistence(RecordError::UnknownQuery(name)) => {
                    SweepError::MissingQuery(name)
                }
                other => SweepError::Asset(other),
            })?;
        }
        Ok(())
    }

    /// Run one sweep over both expiration boundaries.
    ///
    /// Idempotent: the passes re-derive their working sets from the
    /// stored fields, so an immediate re-run reports zero transitions.
    pub fn sweep(&self) -> Result<SweepReport, SweepError> {
        let now = Utc::now();
        let expired = self.check_expiring(now)?;
        let unexpired = self.check_unexpiring(now)?;
        Ok(SweepReport { expired, unexpired })
    }

    fn check_expiring(&self, now: DateTime<Utc>) -> Result<usize, SweepError> {
        let assets = self.service.list(self.config.query_expiring, now)?;
        debug_assert!(
            assets.iter().all(|a| a.is_expiring_at(now)),
            "expected all assets to be expiring"
        );
        info!("found {} expiring assets", assets.len());

        for asset in &assets {
            self.service.expire(asset.id())?;
        }
        Ok(assets.len())
    }

    fn check_unexpiring(&self, now: DateTime<Utc>) -> Result<usize, SweepError> {
        let assets = self.service.list(self.config.query_unexpiring, now)?;
        debug_assert!(
            assets.iter().all(|a| a.is_unexpiring_at(now)),
            "expected all assets to be unexpiring"
        );
        info!("found {} unexpiring assets", assets.len());

        for asset in &assets {
            self.service.unexpire(asset.id())?;
        }
        Ok(assets.len())
    }

    /// Run sweeps on the configured interval until the stop channel
    /// signals or disconnects. A failing sweep is logged and the loop
    /// continues with the next tick.
    pub fn run_periodic(&self, stop: mpsc::Receiver<()>) {
        info!(interval = ?self.config.interval, "expiration sweeper started");
        loop {
            match stop.recv_timeout(self.config.interval) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    info!("expiration sweeper stopped");
                    return;
                }
                Err(RecvTimeoutError::Timeout) => match self.sweep() {
                    Ok(report) if !report.is_empty() => {
                        info!(
                            expired = report.expired,
                            unexpired = report.unexpired,
                            "sweep completed"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => warn!("sweep failed, retrying next tick: {e}"),
                },
            }
        }
    }
}

impl<R, B> ExpirationSweeper<R, B>
where
    R: RecordStore<Asset> + 'static,
    B: BlobStore + 'static,
{
    /// Spawn the periodic runner on a background thread.
    pub fn spawn(self: Arc<Self>) -> SweeperHandle {
        let (stop_tx, stop_rx) = mpsc::channel();
        let join = std::thread::spawn(move || self.run_periodic(stop_rx));
        SweeperHandle {
            stop: stop_tx,
            join,
        }
    }
}

impl<R, B> std::fmt::Debug for ExpirationSweeper<R, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpirationSweeper")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Handle to a spawned periodic sweeper.
pub struct SweeperHandle {
    stop: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the runner to stop and wait for it to exit.
    pub fn stop(self) {
        // A disconnected channel also stops the runner, so a send failure
        // only means it is already on its way out.
        let _ = self.stop.send(());
        let _ = self.join.join();
    }
}
