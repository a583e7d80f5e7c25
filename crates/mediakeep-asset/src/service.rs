use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use mediakeep_blob::BlobStore;
use mediakeep_events::{EventBus, MediaEvent};
use mediakeep_record::{QueryName, RecordStore};
use mediakeep_types::{Asset, AssetDraft, AssetId};

use crate::error::AssetError;

/// The asset lifecycle service.
///
/// Constructed once with its stores and the event bus, then shared.
/// Every operation runs inside one record-store transaction; blob store
/// calls sit outside that transaction, which is why the create path
/// carries an explicit compensation step.
pub struct AssetService<R, B> {
    records: Arc<R>,
    blobs: Arc<B>,
    events: Arc<EventBus>,
}

impl<R, B> AssetService<R, B>
where
    R: RecordStore<Asset>,
    B: BlobStore,
{
    pub fn new(records: Arc<R>, blobs: Arc<B>, events: Arc<EventBus>) -> Self {
        Self {
            records,
            blobs,
            events,
        }
    }

    /// Create an asset from a draft.
    ///
    /// The payload is written to the blob store first; only then is the
    /// record persisted. If persistence fails, the orphaned payload is
    /// deleted (best effort) and the original persistence error is
    /// re-raised. A blob store failure aborts before any record exists.
    pub fn create(&self, mut draft: AssetDraft) -> Result<Asset, AssetError> {
        self.events.publish(&MediaEvent::AssetCreate);

        let payload = draft
            .take_payload()
            .ok_or_else(|| AssetError::Validation("draft carries no payload".into()))?;

        let key = self.blobs.put(&mut payload.as_ref())?;

        let now = Utc::now();
        let mut asset = draft.build(now);
        asset
            .assign_store_key(key)
            .map_err(|e| AssetError::State(e.to_string()))?;
        asset.attach_payload(payload);

        let stored = self
            .records
            .in_transaction(|tx| tx.create(asset.clone()));

        match stored {
            Ok(stored) => {
                self.events.publish(&MediaEvent::AssetCreated {
                    asset: stored.id(),
                });
                Ok(stored)
            }
            Err(e) => {
                asset.clear_store_key();
                warn!(%key, "saving asset failed, removing binary data from store");
                if let Err(inner) = self.blobs.delete(&key) {
                    // The original persistence error still wins; the key is
                    // logged for out-of-band garbage collection.
                    warn!(%key, "unable to delete orphaned blob: {inner}");
                }
                Err(AssetError::Persistence(e))
            }
        }
    }

    /// Apply metadata changes to a persisted asset.
    ///
    /// Only the client-mutable fields are taken from the given asset:
    /// name, title, description, metadata, and the expiration date. The
    /// store key, payload, and expired flag always come from the stored
    /// record -- neither is client-mutable.
    pub fn update(&self, asset: &Asset) -> Result<Asset, AssetError> {
        let id = asset.id();
        if id.is_nil() {
            return Err(AssetError::Validation("asset has not been persisted".into()));
        }
        self.events.publish(&MediaEvent::AssetUpdate { asset: id });

        let updated = self
            .records
            .in_transaction(|tx| {
                let mut current = tx.read(id)?;
                current.set_name(asset.name());
                current.set_title(asset.title());
                current.set_description(asset.description());
                current.clear_meta_data();
                for (k, v) in asset.meta_data() {
                    // Keys in a persisted map already passed validation.
                    let _ = current.set_meta_data(k, v.clone());
                }
                current.set_expires_at(asset.expires_at());
                current.touch(Utc::now());
                tx.update(current)
            })
            .map_err(|e| AssetError::from_record(id, e))?;

        self.events.publish(&MediaEvent::AssetUpdated { asset: id });
        Ok(updated)
    }

    /// Delete an asset record.
    ///
    /// The binary payload is left in the blob store: compensating
    /// deletion is reserved for the create path, and an abandoned blob is
    /// recoverable by out-of-band garbage collection, while a record
    /// pointing at deleted binary data is not.
    pub fn delete(&self, id: AssetId) -> Result<(), AssetError> {
        self.events.publish(&MediaEvent::AssetDelete { asset: id });

        let deleted = self
            .records
            .in_transaction(|tx| {
                let asset = tx.read(id)?;
                tx.delete(id)?;
                Ok(asset)
            })
            .map_err(|e| AssetError::from_record(id, e))?;

        if let Some(key) = deleted.store_key() {
            debug!(%id, %key, "asset deleted, blob left for out-of-band garbage collection");
        }

        self.events.publish(&MediaEvent::AssetDeleted { asset: id });
        Ok(())
    }

    /// Read an asset by id.
    pub fn get(&self, id: AssetId) -> Result<Asset, AssetError> {
        self.records
            .read(id)
            .map_err(|e| AssetError::from_record(id, e))
    }

    /// Attach the binary payload to an asset, fetching it from the blob
    /// store on first call.
    ///
    /// Idempotent: an asset that already carries a payload is returned
    /// untouched, without another blob store read.
    pub fn read_stream(&self, asset: &mut Asset) -> Result<(), AssetError> {
        if asset.has_payload() {
            return Ok(());
        }
        let key = *asset.store_key().ok_or_else(|| {
            AssetError::State("asset has no store key, payload was never persisted".into())
        })?;
        let payload = self.blobs.get(&key)?;
        asset.attach_payload(payload);
        Ok(())
    }

    /// Run a named query against the record store.
    pub fn list(&self, query: QueryName, now: DateTime<Utc>) -> Result<Vec<Asset>, AssetError> {
        self.records
            .list(query, now)
            .map_err(AssetError::Persistence)
    }

    /// Verify a named query is available. Used by the sweeper's fail-fast
    /// initialization.
    pub fn verify_query(&self, query: QueryName) -> Result<(), AssetError> {
        self.records
            .verify_query(query)
            .map_err(AssetError::Persistence)
    }

    /// Transition an asset to expired.
    ///
    /// Driven by the sweep over assets in the expiring state, and usable
    /// directly as the manual override. Already-expired assets are left
    /// untouched and no event fires.
    pub fn expire(&self, id: AssetId) -> Result<Asset, AssetError> {
        let (asset, changed) = self.set_expired_flag(id, true)?;
        if changed {
            self.events.publish(&MediaEvent::AssetExpired { asset: id });
        }
        Ok(asset)
    }

    /// Transition an asset out of expired.
    ///
    /// Driven by the sweep over assets in the unexpiring state, and
    /// usable directly as the manual override. Not-expired assets are
    /// left untouched and no event fires.
    pub fn unexpire(&self, id: AssetId) -> Result<Asset, AssetError> {
        let (asset, changed) = self.set_expired_flag(id, false)?;
        if changed {
            self.events.publish(&MediaEvent::AssetUnexpired { asset: id });
        }
        Ok(asset)
    }

    fn set_expired_flag(&self, id: AssetId, expired: bool) -> Result<(Asset, bool), AssetError> {
        self.records
            .in_transaction(|tx| {
                let mut asset = tx.read(id)?;
                if asset.is_expired() == expired {
                    trace!(%id, expired, "expired flag already in target state");
                    return Ok((asset, false));
                }
                asset.set_expired(expired);
                asset.touch(Utc::now());
                let asset = tx.update(asset)?;
                Ok((asset, true))
            })
            .map_err(|e| AssetError::from_record(id, e))
    }
}

impl<R, B> std::fmt::Debug for AssetService<R, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetService").finish_non_exhaustive()
    }
}
