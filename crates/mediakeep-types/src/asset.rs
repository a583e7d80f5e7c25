use std::cmp::Ordering;
use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypesError;
use crate::id::{AssetId, BlobKey};
use crate::normalize::normalize;

/// A binary-backed asset record.
///
/// The structured fields live in the record store; the binary payload
/// lives in the blob store under [`store_key`](Asset::store_key). The
/// `payload` field is a transient, in-memory attachment populated by the
/// lifecycle's read-stream operation and never persisted.
///
/// # Expiration states
///
/// Four derived states over the two stored fields `expires_at` and
/// `expired`:
///
/// | state      | condition                                              |
/// |------------|--------------------------------------------------------|
/// | expirable  | `expires_at` is set                                    |
/// | expiring   | not expired, expirable, and `expires_at` at/before now |
/// | expired    | the `expired` flag is set                              |
/// | unexpiring | expired, and `expires_at` absent or after now          |
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Asset {
    id: AssetId,
    name: Option<String>,
    title: Option<String>,
    description: Option<String>,
    store_key: Option<BlobKey>,
    meta_data: BTreeMap<String, String>,
    expires_at: Option<DateTime<Utc>>,
    expired: bool,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    #[serde(skip)]
    payload: Option<Bytes>,
}

impl Asset {
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Assign the record-store identifier. Called by the record store on
    /// create; ignored afterwards by convention (ids are immutable once
    /// assigned).
    pub fn assign_id(&mut self, id: AssetId) {
        self.id = id;
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name<S: AsRef<str>>(&mut self, name: Option<S>) {
        self.name = normalize(name);
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title<S: AsRef<str>>(&mut self, title: Option<S>) {
        self.title = normalize(title);
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description<S: AsRef<str>>(&mut self, description: Option<S>) {
        self.description = normalize(description);
    }

    /// The blob store handle, present exactly when the asset has been
    /// persisted together with its binary payload.
    pub fn store_key(&self) -> Option<&BlobKey> {
        self.store_key.as_ref()
    }

    /// Set the store key during the create protocol.
    ///
    /// The key is written once; reassigning an already-set key is an
    /// error. [`clear_store_key`](Asset::clear_store_key) exists solely
    /// for the failed-create compensation path.
    pub fn assign_store_key(&mut self, key: BlobKey) -> Result<(), TypesError> {
        if self.store_key.is_some() {
            return Err(TypesError::StoreKeyReassigned);
        }
        self.store_key = Some(key);
        Ok(())
    }

    /// Clear the store key after a failed create, once the orphaned blob
    /// has been handed to compensation.
    pub fn clear_store_key(&mut self) {
        self.store_key = None;
    }

    pub fn meta_data(&self) -> &BTreeMap<String, String> {
        &self.meta_data
    }

    /// Insert a metadata entry. Keys are trimmed; blank keys are
    /// rejected; duplicate keys overwrite.
    pub fn set_meta_data<V: Into<String>>(&mut self, key: &str, value: V) -> Result<(), TypesError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(TypesError::BlankMetaKey {
                value: value.into(),
            });
        }
        self.meta_data.insert(key.to_owned(), value.into());
        Ok(())
    }

    /// Remove all metadata entries.
    pub fn clear_meta_data(&mut self) {
        self.meta_data.clear();
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn set_expires_at(&mut self, expires_at: Option<DateTime<Utc>>) {
        self.expires_at = expires_at;
    }

    /// Whether the asset has an expiration date at all.
    pub fn is_expirable(&self) -> bool {
        self.expires_at.is_some()
    }

    /// Whether the asset should transition to expired: not yet flagged,
    /// but its expiration date is at or before `now`.
    pub fn is_expiring_at(&self, now: DateTime<Utc>) -> bool {
        !self.expired && self.expires_at.is_some_and(|at| at <= now)
    }

    /// Whether the asset is currently expiring, measured against the wall
    /// clock.
    pub fn is_expiring(&self) -> bool {
        self.is_expiring_at(Utc::now())
    }

    /// The stored expired flag, independent of `expires_at`.
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Whether the asset should transition back out of expired: flagged,
    /// but no expiration date or one that lies after `now`.
    pub fn is_unexpiring_at(&self, now: DateTime<Utc>) -> bool {
        self.expired && self.expires_at.map_or(true, |at| at > now)
    }

    /// Whether the asset is currently unexpiring, measured against the
    /// wall clock.
    pub fn is_unexpiring(&self) -> bool {
        self.is_unexpiring_at(Utc::now())
    }

    /// Flip the stored expired flag.
    ///
    /// Driven by the lifecycle transitions (sweep passes or the explicit
    /// expire/unexpire API); regular client updates never touch it.
    pub fn set_expired(&mut self, expired: bool) {
        self.expired = expired;
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// Refresh the modification stamp. Called by the lifecycle on every
    /// persisted mutation.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.modified_at = now;
    }

    /// Whether a payload is currently attached.
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// The attached binary payload, if any.
    pub fn payload(&self) -> Option<&Bytes> {
        self.payload.as_ref()
    }

    /// Attach a binary payload fetched from the blob store.
    pub fn attach_payload(&mut self, payload: Bytes) {
        self.payload = Some(payload);
    }

    /// Order assets by expiration date, earliest first, assets without an
    /// expiration date last. Sorting a listing with this moves the assets
    /// closest to expiry to the top.
    pub fn cmp_by_expiration(a: &Asset, b: &Asset) -> Ordering {
        match (a.expires_at, b.expires_at) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// A transient asset that has not been persisted yet.
///
/// Drafts carry the structured fields plus the binary payload destined
/// for the blob store. The lifecycle's create operation turns a draft
/// into a persisted [`Asset`].
#[derive(Clone, Debug, Default)]
pub struct AssetDraft {
    name: Option<String>,
    title: Option<String>,
    description: Option<String>,
    meta_data: BTreeMap<String, String>,
    expires_at: Option<DateTime<Utc>>,
    payload: Option<Bytes>,
}

impl AssetDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name<S: AsRef<str>>(&mut self, name: Option<S>) {
        self.name = normalize(name);
    }

    pub fn set_title<S: AsRef<str>>(&mut self, title: Option<S>) {
        self.title = normalize(title);
    }

    pub fn set_description<S: AsRef<str>>(&mut self, description: Option<S>) {
        self.description = normalize(description);
    }

    pub fn set_meta_data<V: Into<String>>(&mut self, key: &str, value: V) -> Result<(), TypesError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(TypesError::BlankMetaKey {
                value: value.into(),
            });
        }
        self.meta_data.insert(key.to_owned(), value.into());
        Ok(())
    }

    pub fn set_expires_at(&mut self, expires_at: Option<DateTime<Utc>>) {
        self.expires_at = expires_at;
    }

    /// Attach the binary payload to be written to the blob store.
    pub fn attach_payload(&mut self, payload: Bytes) {
        self.payload = Some(payload);
    }

    pub fn payload(&self) -> Option<&Bytes> {
        self.payload.as_ref()
    }

    /// Take the payload out of the draft, leaving it empty.
    pub fn take_payload(&mut self) -> Option<Bytes> {
        self.payload.take()
    }

    /// Finalize the draft into an asset.
    ///
    /// The id stays nil (the record store assigns the real one on
    /// create); the store key is set separately by the create protocol
    /// once the payload has been written.
    pub fn build(self, now: DateTime<Utc>) -> Asset {
        Asset {
            id: AssetId::nil(),
            name: self.name,
            title: self.title,
            description: self.description,
            store_key: None,
            meta_data: self.meta_data,
            expires_at: self.expires_at,
            expired: false,
            created_at: now,
            modified_at: now,
            payload: self.payload,
        }
    }
}
