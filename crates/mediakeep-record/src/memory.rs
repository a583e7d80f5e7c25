use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::error::{RecordError, RecordResult};
use crate::query::{QueryCatalog, QueryName};
use crate::traits::{Record, RecordRef, RecordStore, RecordTx};

/// In-memory, BTreeMap-based record store.
///
/// Intended for tests and embedding. Transactions take the write lock
/// for their whole duration (serializing all mutations on this entity
/// type) and snapshot the map on entry; an `Err` from the transaction
/// closure restores the snapshot, so partial mutations are never
/// observable.
pub struct InMemoryRecordStore<T: Record> {
    records: RwLock<BTreeMap<T::Id, T>>,
    catalog: QueryCatalog<T>,
    fail_next_create: AtomicBool,
}

impl<T: Record> InMemoryRecordStore<T> {
    /// Create an empty store with an empty query catalog.
    pub fn new() -> Self {
        Self::with_catalog(QueryCatalog::new())
    }

    /// Create an empty store with the given query catalog.
    pub fn with_catalog(catalog: QueryCatalog<T>) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            catalog,
            fail_next_create: AtomicBool::new(false),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().expect("lock poisoned").is_empty()
    }

    /// Make the next `create` inside any transaction fail with a
    /// constraint violation. Used to drive the compensation paths in
    /// lifecycle tests.
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }
}

impl<T: Record> Default for InMemoryRecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

struct MemoryTx<'a, T: Record> {
    records: &'a mut BTreeMap<T::Id, T>,
    catalog: &'a QueryCatalog<T>,
    fail_next_create: &'a AtomicBool,
}

impl<T: Record> RecordTx<T> for MemoryTx<'_, T> {
    fn create(&mut self, mut entity: T) -> RecordResult<T> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(RecordError::Constraint("injected create failure".into()));
        }
        if !entity.has_id() {
            entity.assign_fresh_id();
        }
        let id = entity.id();
        if self.records.contains_key(&id) {
            return Err(RecordError::Duplicate { id: id.to_string() });
        }
        trace!(%id, "created record");
        self.records.insert(id, entity.clone());
        Ok(entity)
    }

    fn read(&self, id: T::Id) -> RecordResult<T> {
        self.records
            .get(&id)
            .cloned()
            .ok_or_else(|| RecordError::NotFound { id: id.to_string() })
    }

    fn update(&mut self, entity: T) -> RecordResult<T> {
        let id = entity.id();
        if !self.records.contains_key(&id) {
            return Err(RecordError::NotFound { id: id.to_string() });
        }
        self.records.insert(id, entity.clone());
        Ok(entity)
    }

    fn delete(&mut self, id: T::Id) -> RecordResult<()> {
        match self.records.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RecordError::NotFound { id: id.to_string() }),
        }
    }

    fn list(&self, query: QueryName, now: DateTime<Utc>) -> RecordResult<Vec<T>> {
        let predicate = self.catalog.get(query)?;
        Ok(self
            .records
            .values()
            .filter(|record| predicate(record, now))
            .cloned()
            .collect())
    }
}

impl<T: Record> RecordStore<T> for InMemoryRecordStore<T> {
    fn in_transaction<R, E, F>(&self, f: F) -> Result<R, E>
    where
        E: From<RecordError>,
        F: FnOnce(&mut dyn RecordTx<T>) -> Result<R, E>,
    {
        let mut records = self.records.write().expect("lock poisoned");
        let snapshot = records.clone();
        let mut tx = MemoryTx {
            records: &mut *records,
            catalog: &self.catalog,
            fail_next_create: &self.fail_next_create,
        };
        match f(&mut tx) {
            Ok(value) => Ok(value),
            Err(e) => {
                trace!("transaction rolled back");
                *records = snapshot;
                Err(e)
            }
        }
    }

    fn read(&self, id: T::Id) -> RecordResult<T> {
        self.records
            .read()
            .expect("lock poisoned")
            .get(&id)
            .cloned()
            .ok_or_else(|| RecordError::NotFound { id: id.to_string() })
    }

    fn reference(&self, id: T::Id) -> RecordResult<RecordRef<T>> {
        let records = self.records.read().expect("lock poisoned");
        if records.contains_key(&id) {
            Ok(RecordRef::new(id))
        } else {
            Err(RecordError::NotFound { id: id.to_string() })
        }
    }

    fn list(&self, query: QueryName, now: DateTime<Utc>) -> RecordResult<Vec<T>> {
        let predicate = self.catalog.get(query)?;
        Ok(self
            .records
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|record| predicate(record, now))
            .cloned()
            .collect())
    }

    fn verify_query(&self, query: QueryName) -> RecordResult<()> {
        self.catalog.verify(query)
    }
}

impl<T: Record> std::fmt::Debug for InMemoryRecordStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRecordStore")
            .field("record_count", &self.len())
            .field("catalog", &self.catalog)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{asset_queries, ASSETS_EXPIRING};
    use chrono::Duration;
    use mediakeep_types::{Asset, AssetDraft, AssetId};

    fn store() -> InMemoryRecordStore<Asset> {
        InMemoryRecordStore::with_catalog(asset_queries())
    }

    fn draft_asset(name: &str) -> Asset {
        let mut draft = AssetDraft::new();
        draft.set_name(Some(name));
        draft.build(Utc::now())
    }

    // -----------------------------------------------------------------------
    // Create / read / update / delete
    // -----------------------------------------------------------------------

    #[test]
    fn create_assigns_an_id() {
        let store = store();
        let created = store
            .in_transaction(|tx| tx.create(draft_asset("a")))
            .unwrap();
        assert!(!created.id().is_nil());
        assert_eq!(store.read(created.id()).unwrap().name(), Some("a"));
    }

    #[test]
    fn create_keeps_a_preassigned_id() {
        let store = store();
        let mut asset = draft_asset("a");
        let id = AssetId::generate();
        asset.assign_id(id);
        let created = store.in_transaction(|tx| tx.create(asset)).unwrap();
        assert_eq!(created.id(), id);
    }

    #[test]
    fn create_duplicate_id_is_rejected() {
        let store = store();
        let mut asset = draft_asset("a");
        asset.assign_id(AssetId::generate());
        store.in_transaction(|tx| tx.create(asset.clone())).unwrap();
        let err = store.in_transaction(|tx| tx.create(asset)).unwrap_err();
        assert!(matches!(err, RecordError::Duplicate { .. }));
    }

    #[test]
    fn read_missing_is_not_found() {
        let store = store();
        let err = store.read(AssetId::generate()).unwrap_err();
        assert!(matches!(err, RecordError::NotFound { .. }));
    }

    #[test]
    fn update_overwrites() {
        let store = store();
        let mut created = store
            .in_transaction(|tx| tx.create(draft_asset("before")))
            .unwrap();
        created.set_name(Some("after"));
        store
            .in_transaction(|tx| tx.update(created.clone()))
            .unwrap();
        assert_eq!(store.read(created.id()).unwrap().name(), Some("after"));
    }

    #[test]
    fn update_missing_is_not_found() {
        let store = store();
        let mut asset = draft_asset("ghost");
        asset.assign_id(AssetId::generate());
        let err = store.in_transaction(|tx| tx.update(asset)).unwrap_err();
        assert!(matches!(err, RecordError::NotFound { .. }));
    }

    #[test]
    fn delete_removes_the_record() {
        let store = store();
        let created = store
            .in_transaction(|tx| tx.create(draft_asset("a")))
            .unwrap();
        store.in_transaction(|tx| tx.delete(created.id())).unwrap();
        assert!(store.read(created.id()).is_err());
    }

    // -----------------------------------------------------------------------
    // Transaction rollback
    // -----------------------------------------------------------------------

    #[test]
    fn failed_transaction_rolls_back_all_mutations() {
        let store = store();
        let existing = store
            .in_transaction(|tx| tx.create(draft_asset("keep")))
            .unwrap();

        let result: RecordResult<()> = store.in_transaction(|tx| {
            tx.create(draft_asset("doomed"))?;
            let mut renamed = tx.read(existing.id())?;
            renamed.set_name(Some("mutated"));
            tx.update(renamed)?;
            Err(RecordError::Conflict("boom".into()))
        });

        assert!(result.is_err());
        assert_eq!(store.len(), 1);
        assert_eq!(store.read(existing.id()).unwrap().name(), Some("keep"));
    }

    #[test]
    fn injected_create_failure_fires_once() {
        let store = store();
        store.fail_next_create();
        let err = store
            .in_transaction(|tx| tx.create(draft_asset("a")))
            .unwrap_err();
        assert!(matches!(err, RecordError::Constraint(_)));
        assert!(store.in_transaction(|tx| tx.create(draft_asset("a"))).is_ok());
    }

    // -----------------------------------------------------------------------
    // References
    // -----------------------------------------------------------------------

    #[test]
    fn reference_checks_existence() {
        let store = store();
        let created = store
            .in_transaction(|tx| tx.create(draft_asset("a")))
            .unwrap();
        let reference = store.reference(created.id()).unwrap();
        assert_eq!(reference.id(), created.id());

        let err = store.reference(AssetId::generate()).unwrap_err();
        assert!(matches!(err, RecordError::NotFound { .. }));
    }

    // -----------------------------------------------------------------------
    // Named queries
    // -----------------------------------------------------------------------

    #[test]
    fn list_filters_by_registered_predicate() {
        let store = store();
        let now = Utc::now();

        let mut overdue = AssetDraft::new();
        overdue.set_expires_at(Some(now - Duration::hours(1)));
        let mut fresh = AssetDraft::new();
        fresh.set_expires_at(Some(now + Duration::hours(1)));

        store
            .in_transaction(|tx| {
                tx.create(overdue.build(now))?;
                tx.create(fresh.build(now))?;
                tx.create(AssetDraft::new().build(now))
            })
            .unwrap();

        let expiring = store.list(ASSETS_EXPIRING, now).unwrap();
        assert_eq!(expiring.len(), 1);
        assert!(expiring[0].is_expiring_at(now));
    }

    #[test]
    fn list_unknown_query_is_rejected() {
        let store: InMemoryRecordStore<Asset> = InMemoryRecordStore::new();
        let err = store.list(ASSETS_EXPIRING, Utc::now()).unwrap_err();
        assert!(matches!(err, RecordError::UnknownQuery(_)));
    }

    #[test]
    fn verify_query_checks_the_catalog() {
        let store = store();
        store.verify_query(ASSETS_EXPIRING).unwrap();

        let bare: InMemoryRecordStore<Asset> = InMemoryRecordStore::new();
        assert!(bare.verify_query(ASSETS_EXPIRING).is_err());
    }
}
