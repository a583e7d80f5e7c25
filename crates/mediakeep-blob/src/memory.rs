use std::collections::HashMap;
use std::io::Read;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use bytes::Bytes;
use mediakeep_types::BlobKey;

use crate::error::{BlobError, BlobResult};
use crate::traits::BlobStore;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Payloads are held behind a `RwLock`;
/// `Bytes` makes reads cheap. The store counts `get` calls and can be
/// told to fail the next `put` or `delete`, which the lifecycle tests use
/// to drive the compensation paths deterministically.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<BlobKey, Bytes>>,
    get_count: AtomicU64,
    fail_next_put: AtomicBool,
    fail_next_delete: AtomicBool,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            get_count: AtomicU64::new(0),
            fail_next_put: AtomicBool::new(false),
            fail_next_delete: AtomicBool::new(false),
        }
    }

    /// Number of payloads currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored payloads.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .expect("lock poisoned")
            .values()
            .map(|b| b.len() as u64)
            .sum()
    }

    /// Remove all payloads from the store.
    pub fn clear(&self) {
        self.blobs.write().expect("lock poisoned").clear();
    }

    /// How many `get` calls this store has served.
    pub fn get_count(&self) -> u64 {
        self.get_count.load(Ordering::SeqCst)
    }

    /// Make the next `put` fail with an I/O error.
    pub fn fail_next_put(&self) {
        self.fail_next_put.store(true, Ordering::SeqCst);
    }

    /// Make the next `delete` fail with an I/O error.
    pub fn fail_next_delete(&self) {
        self.fail_next_delete.store(true, Ordering::SeqCst);
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, reader: &mut dyn Read) -> BlobResult<BlobKey> {
        if self.fail_next_put.swap(false, Ordering::SeqCst) {
            return Err(BlobError::Io(std::io::Error::other("injected put failure")));
        }
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        let key = BlobKey::generate();
        let mut map = self.blobs.write().expect("lock poisoned");
        map.insert(key, Bytes::from(buf));
        Ok(key)
    }

    fn get(&self, key: &BlobKey) -> BlobResult<Bytes> {
        self.get_count.fetch_add(1, Ordering::SeqCst);
        let map = self.blobs.read().expect("lock poisoned");
        map.get(key).cloned().ok_or(BlobError::NotFound(*key))
    }

    fn delete(&self, key: &BlobKey) -> BlobResult<()> {
        if self.fail_next_delete.swap(false, Ordering::SeqCst) {
            return Err(BlobError::Io(std::io::Error::other(
                "injected delete failure",
            )));
        }
        let mut map = self.blobs.write().expect("lock poisoned");
        match map.remove(key) {
            Some(_) => Ok(()),
            None => Err(BlobError::NotFound(*key)),
        }
    }

    fn exists(&self, key: &BlobKey) -> BlobResult<bool> {
        let map = self.blobs.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .finish()
    }
}
