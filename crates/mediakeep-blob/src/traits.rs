use std::io::Read;

use bytes::Bytes;
use mediakeep_types::BlobKey;

use crate::error::BlobResult;

/// Key-addressed store for raw binary payloads.
///
/// All implementations must satisfy these invariants:
/// - Every successful `put` returns a key that was never handed out
///   before; keys are not derived from content.
/// - A payload readable under a key is exactly the bytes that were
///   written under it.
/// - `delete` only ever affects the payload under the given key.
/// - Concurrent reads are always safe (payloads are immutable).
pub trait BlobStore: Send + Sync {
    /// Drain the reader and store its bytes under a fresh key.
    fn put(&self, reader: &mut dyn Read) -> BlobResult<BlobKey>;

    /// Read the payload stored under `key`.
    ///
    /// Returns `BlobError::NotFound` if the key does not resolve.
    fn get(&self, key: &BlobKey) -> BlobResult<Bytes>;

    /// Delete the payload stored under `key`.
    ///
    /// Returns `BlobError::NotFound` if the key does not resolve.
    fn delete(&self, key: &BlobKey) -> BlobResult<()>;

    /// Check whether a payload exists under `key`.
    fn exists(&self, key: &BlobKey) -> BlobResult<bool>;
}
