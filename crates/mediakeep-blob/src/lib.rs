//! Key-addressed blob storage for mediakeep.
//!
//! Binary asset payloads live here, outside the record store, addressed
//! by an opaque [`BlobKey`](mediakeep_types::BlobKey). Keys are freshly
//! generated per write and never reused: the create protocol's
//! compensating delete must never touch another asset's data, which rules
//! out content addressing (identical payloads would share a key).
//!
//! # Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlobStore`] -- one file per key in a sharded directory tree
//!
//! # Design rules
//!
//! 1. A stored payload is immutable; there is no overwrite operation.
//! 2. Writes are atomic: a reader never observes a partially written blob.
//! 3. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{BlobError, BlobResult};
pub use fs::{FsBlobConfig, FsBlobStore};
pub use memory::InMemoryBlobStore;
pub use traits::BlobStore;
