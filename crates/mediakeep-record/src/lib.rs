//! Transactional record storage for mediakeep entities.
//!
//! The record store holds the structured side of every entity -- asset
//! metadata and directory membership -- while binary payloads live in
//! `mediakeep-blob`. Services open one transaction per operation via
//! [`RecordStore::in_transaction`]; an `Err` from the closure rolls the
//! transaction back, so a multi-step mutation is never half-applied.
//!
//! # Named queries
//!
//! Batch lookups go through a [`QueryCatalog`] of named queries. The two
//! expiration queries ([`ASSETS_EXPIRING`], [`ASSETS_UNEXPIRING`]) are
//! registered by [`asset_queries`]; the sweeper verifies their presence
//! at startup and fails fast when a deployment forgets one.
//!
//! # Backends
//!
//! - [`InMemoryRecordStore`] -- `BTreeMap`-backed store for tests and
//!   embedding, with snapshot-based rollback

pub mod error;
pub mod memory;
pub mod query;
pub mod records;
pub mod traits;

pub use error::{RecordError, RecordResult};
pub use memory::InMemoryRecordStore;
pub use query::{asset_queries, QueryCatalog, QueryName, ASSETS_EXPIRING, ASSETS_UNEXPIRING};
pub use traits::{Record, RecordRef, RecordStore, RecordTx};
