//! Asset lifecycle for mediakeep.
//!
//! [`AssetService`] couples the two stores an asset lives in: structured
//! fields in the record store, the binary payload in the blob store. The
//! create protocol keeps them consistent under partial failure:
//!
//! 1. write the payload, obtaining the store key;
//! 2. persist the record inside one transaction;
//! 3. if persistence fails, delete the now-orphaned payload (best
//!    effort, logged on failure) and re-raise the original error.
//!
//! A record therefore never points at missing binary data, and a failed
//! create leaves the record store untouched. An orphaned payload can
//! survive only when the compensating delete itself fails; the key is
//! logged for out-of-band garbage collection.
//!
//! The service also owns the expiration transitions
//! ([`AssetService::expire`], [`AssetService::unexpire`]) driven by the
//! sweeper in `mediakeep-sweep` and available directly as the manual
//! override API.

pub mod error;
pub mod service;

pub use error::AssetError;
pub use service::AssetService;
