//! Ordered directory membership for mediakeep.
//!
//! [`DirectoryService`] owns the ordered-list invariants of
//! directory-asset membership: indices are contiguous, order is
//! persisted, and the same asset never appears twice. Repositioning uses
//! minimal rotation -- only the contiguous span between the old and new
//! position shifts, by exactly one slot -- so every other member keeps
//! its index and relative order.
//!
//! Operations on one directory are serialized by the record store's
//! transaction scope; concurrent mutations of the same sequence cannot
//! lose updates.

pub mod error;
pub mod service;

pub use error::DirectoryError;
pub use service::{DirectoryService, Position};
