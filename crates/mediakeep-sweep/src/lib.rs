//! Expiration sweeper for mediakeep.
//!
//! [`ExpirationSweeper`] runs the batch side of the asset expiration
//! state machine: one pass flips assets whose expiration date has been
//! reached to expired, a second pass clears the flag on assets whose
//! date was removed or pushed into the future. Both passes re-derive
//! their working set from the stored fields through named queries, so a
//! sweep can be retried at any time without losing or duplicating
//! progress.
//!
//! The sweeper verifies at construction that both named queries are
//! registered and refuses to start otherwise -- a missing query is a
//! deployment error, not something to discover on the first batch run.

pub mod config;
pub mod error;
pub mod sweeper;

pub use config::SweepConfig;
pub use error::SweepError;
pub use sweeper::{ExpirationSweeper, SweepReport, SweeperHandle};
