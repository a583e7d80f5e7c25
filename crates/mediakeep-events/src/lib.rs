//! Lifecycle event bus for mediakeep.
//!
//! The asset and directory services publish a typed [`MediaEvent`] for
//! every mutation: a "pre" event before the change is applied and a
//! "post" event after successful persistence. Consumers implement
//! [`EventSubscriber`] and register on the [`EventBus`] at startup.
//!
//! Delivery is best-effort by design: events are notifications, not part
//! of the surrounding transaction. A failing subscriber is logged and
//! skipped -- it must never corrupt state that has already committed.

pub mod bus;
pub mod event;

pub use bus::{CountingSubscriber, EventBus, EventError, EventSubscriber};
pub use event::MediaEvent;
