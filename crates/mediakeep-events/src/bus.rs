use std::sync::{Arc, Mutex, RwLock};

use thiserror::Error;
use tracing::{debug, warn};

use crate::event::MediaEvent;

/// Error returned by a failing subscriber.
///
/// Subscriber failures are logged by the bus and never propagated to the
/// publishing service.
#[derive(Debug, Error)]
#[error("subscriber error: {0}")]
pub struct EventError(pub String);

/// A registered consumer of lifecycle events.
pub trait EventSubscriber: Send + Sync {
    /// Name used in log output when delivery fails.
    fn name(&self) -> &str;

    fn on_event(&self, event: &MediaEvent) -> Result<(), EventError>;
}

/// Fan-out bus for lifecycle events.
///
/// Subscribers register once at startup; services publish on every
/// mutation. Delivery is synchronous, in registration order, and
/// best-effort: a failing subscriber is logged at warn level and the
/// remaining subscribers still receive the event.
pub struct EventBus {
    subscribers: RwLock<Vec<Arc<dyn EventSubscriber>>>,
}

impl EventBus {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Register a subscriber. Intended to be called during startup,
    /// before services begin publishing.
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) {
        debug!(subscriber = subscriber.name(), "registered event subscriber");
        self.subscribers
            .write()
            .expect("lock poisoned")
            .push(subscriber);
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().expect("lock poisoned").len()
    }

    /// Deliver an event to every subscriber.
    pub fn publish(&self, event: &MediaEvent) {
        let subscribers = self.subscribers.read().expect("lock poisoned");
        for subscriber in subscribers.iter() {
            if let Err(e) = subscriber.on_event(event) {
                warn!(
                    subscriber = subscriber.name(),
                    event = event.name(),
                    "event delivery failed: {e}"
                );
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Test-support subscriber that records every event it receives.
pub struct CountingSubscriber {
    received: Mutex<Vec<MediaEvent>>,
}

impl CountingSubscriber {
    pub fn new() -> Self {
        Self {
            received: Mutex::new(Vec::new()),
        }
    }

    /// All events received so far, in delivery order.
    pub fn received(&self) -> Vec<MediaEvent> {
        self.received.lock().expect("lock poisoned").clone()
    }

    /// How many received events satisfy the filter.
    pub fn count_matching(&self, filter: impl Fn(&MediaEvent) -> bool) -> usize {
        self.received
            .lock()
            .expect("lock poisoned")
            .iter()
            .filter(|e| filter(e))
            .count()
    }
}

impl Default for CountingSubscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for CountingSubscriber {
    fn name(&self) -> &str {
        "counting"
    }

    fn on_event(&self, event: &MediaEvent) -> Result<(), EventError> {
        self.received.lock().expect("lock poisoned").push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediakeep_types::AssetId;

    struct FailingSubscriber;

    impl EventSubscriber for FailingSubscriber {
        fn name(&self) -> &str {
            "failing"
        }

        fn on_event(&self, _event: &MediaEvent) -> Result<(), EventError> {
            Err(EventError("always fails".into()))
        }
    }

    #[test]
    fn publish_reaches_all_subscribers() {
        let bus = EventBus::new();
        let first = Arc::new(CountingSubscriber::new());
        let second = Arc::new(CountingSubscriber::new());
        bus.subscribe(first.clone());
        bus.subscribe(second.clone());

        let event = MediaEvent::AssetCreated {
            asset: AssetId::generate(),
        };
        bus.publish(&event);

        assert_eq!(first.received(), vec![event.clone()]);
        assert_eq!(second.received(), vec![event]);
    }

    #[test]
    fn failing_subscriber_does_not_block_the_rest() {
        let bus = EventBus::new();
        let counting = Arc::new(CountingSubscriber::new());
        bus.subscribe(Arc::new(FailingSubscriber));
        bus.subscribe(counting.clone());

        bus.publish(&MediaEvent::AssetCreate);
        assert_eq!(counting.received().len(), 1);
    }

    #[test]
    fn publish_without_subscribers_is_a_noop() {
        let bus = EventBus::new();
        bus.publish(&MediaEvent::AssetCreate);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn count_matching_filters_events() {
        let bus = EventBus::new();
        let counting = Arc::new(CountingSubscriber::new());
        bus.subscribe(counting.clone());

        let asset = AssetId::generate();
        bus.publish(&MediaEvent::AssetExpired { asset });
        bus.publish(&MediaEvent::AssetUnexpired { asset });
        bus.publish(&MediaEvent::AssetExpired { asset });

        let expired = counting
            .count_matching(|e| matches!(e, MediaEvent::AssetExpired { .. }));
        assert_eq!(expired, 2);
    }
}
