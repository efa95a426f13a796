//! Broadcast channel for committed audit events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. The review
//! service publishes every [`AuditEvent`] after its store commit; the
//! audit exporter subscribes and mirrors events to the analytical store.

use tokio::sync::broadcast;

use super::AuditEvent;

/// Broadcast bus for [`AuditEvent`]s.
///
/// When the ring buffer is full the oldest events are dropped for lagging
/// receivers. The review store remains the source of truth, so a dropped
/// event only delays the analytical mirror.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AuditEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    /// If there are no active receivers, the event is silently dropped.
    pub fn publish(&self, event: AuditEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuditEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{ImageKey, ReviewMutation, ReviewState};
    use chrono::Utc;

    fn make_event(pvid: &str) -> AuditEvent {
        let (_, event) = ReviewState::apply(
            None,
            &ImageKey::new(pvid, 1),
            &ReviewMutation::ToggleStatus,
            "rev@example.com",
            Utc::now(),
        );
        event
    }

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(make_event("PV-1")), 0);
    }

    #[tokio::test]
    async fn subscriber_receives_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let event = make_event("PV-2");
        let id = event.event_id;
        bus.publish(event);

        let Ok(received) = rx.recv().await else {
            panic!("expected to receive event");
        };
        assert_eq!(received.event_id, id);
        assert_eq!(received.product_variant_id, "PV-2");
    }
}
