//! In-memory event bus.
//!
//! Records every published envelope so tests can assert on exactly which
//! billing facts a handler emitted, and how many times. Can be switched into
//! a failing mode to exercise the "persisted but not published" path.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard};

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::EventPublisher;

/// In-memory event bus for tests and database-less runs.
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new());
/// handler.handle(cmd).await?;
/// assert_eq!(bus.events_of_type("order.paid.v1").len(), 1);
/// ```
#[derive(Default)]
pub struct InMemoryEventBus {
    published: RwLock<Vec<EventEnvelope>>,
    failing: AtomicBool,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus whose `publish` always fails.
    pub fn failing() -> Self {
        let bus = Self::default();
        bus.set_failing(true);
        bus
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    // Append-only data, so a poisoned lock is still safe to read.
    fn read(&self) -> RwLockReadGuard<'_, Vec<EventEnvelope>> {
        self.published.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn published_events(&self) -> Vec<EventEnvelope> {
        self.read().clone()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.read()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Event types published for one order or subscription, oldest first.
    pub fn history_of(&self, aggregate_id: &str) -> Vec<String> {
        self.read()
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.event_type.clone())
            .collect()
    }

    pub fn event_count(&self) -> usize {
        self.read().len()
    }

    pub fn has_event(&self, event_type: &str) -> bool {
        self.read().iter().any(|e| e.event_type == event_type)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                format!("event bus unavailable for {}", event.event_type),
            ));
        }
        self.published
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(event_type: &str, aggregate_id: &str) -> EventEnvelope {
        EventEnvelope::new(event_type, aggregate_id, "Order", json!({}))
    }

    #[tokio::test]
    async fn records_published_events_by_type() {
        let bus = InMemoryEventBus::new();

        bus.publish(envelope("order.created.v1", "o-1")).await.unwrap();
        bus.publish(envelope("order.paid.v1", "o-1")).await.unwrap();
        bus.publish(envelope("order.created.v1", "o-2")).await.unwrap();

        assert_eq!(bus.event_count(), 3);
        assert_eq!(bus.events_of_type("order.created.v1").len(), 2);
        assert!(!bus.has_event("order.refunded.v1"));
    }

    #[tokio::test]
    async fn history_is_scoped_to_one_aggregate() {
        let bus = InMemoryEventBus::new();

        bus.publish(envelope("order.created.v1", "o-1")).await.unwrap();
        bus.publish(envelope("order.created.v1", "o-2")).await.unwrap();
        bus.publish(envelope("order.checkout_started.v1", "o-1")).await.unwrap();

        assert_eq!(
            bus.history_of("o-1"),
            vec!["order.created.v1", "order.checkout_started.v1"]
        );
    }

    #[tokio::test]
    async fn failing_bus_rejects_and_records_nothing() {
        let bus = InMemoryEventBus::failing();

        let err = bus.publish(envelope("order.paid.v1", "o-1")).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InternalError);
        assert_eq!(bus.event_count(), 0);

        bus.set_failing(false);
        bus.publish(envelope("order.paid.v1", "o-1")).await.unwrap();
        assert_eq!(bus.event_count(), 1);
    }
}
