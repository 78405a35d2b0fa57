//! EventPublisher port - Outbound channel for billing facts.
//!
//! Handlers publish only after the status write has won, so every event
//! corresponds to a transition the store already holds. A publish error
//! never rolls that transition back.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing domain events such as `order.paid.v1`.
///
/// Delivery is at-least-once from the subscriber's point of view: consumers
/// deduplicate on `event_id`.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;
}
