//! Event publisher that writes every envelope to the tracing pipeline.
//!
//! Default wiring when no message broker is attached: downstream
//! collaborators read `billing.event` records from the log stream.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::EventPublisher;

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventPublisher;

impl TracingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let payload = serde_json::to_string(&event.payload)
            .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;
        tracing::info!(
            target: "billing.event",
            event_id = %event.event_id,
            event_type = %event.event_type,
            aggregate_type = %event.aggregate_type,
            aggregate_id = %event.aggregate_id,
            occurred_at = %event.occurred_at,
            correlation_id = event.metadata.correlation_id.as_deref().unwrap_or(""),
            payload = %payload,
            "domain event"
        );
        Ok(())
    }
}
