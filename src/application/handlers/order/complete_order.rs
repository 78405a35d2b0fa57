//! CompleteOrderHandler - Command handler for marking fulfilment done.

use std::sync::Arc;

use crate::domain::foundation::{Actor, OrderId, Timestamp};
use crate::domain::order::{OrderCompleted, OrderError};
use crate::ports::{EventPublisher, OrderRepository};

use super::super::publish_event;
use super::ledger;
use super::OrderTransitionResult;

/// Command to complete a paid order.
#[derive(Debug, Clone)]
pub struct CompleteOrderCommand {
    pub order_id: OrderId,
    pub actor: Actor,
}

/// Handler for completing orders. Administrators only.
pub struct CompleteOrderHandler {
    repository: Arc<dyn OrderRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl CompleteOrderHandler {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: CompleteOrderCommand,
    ) -> Result<OrderTransitionResult<OrderCompleted>, OrderError> {
        cmd.actor.ensure_admin("order", cmd.order_id.to_string())?;

        let (order, event) = ledger::transition(self.repository.as_ref(), cmd.order_id, |order| {
            order.complete(Timestamp::now())
        })
        .await?;

        tracing::info!(order_id = %order.id, by = %cmd.actor.user_id, "order completed");
        publish_event(self.event_publisher.as_ref(), &event, &cmd.actor.user_id).await;

        Ok(OrderTransitionResult { order, event })
    }
}
