//! CancelOrderHandler - Command handler for cancelling an unpaid order.

use std::sync::Arc;

use crate::domain::foundation::{Actor, OrderId, Timestamp};
use crate::domain::order::{OrderCancelled, OrderError};
use crate::ports::{EventPublisher, OrderRepository};

use super::super::publish_event;
use super::ledger;
use super::OrderTransitionResult;

/// Command to cancel an order before payment.
#[derive(Debug, Clone)]
pub struct CancelOrderCommand {
    pub order_id: OrderId,
    pub actor: Actor,
}

/// Handler for cancelling orders. Owner or administrator.
pub struct CancelOrderHandler {
    repository: Arc<dyn OrderRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl CancelOrderHandler {
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
        cmd: CancelOrderCommand,
    ) -> Result<OrderTransitionResult<OrderCancelled>, OrderError> {
        let actor = &cmd.actor;
        let (order, event) = ledger::transition(self.repository.as_ref(), cmd.order_id, |order| {
            actor.ensure_owner_or_admin(&order.user_id, "order", order.id.to_string())?;
            order.cancel(Timestamp::now())
        })
        .await?;

        tracing::info!(order_id = %order.id, by = %actor.user_id, "order cancelled");
        publish_event(self.event_publisher.as_ref(), &event, &actor.user_id).await;

        Ok(OrderTransitionResult { order, event })
    }
}
