//! RefundOrderHandler - Command handler for recording a refund.

use std::sync::Arc;

use crate::domain::foundation::{Actor, OrderId, Timestamp};
use crate::domain::order::{OrderError, OrderRefunded};
use crate::ports::{EventPublisher, OrderRepository};

use super::super::publish_event;
use super::ledger;
use super::OrderTransitionResult;

/// Command to refund a paid or completed order.
///
/// The money movement itself happens at the provider; this records it.
#[derive(Debug, Clone)]
pub struct RefundOrderCommand {
    pub order_id: OrderId,
    pub actor: Actor,
}

/// Handler for refunds. Administrators only.
pub struct RefundOrderHandler {
    repository: Arc<dyn OrderRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl RefundOrderHandler {
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
        cmd: RefundOrderCommand,
    ) -> Result<OrderTransitionResult<OrderRefunded>, OrderError> {
        cmd.actor.ensure_admin("order", cmd.order_id.to_string())?;

        let (order, event) = ledger::transition(self.repository.as_ref(), cmd.order_id, |order| {
            order.refund(Timestamp::now())
        })
        .await?;

        tracing::info!(
            order_id = %order.id,
            total = %order.total,
            by = %cmd.actor.user_id,
            "order refunded"
        );
        publish_event(self.event_publisher.as_ref(), &event, &cmd.actor.user_id).await;

        Ok(OrderTransitionResult { order, event })
    }
}
