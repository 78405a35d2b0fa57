//! StartCheckoutHandler - Command handler for sending a customer to pay.

use std::sync::Arc;

use crate::domain::foundation::{Actor, OrderId, Timestamp};
use crate::domain::order::{CheckoutStarted, Order, OrderError, OrderStatus};
use crate::ports::{EventPublisher, GatewayLookup, OrderRepository, RedirectRequest};

use super::super::publish_event;
use super::ledger::{self, gateway_error};

/// Command to issue a payment redirect for an order.
#[derive(Debug, Clone)]
pub struct StartCheckoutCommand {
    pub order_id: OrderId,
    pub actor: Actor,
    pub description: Option<String>,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub fail_url: String,
}

/// Result of a checkout.
#[derive(Debug, Clone)]
pub struct StartCheckoutResult {
    pub order: Order,
    pub redirect_url: String,

    /// `None` when the order was already in `processing` and the redirect
    /// was only re-issued.
    pub event: Option<CheckoutStarted>,
}

/// Handler for starting checkout.
pub struct StartCheckoutHandler {
    repository: Arc<dyn OrderRepository>,
    gateways: Arc<dyn GatewayLookup>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl StartCheckoutHandler {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        gateways: Arc<dyn GatewayLookup>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            gateways,
            event_publisher,
        }
    }

    pub async fn handle(&self, cmd: StartCheckoutCommand) -> Result<StartCheckoutResult, OrderError> {
        // 1. Load and authorize
        let order = self
            .repository
            .find_by_id(&cmd.order_id)
            .await?
            .ok_or_else(|| OrderError::not_found(cmd.order_id))?;
        cmd.actor
            .ensure_owner_or_admin(&order.user_id, "order", order.id.to_string())?;

        // 2. Build the redirect; pure, nothing is stored yet
        let gateway = self
            .gateways
            .gateway(&order.payment_provider)
            .map_err(gateway_error)?;
        let request = RedirectRequest {
            order_id: order.id,
            amount: order.total.clone(),
            description: cmd
                .description
                .unwrap_or_else(|| format!("Order {}", order.id)),
            customer_email: cmd.customer_email,
            success_url: cmd.success_url,
            fail_url: cmd.fail_url,
        };
        let redirect_url = gateway.build_redirect(&request).map_err(gateway_error)?;

        if order.status == OrderStatus::Processing {
            return Ok(StartCheckoutResult {
                order,
                redirect_url,
                event: None,
            });
        }

        // 3. pending → processing
        let (order, event) = ledger::transition(self.repository.as_ref(), cmd.order_id, |order| {
            order.start_checkout(Timestamp::now())
        })
        .await?;

        tracing::info!(
            order_id = %order.id,
            provider = %order.payment_provider,
            "checkout started"
        );

        // 4. Publish event
        publish_event(self.event_publisher.as_ref(), &event, &order.user_id).await;

        Ok(StartCheckoutResult {
            order,
            redirect_url,
            event: Some(event),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{owner, pending_order, stranger, Harness};
    use crate::domain::foundation::BillingErrorKind;

    fn handler(h: &Harness) -> StartCheckoutHandler {
        StartCheckoutHandler::new(h.orders.clone(), h.gateways.clone(), h.events.clone())
    }

    fn command(order_id: OrderId, actor: Actor) -> StartCheckoutCommand {
        StartCheckoutCommand {
            order_id,
            actor,
            description: None,
            customer_email: None,
            success_url: "https://shop.test/ok".to_string(),
            fail_url: "https://shop.test/fail".to_string(),
        }
    }

    #[tokio::test]
    async fn moves_pending_order_to_processing() {
        let h = Harness::new();
        let order = pending_order(10_000);
        h.orders.insert(&order).await.unwrap();

        let result = handler(&h).handle(command(order.id, owner())).await.unwrap();

        assert_eq!(result.order.status, OrderStatus::Processing);
        assert_eq!(
            result.redirect_url,
            format!("https://pay.test/{}?sum=100.00", order.id)
        );
        assert!(result.event.is_some());
        assert!(h.events.has_event("order.checkout_started.v1"));
    }

    #[tokio::test]
    async fn reissues_redirect_for_processing_order() {
        let h = Harness::new();
        let order = pending_order(10_000);
        h.orders.insert(&order).await.unwrap();
        handler(&h).handle(command(order.id, owner())).await.unwrap();

        let again = handler(&h).handle(command(order.id, owner())).await.unwrap();

        assert!(again.event.is_none());
        assert_eq!(h.events.events_of_type("order.checkout_started.v1").len(), 1);
    }

    #[tokio::test]
    async fn other_users_cannot_check_out() {
        let h = Harness::new();
        let order = pending_order(10_000);
        h.orders.insert(&order).await.unwrap();

        let err = handler(&h).handle(command(order.id, stranger())).await.unwrap_err();
        assert!(matches!(err, OrderError::Forbidden(_)));
    }

    #[tokio::test]
    async fn settled_order_cannot_restart_checkout() {
        let h = Harness::new();
        let mut order = pending_order(10_000);
        order.cancel(Timestamp::now()).unwrap();
        h.orders.insert(&order).await.unwrap();

        let err = handler(&h).handle(command(order.id, owner())).await.unwrap_err();
        assert_eq!(err.kind(), BillingErrorKind::State);
    }
}
