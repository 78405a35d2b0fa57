//! HandlePaymentNotificationHandler - Command handler for inbound provider
//! notifications.
//!
//! The provider always gets its own acknowledgement format back. Any
//! rejection makes it retry, so transient failures heal on redelivery and
//! duplicates are absorbed by the idempotent ledger.

use std::sync::Arc;

use crate::domain::foundation::ProviderId;
use crate::domain::order::{NotificationEffect, Order, OrderError};
use crate::ports::{
    EventPublisher, GatewayLookup, GatewayResponse, NotificationPayload, OrderRepository,
};

use super::ledger::{self, gateway_error};

/// Command carrying a raw notification for one provider.
#[derive(Debug, Clone)]
pub struct HandlePaymentNotificationCommand {
    pub provider: ProviderId,
    pub payload: NotificationPayload,
}

/// What to send back to the provider, and what happened.
#[derive(Debug)]
pub struct NotificationReply {
    pub response: GatewayResponse,
    pub outcome: Result<(Order, NotificationEffect), OrderError>,
}

impl NotificationReply {
    pub fn is_accepted(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Handler for payment notifications.
pub struct HandlePaymentNotificationHandler {
    repository: Arc<dyn OrderRepository>,
    gateways: Arc<dyn GatewayLookup>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl HandlePaymentNotificationHandler {
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

    /// # Errors
    ///
    /// Only an unknown provider, since there is no gateway to format a reply.
    pub async fn handle(
        &self,
        cmd: HandlePaymentNotificationCommand,
    ) -> Result<NotificationReply, OrderError> {
        let gateway = self.gateways.gateway(&cmd.provider).map_err(gateway_error)?;

        // 1. Parse and verify
        let notification = match gateway.parse_notification(&cmd.payload) {
            Ok(notification) => notification,
            Err(e) => {
                tracing::warn!(provider = %cmd.provider, error = %e, "unreadable payment notification");
                return Ok(NotificationReply {
                    response: gateway.reject(&e.to_string()),
                    outcome: Err(gateway_error(e)),
                });
            }
        };

        if !notification.is_verified {
            tracing::warn!(
                provider = %cmd.provider,
                order_id = %notification.order_id,
                "payment notification failed signature verification"
            );
            return Ok(NotificationReply {
                response: gateway.reject("invalid signature"),
                outcome: Err(OrderError::InvalidSignature {
                    provider: cmd.provider,
                }),
            });
        }

        // 2. Apply through the ledger
        let outcome = ledger::apply_verified(
            self.repository.as_ref(),
            self.event_publisher.as_ref(),
            &notification,
        )
        .await;

        let response = match &outcome {
            Ok(_) => gateway.acknowledge(&notification),
            Err(e) => {
                log_rejection(&cmd.provider, e);
                gateway.reject(&e.message())
            }
        };
        Ok(NotificationReply { response, outcome })
    }
}

fn log_rejection(provider: &ProviderId, err: &OrderError) {
    match err {
        OrderError::AmountMismatch { expected, received } => tracing::warn!(
            %provider,
            expected = %expected,
            received = %received,
            "payment notification amount mismatch, order left unchanged"
        ),
        OrderError::PaymentIdConflict {
            order_id,
            recorded,
            received,
        } => tracing::warn!(
            %provider,
            %order_id,
            recorded = %recorded,
            received = %received,
            "payment notification carries a different payment id"
        ),
        e if e.is_retryable() => {
            tracing::error!(%provider, error = %e, "payment notification not applied, provider will retry")
        }
        e => tracing::info!(%provider, error = %e, "payment notification rejected"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{
        notification_body, pending_order, processing_order, Harness, STUB_PROVIDER,
    };
    use crate::domain::foundation::BillingErrorKind;
    use crate::domain::order::OrderStatus;

    fn handler(h: &Harness) -> HandlePaymentNotificationHandler {
        HandlePaymentNotificationHandler::new(h.orders.clone(), h.gateways.clone(), h.events.clone())
    }

    fn command(body: String) -> HandlePaymentNotificationCommand {
        HandlePaymentNotificationCommand {
            provider: ProviderId::from_static(STUB_PROVIDER),
            payload: NotificationPayload::new(body),
        }
    }

    async fn stored_status(h: &Harness, order: &Order) -> OrderStatus {
        h.orders.find_by_id(&order.id).await.unwrap().unwrap().status
    }

    #[tokio::test]
    async fn verified_success_marks_order_paid() {
        let h = Harness::new();
        let order = processing_order(10_000);
        h.orders.insert(&order).await.unwrap();

        let reply = handler(&h)
            .handle(command(notification_body(&order, 10_000, "paid", "valid")))
            .await
            .unwrap();

        assert!(reply.is_accepted());
        assert!(reply.response.accepted);
        assert_eq!(reply.response.body, "OK");
        assert_eq!(stored_status(&h, &order).await, OrderStatus::Paid);
        assert_eq!(h.events.events_of_type("order.paid.v1").len(), 1);
    }

    #[tokio::test]
    async fn duplicate_delivery_is_acknowledged_without_new_event() {
        let h = Harness::new();
        let order = processing_order(10_000);
        h.orders.insert(&order).await.unwrap();
        let body = notification_body(&order, 10_000, "paid", "valid");

        handler(&h).handle(command(body.clone())).await.unwrap();
        let reply = handler(&h).handle(command(body)).await.unwrap();

        assert!(reply.response.accepted);
        assert!(matches!(
            reply.outcome,
            Ok((_, NotificationEffect::AlreadyApplied { status: OrderStatus::Paid }))
        ));
        assert_eq!(h.events.events_of_type("order.paid.v1").len(), 1);
    }

    #[tokio::test]
    async fn bad_signature_is_rejected_before_lookup() {
        let h = Harness::new();
        // Not stored: verification must fail before the order is looked up.
        let order = processing_order(10_000);

        let reply = handler(&h)
            .handle(command(notification_body(&order, 10_000, "paid", "forged")))
            .await
            .unwrap();

        assert!(!reply.response.accepted);
        assert_eq!(
            reply.outcome.unwrap_err().kind(),
            BillingErrorKind::Authenticity
        );
    }

    #[tokio::test]
    async fn amount_mismatch_is_rejected_and_order_untouched() {
        let h = Harness::new();
        let order = processing_order(10_000);
        h.orders.insert(&order).await.unwrap();

        let reply = handler(&h)
            .handle(command(notification_body(&order, 15_000, "paid", "valid")))
            .await
            .unwrap();

        assert!(!reply.response.accepted);
        assert!(matches!(reply.outcome, Err(OrderError::AmountMismatch { .. })));
        assert_eq!(stored_status(&h, &order).await, OrderStatus::Processing);
        assert_eq!(h.events.event_count(), 0);
    }

    #[tokio::test]
    async fn unknown_order_is_rejected() {
        let h = Harness::new();
        let order = processing_order(10_000);

        let reply = handler(&h)
            .handle(command(notification_body(&order, 10_000, "paid", "valid")))
            .await
            .unwrap();

        assert_eq!(reply.outcome.unwrap_err(), OrderError::not_found(order.id));
    }

    #[tokio::test]
    async fn pending_order_cannot_be_paid_directly() {
        let h = Harness::new();
        let order = pending_order(10_000);
        h.orders.insert(&order).await.unwrap();

        let reply = handler(&h)
            .handle(command(notification_body(&order, 10_000, "paid", "valid")))
            .await
            .unwrap();

        assert_eq!(reply.outcome.unwrap_err().kind(), BillingErrorKind::State);
        assert_eq!(stored_status(&h, &order).await, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn pending_check_is_acknowledged_and_records_payment_id() {
        let h = Harness::new();
        let order = processing_order(10_000);
        h.orders.insert(&order).await.unwrap();

        let reply = handler(&h)
            .handle(command(notification_body(&order, 10_000, "check", "valid")))
            .await
            .unwrap();

        assert!(reply.response.accepted);
        let stored = h.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Processing);
        assert_eq!(stored.payment_id.as_deref(), Some("pay-1"));
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected() {
        let h = Harness::new();
        let reply = handler(&h)
            .handle(command("amount=1".to_string()))
            .await
            .unwrap();
        assert!(!reply.response.accepted);
        assert_eq!(reply.outcome.unwrap_err().kind(), BillingErrorKind::Validation);
    }

    #[tokio::test]
    async fn unknown_provider_is_an_error() {
        let h = Harness::new();
        let cmd = HandlePaymentNotificationCommand {
            provider: ProviderId::from_static("paypal"),
            payload: NotificationPayload::new("x=1"),
        };
        let err = handler(&h).handle(cmd).await.unwrap_err();
        assert_eq!(err.kind(), BillingErrorKind::Configuration);
    }
}
