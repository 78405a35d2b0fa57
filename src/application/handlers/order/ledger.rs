//! Order write path shared by the order handlers.
//!
//! Every write is a compare-and-swap on the status and payment id the change
//! was computed from. A lost race reloads the order and decides again, so two concurrent
//! success notifications produce one `paid` transition and one event.

use crate::domain::foundation::{OrderId, Timestamp};
use crate::domain::order::{NotificationEffect, Order, OrderError, PaymentNotification};
use crate::ports::{EventPublisher, GatewayError, OrderRepository};

use super::super::publish_event;

/// Reload-and-retry bound for a contended order.
pub(crate) const MAX_CAS_ATTEMPTS: usize = 3;

/// Loads the order, applies `change` and writes it back if the stored status
/// and payment id are still the ones `change` saw.
pub(crate) async fn transition<T, F>(
    repository: &dyn OrderRepository,
    order_id: OrderId,
    mut change: F,
) -> Result<(Order, T), OrderError>
where
    T: Send,
    F: FnMut(&mut Order) -> Result<T, OrderError> + Send,
{
    for attempt in 1..=MAX_CAS_ATTEMPTS {
        let mut order = repository
            .find_by_id(&order_id)
            .await?
            .ok_or_else(|| OrderError::not_found(order_id))?;
        let expected = order.status;
        let expected_payment_id = order.payment_id.clone();
        let outcome = change(&mut order)?;

        if repository
            .update_if_status(&order, expected, expected_payment_id.as_deref())
            .await?
        {
            return Ok((order, outcome));
        }
        tracing::debug!(%order_id, attempt, "order changed concurrently, reloading");
    }
    Err(contended(order_id))
}

/// Applies a verified notification and publishes the resulting fact.
///
/// Publishing happens only for the writer that won the status swap. A
/// failed publish is logged, not returned; the transition stands.
pub(crate) async fn apply_verified(
    repository: &dyn OrderRepository,
    publisher: &dyn EventPublisher,
    notification: &PaymentNotification,
) -> Result<(Order, NotificationEffect), OrderError> {
    let order_id = notification.order_id;
    for attempt in 1..=MAX_CAS_ATTEMPTS {
        let mut order = repository
            .find_by_id(&order_id)
            .await?
            .ok_or_else(|| OrderError::not_found(order_id))?;
        let expected = order.status;
        let expected_payment_id = order.payment_id.clone();
        let effect = order.apply_notification(notification, Timestamp::now())?;

        if !effect.needs_persist() {
            tracing::info!(
                %order_id,
                payment_id = %notification.provider_payment_id,
                status = %expected,
                "duplicate notification, already applied"
            );
            return Ok((order, effect));
        }

        if repository
            .update_if_status(&order, expected, expected_payment_id.as_deref())
            .await?
        {
            publish_effect(publisher, &order, &effect).await;
            return Ok((order, effect));
        }
        tracing::debug!(%order_id, attempt, "order changed concurrently, reloading");
    }
    Err(contended(order_id))
}

async fn publish_effect(publisher: &dyn EventPublisher, order: &Order, effect: &NotificationEffect) {
    match effect {
        NotificationEffect::Paid(event) => {
            tracing::info!(order_id = %order.id, payment_id = %event.payment_id, "order paid");
            publish_event(publisher, event, &order.user_id).await;
        }
        NotificationEffect::Failed(event) => {
            tracing::info!(
                order_id = %order.id,
                reason = event.reason.as_deref().unwrap_or("unspecified"),
                "order payment failed"
            );
            publish_event(publisher, event, &order.user_id).await;
        }
        NotificationEffect::AlreadyApplied { .. } | NotificationEffect::Payable => {}
    }
}

fn contended(order_id: OrderId) -> OrderError {
    OrderError::infrastructure(format!(
        "order {} is being modified concurrently, retry later",
        order_id
    ))
}

/// Maps a gateway failure onto the order error taxonomy.
pub(crate) fn gateway_error(err: GatewayError) -> OrderError {
    match err {
        GatewayError::Configuration(msg) => OrderError::configuration(msg),
        GatewayError::Transport(msg) => OrderError::infrastructure(msg),
        GatewayError::MissingField(field) => {
            OrderError::validation(field, "missing from notification")
        }
        GatewayError::Malformed { field, reason } => OrderError::validation(field, reason),
        GatewayError::Signature(e) => OrderError::validation("signature", e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryOrderRepository;
    use crate::application::handlers::test_support::{processing_order, usd, Harness};
    use crate::domain::foundation::{BillingErrorKind, DomainError, ProviderId, UserId};
    use crate::domain::order::{OrderStatus, PaymentOutcome};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    fn success(order: &Order) -> PaymentNotification {
        PaymentNotification {
            provider: ProviderId::from_static("stub"),
            order_id: order.id,
            amount: order.total.clone(),
            provider_payment_id: "pay-1".to_string(),
            outcome: PaymentOutcome::Succeeded,
            is_verified: true,
        }
    }

    #[tokio::test]
    async fn concurrent_duplicates_publish_once() {
        let h = Harness::new();
        let order = processing_order(10_000);
        h.orders.insert(&order).await.unwrap();
        let notification = success(&order);

        let (a, b) = tokio::join!(
            apply_verified(h.orders.as_ref(), h.events.as_ref(), &notification),
            apply_verified(h.orders.as_ref(), h.events.as_ref(), &notification),
        );

        let effects = [a.unwrap().1, b.unwrap().1];
        assert_eq!(effects.iter().filter(|e| e.changed_state()).count(), 1);
        assert_eq!(h.events.events_of_type("order.paid.v1").len(), 1);
    }

    /// Holds writes that mark an order paid until a concurrent writer has run.
    struct SlowPaidWrites(Arc<InMemoryOrderRepository>);

    #[async_trait]
    impl OrderRepository for SlowPaidWrites {
        async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
            self.0.find_by_id(id).await
        }

        async fn insert(&self, order: &Order) -> Result<(), DomainError> {
            self.0.insert(order).await
        }

        async fn update_if_status(
            &self,
            order: &Order,
            expected: OrderStatus,
            expected_payment_id: Option<&str>,
        ) -> Result<bool, DomainError> {
            if order.status == OrderStatus::Paid {
                tokio::time::sleep(Duration::from_millis(30)).await;
            }
            self.0.update_if_status(order, expected, expected_payment_id).await
        }

        async fn count_redemptions(
            &self,
            code: &str,
            user: Option<&UserId>,
        ) -> Result<u64, DomainError> {
            self.0.count_redemptions(code, user).await
        }
    }

    #[tokio::test]
    async fn pending_payment_id_is_not_overwritten_by_a_stale_success() {
        let h = Harness::new();
        let order = processing_order(10_000);
        h.orders.insert(&order).await.unwrap();
        let repository = SlowPaidWrites(h.orders.clone());

        let mut paid_with_b = success(&order);
        paid_with_b.provider_payment_id = "pay-B".to_string();
        let mut pending_with_a = success(&order);
        pending_with_a.provider_payment_id = "pay-A".to_string();
        pending_with_a.outcome = PaymentOutcome::Pending;

        let (b, a) = tokio::join!(
            apply_verified(&repository, h.events.as_ref(), &paid_with_b),
            async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                apply_verified(&repository, h.events.as_ref(), &pending_with_a).await
            },
        );

        assert_eq!(a.unwrap().1, NotificationEffect::Payable);
        assert!(matches!(b, Err(OrderError::PaymentIdConflict { .. })));
        let stored = h.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Processing);
        assert_eq!(stored.payment_id.as_deref(), Some("pay-A"));
        assert_eq!(h.events.event_count(), 0);
    }

    #[tokio::test]
    async fn amount_mismatch_leaves_order_processing() {
        let h = Harness::new();
        let order = processing_order(10_000);
        h.orders.insert(&order).await.unwrap();
        let mut notification = success(&order);
        notification.amount = usd(15_000);

        let err = apply_verified(h.orders.as_ref(), h.events.as_ref(), &notification)
            .await
            .unwrap_err();

        assert!(matches!(err, OrderError::AmountMismatch { .. }));
        let stored = h.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Processing);
        assert_eq!(h.events.event_count(), 0);
    }

    #[tokio::test]
    async fn publish_failure_does_not_undo_the_payment() {
        let h = Harness::new();
        let order = processing_order(10_000);
        h.orders.insert(&order).await.unwrap();
        h.events.set_failing(true);

        let (paid, effect) = apply_verified(h.orders.as_ref(), h.events.as_ref(), &success(&order))
            .await
            .unwrap();

        assert!(effect.changed_state());
        assert_eq!(paid.status, OrderStatus::Paid);
        let stored = h.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
        assert_eq!(h.events.event_count(), 0);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let h = Harness::new();
        let order = processing_order(10_000);

        let err = apply_verified(h.orders.as_ref(), h.events.as_ref(), &success(&order))
            .await
            .unwrap_err();
        assert_eq!(err, OrderError::not_found(order.id));
    }

    #[tokio::test]
    async fn transition_reports_domain_rejection() {
        let h = Harness::new();
        let order = processing_order(10_000);
        h.orders.insert(&order).await.unwrap();

        let err = transition(h.orders.as_ref(), order.id, |o| o.complete(Timestamp::now()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), BillingErrorKind::State);
    }

    #[test]
    fn transport_failures_stay_retryable() {
        assert!(gateway_error(GatewayError::Transport("timeout".into())).is_retryable());
        assert_eq!(
            gateway_error(GatewayError::Configuration("unknown".into())).kind(),
            BillingErrorKind::Configuration
        );
    }
}
