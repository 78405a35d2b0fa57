//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod discount;
pub mod order;
pub mod subscription;

#[cfg(test)]
pub(crate) mod test_support;

pub use discount::{DiscountDecision, ValidateDiscountHandler, ValidateDiscountQuery};
pub use order::{
    CancelOrderCommand, CancelOrderHandler, CompleteOrderCommand, CompleteOrderHandler,
    CreateOrderCommand, CreateOrderHandler, CreateOrderResult, GetOrderHandler, GetOrderQuery,
    HandlePaymentNotificationCommand, HandlePaymentNotificationHandler, NotificationReply,
    OrderTransitionResult, PollPaymentStatusCommand, PollPaymentStatusHandler,
    PollPaymentStatusResult, RefundOrderCommand, RefundOrderHandler, StartCheckoutCommand,
    StartCheckoutHandler, StartCheckoutResult,
};
pub use subscription::{
    CancelSubscriptionHandler, GetSubscriptionHandler, GetSubscriptionQuery,
    PauseSubscriptionHandler, ResumeSubscriptionHandler, SubscriptionCommand,
    SubscriptionTransitionResult,
};

use crate::domain::foundation::{DomainError, ErrorCode, SerializableDomainEvent, UserId};
use crate::ports::EventPublisher;

/// Wraps `event` in an envelope attributed to `user_id` and publishes it.
///
/// Called after the change is committed. A failed publish is logged, not
/// returned; the transition stands and the caller sees its result.
pub(crate) async fn publish_event<E: SerializableDomainEvent>(
    publisher: &dyn EventPublisher,
    event: &E,
    user_id: &UserId,
) {
    let published = match event.to_envelope() {
        Ok(envelope) => publisher.publish(envelope.with_user_id(user_id.to_string())).await,
        Err(e) => Err(DomainError::new(
            ErrorCode::InternalError,
            format!("failed to serialize {}: {}", event.event_type(), e),
        )),
    };
    if let Err(e) = published {
        tracing::error!(
            event_type = event.event_type(),
            aggregate_id = %event.aggregate_id(),
            error = %e,
            "failed to publish event"
        );
    }
}
