//! Order domain events.
//!
//! Downstream collaborators (entitlements, receipts) subscribe to these.
//! `OrderPaid` is published once per order, after the transition to paid
//! has been persisted.

use crate::domain::foundation::{
    domain_event, Currency, EventId, OrderId, ProviderId, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub total_minor: i64,
    pub currency: Currency,
    pub discount_code: Option<String>,
    pub created_at: Timestamp,
}

domain_event!(
    OrderCreated,
    event_type = "order.created.v1",
    aggregate_id = order_id,
    aggregate_type = "Order",
    occurred_at = created_at,
    event_id = event_id
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutStarted {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub payment_provider: ProviderId,
    pub started_at: Timestamp,
}

domain_event!(
    CheckoutStarted,
    event_type = "order.checkout_started.v1",
    aggregate_id = order_id,
    aggregate_type = "Order",
    occurred_at = started_at,
    event_id = event_id
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaid {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub payment_provider: ProviderId,
    pub payment_id: String,
    pub total_minor: i64,
    pub currency: Currency,
    pub discount_code: Option<String>,
    pub paid_at: Timestamp,
}

domain_event!(
    OrderPaid,
    event_type = "order.paid.v1",
    aggregate_id = order_id,
    aggregate_type = "Order",
    occurred_at = paid_at,
    event_id = event_id
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaymentFailed {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub payment_id: String,
    pub reason: Option<String>,
    pub failed_at: Timestamp,
}

domain_event!(
    OrderPaymentFailed,
    event_type = "order.payment_failed.v1",
    aggregate_id = order_id,
    aggregate_type = "Order",
    occurred_at = failed_at,
    event_id = event_id
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub cancelled_at: Timestamp,
}

domain_event!(
    OrderCancelled,
    event_type = "order.cancelled.v1",
    aggregate_id = order_id,
    aggregate_type = "Order",
    occurred_at = cancelled_at,
    event_id = event_id
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCompleted {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub completed_at: Timestamp,
}

domain_event!(
    OrderCompleted,
    event_type = "order.completed.v1",
    aggregate_id = order_id,
    aggregate_type = "Order",
    occurred_at = completed_at,
    event_id = event_id
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRefunded {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub payment_id: Option<String>,
    pub total_minor: i64,
    pub currency: Currency,
    pub refunded_at: Timestamp,
}

domain_event!(
    OrderRefunded,
    event_type = "order.refunded.v1",
    aggregate_id = order_id,
    aggregate_type = "Order",
    occurred_at = refunded_at,
    event_id = event_id
);
