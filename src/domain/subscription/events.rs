//! Subscription domain events.

use crate::domain::foundation::{domain_event, EventId, SubscriptionId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPaused {
    pub event_id: EventId,
    pub subscription_id: SubscriptionId,
    pub user_id: UserId,
    pub next_payment_date: Timestamp,
    pub paused_at: Timestamp,
}

domain_event!(
    SubscriptionPaused,
    event_type = "subscription.paused.v1",
    aggregate_id = subscription_id,
    aggregate_type = "Subscription",
    occurred_at = paused_at,
    event_id = event_id
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionResumed {
    pub event_id: EventId,
    pub subscription_id: SubscriptionId,
    pub user_id: UserId,
    pub days_remaining: i64,
    pub next_payment_date: Timestamp,
    pub resumed_at: Timestamp,
}

domain_event!(
    SubscriptionResumed,
    event_type = "subscription.resumed.v1",
    aggregate_id = subscription_id,
    aggregate_type = "Subscription",
    occurred_at = resumed_at,
    event_id = event_id
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionCanceled {
    pub event_id: EventId,
    pub subscription_id: SubscriptionId,
    pub user_id: UserId,
    pub canceled_at: Timestamp,
}

domain_event!(
    SubscriptionCanceled,
    event_type = "subscription.canceled.v1",
    aggregate_id = subscription_id,
    aggregate_type = "Subscription",
    occurred_at = canceled_at,
    event_id = event_id
);
