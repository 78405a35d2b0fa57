//! Provider-agnostic view of a payment notification.

use crate::domain::foundation::{Money, OrderId, ProviderId};
use serde::{Deserialize, Serialize};

/// What the provider says happened to the payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Succeeded,
    Failed { reason: Option<String> },
    /// Pre-payment check: the provider asks whether the order can be paid.
    Pending,
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentOutcome::Succeeded)
    }
}

/// A parsed notification. Never persisted; consumed once by the ledger.
///
/// `is_verified` is the result of signature verification. An unverified
/// notification must not mutate any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotification {
    pub provider: ProviderId,
    pub order_id: OrderId,
    pub amount: Money,
    pub provider_payment_id: String,
    pub outcome: PaymentOutcome,
    pub is_verified: bool,
}
