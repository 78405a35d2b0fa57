//! Order status state machine.
//!
//! ```text
//! pending ──► processing ──► paid ──► completed
//!    │            │  │         │          │
//!    │            │  └► failed └──────────┴──► refunded
//!    └────────────┴──► cancelled
//! ```

use crate::domain::foundation::{StateMachine, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payment lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created at checkout, no redirect issued yet.
    Pending,

    /// Customer was sent to the provider; awaiting notification.
    Processing,

    /// Provider confirmed the payment.
    Paid,

    /// Fulfilled after payment.
    Completed,

    /// Provider reported a failed payment.
    Failed,

    /// Abandoned before payment.
    Cancelled,

    /// Money returned to the customer.
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Paid => "paid",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// True for statuses that require `paid_at` to be set.
    pub fn is_paid(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Completed)
    }

    /// Orders in these statuses consume discount usage.
    pub fn counts_as_redemption(&self) -> bool {
        self.is_paid()
    }

    /// A notification can no longer move the order out of these statuses.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            OrderStatus::Paid
                | OrderStatus::Completed
                | OrderStatus::Failed
                | OrderStatus::Cancelled
                | OrderStatus::Refunded
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "paid" => Ok(OrderStatus::Paid),
            "completed" => Ok(OrderStatus::Completed),
            "failed" => Ok(OrderStatus::Failed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            other => Err(ValidationError::invalid_format(
                "order_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

impl StateMachine for OrderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Paid)
                | (Processing, Failed)
                | (Processing, Cancelled)
                | (Paid, Completed)
                | (Paid, Refunded)
                | (Completed, Refunded)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrderStatus::*;
        match self {
            Pending => vec![Processing, Cancelled],
            Processing => vec![Paid, Failed, Cancelled],
            Paid => vec![Completed, Refunded],
            Completed => vec![Refunded],
            Failed | Cancelled | Refunded => vec![],
        }
    }
}
