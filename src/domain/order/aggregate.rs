//! Order aggregate entity.
//!
//! # Design Decisions
//!
//! - **Money in minor units**: totals are `Money` (i64 minor units), never floats
//! - **Prices captured**: line items copy the unit price at order time
//! - **Never deleted**: every change is a status transition; refund is terminal
//! - **Pure decisions**: `apply_notification` decides and mutates in memory;
//!   persisting and publishing belong to the application layer

use crate::domain::foundation::{
    Currency, EventId, Money, OrderId, ProviderId, StateMachine, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};

use super::events::{
    CheckoutStarted, OrderCancelled, OrderCompleted, OrderCreated, OrderPaid, OrderPaymentFailed,
    OrderRefunded,
};
use super::{OrderError, OrderStatus, PaymentNotification, PaymentOutcome};

const MAX_QUANTITY: u32 = 10_000;

/// A purchased product or service with its price at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_ref: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl LineItem {
    pub fn new(
        product_ref: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self, OrderError> {
        let product_ref = product_ref.into();
        if product_ref.trim().is_empty() {
            return Err(OrderError::validation("product_ref", "cannot be empty"));
        }
        if quantity == 0 || quantity > MAX_QUANTITY {
            return Err(OrderError::validation(
                "quantity",
                format!("must be between 1 and {}", MAX_QUANTITY),
            ));
        }
        Ok(Self {
            product_ref,
            quantity,
            unit_price,
        })
    }

    pub fn line_total(&self) -> Result<Money, OrderError> {
        Ok(self.unit_price.checked_times(self.quantity)?)
    }
}

/// A discount that was validated and applied when the order was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    pub code: String,
    pub amount: Money,
}

/// Result of applying a verified notification to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEffect {
    /// processing → paid; publish the event after persisting.
    Paid(OrderPaid),

    /// processing → failed.
    Failed(OrderPaymentFailed),

    /// Duplicate delivery for an already-settled order. Nothing changed.
    AlreadyApplied { status: OrderStatus },

    /// Verified pre-payment check for a processing order. Status is
    /// unchanged; the provider payment id is recorded if it was unknown.
    Payable,
}

impl NotificationEffect {
    /// Whether the status moved.
    pub fn changed_state(&self) -> bool {
        matches!(self, NotificationEffect::Paid(_) | NotificationEffect::Failed(_))
    }

    /// Whether the order must be written back.
    pub fn needs_persist(&self) -> bool {
        !matches!(self, NotificationEffect::AlreadyApplied { .. })
    }
}

/// Order aggregate.
///
/// # Invariants
///
/// - `paid_at.is_some()` iff `status` is paid or completed
/// - `total == subtotal - discount`, never negative
/// - every line item and the total share `currency`
/// - `payment_id`, once set, never changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub line_items: Vec<LineItem>,
    pub currency: Currency,
    pub subtotal: Money,
    pub discount: Option<AppliedDiscount>,
    pub total: Money,
    pub status: OrderStatus,
    pub payment_provider: ProviderId,

    /// Provider-assigned reference, learned from the first notification.
    pub payment_id: Option<String>,

    pub paid_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub cancelled_at: Option<Timestamp>,
    pub refunded_at: Option<Timestamp>,
}

impl Order {
    /// Creates a pending order, capturing prices and applying a discount.
    pub fn create(
        id: OrderId,
        user_id: UserId,
        currency: Currency,
        line_items: Vec<LineItem>,
        payment_provider: ProviderId,
        discount: Option<AppliedDiscount>,
        now: Timestamp,
    ) -> Result<(Self, OrderCreated), OrderError> {
        if line_items.is_empty() {
            return Err(OrderError::validation("line_items", "order has no items"));
        }

        let mut subtotal = Money::zero(currency.clone());
        for item in &line_items {
            if item.unit_price.currency() != &currency {
                return Err(OrderError::validation(
                    "line_items",
                    format!(
                        "item '{}' is priced in {}, order is in {}",
                        item.product_ref,
                        item.unit_price.currency(),
                        currency
                    ),
                ));
            }
            subtotal = subtotal.checked_add(&item.line_total()?)?;
        }

        let total = match &discount {
            Some(applied) => subtotal.saturating_sub(&applied.amount)?,
            None => subtotal.clone(),
        };

        let order = Self {
            id,
            user_id,
            line_items,
            currency,
            subtotal,
            discount,
            total,
            status: OrderStatus::Pending,
            payment_provider,
            payment_id: None,
            paid_at: None,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
            refunded_at: None,
        };

        let event = OrderCreated {
            event_id: EventId::new(),
            order_id: order.id,
            user_id: order.user_id.clone(),
            total_minor: order.total.minor_units(),
            currency: order.currency.clone(),
            discount_code: order.discount_code().map(str::to_string),
            created_at: now,
        };

        Ok((order, event))
    }

    pub fn discount_code(&self) -> Option<&str> {
        self.discount.as_ref().map(|d| d.code.as_str())
    }

    /// pending → processing, once the redirect has been issued.
    pub fn start_checkout(&mut self, now: Timestamp) -> Result<CheckoutStarted, OrderError> {
        if self.total.is_zero() {
            return Err(OrderError::validation("total", "nothing to pay"));
        }
        self.transition_to(OrderStatus::Processing, "start checkout for")?;
        self.updated_at = now;
        Ok(CheckoutStarted {
            event_id: EventId::new(),
            order_id: self.id,
            payment_provider: self.payment_provider.clone(),
            started_at: now,
        })
    }

    /// Applies a verified provider notification.
    ///
    /// Checks run in this order, and none of them mutates on failure:
    /// authenticity, provider, amount and currency, payment id, status.
    /// A repeat for an already-settled order with the same payment id is
    /// `AlreadyApplied`, so at-least-once delivery is harmless.
    pub fn apply_notification(
        &mut self,
        notification: &PaymentNotification,
        now: Timestamp,
    ) -> Result<NotificationEffect, OrderError> {
        if !notification.is_verified {
            return Err(OrderError::InvalidSignature {
                provider: notification.provider.clone(),
            });
        }
        if notification.order_id != self.id {
            return Err(OrderError::validation(
                "order_id",
                "notification refers to a different order",
            ));
        }
        if notification.provider != self.payment_provider {
            return Err(OrderError::validation(
                "provider",
                format!(
                    "order is paid through {}, notification came from {}",
                    self.payment_provider, notification.provider
                ),
            ));
        }
        if notification.amount != self.total {
            return Err(OrderError::AmountMismatch {
                expected: self.total.clone(),
                received: notification.amount.clone(),
            });
        }
        if notification.provider_payment_id.trim().is_empty() {
            return Err(OrderError::validation("payment_id", "cannot be empty"));
        }
        if let Some(recorded) = &self.payment_id {
            if recorded != &notification.provider_payment_id {
                return Err(OrderError::PaymentIdConflict {
                    order_id: self.id,
                    recorded: recorded.clone(),
                    received: notification.provider_payment_id.clone(),
                });
            }
        }

        match (self.status, &notification.outcome) {
            (OrderStatus::Processing, PaymentOutcome::Succeeded) => self
                .mark_paid(notification.provider_payment_id.clone(), now)
                .map(NotificationEffect::Paid),
            (OrderStatus::Processing, PaymentOutcome::Failed { reason }) => self
                .mark_failed(notification.provider_payment_id.clone(), reason.clone(), now)
                .map(NotificationEffect::Failed),
            (OrderStatus::Processing, PaymentOutcome::Pending) => {
                if self.payment_id.is_none() {
                    self.payment_id = Some(notification.provider_payment_id.clone());
                    self.updated_at = now;
                }
                Ok(NotificationEffect::Payable)
            }
            (status, _) if status.is_settled() && self.payment_id.is_some() => {
                Ok(NotificationEffect::AlreadyApplied { status })
            }
            (status, _) => Err(OrderError::invalid_state(status, "apply a payment notification to")),
        }
    }

    /// processing → paid. Records the payment id and `paid_at`.
    pub fn mark_paid(
        &mut self,
        payment_id: String,
        now: Timestamp,
    ) -> Result<OrderPaid, OrderError> {
        self.transition_to(OrderStatus::Paid, "mark as paid")?;
        self.payment_id = Some(payment_id.clone());
        self.paid_at = Some(now);
        self.updated_at = now;
        Ok(OrderPaid {
            event_id: EventId::new(),
            order_id: self.id,
            user_id: self.user_id.clone(),
            payment_provider: self.payment_provider.clone(),
            payment_id,
            total_minor: self.total.minor_units(),
            currency: self.currency.clone(),
            discount_code: self.discount_code().map(str::to_string),
            paid_at: now,
        })
    }

    /// processing → failed.
    pub fn mark_failed(
        &mut self,
        payment_id: String,
        reason: Option<String>,
        now: Timestamp,
    ) -> Result<OrderPaymentFailed, OrderError> {
        self.transition_to(OrderStatus::Failed, "mark as failed")?;
        self.payment_id = Some(payment_id.clone());
        self.updated_at = now;
        Ok(OrderPaymentFailed {
            event_id: EventId::new(),
            order_id: self.id,
            user_id: self.user_id.clone(),
            payment_id,
            reason,
            failed_at: now,
        })
    }

    /// pending or processing → cancelled.
    pub fn cancel(&mut self, now: Timestamp) -> Result<OrderCancelled, OrderError> {
        self.transition_to(OrderStatus::Cancelled, "cancel")?;
        self.cancelled_at = Some(now);
        self.updated_at = now;
        Ok(OrderCancelled {
            event_id: EventId::new(),
            order_id: self.id,
            user_id: self.user_id.clone(),
            cancelled_at: now,
        })
    }

    /// paid → completed.
    pub fn complete(&mut self, now: Timestamp) -> Result<OrderCompleted, OrderError> {
        self.transition_to(OrderStatus::Completed, "complete")?;
        self.updated_at = now;
        Ok(OrderCompleted {
            event_id: EventId::new(),
            order_id: self.id,
            user_id: self.user_id.clone(),
            completed_at: now,
        })
    }

    /// paid or completed → refunded. Clears `paid_at`.
    pub fn refund(&mut self, now: Timestamp) -> Result<OrderRefunded, OrderError> {
        self.transition_to(OrderStatus::Refunded, "refund")?;
        self.paid_at = None;
        self.refunded_at = Some(now);
        self.updated_at = now;
        Ok(OrderRefunded {
            event_id: EventId::new(),
            order_id: self.id,
            user_id: self.user_id.clone(),
            payment_id: self.payment_id.clone(),
            total_minor: self.total.minor_units(),
            currency: self.currency.clone(),
            refunded_at: now,
        })
    }

    fn transition_to(
        &mut self,
        target: OrderStatus,
        attempted: &'static str,
    ) -> Result<(), OrderError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|_| OrderError::invalid_state(self.status, attempted))?;
        Ok(())
    }
}
