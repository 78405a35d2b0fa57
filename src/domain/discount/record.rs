//! Discount entity and the pure evaluation steps.
//!
//! Usage is never stored on the discount. Callers count redeemed orders and
//! hand the counts in, so each check below is a pure function.

use crate::domain::foundation::{DiscountId, Money, Timestamp, UserId};
use serde::{Deserialize, Serialize};

use super::{DiscountCode, RejectionReason};

/// How the discount reduces a cart total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DiscountValue {
    /// Percent of the cart total. Values above 100 are clamped by the cart total.
    Percentage(u32),

    /// Fixed amount in minor units of the cart's currency.
    Fixed(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountStatus {
    Active,
    Inactive,
}

impl DiscountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountStatus::Active => "active",
            DiscountStatus::Inactive => "inactive",
        }
    }
}

/// A promotion record. Read-mostly; created by operators or reward issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub id: DiscountId,
    pub code: DiscountCode,
    pub value: DiscountValue,
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,

    /// Cap on redeemed orders across all users.
    pub max_usage: Option<u32>,

    /// Cap on redeemed orders per user.
    pub max_usage_per_user: Option<u32>,

    /// Binds the code to one user, e.g. a reward-derived code.
    pub owner: Option<UserId>,

    pub status: DiscountStatus,
    pub created_at: Timestamp,
}

/// A successful evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscountQuote {
    pub code: DiscountCode,
    pub discount_amount: Money,

    /// Present for percentage discounts so callers can render "20% off".
    pub discount_percentage: Option<u32>,
}

impl Discount {
    pub fn is_active(&self) -> bool {
        self.status == DiscountStatus::Active
    }

    /// Start date in the future, then end date in the past.
    pub fn check_schedule(&self, now: Timestamp) -> Result<(), RejectionReason> {
        if let Some(starts_at) = self.starts_at {
            if starts_at.is_after(&now) {
                return Err(RejectionReason::NotYetActive);
            }
        }
        if let Some(ends_at) = self.ends_at {
            if ends_at.is_before(&now) {
                return Err(RejectionReason::Expired);
            }
        }
        Ok(())
    }

    pub fn check_global_usage(&self, redeemed: u64) -> Result<(), RejectionReason> {
        match self.max_usage {
            Some(max) if redeemed >= u64::from(max) => Err(RejectionReason::UsageLimitReached),
            _ => Ok(()),
        }
    }

    pub fn check_user_usage(&self, redeemed_by_user: u64) -> Result<(), RejectionReason> {
        match self.max_usage_per_user {
            Some(max) if redeemed_by_user >= u64::from(max) => Err(RejectionReason::AlreadyUsed),
            _ => Ok(()),
        }
    }

    pub fn check_owner(&self, requester: &UserId) -> Result<(), RejectionReason> {
        match &self.owner {
            Some(owner) if owner != requester => Err(RejectionReason::BelongsToAnotherUser),
            _ => Ok(()),
        }
    }

    /// Computes the discount for a cart total, capped at that total.
    ///
    /// Percentages floor to whole minor units.
    pub fn quote(&self, cart_total: &Money) -> DiscountQuote {
        let total = cart_total.minor_units();
        let (raw, percentage) = match self.value {
            DiscountValue::Percentage(pct) => {
                let amount = i128::from(total) * i128::from(pct) / 100;
                (i64::try_from(amount).unwrap_or(i64::MAX), Some(pct))
            }
            DiscountValue::Fixed(amount) => (amount.max(0), None),
        };
        let clamped = raw.min(total);

        DiscountQuote {
            code: self.code.clone(),
            discount_amount: Money::new(clamped, cart_total.currency().clone())
                .unwrap_or_else(|_| Money::zero(cart_total.currency().clone())),
            discount_percentage: percentage,
        }
    }

    /// Runs every step with pre-fetched usage counts.
    ///
    /// Same order and short-circuiting as the store-backed validator.
    pub fn evaluate(
        &self,
        requester: &UserId,
        cart_total: &Money,
        now: Timestamp,
        redeemed: u64,
        redeemed_by_user: u64,
    ) -> Result<DiscountQuote, RejectionReason> {
        if !self.is_active() {
            return Err(RejectionReason::InvalidCode);
        }
        self.check_schedule(now)?;
        self.check_global_usage(redeemed)?;
        self.check_user_usage(redeemed_by_user)?;
        self.check_owner(requester)?;
        Ok(self.quote(cart_total))
    }
}
