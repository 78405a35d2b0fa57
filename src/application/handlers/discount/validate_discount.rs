//! ValidateDiscountHandler - Query handler for checking a discount code.

use std::sync::Arc;

use crate::domain::discount::{DiscountCode, DiscountQuote, RejectionReason};
use crate::domain::foundation::{DomainError, Money, Timestamp, UserId};
use crate::ports::{DiscountRepository, OrderRepository};

/// Query to check a code against a cart.
#[derive(Debug, Clone)]
pub struct ValidateDiscountQuery {
    pub code: String,
    pub user_id: UserId,
    pub cart_total: Money,
}

/// Either a bounded discount or the first reason it does not apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscountDecision {
    Applied(DiscountQuote),
    Rejected(RejectionReason),
}

impl DiscountDecision {
    pub fn is_valid(&self) -> bool {
        matches!(self, DiscountDecision::Applied(_))
    }
}

/// Handler for discount validation.
///
/// Usage is derived from order history, never from a stored counter: a
/// redemption is an order in `paid` or `completed` that references the
/// code. Counts are only queried when the discount sets the matching limit.
pub struct ValidateDiscountHandler {
    discounts: Arc<dyn DiscountRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl ValidateDiscountHandler {
    pub fn new(discounts: Arc<dyn DiscountRepository>, orders: Arc<dyn OrderRepository>) -> Self {
        Self { discounts, orders }
    }

    /// # Errors
    ///
    /// Only store failures. Every business outcome is a `DiscountDecision`.
    pub async fn handle(&self, query: ValidateDiscountQuery) -> Result<DiscountDecision, DomainError> {
        let Ok(code) = DiscountCode::try_new(&query.code) else {
            return Ok(DiscountDecision::Rejected(RejectionReason::InvalidCode));
        };

        let discount = match self.discounts.find_by_code(&code).await? {
            Some(discount) if discount.is_active() => discount,
            _ => return Ok(DiscountDecision::Rejected(RejectionReason::InvalidCode)),
        };

        let redeemed = match discount.max_usage {
            Some(_) => self.orders.count_redemptions(code.as_str(), None).await?,
            None => 0,
        };
        let redeemed_by_user = match discount.max_usage_per_user {
            Some(_) => {
                self.orders
                    .count_redemptions(code.as_str(), Some(&query.user_id))
                    .await?
            }
            None => 0,
        };

        let decision = match discount.evaluate(
            &query.user_id,
            &query.cart_total,
            Timestamp::now(),
            redeemed,
            redeemed_by_user,
        ) {
            Ok(quote) => DiscountDecision::Applied(quote),
            Err(reason) => {
                tracing::debug!(
                    code = %code,
                    user_id = %query.user_id,
                    reason = reason.code(),
                    "discount rejected"
                );
                DiscountDecision::Rejected(reason)
            }
        };
        Ok(decision)
    }
}
