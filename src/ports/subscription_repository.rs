//! Subscription repository port.

use crate::domain::foundation::{DomainError, SubscriptionId};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use async_trait::async_trait;

/// Repository port for Subscription aggregate persistence.
///
/// Uses the same status compare-and-swap as orders, so a pause racing a
/// cancel leaves exactly one of them applied.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by id. Returns `None` if not found.
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError>;

    /// Insert a new subscription.
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Persist only if the stored status still equals `expected`.
    async fn update_if_status(
        &self,
        subscription: &Subscription,
        expected: SubscriptionStatus,
    ) -> Result<bool, DomainError>;
}
