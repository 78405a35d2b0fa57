//! GetSubscriptionHandler - Query handler for a single subscription.

use std::sync::Arc;

use crate::domain::foundation::{Actor, SubscriptionId};
use crate::domain::subscription::{Subscription, SubscriptionError};
use crate::ports::SubscriptionRepository;

#[derive(Debug, Clone)]
pub struct GetSubscriptionQuery {
    pub subscription_id: SubscriptionId,
    pub actor: Actor,
}

pub struct GetSubscriptionHandler {
    repository: Arc<dyn SubscriptionRepository>,
}

impl GetSubscriptionHandler {
    pub fn new(repository: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, query: GetSubscriptionQuery) -> Result<Subscription, SubscriptionError> {
        let subscription = self
            .repository
            .find_by_id(&query.subscription_id)
            .await?
            .ok_or(SubscriptionError::NotFound(query.subscription_id))?;
        query.actor.ensure_owner_or_admin(
            &subscription.user_id,
            "subscription",
            subscription.id.to_string(),
        )?;
        Ok(subscription)
    }
}
