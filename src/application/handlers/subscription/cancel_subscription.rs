//! CancelSubscriptionHandler - Command handler for ending a subscription.

use std::sync::Arc;

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::events::SubscriptionCanceled;
use crate::domain::subscription::SubscriptionError;
use crate::ports::{EventPublisher, SubscriptionRepository};

use super::super::publish_event;
use super::{scheduler, SubscriptionCommand, SubscriptionTransitionResult};

pub struct CancelSubscriptionHandler {
    repository: Arc<dyn SubscriptionRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl CancelSubscriptionHandler {
    pub fn new(
        repository: Arc<dyn SubscriptionRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: SubscriptionCommand,
    ) -> Result<SubscriptionTransitionResult<SubscriptionCanceled>, SubscriptionError> {
        let (subscription, event) = scheduler::transition(
            self.repository.as_ref(),
            cmd.subscription_id,
            &cmd.actor,
            |subscription| subscription.cancel(Timestamp::now()),
        )
        .await?;

        tracing::info!(subscription_id = %subscription.id, "subscription canceled");
        publish_event(self.event_publisher.as_ref(), &event, &cmd.actor.user_id).await;

        Ok(SubscriptionTransitionResult {
            subscription,
            event,
        })
    }
}
