//! PauseSubscriptionHandler - Command handler for pausing billing.

use std::sync::Arc;

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::events::SubscriptionPaused;
use crate::domain::subscription::SubscriptionError;
use crate::ports::{EventPublisher, SubscriptionRepository};

use super::super::publish_event;
use super::{scheduler, SubscriptionCommand, SubscriptionTransitionResult};

/// Handler for pausing subscriptions. Owner or administrator.
pub struct PauseSubscriptionHandler {
    repository: Arc<dyn SubscriptionRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl PauseSubscriptionHandler {
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
    ) -> Result<SubscriptionTransitionResult<SubscriptionPaused>, SubscriptionError> {
        let (subscription, event) = scheduler::transition(
            self.repository.as_ref(),
            cmd.subscription_id,
            &cmd.actor,
            |subscription| subscription.pause(Timestamp::now()),
        )
        .await?;

        tracing::info!(
            subscription_id = %subscription.id,
            next_payment_date = %subscription.next_payment_date,
            "subscription paused"
        );
        publish_event(self.event_publisher.as_ref(), &event, &cmd.actor.user_id).await;

        Ok(SubscriptionTransitionResult {
            subscription,
            event,
        })
    }
}
