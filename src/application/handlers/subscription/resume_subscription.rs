//! ResumeSubscriptionHandler - Command handler for resuming billing.

use std::sync::Arc;

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::events::SubscriptionResumed;
use crate::domain::subscription::SubscriptionError;
use crate::ports::{EventPublisher, SubscriptionRepository};

use super::super::publish_event;
use super::{scheduler, SubscriptionCommand, SubscriptionTransitionResult};

/// Handler for resuming subscriptions. Owner or administrator.
///
/// The new `next_payment_date` is now plus the whole days that were left
/// when the subscription was paused.
pub struct ResumeSubscriptionHandler {
    repository: Arc<dyn SubscriptionRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl ResumeSubscriptionHandler {
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
    ) -> Result<SubscriptionTransitionResult<SubscriptionResumed>, SubscriptionError> {
        let (subscription, event) = scheduler::transition(
            self.repository.as_ref(),
            cmd.subscription_id,
            &cmd.actor,
            |subscription| subscription.resume(Timestamp::now()),
        )
        .await?;

        tracing::info!(
            subscription_id = %subscription.id,
            days_remaining = event.days_remaining,
            next_payment_date = %subscription.next_payment_date,
            "subscription resumed"
        );
        publish_event(self.event_publisher.as_ref(), &event, &cmd.actor.user_id).await;

        Ok(SubscriptionTransitionResult {
            subscription,
            event,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::subscription::tests::{active_subscription, command};
    use crate::application::handlers::test_support::{admin, owner, Harness};
    use crate::domain::foundation::BillingErrorKind;
    use crate::domain::subscription::SubscriptionStatus;

    fn handler(h: &Harness) -> ResumeSubscriptionHandler {
        ResumeSubscriptionHandler::new(h.subscriptions.clone(), h.events.clone())
    }

    #[tokio::test]
    async fn resume_restores_remaining_runway() {
        let h = Harness::new();
        let mut sub = active_subscription(10);
        // Paused 100 days ago with ten days of runway left.
        let paused_at = Timestamp::now().add_days(-100);
        sub.next_payment_date = paused_at.add_days(10);
        sub.pause(paused_at).unwrap();
        h.subscriptions.insert(&sub).await.unwrap();

        let before = Timestamp::now();
        let result = handler(&h).handle(command(&sub, owner())).await.unwrap();

        assert_eq!(result.subscription.status, SubscriptionStatus::Active);
        assert_eq!(result.event.days_remaining, 10);
        assert_eq!(
            result.subscription.next_payment_date.whole_days_since(&before),
            10
        );
        assert!(result.subscription.metadata.paused_at.is_none());
        assert!(result.subscription.metadata.resumed_at.is_some());
        assert!(h.events.has_event("subscription.resumed.v1"));
    }

    #[tokio::test]
    async fn resuming_active_subscription_is_a_state_error() {
        let h = Harness::new();
        let sub = active_subscription(10);
        h.subscriptions.insert(&sub).await.unwrap();

        let err = handler(&h).handle(command(&sub, admin())).await.unwrap_err();
        assert_eq!(err.kind(), BillingErrorKind::State);
        assert!(err.message().contains("active"));
    }

    #[tokio::test]
    async fn resume_is_reported_even_when_publishing_fails() {
        let h = Harness::new();
        let mut sub = active_subscription(10);
        sub.pause(Timestamp::now()).unwrap();
        h.subscriptions.insert(&sub).await.unwrap();
        h.events.set_failing(true);

        let result = handler(&h).handle(command(&sub, owner())).await.unwrap();

        assert_eq!(result.subscription.status, SubscriptionStatus::Active);
        let stored = h.subscriptions.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Active);
        assert_eq!(h.events.event_count(), 0);
    }
}
