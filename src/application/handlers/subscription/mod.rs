//! Subscription command and query handlers.

mod cancel_subscription;
mod get_subscription;
mod pause_subscription;
mod resume_subscription;
mod scheduler;

use crate::domain::foundation::{Actor, SubscriptionId};
use crate::domain::subscription::Subscription;

pub use cancel_subscription::CancelSubscriptionHandler;
pub use get_subscription::{GetSubscriptionHandler, GetSubscriptionQuery};
pub use pause_subscription::PauseSubscriptionHandler;
pub use resume_subscription::ResumeSubscriptionHandler;

/// Pause, resume and cancel all take the same input.
#[derive(Debug, Clone)]
pub struct SubscriptionCommand {
    pub subscription_id: SubscriptionId,
    pub actor: Actor,
}

/// Subscription after a transition, with the event it produced.
#[derive(Debug, Clone)]
pub struct SubscriptionTransitionResult<E> {
    pub subscription: Subscription,
    pub event: E,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::application::handlers::test_support::{usd, user};
    use crate::domain::foundation::Timestamp;

    /// Active subscription owned by `user-1`, due in `days`.
    pub(crate) fn active_subscription(days: i64) -> Subscription {
        let now = Timestamp::now();
        Subscription::create(
            SubscriptionId::new(),
            user("user-1"),
            "pro-monthly",
            usd(990),
            now.add_days(days),
            now,
        )
        .unwrap()
    }

    pub(crate) fn command(subscription: &Subscription, actor: Actor) -> SubscriptionCommand {
        SubscriptionCommand {
            subscription_id: subscription.id,
            actor,
        }
    }
}
