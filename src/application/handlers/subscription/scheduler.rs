//! Subscription write path shared by the subscription handlers.

use crate::domain::foundation::{Actor, SubscriptionId};
use crate::domain::subscription::{Subscription, SubscriptionError};
use crate::ports::SubscriptionRepository;

const MAX_CAS_ATTEMPTS: usize = 3;

/// Loads the subscription, checks `actor` may manage it, applies `change`
/// and writes it back if the stored status is still the one `change` saw.
pub(crate) async fn transition<T, F>(
    repository: &dyn SubscriptionRepository,
    subscription_id: SubscriptionId,
    actor: &Actor,
    mut change: F,
) -> Result<(Subscription, T), SubscriptionError>
where
    T: Send,
    F: FnMut(&mut Subscription) -> Result<T, SubscriptionError> + Send,
{
    for attempt in 1..=MAX_CAS_ATTEMPTS {
        let mut subscription = repository
            .find_by_id(&subscription_id)
            .await?
            .ok_or(SubscriptionError::NotFound(subscription_id))?;
        actor.ensure_owner_or_admin(
            &subscription.user_id,
            "subscription",
            subscription_id.to_string(),
        )?;

        let expected = subscription.status;
        let outcome = change(&mut subscription)?;

        if repository.update_if_status(&subscription, expected).await? {
            return Ok((subscription, outcome));
        }
        tracing::debug!(%subscription_id, attempt, "subscription changed concurrently, reloading");
    }
    Err(SubscriptionError::Infrastructure(format!(
        "subscription {} is being modified concurrently, retry later",
        subscription_id
    )))
}
