//! Subscription aggregate.
//!
//! Pausing keeps the original `next_payment_date` as a reference point.
//! Resuming re-applies the runway that was left at the moment of pausing:
//! a subscriber who paused ten days before a charge gets ten days again,
//! however long the pause lasted.

use crate::domain::foundation::{
    EventId, Money, StateMachine, SubscriptionId, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};

use super::events::{SubscriptionCanceled, SubscriptionPaused, SubscriptionResumed};
use super::{SubscriptionError, SubscriptionStatus};

/// Pause bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionMetadata {
    /// Set on pause, cleared on resume.
    pub paused_at: Option<Timestamp>,

    /// Set on resume.
    pub resumed_at: Option<Timestamp>,
}

/// A recurring-billing agreement.
///
/// # Invariants
///
/// - `metadata.paused_at.is_some()` iff `status == Paused`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_ref: String,
    pub status: SubscriptionStatus,
    pub next_payment_date: Timestamp,
    pub amount: Money,
    pub metadata: SubscriptionMetadata,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub canceled_at: Option<Timestamp>,
}

impl Subscription {
    /// Creates an active subscription due on `next_payment_date`.
    pub fn create(
        id: SubscriptionId,
        user_id: UserId,
        plan_ref: impl Into<String>,
        amount: Money,
        next_payment_date: Timestamp,
        now: Timestamp,
    ) -> Result<Self, SubscriptionError> {
        let plan_ref = plan_ref.into();
        if plan_ref.trim().is_empty() {
            return Err(SubscriptionError::validation("plan_ref", "cannot be empty"));
        }
        Ok(Self {
            id,
            user_id,
            plan_ref,
            status: SubscriptionStatus::Active,
            next_payment_date,
            amount,
            metadata: SubscriptionMetadata::default(),
            created_at: now,
            updated_at: now,
            canceled_at: None,
        })
    }

    /// active → paused. `next_payment_date` is left untouched.
    pub fn pause(&mut self, now: Timestamp) -> Result<SubscriptionPaused, SubscriptionError> {
        self.transition_to(SubscriptionStatus::Paused, "pause")?;
        self.metadata.paused_at = Some(now);
        self.updated_at = now;
        Ok(SubscriptionPaused {
            event_id: EventId::new(),
            subscription_id: self.id,
            user_id: self.user_id.clone(),
            next_payment_date: self.next_payment_date,
            paused_at: now,
        })
    }

    /// paused → active, shifting the next charge by the preserved runway.
    ///
    /// `days_remaining = max(0, whole days from paused_at to next_payment_date)`
    /// and the new date is `now + days_remaining`. Zero means due now.
    pub fn resume(&mut self, now: Timestamp) -> Result<SubscriptionResumed, SubscriptionError> {
        if self.status != SubscriptionStatus::Paused {
            return Err(SubscriptionError::invalid_state(self.status, "resume"));
        }
        let paused_at = self.metadata.paused_at.ok_or_else(|| {
            SubscriptionError::validation(
                "metadata.paused_at",
                "paused subscription has no pause timestamp",
            )
        })?;

        let days_remaining = self.next_payment_date.whole_days_since(&paused_at).max(0);

        self.transition_to(SubscriptionStatus::Active, "resume")?;
        self.next_payment_date = now.add_days(days_remaining);
        self.metadata.paused_at = None;
        self.metadata.resumed_at = Some(now);
        self.updated_at = now;

        Ok(SubscriptionResumed {
            event_id: EventId::new(),
            subscription_id: self.id,
            user_id: self.user_id.clone(),
            days_remaining,
            next_payment_date: self.next_payment_date,
            resumed_at: now,
        })
    }

    /// active or paused → canceled.
    pub fn cancel(&mut self, now: Timestamp) -> Result<SubscriptionCanceled, SubscriptionError> {
        self.transition_to(SubscriptionStatus::Canceled, "cancel")?;
        self.metadata.paused_at = None;
        self.canceled_at = Some(now);
        self.updated_at = now;
        Ok(SubscriptionCanceled {
            event_id: EventId::new(),
            subscription_id: self.id,
            user_id: self.user_id.clone(),
            canceled_at: now,
        })
    }

    fn transition_to(
        &mut self,
        target: SubscriptionStatus,
        attempted: &'static str,
    ) -> Result<(), SubscriptionError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|_| SubscriptionError::invalid_state(self.status, attempted))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Currency;
    use chrono::{TimeZone, Utc};

    fn t0() -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())
    }

    fn subscription(next_payment_date: Timestamp) -> Subscription {
        Subscription::create(
            SubscriptionId::new(),
            UserId::new("user-1").unwrap(),
            "plan-monthly",
            Money::new(990, Currency::new("USD").unwrap()).unwrap(),
            next_payment_date,
            t0().add_days(-20),
        )
        .unwrap()
    }

    #[test]
    fn pause_keeps_next_payment_date() {
        let mut sub = subscription(t0().add_days(10));
        let event = sub.pause(t0()).unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Paused);
        assert_eq!(sub.next_payment_date, t0().add_days(10));
        assert_eq!(sub.metadata.paused_at, Some(t0()));
        assert_eq!(event.next_payment_date, t0().add_days(10));
    }

    #[test]
    fn resume_after_long_pause_restores_ten_days_of_runway() {
        let mut sub = subscription(t0().add_days(10));
        sub.pause(t0()).unwrap();

        let resumed_at = t0().add_days(100);
        let event = sub.resume(resumed_at).unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert_eq!(sub.next_payment_date, resumed_at.add_days(10));
        assert_ne!(sub.next_payment_date, t0().add_days(10));
        assert_eq!(sub.metadata.paused_at, None);
        assert_eq!(sub.metadata.resumed_at, Some(resumed_at));
        assert_eq!(event.days_remaining, 10);
    }

    #[test]
    fn resume_floors_partial_days() {
        let next = t0().add_days(3).plus_secs(60 * 60 * 23);
        let mut sub = subscription(next);
        sub.pause(t0()).unwrap();

        let event = sub.resume(t0().add_days(5)).unwrap();

        assert_eq!(event.days_remaining, 3);
        assert_eq!(sub.next_payment_date, t0().add_days(8));
    }

    #[test]
    fn overdue_at_pause_means_due_immediately_on_resume() {
        let mut sub = subscription(t0().add_days(-2));
        sub.pause(t0()).unwrap();

        let resumed_at = t0().add_days(30);
        sub.resume(resumed_at).unwrap();

        assert_eq!(sub.next_payment_date, resumed_at);
    }

    #[test]
    fn resume_requires_paused() {
        let mut sub = subscription(t0().add_days(10));
        let before = sub.clone();

        let err = sub.resume(t0()).unwrap_err();

        assert_eq!(
            err,
            SubscriptionError::invalid_state(SubscriptionStatus::Active, "resume")
        );
        assert_eq!(sub, before);
    }

    #[test]
    fn pause_requires_active() {
        let mut sub = subscription(t0().add_days(10));
        sub.pause(t0()).unwrap();
        assert_eq!(
            sub.pause(t0()),
            Err(SubscriptionError::invalid_state(SubscriptionStatus::Paused, "pause"))
        );

        sub.cancel(t0()).unwrap();
        assert_eq!(
            sub.pause(t0()),
            Err(SubscriptionError::invalid_state(SubscriptionStatus::Canceled, "pause"))
        );
    }

    #[test]
    fn cancel_from_paused_clears_pause_marker() {
        let mut sub = subscription(t0().add_days(10));
        sub.pause(t0()).unwrap();
        sub.cancel(t0().add_days(1)).unwrap();

        assert_eq!(sub.status, SubscriptionStatus::Canceled);
        assert_eq!(sub.metadata.paused_at, None);
        assert_eq!(sub.canceled_at, Some(t0().add_days(1)));
        assert!(sub.resume(t0()).is_err());
    }

    #[test]
    fn create_rejects_blank_plan() {
        let result = Subscription::create(
            SubscriptionId::new(),
            UserId::new("u").unwrap(),
            " ",
            Money::zero(Currency::new("USD").unwrap()),
            t0(),
            t0(),
        );
        assert!(matches!(result, Err(SubscriptionError::ValidationFailed { .. })));
    }
}
