//! Subscription scheduler domain module.
//!
//! Lifecycle transitions for recurring-billing agreements, including the
//! proportional recomputation of the next charge date on resume.

mod aggregate;
mod errors;
pub mod events;
mod status;

pub use aggregate::{Subscription, SubscriptionMetadata};
pub use errors::SubscriptionError;
pub use status::SubscriptionStatus;
