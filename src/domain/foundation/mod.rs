//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types
//! that form the vocabulary of the billing domain.

mod authorization;
mod errors;
mod events;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use authorization::Actor;
pub use errors::{BillingErrorKind, DomainError, ErrorCode, ValidationError};
pub use events::{
    domain_event, DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent,
};
pub use ids::{DiscountId, OrderId, ProviderId, SubscriptionId, UserId};
pub use money::{Currency, Money};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
