//! Order ledger domain module.
//!
//! Drives an order through its payment lifecycle and decides how a
//! verified provider notification changes it.
//!
//! # Module Structure
//!
//! - `aggregate` - Order aggregate, line items and notification effects
//! - `status` - OrderStatus state machine
//! - `notification` - Provider-agnostic payment notification
//! - `events` - Order domain events
//! - `errors` - OrderError taxonomy

mod aggregate;
mod errors;
pub mod events;
mod notification;
mod status;

pub use aggregate::{AppliedDiscount, LineItem, NotificationEffect, Order};
pub use errors::OrderError;
pub use events::{
    CheckoutStarted, OrderCancelled, OrderCompleted, OrderCreated, OrderPaid, OrderPaymentFailed,
    OrderRefunded,
};
pub use notification::{PaymentNotification, PaymentOutcome};
pub use status::OrderStatus;
