//! Discount domain module.
//!
//! Evaluates a discount record against a cart total, a requesting user and
//! the current time, producing either a bounded amount or a rejection reason.
//!
//! # Evaluation order
//!
//! 1. lookup (case-insensitive, active only)
//! 2. start date
//! 3. end date
//! 4. global usage
//! 5. per-user usage
//! 6. ownership
//! 7. raw amount, then clamp to the cart total

mod code;
mod record;
mod rejection;

pub use code::DiscountCode;
pub use record::{Discount, DiscountQuote, DiscountStatus, DiscountValue};
pub use rejection::RejectionReason;
