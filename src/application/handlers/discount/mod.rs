//! Discount query handlers.

mod validate_discount;

pub use validate_discount::{DiscountDecision, ValidateDiscountHandler, ValidateDiscountQuery};
