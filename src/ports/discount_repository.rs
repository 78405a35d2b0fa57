//! Discount repository port (read side).

use crate::domain::discount::{Discount, DiscountCode};
use crate::domain::foundation::DomainError;
use async_trait::async_trait;

/// Lookup of discount records by their public code.
#[async_trait]
pub trait DiscountRepository: Send + Sync {
    /// Find a discount by code, whatever its status.
    ///
    /// Returns `None` if no record carries this code.
    async fn find_by_code(&self, code: &DiscountCode) -> Result<Option<Discount>, DomainError>;
}
