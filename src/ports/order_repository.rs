//! Order repository port.
//!
//! # Design
//!
//! - **Compare-and-swap updates**: a write names the status and payment id it
//!   read, so two concurrent notifications for one order can never both win
//! - **Never deletes**: orders only change status
//! - **Counts redemptions**: the discount validator asks for usage here
//!   instead of keeping a counter that could drift

use crate::domain::foundation::{DomainError, OrderId, UserId};
use crate::domain::order::{Order, OrderStatus};
use async_trait::async_trait;

/// Repository port for Order aggregate persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Find an order by id. Returns `None` if not found.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError>;

    /// Insert a newly created order.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure or duplicate id
    async fn insert(&self, order: &Order) -> Result<(), DomainError>;

    /// Persist `order` only if the stored status still equals `expected` and
    /// the stored payment id still equals `expected_payment_id`.
    ///
    /// A pending notification records a payment id without moving the
    /// status, so the status alone cannot detect that write.
    ///
    /// Returns `Ok(false)` when another writer got there first; the caller
    /// re-reads and decides again.
    async fn update_if_status(
        &self,
        order: &Order,
        expected: OrderStatus,
        expected_payment_id: Option<&str>,
    ) -> Result<bool, DomainError>;

    /// Count paid or completed orders that used `code`.
    ///
    /// With `user` set, only that user's orders are counted.
    async fn count_redemptions(
        &self,
        code: &str,
        user: Option<&UserId>,
    ) -> Result<u64, DomainError>;
}
