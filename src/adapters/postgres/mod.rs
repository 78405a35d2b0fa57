//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresOrderRepository` - Order ledger with status compare-and-swap
//! - `PostgresDiscountRepository` - Case-insensitive discount lookup
//! - `PostgresSubscriptionRepository` - Subscription lifecycle storage
//!
//! Schema lives in `migrations/`.

mod discount_repository;
mod order_repository;
mod subscription_repository;

pub use discount_repository::PostgresDiscountRepository;
pub use order_repository::PostgresOrderRepository;
pub use subscription_repository::PostgresSubscriptionRepository;
