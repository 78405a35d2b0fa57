//! In-memory store adapters for tests and database-less development.
//!
//! Semantics match the Postgres adapters, including the status
//! compare-and-swap.

mod discount_repository;
mod order_repository;
mod subscription_repository;

pub use discount_repository::InMemoryDiscountRepository;
pub use order_repository::InMemoryOrderRepository;
pub use subscription_repository::InMemorySubscriptionRepository;
