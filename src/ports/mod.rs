//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Store Ports
//!
//! - `OrderRepository` - Order persistence with status compare-and-swap
//! - `DiscountRepository` - Discount lookup by code
//! - `SubscriptionRepository` - Subscription persistence
//!
//! ## Provider Ports
//!
//! - `PaymentGateway` - Redirects, notifications and status polling per provider
//! - `GatewayLookup` - Provider id to gateway resolution
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Port for publishing domain events

mod discount_repository;
mod event_publisher;
mod order_repository;
mod payment_gateway;
mod subscription_repository;

pub use discount_repository::DiscountRepository;
pub use event_publisher::EventPublisher;
pub use order_repository::OrderRepository;
pub use payment_gateway::{
    GatewayError, GatewayLookup, GatewayResponse, NotificationPayload, PaymentGateway,
    PaymentStatusCheck, RedirectRequest,
};
pub use subscription_repository::SubscriptionRepository;
