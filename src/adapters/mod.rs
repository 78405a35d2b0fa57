//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `events` - Event publishers (in-memory, tracing)
//! - `gateways` - Robokassa, Unitpay and CoinPayments clients
//! - `http` - Axum routes and handlers
//! - `memory` - In-memory repositories for tests and database-less runs
//! - `postgres` - PostgreSQL repositories

pub mod events;
pub mod gateways;
pub mod http;
pub mod memory;
pub mod postgres;

pub use events::{InMemoryEventBus, TracingEventPublisher};
pub use gateways::GatewayRegistry;
