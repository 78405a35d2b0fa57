//! HTTP adapter for billing endpoints.
//!
//! - `POST /api/orders`, `GET /api/orders/:id`
//! - `POST /api/orders/:id/{checkout,poll,cancel,complete,refund}`
//! - `GET|POST /api/payments/:provider/notify`
//! - `POST /api/discounts/validate`
//! - `GET /api/subscriptions/:id`
//! - `POST /api/subscriptions/:id/{pause,resume,cancel}`

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{ApiError, AuthenticatedActor, BillingAppState};
pub use routes::billing_router;
