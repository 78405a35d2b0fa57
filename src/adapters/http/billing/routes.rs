//! Axum router configuration for billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    cancel_order, cancel_subscription, complete_order, create_order, get_order,
    get_subscription, handle_notification, pause_subscription, poll_payment_status,
    refund_order, resume_subscription, start_checkout, validate_discount, BillingAppState,
};

/// Order routes, mounted at `/orders`.
///
/// # Routes
///
/// - `POST /` - Create an order
/// - `GET /:id` - Get an order (owner or admin)
/// - `POST /:id/checkout` - Issue the provider redirect
/// - `POST /:id/poll` - Poll the provider for the payment status
/// - `POST /:id/cancel` - Cancel before payment (owner or admin)
/// - `POST /:id/complete` - Mark fulfilled (admin)
/// - `POST /:id/refund` - Record a refund (admin)
pub fn order_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/:id", get(get_order))
        .route("/:id/checkout", post(start_checkout))
        .route("/:id/poll", post(poll_payment_status))
        .route("/:id/cancel", post(cancel_order))
        .route("/:id/complete", post(complete_order))
        .route("/:id/refund", post(refund_order))
}

/// Provider notification routes, mounted at `/payments`.
///
/// These carry no caller identity; the gateway verifies the signature.
/// Some providers deliver by GET with a query string.
pub fn payment_routes() -> Router<BillingAppState> {
    Router::new().route(
        "/:provider/notify",
        post(handle_notification).get(handle_notification),
    )
}

pub fn discount_routes() -> Router<BillingAppState> {
    Router::new().route("/validate", post(validate_discount))
}

pub fn subscription_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/:id", get(get_subscription))
        .route("/:id/pause", post(pause_subscription))
        .route("/:id/resume", post(resume_subscription))
        .route("/:id/cancel", post(cancel_subscription))
}

/// The complete billing router, suitable for mounting at `/api`.
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .nest("/api", billing_router())
///     .with_state(app_state);
/// ```
pub fn billing_router() -> Router<BillingAppState> {
    Router::new()
        .nest("/orders", order_routes())
        .nest("/payments", payment_routes())
        .nest("/discounts", discount_routes())
        .nest("/subscriptions", subscription_routes())
}
