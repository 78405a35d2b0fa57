//! HTTP handlers for billing endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Json, Path, RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::application::handlers::{
    CancelOrderCommand, CancelOrderHandler, CancelSubscriptionHandler, CompleteOrderCommand,
    CompleteOrderHandler, CreateOrderCommand, CreateOrderHandler, GetOrderHandler, GetOrderQuery,
    GetSubscriptionHandler, GetSubscriptionQuery, HandlePaymentNotificationCommand,
    HandlePaymentNotificationHandler, PauseSubscriptionHandler, PollPaymentStatusCommand,
    PollPaymentStatusHandler, RefundOrderCommand, RefundOrderHandler, ResumeSubscriptionHandler,
    StartCheckoutCommand, StartCheckoutHandler, SubscriptionCommand, ValidateDiscountHandler,
    ValidateDiscountQuery,
};
use crate::domain::foundation::{
    Actor, BillingErrorKind, Currency, DomainError, ErrorCode, Money, OrderId, ProviderId,
    SubscriptionId, UserId, ValidationError,
};
use crate::domain::order::{LineItem, OrderError};
use crate::domain::subscription::SubscriptionError;
use crate::ports::{
    DiscountRepository, EventPublisher, GatewayLookup, NotificationPayload, OrderRepository,
    SubscriptionRepository,
};

use super::dto::{
    CheckoutRequest, CheckoutResponse, CreateOrderRequest, DiscountValidationResponse,
    ErrorResponse, OrderResponse, PollStatusResponse, ResumeSubscriptionResponse,
    SubscriptionResponse, ValidateDiscountRequest,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; every dependency is behind an `Arc`.
#[derive(Clone)]
pub struct BillingAppState {
    pub orders: Arc<dyn OrderRepository>,
    pub discounts: Arc<dyn DiscountRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub gateways: Arc<dyn GatewayLookup>,
    pub event_publisher: Arc<dyn EventPublisher>,
    pub status_check_timeout: Duration,
}

impl BillingAppState {
    pub fn create_order_handler(&self) -> CreateOrderHandler {
        CreateOrderHandler::new(
            self.orders.clone(),
            self.discounts.clone(),
            self.gateways.clone(),
            self.event_publisher.clone(),
        )
    }

    pub fn get_order_handler(&self) -> GetOrderHandler {
        GetOrderHandler::new(self.orders.clone())
    }

    pub fn start_checkout_handler(&self) -> StartCheckoutHandler {
        StartCheckoutHandler::new(
            self.orders.clone(),
            self.gateways.clone(),
            self.event_publisher.clone(),
        )
    }

    pub fn notification_handler(&self) -> HandlePaymentNotificationHandler {
        HandlePaymentNotificationHandler::new(
            self.orders.clone(),
            self.gateways.clone(),
            self.event_publisher.clone(),
        )
    }

    pub fn poll_handler(&self) -> PollPaymentStatusHandler {
        PollPaymentStatusHandler::new(
            self.orders.clone(),
            self.gateways.clone(),
            self.event_publisher.clone(),
            self.status_check_timeout,
        )
    }

    pub fn cancel_order_handler(&self) -> CancelOrderHandler {
        CancelOrderHandler::new(self.orders.clone(), self.event_publisher.clone())
    }

    pub fn complete_order_handler(&self) -> CompleteOrderHandler {
        CompleteOrderHandler::new(self.orders.clone(), self.event_publisher.clone())
    }

    pub fn refund_order_handler(&self) -> RefundOrderHandler {
        RefundOrderHandler::new(self.orders.clone(), self.event_publisher.clone())
    }

    pub fn validate_discount_handler(&self) -> ValidateDiscountHandler {
        ValidateDiscountHandler::new(self.discounts.clone(), self.orders.clone())
    }

    pub fn pause_subscription_handler(&self) -> PauseSubscriptionHandler {
        PauseSubscriptionHandler::new(self.subscriptions.clone(), self.event_publisher.clone())
    }

    pub fn resume_subscription_handler(&self) -> ResumeSubscriptionHandler {
        ResumeSubscriptionHandler::new(self.subscriptions.clone(), self.event_publisher.clone())
    }

    pub fn cancel_subscription_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(self.subscriptions.clone(), self.event_publisher.clone())
    }

    pub fn get_subscription_handler(&self) -> GetSubscriptionHandler {
        GetSubscriptionHandler::new(self.subscriptions.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Caller identity
// ════════════════════════════════════════════════════════════════════════════════

/// Caller identity set by the upstream gateway.
///
/// `X-User-Id` names the user; `X-User-Role: admin` grants administrative
/// capability.
#[derive(Debug, Clone)]
pub struct AuthenticatedActor(pub Actor);

/// Rejection type for AuthenticatedActor extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthenticatedActor
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| UserId::new(s).ok())
            .ok_or(AuthenticationRequired)?;
        let is_admin = parts
            .headers
            .get("X-User-Role")
            .and_then(|v| v.to_str().ok())
            .map(|role| role.eq_ignore_ascii_case("admin"))
            .unwrap_or(false);

        Ok(AuthenticatedActor(Actor { user_id, is_admin }))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Order endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/orders - Create an order for the caller
pub async fn create_order(
    State(state): State<BillingAppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let currency = Currency::new(&request.currency)?;
    let line_items = request
        .line_items
        .into_iter()
        .map(|item| {
            let price = Money::new(item.unit_price, currency.clone())?;
            LineItem::new(item.product_ref, item.quantity, price)
        })
        .collect::<Result<Vec<_>, OrderError>>()?;

    let cmd = CreateOrderCommand {
        user_id: actor.user_id,
        currency,
        line_items,
        payment_provider: ProviderId::new(request.payment_provider)?,
        discount_code: request.discount_code,
    };
    let result = state.create_order_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&result.order))))
}

/// GET /api/orders/:id
pub async fn get_order(
    State(state): State<BillingAppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(order_id): Path<OrderId>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .get_order_handler()
        .handle(GetOrderQuery { order_id, actor })
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /api/orders/:id/checkout - Issue the provider redirect
pub async fn start_checkout(
    State(state): State<BillingAppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(order_id): Path<OrderId>,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = StartCheckoutCommand {
        order_id,
        actor,
        description: request.description,
        customer_email: request.customer_email,
        success_url: request.success_url,
        fail_url: request.fail_url,
    };
    let result = state.start_checkout_handler().handle(cmd).await?;

    Ok(Json(CheckoutResponse {
        redirect_url: result.redirect_url,
        order: OrderResponse::from(&result.order),
    }))
}

/// POST /api/orders/:id/poll - Ask the provider when no notification came
pub async fn poll_payment_status(
    State(state): State<BillingAppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(order_id): Path<OrderId>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .poll_handler()
        .handle(PollPaymentStatusCommand { order_id, actor })
        .await?;
    Ok(Json(PollStatusResponse::new(&result.check, &result.order)))
}

/// POST /api/orders/:id/cancel
pub async fn cancel_order(
    State(state): State<BillingAppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(order_id): Path<OrderId>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .cancel_order_handler()
        .handle(CancelOrderCommand { order_id, actor })
        .await?;
    Ok(Json(OrderResponse::from(&result.order)))
}

/// POST /api/orders/:id/complete - Admin only
pub async fn complete_order(
    State(state): State<BillingAppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(order_id): Path<OrderId>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .complete_order_handler()
        .handle(CompleteOrderCommand { order_id, actor })
        .await?;
    Ok(Json(OrderResponse::from(&result.order)))
}

/// POST /api/orders/:id/refund - Admin only
pub async fn refund_order(
    State(state): State<BillingAppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(order_id): Path<OrderId>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .refund_order_handler()
        .handle(RefundOrderCommand { order_id, actor })
        .await?;
    Ok(Json(OrderResponse::from(&result.order)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Provider notifications (no caller identity, signature verified)
// ════════════════════════════════════════════════════════════════════════════════

/// GET|POST /api/payments/:provider/notify
///
/// The body is the provider's acknowledgement format. 200 means accepted;
/// 503 asks the provider to retry a transient failure; 400 otherwise.
pub async fn handle_notification(
    State(state): State<BillingAppState>,
    Path(provider): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let provider = ProviderId::new(provider).map_err(|e| {
        ApiError::new(ErrorCode::ConfigurationError, BillingErrorKind::Configuration, e.to_string())
    })?;

    let mut payload = NotificationPayload::new(body.to_vec());
    if let Some(query) = query {
        payload = payload.with_query(query);
    }
    for (name, value) in headers.iter() {
        if let Ok(value) = value.to_str() {
            payload = payload.with_header(name.as_str(), value);
        }
    }

    let reply = state
        .notification_handler()
        .handle(HandlePaymentNotificationCommand { provider, payload })
        .await?;

    let status = match &reply.outcome {
        Ok(_) => StatusCode::OK,
        Err(e) if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
        Err(_) => StatusCode::BAD_REQUEST,
    };
    Ok((
        status,
        [(header::CONTENT_TYPE, reply.response.content_type)],
        reply.response.body,
    )
        .into_response())
}

// ════════════════════════════════════════════════════════════════════════════════
// Discounts
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/discounts/validate
///
/// A rejected code is still a 200: the body says why.
pub async fn validate_discount(
    State(state): State<BillingAppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Json(request): Json<ValidateDiscountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cart_total = Money::new(request.cart_total, Currency::new(&request.currency)?)?;
    let decision = state
        .validate_discount_handler()
        .handle(ValidateDiscountQuery {
            code: request.code,
            user_id: actor.user_id,
            cart_total,
        })
        .await?;
    Ok(Json(DiscountValidationResponse::from(decision)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscriptions
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/subscriptions/:id
pub async fn get_subscription(
    State(state): State<BillingAppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(subscription_id): Path<SubscriptionId>,
) -> Result<impl IntoResponse, ApiError> {
    let subscription = state
        .get_subscription_handler()
        .handle(GetSubscriptionQuery {
            subscription_id,
            actor,
        })
        .await?;
    Ok(Json(SubscriptionResponse::from(&subscription)))
}

/// POST /api/subscriptions/:id/pause
pub async fn pause_subscription(
    State(state): State<BillingAppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(subscription_id): Path<SubscriptionId>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .pause_subscription_handler()
        .handle(SubscriptionCommand {
            subscription_id,
            actor,
        })
        .await?;
    Ok(Json(SubscriptionResponse::from(&result.subscription)))
}

/// POST /api/subscriptions/:id/resume
pub async fn resume_subscription(
    State(state): State<BillingAppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(subscription_id): Path<SubscriptionId>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .resume_subscription_handler()
        .handle(SubscriptionCommand {
            subscription_id,
            actor,
        })
        .await?;
    Ok(Json(ResumeSubscriptionResponse {
        next_payment_date: result.subscription.next_payment_date.to_rfc3339(),
        days_remaining: result.event.days_remaining,
        subscription: SubscriptionResponse::from(&result.subscription),
    }))
}

/// POST /api/subscriptions/:id/cancel
pub async fn cancel_subscription(
    State(state): State<BillingAppState>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(subscription_id): Path<SubscriptionId>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .cancel_subscription_handler()
        .handle(SubscriptionCommand {
            subscription_id,
            actor,
        })
        .await?;
    Ok(Json(SubscriptionResponse::from(&result.subscription)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    kind: BillingErrorKind,
    message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, kind: BillingErrorKind, message: impl Into<String>) -> Self {
        Self {
            code,
            kind,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code {
            ErrorCode::OrderNotFound
            | ErrorCode::DiscountNotFound
            | ErrorCode::SubscriptionNotFound => StatusCode::NOT_FOUND,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Unauthorized | ErrorCode::InvalidSignature => StatusCode::UNAUTHORIZED,
            ErrorCode::PaymentIdConflict => StatusCode::CONFLICT,
            _ => match self.kind {
                BillingErrorKind::Validation => StatusCode::BAD_REQUEST,
                BillingErrorKind::Authenticity => StatusCode::UNAUTHORIZED,
                BillingErrorKind::State => StatusCode::CONFLICT,
                BillingErrorKind::Configuration => StatusCode::UNPROCESSABLE_ENTITY,
                BillingErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        Self::new(err.code(), err.kind(), err.message())
    }
}

impl From<SubscriptionError> for ApiError {
    fn from(err: SubscriptionError) -> Self {
        Self::new(err.code(), err.kind(), err.message())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::new(err.code, err.kind(), err.message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::new(ErrorCode::ValidationFailed, BillingErrorKind::Validation, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = %self.code, message = %self.message, "request failed");
        }
        let body = ErrorResponse::new(self.code.to_string(), self.message);
        (status, Json(body)).into_response()
    }
}
