//! Order ledger error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | Kind | HTTP Status |
//! |-------|------|-------------|
//! | NotFound | Validation | 404 |
//! | ValidationFailed | Validation | 400 |
//! | AmountMismatch | Validation | 422 |
//! | InvalidSignature | Authenticity | 401 |
//! | PaymentIdConflict | Authenticity | 409 |
//! | InvalidState | State | 409 |
//! | Forbidden | Validation | 403 |
//! | Configuration | Configuration | 500 |
//! | Infrastructure | Transient | 503 |

use crate::domain::foundation::{
    BillingErrorKind, DomainError, ErrorCode, Money, OrderId, ProviderId, ValidationError,
};

use super::OrderStatus;

/// Order-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// No order with this id.
    NotFound(OrderId),

    /// Malformed input (line items, notification fields).
    ValidationFailed { field: String, message: String },

    /// Notification amount or currency differs from the recorded total.
    AmountMismatch { expected: Money, received: Money },

    /// Notification signature did not verify.
    InvalidSignature { provider: ProviderId },

    /// Notification carries a different provider payment id than the one on record.
    PaymentIdConflict {
        order_id: OrderId,
        recorded: String,
        received: String,
    },

    /// Operation not allowed in the current status.
    InvalidState {
        current: OrderStatus,
        attempted: &'static str,
    },

    /// Caller may not act on this order.
    Forbidden(String),

    /// Unknown provider or missing credentials.
    Configuration(String),

    /// Store or provider unavailable.
    Infrastructure(String),
}

impl OrderError {
    pub fn not_found(id: OrderId) -> Self {
        OrderError::NotFound(id)
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        OrderError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_state(current: OrderStatus, attempted: &'static str) -> Self {
        OrderError::InvalidState { current, attempted }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        OrderError::Configuration(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        OrderError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            OrderError::NotFound(_) => ErrorCode::OrderNotFound,
            OrderError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            OrderError::AmountMismatch { .. } => ErrorCode::AmountMismatch,
            OrderError::InvalidSignature { .. } => ErrorCode::InvalidSignature,
            OrderError::PaymentIdConflict { .. } => ErrorCode::PaymentIdConflict,
            OrderError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            OrderError::Forbidden(_) => ErrorCode::Forbidden,
            OrderError::Configuration(_) => ErrorCode::ConfigurationError,
            OrderError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn kind(&self) -> BillingErrorKind {
        match self {
            OrderError::NotFound(_)
            | OrderError::ValidationFailed { .. }
            | OrderError::AmountMismatch { .. }
            | OrderError::Forbidden(_) => BillingErrorKind::Validation,
            OrderError::InvalidSignature { .. } | OrderError::PaymentIdConflict { .. } => {
                BillingErrorKind::Authenticity
            }
            OrderError::InvalidState { .. } => BillingErrorKind::State,
            OrderError::Configuration(_) => BillingErrorKind::Configuration,
            OrderError::Infrastructure(_) => BillingErrorKind::Transient,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            OrderError::NotFound(id) => format!("Order not found: {}", id),
            OrderError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            OrderError::AmountMismatch { expected, received } => format!(
                "Amount mismatch: order total is {}, notification claims {}",
                expected, received
            ),
            OrderError::InvalidSignature { provider } => {
                format!("Invalid {} notification signature", provider)
            }
            OrderError::PaymentIdConflict {
                order_id,
                recorded,
                received,
            } => format!(
                "Order {} already has payment id '{}', notification carries '{}'",
                order_id, recorded, received
            ),
            OrderError::InvalidState { current, attempted } => {
                format!("Cannot {} order in {} state", attempted, current)
            }
            OrderError::Forbidden(msg) => msg.clone(),
            OrderError::Configuration(msg) => format!("Configuration error: {}", msg),
            OrderError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl std::fmt::Display for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for OrderError {}

impl From<DomainError> for OrderError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::Forbidden | ErrorCode::Unauthorized => OrderError::Forbidden(err.message),
            ErrorCode::ConfigurationError => OrderError::Configuration(err.message),
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => OrderError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "request".to_string()),
                message: err.message,
            },
            _ => OrderError::Infrastructure(err.to_string()),
        }
    }
}

impl From<ValidationError> for OrderError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::EmptyField { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field.clone(),
        };
        OrderError::ValidationFailed {
            field,
            message: err.to_string(),
        }
    }
}

impl From<OrderError> for DomainError {
    fn from(err: OrderError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
