//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i64, max: i64, actual: i64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Broad failure categories shared by every billing component.
///
/// Callers branch on the kind, never on message text:
///
/// | Kind | Retry | Effect on stored state |
/// |------|-------|------------------------|
/// | Configuration | never | none, surfaced immediately |
/// | Validation | no | unchanged |
/// | Authenticity | no | unchanged, logged as security event |
/// | State | no | unchanged, current state reported |
/// | Transient | yes, with backoff | unchanged |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BillingErrorKind {
    Configuration,
    Validation,
    Authenticity,
    State,
    Transient,
}

impl BillingErrorKind {
    /// Whether a caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BillingErrorKind::Transient)
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    EmptyField,
    OutOfRange,
    InvalidFormat,
    AmountMismatch,

    // Not found errors
    OrderNotFound,
    DiscountNotFound,
    SubscriptionNotFound,

    // State errors
    InvalidStateTransition,
    ConcurrentModification,

    // Authorization and authenticity errors
    Unauthorized,
    Forbidden,
    InvalidSignature,
    PaymentIdConflict,

    // Configuration errors
    ConfigurationError,

    // Infrastructure errors
    DatabaseError,
    ProviderUnavailable,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::EmptyField => "EMPTY_FIELD",
            ErrorCode::OutOfRange => "OUT_OF_RANGE",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::AmountMismatch => "AMOUNT_MISMATCH",
            ErrorCode::OrderNotFound => "ORDER_NOT_FOUND",
            ErrorCode::DiscountNotFound => "DISCOUNT_NOT_FOUND",
            ErrorCode::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::ConcurrentModification => "CONCURRENT_MODIFICATION",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::PaymentIdConflict => "PAYMENT_ID_CONFLICT",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
///
/// Ports return this for infrastructure failures; component errors wrap it.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
            details: HashMap::new(),
        }
        .with_detail("field", field.into())
    }

    /// Creates a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Maps the code onto the shared failure taxonomy.
    pub fn kind(&self) -> BillingErrorKind {
        match self.code {
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat
            | ErrorCode::AmountMismatch
            | ErrorCode::OrderNotFound
            | ErrorCode::DiscountNotFound
            | ErrorCode::SubscriptionNotFound
            | ErrorCode::Unauthorized
            | ErrorCode::Forbidden => BillingErrorKind::Validation,
            ErrorCode::InvalidSignature | ErrorCode::PaymentIdConflict => {
                BillingErrorKind::Authenticity
            }
            ErrorCode::ConfigurationError => BillingErrorKind::Configuration,
            ErrorCode::InvalidStateTransition => BillingErrorKind::State,
            ErrorCode::ConcurrentModification
            | ErrorCode::DatabaseError
            | ErrorCode::ProviderUnavailable
            | ErrorCode::InternalError => BillingErrorKind::Transient,
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}
