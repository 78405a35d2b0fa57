//! Subscription error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | NotFound | 404 |
//! | InvalidState | 409 |
//! | Forbidden | 403 |
//! | ValidationFailed | 400 |
//! | Infrastructure | 503 |

use crate::domain::foundation::{
    BillingErrorKind, DomainError, ErrorCode, SubscriptionId,
};

use super::SubscriptionStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    NotFound(SubscriptionId),

    /// The operation does not apply to the current status.
    InvalidState {
        current: SubscriptionStatus,
        attempted: &'static str,
    },

    Forbidden(String),

    ValidationFailed { field: String, message: String },

    Infrastructure(String),
}

impl SubscriptionError {
    pub fn invalid_state(current: SubscriptionStatus, attempted: &'static str) -> Self {
        SubscriptionError::InvalidState { current, attempted }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SubscriptionError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            SubscriptionError::NotFound(_) => ErrorCode::SubscriptionNotFound,
            SubscriptionError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            SubscriptionError::Forbidden(_) => ErrorCode::Forbidden,
            SubscriptionError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            SubscriptionError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn kind(&self) -> BillingErrorKind {
        match self {
            SubscriptionError::InvalidState { .. } => BillingErrorKind::State,
            SubscriptionError::Infrastructure(_) => BillingErrorKind::Transient,
            _ => BillingErrorKind::Validation,
        }
    }

    pub fn message(&self) -> String {
        match self {
            SubscriptionError::NotFound(id) => format!("Subscription not found: {}", id),
            SubscriptionError::InvalidState { current, attempted } => format!(
                "Invalid state for this operation: cannot {} subscription in {} state",
                attempted, current
            ),
            SubscriptionError::Forbidden(msg) => msg.clone(),
            SubscriptionError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            SubscriptionError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl std::fmt::Display for SubscriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SubscriptionError {}

impl From<DomainError> for SubscriptionError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::Forbidden | ErrorCode::Unauthorized => {
                SubscriptionError::Forbidden(err.message)
            }
            ErrorCode::ValidationFailed => SubscriptionError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "request".to_string()),
                message: err.message,
            },
            _ => SubscriptionError::Infrastructure(err.to_string()),
        }
    }
}
