//! Payment gateway port.
//!
//! One implementation per provider, selected by the `ProviderId` stored on
//! the order. Redirect construction and notification parsing are pure;
//! only status polling touches the network.
//!
//! # Design
//!
//! - **Table-driven**: gateways are looked up in a registry, never chosen by
//!   string comparison at call sites
//! - **Verification is data**: `parse_notification` reports `is_verified`
//!   instead of erroring, so the ledger can log and reject in one place
//! - **Polling never throws**: timeouts and provider errors come back as
//!   `PaymentStatusCheck::Unknown`

use crate::domain::foundation::{BillingErrorKind, Money, OrderId, ProviderId};
use crate::domain::order::{Order, PaymentNotification};
use crate::domain::signature::SignatureError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Port for provider-specific payment plumbing.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Identifier under which this gateway is registered.
    fn provider(&self) -> &ProviderId;

    /// Build the absolute URL the customer is sent to.
    ///
    /// # Errors
    ///
    /// - `Signature` if a field the provider signs is empty
    /// - `Configuration` if the base URL cannot be used
    fn build_redirect(&self, request: &RedirectRequest) -> Result<String, GatewayError>;

    /// Extract a notification from an inbound provider call and verify it.
    ///
    /// A bad signature yields `Ok` with `is_verified == false`; `Err` means
    /// the payload could not be read at all.
    fn parse_notification(
        &self,
        payload: &NotificationPayload,
    ) -> Result<PaymentNotification, GatewayError>;

    /// Ask the provider what happened to the order's payment.
    ///
    /// Must return within roughly `timeout`. Anything inconclusive, a
    /// timeout included, is `Unknown`.
    async fn check_status(&self, order: &Order, timeout: Duration) -> PaymentStatusCheck;

    /// Response that tells the provider the notification was accepted.
    fn acknowledge(&self, notification: &PaymentNotification) -> GatewayResponse;

    /// Response that tells the provider to retry later.
    fn reject(&self, reason: &str) -> GatewayResponse;
}

/// Resolves the gateway for a provider id.
pub trait GatewayLookup: Send + Sync {
    /// # Errors
    ///
    /// `Configuration` when no gateway is registered under `provider`.
    fn gateway(&self, provider: &ProviderId) -> Result<Arc<dyn PaymentGateway>, GatewayError>;

    fn supports(&self, provider: &ProviderId) -> bool {
        self.gateway(provider).is_ok()
    }
}

/// Everything a gateway needs to build a checkout redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectRequest {
    pub order_id: OrderId,
    pub amount: Money,
    pub description: String,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub fail_url: String,
}

/// Raw inbound notification as received by the HTTP adapter.
#[derive(Debug, Clone, Default)]
pub struct NotificationPayload {
    /// Request body, exactly as received. HMAC schemes sign these bytes.
    pub body: Vec<u8>,

    /// Query string without the leading `?`.
    pub query: Option<String>,

    /// Header names lowercased.
    pub headers: HashMap<String, String>,
}

impl NotificationPayload {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Decodes url-encoded fields from the body, or the query string when
    /// the body is empty. Providers deliver either way.
    pub fn form_fields(&self) -> Result<HashMap<String, String>, GatewayError> {
        let source: &[u8] = if self.body.is_empty() {
            self.query.as_deref().unwrap_or_default().as_bytes()
        } else {
            &self.body
        };
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(source)
            .map_err(|e| GatewayError::malformed("body", e.to_string()))?;
        Ok(pairs.into_iter().collect())
    }
}

/// Outcome of actively polling a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatusCheck {
    Paid {
        payment_id: String,
        amount: Money,
    },
    Failed {
        payment_id: String,
        amount: Money,
        reason: Option<String>,
    },
    Pending,
    /// Inconclusive. Try again later; never treat as failure.
    Unknown {
        reason: String,
    },
}

impl PaymentStatusCheck {
    pub fn unknown(reason: impl Into<String>) -> Self {
        PaymentStatusCheck::Unknown {
            reason: reason.into(),
        }
    }

    pub fn is_conclusive(&self) -> bool {
        matches!(
            self,
            PaymentStatusCheck::Paid { .. } | PaymentStatusCheck::Failed { .. }
        )
    }
}

/// Provider-defined acknowledgement body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    /// Whether the provider will read this as success.
    pub accepted: bool,
    pub content_type: &'static str,
    pub body: String,
}

impl GatewayResponse {
    pub fn text(accepted: bool, body: impl Into<String>) -> Self {
        Self {
            accepted,
            content_type: "text/plain; charset=utf-8",
            body: body.into(),
        }
    }

    pub fn json(accepted: bool, body: serde_json::Value) -> Self {
        Self {
            accepted,
            content_type: "application/json",
            body: body.to_string(),
        }
    }
}

/// Gateway failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("Missing notification field: {0}")]
    MissingField(String),

    #[error("Malformed field '{field}': {reason}")]
    Malformed { field: String, reason: String },

    #[error("Gateway configuration error: {0}")]
    Configuration(String),

    #[error("Provider unavailable: {0}")]
    Transport(String),
}

impl GatewayError {
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        GatewayError::Malformed {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> BillingErrorKind {
        match self {
            GatewayError::Signature(_)
            | GatewayError::MissingField(_)
            | GatewayError::Malformed { .. } => BillingErrorKind::Validation,
            GatewayError::Configuration(_) => BillingErrorKind::Configuration,
            GatewayError::Transport(_) => BillingErrorKind::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn PaymentGateway) {}

    #[allow(dead_code)]
    fn assert_lookup_object_safe(_: &dyn GatewayLookup) {}

    #[test]
    fn form_fields_prefers_body_over_query() {
        let payload = NotificationPayload::new("OutSum=10.00&InvId=7").with_query("InvId=9");
        let fields = payload.form_fields().unwrap();
        assert_eq!(fields.get("InvId").map(String::as_str), Some("7"));
        assert_eq!(fields.get("OutSum").map(String::as_str), Some("10.00"));
    }

    #[test]
    fn form_fields_falls_back_to_query() {
        let payload = NotificationPayload::new(Vec::new()).with_query("method=pay&params%5Bsum%5D=5");
        let fields = payload.form_fields().unwrap();
        assert_eq!(fields.get("params[sum]").map(String::as_str), Some("5"));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let payload = NotificationPayload::new(Vec::new()).with_header("HMAC", "abc");
        assert_eq!(payload.header("hmac"), Some("abc"));
        assert_eq!(payload.header("Hmac"), Some("abc"));
    }

    #[test]
    fn signature_errors_are_validation_kind() {
        let err: GatewayError = SignatureError::MissingField("OutSum".into()).into();
        assert_eq!(err.kind(), BillingErrorKind::Validation);
        assert!(GatewayError::Transport("timeout".into()).kind().is_retryable());
    }

    #[test]
    fn only_paid_and_failed_are_conclusive() {
        assert!(!PaymentStatusCheck::Pending.is_conclusive());
        assert!(!PaymentStatusCheck::unknown("timeout").is_conclusive());
    }
}
