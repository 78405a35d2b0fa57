//! HTTP DTOs (Data Transfer Objects) for billing endpoints.
//!
//! Amounts travel as integer minor units next to an ISO-4217 currency code;
//! responses also carry the provider-style decimal rendering for display.
//! Timestamps are RFC 3339.

use serde::{Deserialize, Serialize};

use crate::application::handlers::DiscountDecision;
use crate::domain::foundation::{Money, Timestamp};
use crate::domain::order::Order;
use crate::domain::subscription::Subscription;
use crate::ports::PaymentStatusCheck;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct LineItemRequest {
    pub product_ref: String,
    pub quantity: u32,
    /// Unit price in minor units of the order currency.
    pub unit_price: i64,
}

/// Request to create an order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub currency: String,
    pub payment_provider: String,
    pub line_items: Vec<LineItemRequest>,
    #[serde(default)]
    pub discount_code: Option<String>,
}

/// Request to send the customer to the payment provider.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub success_url: String,
    pub fail_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
}

/// Request to check a discount code against a cart.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateDiscountRequest {
    pub code: String,
    /// Cart total in minor units.
    pub cart_total: i64,
    pub currency: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct LineItemResponse {
    pub product_ref: String,
    pub quantity: u32,
    pub unit_price: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub status: String,
    pub currency: String,
    pub line_items: Vec<LineItemResponse>,
    pub subtotal: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
    pub discount_amount: i64,
    pub total: i64,
    /// Total as sent to providers, e.g. `"100.00"`.
    pub total_display: String,
    pub payment_provider: String,
    pub payment_id: Option<String>,
    pub paid_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub cancelled_at: Option<String>,
    pub refunded_at: Option<String>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            user_id: order.user_id.to_string(),
            status: order.status.as_str().to_string(),
            currency: order.currency.code().to_string(),
            line_items: order
                .line_items
                .iter()
                .map(|item| LineItemResponse {
                    product_ref: item.product_ref.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price.minor_units(),
                })
                .collect(),
            subtotal: order.subtotal.minor_units(),
            discount_code: order.discount_code().map(str::to_string),
            discount_amount: order
                .discount
                .as_ref()
                .map(|d| d.amount.minor_units())
                .unwrap_or(0),
            total: order.total.minor_units(),
            total_display: order.total.to_decimal_string(),
            payment_provider: order.payment_provider.to_string(),
            payment_id: order.payment_id.clone(),
            paid_at: rfc3339(order.paid_at),
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
            cancelled_at: rfc3339(order.cancelled_at),
            refunded_at: rfc3339(order.refunded_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub redirect_url: String,
    pub order: OrderResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollStatusResponse {
    /// `paid`, `failed`, `pending` or `unknown`.
    pub provider_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub order: OrderResponse,
}

impl PollStatusResponse {
    pub fn new(check: &PaymentStatusCheck, order: &Order) -> Self {
        let (provider_status, detail) = match check {
            PaymentStatusCheck::Paid { .. } => ("paid", None),
            PaymentStatusCheck::Failed { reason, .. } => ("failed", reason.clone()),
            PaymentStatusCheck::Pending => ("pending", None),
            PaymentStatusCheck::Unknown { reason } => ("unknown", Some(reason.clone())),
        };
        Self {
            provider_status,
            detail,
            order: OrderResponse::from(order),
        }
    }
}

/// Discount validation outcome.
///
/// `reason` is the machine-readable code; `message` is for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscountValidationResponse {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl From<DiscountDecision> for DiscountValidationResponse {
    fn from(decision: DiscountDecision) -> Self {
        match decision {
            DiscountDecision::Applied(quote) => Self {
                is_valid: true,
                code: Some(quote.code.to_string()),
                discount_amount: Some(quote.discount_amount.minor_units()),
                discount_percentage: quote.discount_percentage,
                reason: None,
                message: None,
            },
            DiscountDecision::Rejected(reason) => Self {
                is_valid: false,
                code: None,
                discount_amount: None,
                discount_percentage: None,
                reason: Some(reason.code()),
                message: Some(reason.message()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub user_id: String,
    pub plan_ref: String,
    pub status: String,
    pub next_payment_date: String,
    pub amount: i64,
    pub currency: String,
    pub paused_at: Option<String>,
    pub resumed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub canceled_at: Option<String>,
}

impl From<&Subscription> for SubscriptionResponse {
    fn from(sub: &Subscription) -> Self {
        Self {
            id: sub.id.to_string(),
            user_id: sub.user_id.to_string(),
            plan_ref: sub.plan_ref.clone(),
            status: sub.status.as_str().to_string(),
            next_payment_date: sub.next_payment_date.to_rfc3339(),
            amount: sub.amount.minor_units(),
            currency: amount_currency(&sub.amount),
            paused_at: rfc3339(sub.metadata.paused_at),
            resumed_at: rfc3339(sub.metadata.resumed_at),
            created_at: sub.created_at.to_rfc3339(),
            updated_at: sub.updated_at.to_rfc3339(),
            canceled_at: rfc3339(sub.canceled_at),
        }
    }
}

/// Response for resume: the new due date up front.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeSubscriptionResponse {
    pub next_payment_date: String,
    pub days_remaining: i64,
    pub subscription: SubscriptionResponse,
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

fn rfc3339(ts: Option<Timestamp>) -> Option<String> {
    ts.map(|t| t.to_rfc3339())
}

fn amount_currency(amount: &Money) -> String {
    amount.currency().code().to_string()
}
