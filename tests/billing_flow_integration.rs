//! Integration tests for the billing HTTP surface.
//!
//! These tests drive the full router with in-memory stores and a real
//! Robokassa gateway:
//! 1. Discount validation
//! 2. Order creation, checkout and signed provider notifications
//! 3. Subscription pause and resume

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use storefront_billing::adapters::gateways::{GatewayRegistry, RobokassaGateway};
use storefront_billing::adapters::http::{billing_router, BillingAppState};
use storefront_billing::adapters::memory::{
    InMemoryDiscountRepository, InMemoryOrderRepository, InMemorySubscriptionRepository,
};
use storefront_billing::adapters::InMemoryEventBus;
use storefront_billing::domain::discount::{Discount, DiscountCode, DiscountStatus, DiscountValue};
use storefront_billing::domain::foundation::{
    Currency, DiscountId, Money, SubscriptionId, Timestamp, UserId,
};
use storefront_billing::domain::signature::{
    DigestAlgorithm, SignatureField, SignatureScheme, TokenCase,
};
use storefront_billing::domain::subscription::Subscription;
use storefront_billing::ports::SubscriptionRepository;

// =============================================================================
// Test Infrastructure
// =============================================================================

const PASSWORD2: &str = "result-pass";

struct TestApp {
    router: Router,
    events: Arc<InMemoryEventBus>,
    discounts: Arc<InMemoryDiscountRepository>,
    subscriptions: Arc<InMemorySubscriptionRepository>,
}

impl TestApp {
    fn new() -> Self {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let discounts = Arc::new(InMemoryDiscountRepository::new());
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let events = Arc::new(InMemoryEventBus::new());

        let robokassa = RobokassaGateway::new(
            "demo-shop",
            SecretString::new("redirect-pass".to_string()),
            SecretString::new(PASSWORD2.to_string()),
            DigestAlgorithm::Sha256,
        )
        .with_base_url("https://robokassa.test/pay");
        let gateways = GatewayRegistry::new().with_gateway(Arc::new(robokassa));

        let state = BillingAppState {
            orders,
            discounts: discounts.clone(),
            subscriptions: subscriptions.clone(),
            gateways: Arc::new(gateways),
            event_publisher: events.clone(),
            status_check_timeout: Duration::from_secs(1),
        };

        Self {
            router: Router::new().nest("/api", billing_router()).with_state(state),
            events,
            discounts,
            subscriptions,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn send_json(
        &self,
        method: &str,
        uri: &str,
        user: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("X-User-Id", user)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let (status, text) = self.send(request).await;
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap()
        };
        (status, value)
    }

    async fn notify_robokassa(&self, out_sum: &str, order_id: &str) -> (StatusCode, String) {
        let signature = result_signature(out_sum, order_id);
        let request = Request::builder()
            .method("POST")
            .uri("/api/payments/robokassa/notify")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(format!(
                "OutSum={}&InvId={}&Shp_order={}&SignatureValue={}",
                out_sum, INV_ID, order_id, signature
            )))
            .unwrap();
        self.send(request).await
    }

    /// Creates a 100.00 RUB order for `user-1` and starts checkout.
    async fn order_in_checkout(&self) -> String {
        let (status, created) = self
            .send_json(
                "POST",
                "/api/orders",
                "user-1",
                Some(json!({
                    "currency": "RUB",
                    "payment_provider": "robokassa",
                    "line_items": [
                        { "product_ref": "sku-1", "quantity": 2, "unit_price": 5000 }
                    ]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let order_id = created["id"].as_str().unwrap().to_string();

        let (status, checkout) = self
            .send_json(
                "POST",
                &format!("/api/orders/{}/checkout", order_id),
                "user-1",
                Some(json!({
                    "success_url": "https://shop.test/ok",
                    "fail_url": "https://shop.test/fail"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(checkout["order"]["status"], "processing");
        order_id
    }

    async fn order_status(&self, order_id: &str) -> String {
        let (_, order) = self
            .send_json("GET", &format!("/api/orders/{}", order_id), "user-1", None)
            .await;
        order["status"].as_str().unwrap().to_string()
    }
}

/// Invoice number Robokassa assigns to the test payments.
const INV_ID: &str = "5120";

fn result_signature(out_sum: &str, order_id: &str) -> String {
    SignatureScheme::new(DigestAlgorithm::Sha256, ":")
        .with_case(TokenCase::Upper)
        .sign_with_trailing(
            &[
                SignatureField::required("OutSum", Some(out_sum)),
                SignatureField::required("InvId", Some(INV_ID)),
            ],
            PASSWORD2,
            &[SignatureField::required(
                "Shp_order",
                Some(&format!("Shp_order={}", order_id)),
            )],
        )
        .unwrap()
}

fn summer20() -> Discount {
    Discount {
        id: DiscountId::new(),
        code: DiscountCode::try_new("SUMMER20").unwrap(),
        value: DiscountValue::Percentage(20),
        starts_at: None,
        ends_at: None,
        max_usage: None,
        max_usage_per_user: None,
        owner: None,
        status: DiscountStatus::Active,
        created_at: Timestamp::now(),
    }
}

// =============================================================================
// Discounts
// =============================================================================

#[tokio::test]
async fn discount_code_is_validated_case_insensitively() {
    let app = TestApp::new();
    app.discounts.upsert(summer20()).await;

    let (status, body) = app
        .send_json(
            "POST",
            "/api/discounts/validate",
            "user-1",
            Some(json!({ "code": "summer20", "cart_total": 10000, "currency": "USD" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_valid"], true);
    assert_eq!(body["discount_amount"], 2000);
    assert_eq!(body["discount_percentage"], 20);
}

#[tokio::test]
async fn unknown_discount_code_is_rejected_with_reason() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(
            "POST",
            "/api/discounts/validate",
            "user-1",
            Some(json!({ "code": "NOPE", "cart_total": 10000, "currency": "USD" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_valid"], false);
    assert_eq!(body["reason"], "INVALID_CODE");
}

#[tokio::test]
async fn requests_without_identity_are_unauthorized() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/api/discounts/validate")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "code": "SUMMER20", "cart_total": 100, "currency": "USD" }).to_string(),
        ))
        .unwrap();

    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Orders and notifications
// =============================================================================

#[tokio::test]
async fn order_with_discount_totals_after_discount() {
    let app = TestApp::new();
    app.discounts.upsert(summer20()).await;

    let (status, order) = app
        .send_json(
            "POST",
            "/api/orders",
            "user-1",
            Some(json!({
                "currency": "RUB",
                "payment_provider": "robokassa",
                "discount_code": "Summer20",
                "line_items": [
                    { "product_ref": "sku-1", "quantity": 1, "unit_price": 10000 }
                ]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["subtotal"], 10000);
    assert_eq!(order["discount_amount"], 2000);
    assert_eq!(order["total"], 8000);
    assert_eq!(order["status"], "pending");
    assert_eq!(app.events.events_of_type("order.created.v1").len(), 1);
}

#[tokio::test]
async fn order_for_unconfigured_provider_is_refused() {
    let app = TestApp::new();

    let (status, body) = app
        .send_json(
            "POST",
            "/api/orders",
            "user-1",
            Some(json!({
                "currency": "USD",
                "payment_provider": "unitpay",
                "line_items": [
                    { "product_ref": "sku-1", "quantity": 1, "unit_price": 100 }
                ]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error_code"].is_string());
}

#[tokio::test]
async fn signed_notification_marks_order_paid() {
    let app = TestApp::new();
    let order_id = app.order_in_checkout().await;

    let (status, body) = app.notify_robokassa("100.00", &order_id).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, format!("OK{}", INV_ID));
    assert_eq!(app.order_status(&order_id).await, "paid");
    assert_eq!(app.events.events_of_type("order.paid.v1").len(), 1);
}

#[tokio::test]
async fn duplicate_notification_is_acknowledged_once() {
    let app = TestApp::new();
    let order_id = app.order_in_checkout().await;

    let (first, _) = app.notify_robokassa("100.00", &order_id).await;
    let (second, body) = app.notify_robokassa("100.00", &order_id).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(body, format!("OK{}", INV_ID));
    assert_eq!(app.events.events_of_type("order.paid.v1").len(), 1);
}

#[tokio::test]
async fn notification_with_wrong_amount_leaves_order_processing() {
    let app = TestApp::new();
    let order_id = app.order_in_checkout().await;

    let (status, _) = app.notify_robokassa("150.00", &order_id).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.order_status(&order_id).await, "processing");
    assert!(app.events.events_of_type("order.paid.v1").is_empty());
}

#[tokio::test]
async fn forged_signature_is_rejected() {
    let app = TestApp::new();
    let order_id = app.order_in_checkout().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/payments/robokassa/notify")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "OutSum=100.00&InvId={}&Shp_order={}&SignatureValue=DEADBEEF",
            INV_ID, order_id
        )))
        .unwrap();
    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.order_status(&order_id).await, "processing");
}

#[tokio::test]
async fn other_users_cannot_read_an_order() {
    let app = TestApp::new();
    let order_id = app.order_in_checkout().await;

    let (status, _) = app
        .send_json("GET", &format!("/api/orders/{}", order_id), "user-2", None)
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

// =============================================================================
// Subscriptions
// =============================================================================

#[tokio::test]
async fn pause_then_resume_keeps_remaining_days() {
    let app = TestApp::new();
    let now = Timestamp::now();
    let subscription = Subscription::create(
        SubscriptionId::new(),
        UserId::new("user-1").unwrap(),
        "plan-monthly",
        Money::new(990, Currency::new("USD").unwrap()).unwrap(),
        now.add_days(30),
        now,
    )
    .unwrap();
    let id = subscription.id.to_string();
    app.subscriptions.insert(&subscription).await.unwrap();

    let (status, paused) = app
        .send_json(
            "POST",
            &format!("/api/subscriptions/{}/pause", id),
            "user-1",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paused["status"], "paused");

    let (status, resumed) = app
        .send_json(
            "POST",
            &format!("/api/subscriptions/{}/resume", id),
            "user-1",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resumed["subscription"]["status"], "active");
    let days = resumed["days_remaining"].as_i64().unwrap();
    assert!((29..=30).contains(&days), "days_remaining = {}", days);

    assert_eq!(app.events.events_of_type("subscription.resumed.v1").len(), 1);
}

#[tokio::test]
async fn resuming_an_active_subscription_conflicts() {
    let app = TestApp::new();
    let now = Timestamp::now();
    let subscription = Subscription::create(
        SubscriptionId::new(),
        UserId::new("user-1").unwrap(),
        "plan-monthly",
        Money::new(990, Currency::new("USD").unwrap()).unwrap(),
        now.add_days(30),
        now,
    )
    .unwrap();
    app.subscriptions.insert(&subscription).await.unwrap();

    let (status, _) = app
        .send_json(
            "POST",
            &format!("/api/subscriptions/{}/resume", subscription.id),
            "user-1",
            None,
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
}
