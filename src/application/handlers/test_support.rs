//! Fixtures shared by handler tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::adapters::events::InMemoryEventBus;
use crate::adapters::gateways::GatewayRegistry;
use crate::adapters::memory::{
    InMemoryDiscountRepository, InMemoryOrderRepository, InMemorySubscriptionRepository,
};
use crate::domain::foundation::{
    Actor, Currency, Money, OrderId, ProviderId, Timestamp, UserId,
};
use crate::domain::order::{LineItem, Order, PaymentNotification, PaymentOutcome};
use crate::ports::{
    GatewayError, GatewayResponse, NotificationPayload, PaymentGateway, PaymentStatusCheck,
    RedirectRequest,
};

pub(crate) const STUB_PROVIDER: &str = "stub";

pub(crate) fn usd(minor: i64) -> Money {
    Money::new(minor, Currency::new("USD").unwrap()).unwrap()
}

pub(crate) fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

pub(crate) fn owner() -> Actor {
    Actor::user(user("user-1"))
}

pub(crate) fn admin() -> Actor {
    Actor::admin(user("ops"))
}

pub(crate) fn stranger() -> Actor {
    Actor::user(user("intruder"))
}

/// A pending stub-provider order owned by `user-1`.
pub(crate) fn pending_order(minor: i64) -> Order {
    let item = LineItem::new("course-rust", 1, usd(minor)).unwrap();
    Order::create(
        OrderId::new(),
        user("user-1"),
        Currency::new("USD").unwrap(),
        vec![item],
        ProviderId::from_static(STUB_PROVIDER),
        None,
        Timestamp::now(),
    )
    .unwrap()
    .0
}

pub(crate) fn processing_order(minor: i64) -> Order {
    let mut order = pending_order(minor);
    order.start_checkout(Timestamp::now()).unwrap();
    order
}

/// Gateway whose notifications are plain form fields:
/// `order_id`, `amount` (minor units, USD), `payment_id`, `outcome`
/// (`paid`, `failed` or `check`) and `sig` (`valid` verifies).
pub(crate) struct StubGateway {
    provider: ProviderId,
    status: Mutex<PaymentStatusCheck>,
    delay: Option<Duration>,
}

impl StubGateway {
    pub(crate) fn new() -> Self {
        Self {
            provider: ProviderId::from_static(STUB_PROVIDER),
            status: Mutex::new(PaymentStatusCheck::Pending),
            delay: None,
        }
    }

    pub(crate) fn with_status(self, status: PaymentStatusCheck) -> Self {
        *self.status.lock().unwrap() = status;
        self
    }

    /// Make `check_status` stall, to exercise the caller's timeout.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    fn provider(&self) -> &ProviderId {
        &self.provider
    }

    fn build_redirect(&self, request: &RedirectRequest) -> Result<String, GatewayError> {
        Ok(format!(
            "https://pay.test/{}?sum={}",
            request.order_id,
            request.amount.to_decimal_string()
        ))
    }

    fn parse_notification(
        &self,
        payload: &NotificationPayload,
    ) -> Result<PaymentNotification, GatewayError> {
        let form = payload.form_fields()?;
        let get = |name: &str| {
            form.get(name)
                .cloned()
                .ok_or_else(|| GatewayError::MissingField(name.to_string()))
        };
        let order_id = get("order_id")?
            .parse::<OrderId>()
            .map_err(|e| GatewayError::malformed("order_id", e.to_string()))?;
        let amount = get("amount")?
            .parse::<i64>()
            .map_err(|e| GatewayError::malformed("amount", e.to_string()))?;
        let outcome = match get("outcome")?.as_str() {
            "paid" => PaymentOutcome::Succeeded,
            "failed" => PaymentOutcome::Failed {
                reason: Some("declined".to_string()),
            },
            "check" => PaymentOutcome::Pending,
            other => return Err(GatewayError::malformed("outcome", other.to_string())),
        };
        Ok(PaymentNotification {
            provider: self.provider.clone(),
            order_id,
            amount: usd(amount),
            provider_payment_id: get("payment_id")?,
            outcome,
            is_verified: get("sig")? == "valid",
        })
    }

    async fn check_status(&self, _order: &Order, _timeout: Duration) -> PaymentStatusCheck {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.status.lock().unwrap().clone()
    }

    fn acknowledge(&self, _notification: &PaymentNotification) -> GatewayResponse {
        GatewayResponse::text(true, "OK")
    }

    fn reject(&self, reason: &str) -> GatewayResponse {
        GatewayResponse::text(false, format!("ERR {}", reason))
    }
}

pub(crate) fn notification_body(order: &Order, amount: i64, outcome: &str, sig: &str) -> String {
    format!(
        "order_id={}&amount={}&payment_id=pay-1&outcome={}&sig={}",
        order.id, amount, outcome, sig
    )
}

/// Stores and bus wired together the way `main` wires them.
pub(crate) struct Harness {
    pub orders: Arc<InMemoryOrderRepository>,
    pub discounts: Arc<InMemoryDiscountRepository>,
    pub subscriptions: Arc<InMemorySubscriptionRepository>,
    pub events: Arc<InMemoryEventBus>,
    pub gateways: Arc<GatewayRegistry>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_gateway(StubGateway::new())
    }

    pub(crate) fn with_gateway(gateway: StubGateway) -> Self {
        Self {
            orders: Arc::new(InMemoryOrderRepository::new()),
            discounts: Arc::new(InMemoryDiscountRepository::new()),
            subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
            events: Arc::new(InMemoryEventBus::new()),
            gateways: Arc::new(GatewayRegistry::new().with_gateway(Arc::new(gateway))),
        }
    }
}
