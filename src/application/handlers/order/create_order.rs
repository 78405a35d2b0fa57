//! CreateOrderHandler - Command handler for placing an order.

use std::sync::Arc;

use crate::domain::foundation::{Currency, Money, OrderId, ProviderId, Timestamp, UserId};
use crate::domain::order::{AppliedDiscount, LineItem, Order, OrderCreated, OrderError};
use crate::ports::{DiscountRepository, EventPublisher, GatewayLookup, OrderRepository};

use super::super::discount::{DiscountDecision, ValidateDiscountHandler, ValidateDiscountQuery};
use super::super::publish_event;

/// Command to create an order.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub user_id: UserId,
    pub currency: Currency,
    pub line_items: Vec<LineItem>,
    pub payment_provider: ProviderId,
    pub discount_code: Option<String>,
}

/// Result of successful order creation.
#[derive(Debug, Clone)]
pub struct CreateOrderResult {
    pub order: Order,
    pub event: OrderCreated,
}

/// Handler for creating orders.
pub struct CreateOrderHandler {
    repository: Arc<dyn OrderRepository>,
    gateways: Arc<dyn GatewayLookup>,
    discounts: ValidateDiscountHandler,
    event_publisher: Arc<dyn EventPublisher>,
}

impl CreateOrderHandler {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        discounts: Arc<dyn DiscountRepository>,
        gateways: Arc<dyn GatewayLookup>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            discounts: ValidateDiscountHandler::new(discounts, repository.clone()),
            repository,
            gateways,
            event_publisher,
        }
    }

    pub async fn handle(&self, cmd: CreateOrderCommand) -> Result<CreateOrderResult, OrderError> {
        // 1. Provider must be wired before anything is stored
        if !self.gateways.supports(&cmd.payment_provider) {
            return Err(OrderError::configuration(format!(
                "no gateway configured for provider '{}'",
                cmd.payment_provider
            )));
        }

        // 2. Discount is checked against the undiscounted subtotal
        let discount = match cmd
            .discount_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
        {
            Some(code) => {
                let subtotal = subtotal_of(&cmd.currency, &cmd.line_items)?;
                let query = ValidateDiscountQuery {
                    code: code.to_string(),
                    user_id: cmd.user_id.clone(),
                    cart_total: subtotal,
                };
                match self.discounts.handle(query).await? {
                    DiscountDecision::Applied(quote) => Some(AppliedDiscount {
                        code: quote.code.to_string(),
                        amount: quote.discount_amount,
                    }),
                    DiscountDecision::Rejected(reason) => {
                        return Err(OrderError::validation("discount_code", reason.message()));
                    }
                }
            }
            None => None,
        };

        // 3. Build and persist
        let (order, event) = Order::create(
            OrderId::new(),
            cmd.user_id,
            cmd.currency,
            cmd.line_items,
            cmd.payment_provider,
            discount,
            Timestamp::now(),
        )?;
        self.repository.insert(&order).await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total = %order.total,
            provider = %order.payment_provider,
            "order created"
        );

        // 4. Publish event
        publish_event(self.event_publisher.as_ref(), &event, &order.user_id).await;

        Ok(CreateOrderResult { order, event })
    }
}

fn subtotal_of(currency: &Currency, items: &[LineItem]) -> Result<Money, OrderError> {
    items
        .iter()
        .try_fold(Money::zero(currency.clone()), |acc, item| -> Result<Money, OrderError> {
            Ok(acc.checked_add(&item.line_total()?)?)
        })
}
