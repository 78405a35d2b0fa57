//! Fixtures shared by gateway tests.

use crate::domain::foundation::{Currency, Money, OrderId, ProviderId, Timestamp, UserId};
use crate::domain::order::{LineItem, Order};

/// An order in `processing` with a single line item of `minor` units.
pub(crate) fn processing_order(provider: &str, currency: &str, minor: i64) -> Order {
    let currency = Currency::new(currency).unwrap();
    let item = LineItem::new("sku-1", 1, Money::new(minor, currency.clone()).unwrap()).unwrap();
    let (mut order, _) = Order::create(
        OrderId::new(),
        UserId::new("user-1").unwrap(),
        currency,
        vec![item],
        ProviderId::new(provider).unwrap(),
        None,
        Timestamp::now(),
    )
    .unwrap();
    order.start_checkout(Timestamp::now()).unwrap();
    order
}
