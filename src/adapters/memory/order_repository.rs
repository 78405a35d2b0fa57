//! In-memory order store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, OrderId, UserId};
use crate::domain::order::{Order, OrderStatus};
use crate::ports::OrderRepository;

/// Orders held in a map behind one lock.
///
/// `update_if_status` compares and writes under the same write guard, so it
/// has the same single-winner guarantee as the SQL conditional update.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored orders
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn insert(&self, order: &Order) -> Result<(), DomainError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("order {} already exists", order.id),
            ));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update_if_status(
        &self,
        order: &Order,
        expected: OrderStatus,
        expected_payment_id: Option<&str>,
    ) -> Result<bool, DomainError> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order.id) {
            Some(stored)
                if stored.status == expected
                    && stored.payment_id.as_deref() == expected_payment_id =>
            {
                *stored = order.clone();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(DomainError::new(
                ErrorCode::OrderNotFound,
                format!("order {} not found", order.id),
            )),
        }
    }

    async fn count_redemptions(
        &self,
        code: &str,
        user: Option<&UserId>,
    ) -> Result<u64, DomainError> {
        let orders = self.orders.read().await;
        let count = orders
            .values()
            .filter(|o| o.status.counts_as_redemption())
            .filter(|o| {
                o.discount_code()
                    .map(|c| c.eq_ignore_ascii_case(code))
                    .unwrap_or(false)
            })
            .filter(|o| user.map(|u| &o.user_id == u).unwrap_or(true))
            .count();
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Currency, Money, ProviderId, Timestamp};
    use crate::domain::order::{AppliedDiscount, LineItem};

    fn order(user: &str, code: Option<&str>) -> Order {
        let usd = Currency::new("USD").unwrap();
        let item = LineItem::new("sku", 1, Money::new(5_000, usd.clone()).unwrap()).unwrap();
        let discount = code.map(|c| AppliedDiscount {
            code: c.to_string(),
            amount: Money::new(1_000, usd.clone()).unwrap(),
        });
        Order::create(
            OrderId::new(),
            UserId::new(user).unwrap(),
            usd,
            vec![item],
            ProviderId::from_static("robokassa"),
            discount,
            Timestamp::now(),
        )
        .unwrap()
        .0
    }

    fn paid(mut order: Order) -> Order {
        order.start_checkout(Timestamp::now()).unwrap();
        order.mark_paid("pay-1".into(), Timestamp::now()).unwrap();
        order
    }

    #[tokio::test]
    async fn insert_then_find() {
        let repo = InMemoryOrderRepository::new();
        let o = order("a", None);
        repo.insert(&o).await.unwrap();

        assert_eq!(repo.find_by_id(&o.id).await.unwrap(), Some(o.clone()));
        assert!(repo.insert(&o).await.is_err());
    }

    #[tokio::test]
    async fn update_if_status_only_wins_once() {
        let repo = InMemoryOrderRepository::new();
        let mut o = order("a", None);
        o.start_checkout(Timestamp::now()).unwrap();
        repo.insert(&o).await.unwrap();

        let mut first = o.clone();
        first.mark_paid("pay-1".into(), Timestamp::now()).unwrap();
        let mut second = o.clone();
        second.mark_paid("pay-1".into(), Timestamp::now()).unwrap();

        assert!(repo.update_if_status(&first, OrderStatus::Processing, None).await.unwrap());
        assert!(!repo.update_if_status(&second, OrderStatus::Processing, None).await.unwrap());
    }

    #[tokio::test]
    async fn recorded_payment_id_fails_a_stale_write() {
        let repo = InMemoryOrderRepository::new();
        let mut o = order("a", None);
        o.start_checkout(Timestamp::now()).unwrap();
        repo.insert(&o).await.unwrap();

        let mut pending = o.clone();
        pending.payment_id = Some("pay-A".into());
        assert!(repo.update_if_status(&pending, OrderStatus::Processing, None).await.unwrap());

        let mut stale = o.clone();
        stale.mark_paid("pay-B".into(), Timestamp::now()).unwrap();
        assert!(!repo.update_if_status(&stale, OrderStatus::Processing, None).await.unwrap());

        let stored = repo.find_by_id(&o.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_id.as_deref(), Some("pay-A"));
        assert_eq!(stored.status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn update_of_missing_order_is_not_found() {
        let repo = InMemoryOrderRepository::new();
        let o = order("a", None);
        let err = repo.update_if_status(&o, OrderStatus::Pending, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);
    }

    #[tokio::test]
    async fn redemptions_count_paid_orders_case_insensitively() {
        let repo = InMemoryOrderRepository::new();
        repo.insert(&paid(order("a", Some("SUMMER20")))).await.unwrap();
        repo.insert(&paid(order("b", Some("SUMMER20")))).await.unwrap();
        repo.insert(&order("a", Some("SUMMER20"))).await.unwrap();
        repo.insert(&paid(order("a", Some("WINTER")))).await.unwrap();

        assert_eq!(repo.count_redemptions("summer20", None).await.unwrap(), 2);
        let a = UserId::new("a").unwrap();
        assert_eq!(repo.count_redemptions("SUMMER20", Some(&a)).await.unwrap(), 1);
    }
}
