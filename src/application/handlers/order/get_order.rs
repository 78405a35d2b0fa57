//! GetOrderHandler - Query handler for a single order.

use std::sync::Arc;

use crate::domain::foundation::{Actor, OrderId};
use crate::domain::order::{Order, OrderError};
use crate::ports::OrderRepository;

#[derive(Debug, Clone)]
pub struct GetOrderQuery {
    pub order_id: OrderId,
    pub actor: Actor,
}

pub struct GetOrderHandler {
    repository: Arc<dyn OrderRepository>,
}

impl GetOrderHandler {
    pub fn new(repository: Arc<dyn OrderRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, query: GetOrderQuery) -> Result<Order, OrderError> {
        let order = self
            .repository
            .find_by_id(&query.order_id)
            .await?
            .ok_or_else(|| OrderError::not_found(query.order_id))?;
        query
            .actor
            .ensure_owner_or_admin(&order.user_id, "order", order.id.to_string())?;
        Ok(order)
    }
}
