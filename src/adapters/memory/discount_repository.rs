//! In-memory discount store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::discount::{Discount, DiscountCode};
use crate::domain::foundation::DomainError;
use crate::ports::DiscountRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryDiscountRepository {
    discounts: Arc<RwLock<HashMap<DiscountCode, Discount>>>,
}

impl InMemoryDiscountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a discount, replacing any record with the same code.
    pub async fn upsert(&self, discount: Discount) {
        self.discounts
            .write()
            .await
            .insert(discount.code.clone(), discount);
    }
}

#[async_trait]
impl DiscountRepository for InMemoryDiscountRepository {
    async fn find_by_code(&self, code: &DiscountCode) -> Result<Option<Discount>, DomainError> {
        Ok(self.discounts.read().await.get(code).cloned())
    }
}
