//! PostgreSQL implementation of OrderRepository.
//!
//! Line items are stored as JSONB; amounts are BIGINT minor units next to a
//! single currency column. Status writes are compare-and-swap on the
//! `status` and `payment_id` columns, so two concurrent notifications for the
//! same order resolve to exactly one winning UPDATE.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{
    Currency, DomainError, ErrorCode, Money, OrderId, ProviderId, Timestamp, UserId,
};
use crate::domain::order::{AppliedDiscount, LineItem, Order, OrderStatus};
use crate::ports::OrderRepository;

const SELECT_ORDER: &str = r#"
    SELECT id, user_id, currency, line_items, subtotal_minor, discount_code,
           discount_minor, total_minor, status, payment_provider, payment_id,
           paid_at, created_at, updated_at, cancelled_at, refunded_at
    FROM orders
"#;

/// PostgreSQL implementation of OrderRepository.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_ORDER))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to fetch order: {}", e)))?;

        row.map(row_to_order).transpose()
    }

    async fn insert(&self, order: &Order) -> Result<(), DomainError> {
        let line_items = serde_json::to_value(&order.line_items).map_err(|e| {
            DomainError::database(format!("Failed to encode line items: {}", e))
        })?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, currency, line_items, subtotal_minor, discount_code,
                discount_minor, total_minor, status, payment_provider, payment_id,
                paid_at, created_at, updated_at, cancelled_at, refunded_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_str())
        .bind(order.currency.code())
        .bind(line_items)
        .bind(order.subtotal.minor_units())
        .bind(order.discount.as_ref().map(|d| d.code.clone()))
        .bind(order.discount.as_ref().map(|d| d.amount.minor_units()))
        .bind(order.total.minor_units())
        .bind(order.status.as_str())
        .bind(order.payment_provider.as_str())
        .bind(order.payment_id.as_deref())
        .bind(order.paid_at.map(|t| *t.as_datetime()))
        .bind(order.created_at.as_datetime())
        .bind(order.updated_at.as_datetime())
        .bind(order.cancelled_at.map(|t| *t.as_datetime()))
        .bind(order.refunded_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert order: {}", e)))?;

        Ok(())
    }

    async fn update_if_status(
        &self,
        order: &Order,
        expected: OrderStatus,
        expected_payment_id: Option<&str>,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = $3,
                payment_id = $4,
                paid_at = $5,
                updated_at = $6,
                cancelled_at = $7,
                refunded_at = $8
            WHERE id = $1 AND status = $2 AND payment_id IS NOT DISTINCT FROM $9
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(expected.as_str())
        .bind(order.status.as_str())
        .bind(order.payment_id.as_deref())
        .bind(order.paid_at.map(|t| *t.as_datetime()))
        .bind(order.updated_at.as_datetime())
        .bind(order.cancelled_at.map(|t| *t.as_datetime()))
        .bind(order.refunded_at.map(|t| *t.as_datetime()))
        .bind(expected_payment_id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update order: {}", e)))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        // Zero rows: another writer moved the order on, or it never existed.
        let exists: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE id = $1")
            .bind(order.id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                DomainError::database(format!("Failed to check order existence: {}", e))
            })?;

        if exists.0 == 0 {
            return Err(DomainError::new(
                ErrorCode::OrderNotFound,
                format!("Order not found: {}", order.id),
            ));
        }
        Ok(false)
    }

    async fn count_redemptions(
        &self,
        code: &str,
        user: Option<&UserId>,
    ) -> Result<u64, DomainError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM orders
            WHERE upper(discount_code) = upper($1)
              AND status IN ('paid', 'completed')
              AND ($2::TEXT IS NULL OR user_id = $2)
            "#,
        )
        .bind(code)
        .bind(user.map(|u| u.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to count redemptions: {}", e)))?;

        Ok(count.0.max(0) as u64)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| DomainError::database(format!("Failed to get {}: {}", name, e)))
}

fn timestamp(value: Option<chrono::DateTime<chrono::Utc>>) -> Option<Timestamp> {
    value.map(Timestamp::from_datetime)
}

fn money(minor: i64, currency: &Currency) -> Result<Money, DomainError> {
    Money::new(minor, currency.clone())
        .map_err(|e| DomainError::database(format!("Invalid stored amount: {}", e)))
}

fn row_to_order(row: PgRow) -> Result<Order, DomainError> {
    let id: uuid::Uuid = column(&row, "id")?;
    let user_id: String = column(&row, "user_id")?;
    let currency: String = column(&row, "currency")?;
    let line_items: serde_json::Value = column(&row, "line_items")?;
    let subtotal_minor: i64 = column(&row, "subtotal_minor")?;
    let discount_code: Option<String> = column(&row, "discount_code")?;
    let discount_minor: Option<i64> = column(&row, "discount_minor")?;
    let total_minor: i64 = column(&row, "total_minor")?;
    let status: String = column(&row, "status")?;
    let payment_provider: String = column(&row, "payment_provider")?;
    let payment_id: Option<String> = column(&row, "payment_id")?;
    let paid_at = column(&row, "paid_at")?;
    let created_at = column(&row, "created_at")?;
    let updated_at = column(&row, "updated_at")?;
    let cancelled_at = column(&row, "cancelled_at")?;
    let refunded_at = column(&row, "refunded_at")?;

    let currency = Currency::new(&currency)
        .map_err(|e| DomainError::database(format!("Invalid stored currency: {}", e)))?;
    let line_items: Vec<LineItem> = serde_json::from_value(line_items)
        .map_err(|e| DomainError::database(format!("Invalid stored line items: {}", e)))?;
    let discount = match (discount_code, discount_minor) {
        (Some(code), Some(minor)) => Some(AppliedDiscount {
            code,
            amount: money(minor, &currency)?,
        }),
        _ => None,
    };

    Ok(Order {
        id: OrderId::from_uuid(id),
        user_id: UserId::new(user_id)
            .map_err(|e| DomainError::database(format!("Invalid stored user id: {}", e)))?,
        line_items,
        subtotal: money(subtotal_minor, &currency)?,
        total: money(total_minor, &currency)?,
        currency,
        discount,
        status: status
            .parse()
            .map_err(|_| DomainError::database(format!("Invalid order status: {}", status)))?,
        payment_provider: ProviderId::new(payment_provider)
            .map_err(|e| DomainError::database(format!("Invalid stored provider: {}", e)))?,
        payment_id,
        paid_at: timestamp(paid_at),
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
        cancelled_at: timestamp(cancelled_at),
        refunded_at: timestamp(refunded_at),
    })
}
