//! PostgreSQL implementation of DiscountRepository.
//!
//! Codes are stored uppercase, so a lookup by normalized `DiscountCode` is
//! an exact match on `upper(code)`.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::discount::{Discount, DiscountCode, DiscountStatus, DiscountValue};
use crate::domain::foundation::{DiscountId, DomainError, Timestamp, UserId};
use crate::ports::DiscountRepository;

/// PostgreSQL implementation of DiscountRepository.
#[derive(Clone)]
pub struct PostgresDiscountRepository {
    pool: PgPool,
}

impl PostgresDiscountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DiscountRepository for PostgresDiscountRepository {
    async fn find_by_code(&self, code: &DiscountCode) -> Result<Option<Discount>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, code, value_type, value, starts_at, ends_at, max_usage,
                   max_usage_per_user, owner_user_id, status, created_at
            FROM discounts
            WHERE upper(code) = $1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch discount: {}", e)))?;

        row.map(row_to_discount).transpose()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn str_to_value(kind: &str, value: i64) -> Result<DiscountValue, DomainError> {
    match kind {
        "percentage" => u32::try_from(value)
            .map(DiscountValue::Percentage)
            .map_err(|_| DomainError::database(format!("Invalid percentage: {}", value))),
        "fixed" => Ok(DiscountValue::Fixed(value)),
        _ => Err(DomainError::database(format!(
            "Invalid discount value type: {}",
            kind
        ))),
    }
}

fn str_to_status(s: &str) -> Result<DiscountStatus, DomainError> {
    match s {
        "active" => Ok(DiscountStatus::Active),
        "inactive" => Ok(DiscountStatus::Inactive),
        _ => Err(DomainError::database(format!(
            "Invalid discount status: {}",
            s
        ))),
    }
}

fn usage_limit(value: Option<i32>, name: &str) -> Result<Option<u32>, DomainError> {
    value
        .map(|v| {
            u32::try_from(v)
                .map_err(|_| DomainError::database(format!("Invalid {}: {}", name, v)))
        })
        .transpose()
}

fn row_to_discount(row: PgRow) -> Result<Discount, DomainError> {
    let get_err = |name: &str, e: sqlx::Error| {
        DomainError::database(format!("Failed to get {}: {}", name, e))
    };

    let id: uuid::Uuid = row.try_get("id").map_err(|e| get_err("id", e))?;
    let code: String = row.try_get("code").map_err(|e| get_err("code", e))?;
    let value_type: String = row
        .try_get("value_type")
        .map_err(|e| get_err("value_type", e))?;
    let value: i64 = row.try_get("value").map_err(|e| get_err("value", e))?;
    let starts_at: Option<chrono::DateTime<chrono::Utc>> = row
        .try_get("starts_at")
        .map_err(|e| get_err("starts_at", e))?;
    let ends_at: Option<chrono::DateTime<chrono::Utc>> =
        row.try_get("ends_at").map_err(|e| get_err("ends_at", e))?;
    let max_usage: Option<i32> = row
        .try_get("max_usage")
        .map_err(|e| get_err("max_usage", e))?;
    let max_usage_per_user: Option<i32> = row
        .try_get("max_usage_per_user")
        .map_err(|e| get_err("max_usage_per_user", e))?;
    let owner: Option<String> = row
        .try_get("owner_user_id")
        .map_err(|e| get_err("owner_user_id", e))?;
    let status: String = row.try_get("status").map_err(|e| get_err("status", e))?;
    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(|e| get_err("created_at", e))?;

    Ok(Discount {
        id: DiscountId::from_uuid(id),
        code: DiscountCode::try_new(&code)
            .map_err(|e| DomainError::database(format!("Invalid stored code: {}", e)))?,
        value: str_to_value(&value_type, value)?,
        starts_at: starts_at.map(Timestamp::from_datetime),
        ends_at: ends_at.map(Timestamp::from_datetime),
        max_usage: usage_limit(max_usage, "max_usage")?,
        max_usage_per_user: usage_limit(max_usage_per_user, "max_usage_per_user")?,
        owner: owner
            .map(UserId::new)
            .transpose()
            .map_err(|e| DomainError::database(format!("Invalid stored owner: {}", e)))?,
        status: str_to_status(&status)?,
        created_at: Timestamp::from_datetime(created_at),
    })
}
