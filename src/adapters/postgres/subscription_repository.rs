//! PostgreSQL implementation of SubscriptionRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{
    Currency, DomainError, ErrorCode, Money, SubscriptionId, Timestamp, UserId,
};
use crate::domain::subscription::{Subscription, SubscriptionMetadata, SubscriptionStatus};
use crate::ports::SubscriptionRepository;

/// PostgreSQL implementation of SubscriptionRepository.
#[derive(Clone)]
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, plan_ref, status, next_payment_date, amount_minor,
                   currency, paused_at, resumed_at, created_at, updated_at, canceled_at
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to fetch subscription: {}", e)))?;

        row.map(row_to_subscription).transpose()
    }

    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, user_id, plan_ref, status, next_payment_date, amount_minor,
                currency, paused_at, resumed_at, created_at, updated_at, canceled_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_str())
        .bind(&subscription.plan_ref)
        .bind(subscription.status.as_str())
        .bind(subscription.next_payment_date.as_datetime())
        .bind(subscription.amount.minor_units())
        .bind(subscription.amount.currency().code())
        .bind(subscription.metadata.paused_at.map(|t| *t.as_datetime()))
        .bind(subscription.metadata.resumed_at.map(|t| *t.as_datetime()))
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .bind(subscription.canceled_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert subscription: {}", e)))?;

        Ok(())
    }

    async fn update_if_status(
        &self,
        subscription: &Subscription,
        expected: SubscriptionStatus,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                status = $3,
                next_payment_date = $4,
                paused_at = $5,
                resumed_at = $6,
                updated_at = $7,
                canceled_at = $8
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(expected.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.next_payment_date.as_datetime())
        .bind(subscription.metadata.paused_at.map(|t| *t.as_datetime()))
        .bind(subscription.metadata.resumed_at.map(|t| *t.as_datetime()))
        .bind(subscription.updated_at.as_datetime())
        .bind(subscription.canceled_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update subscription: {}", e)))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        let exists: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE id = $1")
            .bind(subscription.id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                DomainError::database(format!("Failed to check subscription existence: {}", e))
            })?;

        if exists.0 == 0 {
            return Err(DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("Subscription not found: {}", subscription.id),
            ));
        }
        Ok(false)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn row_to_subscription(row: PgRow) -> Result<Subscription, DomainError> {
    let get_err = |name: &str, e: sqlx::Error| {
        DomainError::database(format!("Failed to get {}: {}", name, e))
    };

    let id: uuid::Uuid = row.try_get("id").map_err(|e| get_err("id", e))?;
    let user_id: String = row.try_get("user_id").map_err(|e| get_err("user_id", e))?;
    let plan_ref: String = row.try_get("plan_ref").map_err(|e| get_err("plan_ref", e))?;
    let status: String = row.try_get("status").map_err(|e| get_err("status", e))?;
    let next_payment_date: chrono::DateTime<chrono::Utc> = row
        .try_get("next_payment_date")
        .map_err(|e| get_err("next_payment_date", e))?;
    let amount_minor: i64 = row
        .try_get("amount_minor")
        .map_err(|e| get_err("amount_minor", e))?;
    let currency: String = row.try_get("currency").map_err(|e| get_err("currency", e))?;
    let paused_at: Option<chrono::DateTime<chrono::Utc>> = row
        .try_get("paused_at")
        .map_err(|e| get_err("paused_at", e))?;
    let resumed_at: Option<chrono::DateTime<chrono::Utc>> = row
        .try_get("resumed_at")
        .map_err(|e| get_err("resumed_at", e))?;
    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(|e| get_err("created_at", e))?;
    let updated_at: chrono::DateTime<chrono::Utc> = row
        .try_get("updated_at")
        .map_err(|e| get_err("updated_at", e))?;
    let canceled_at: Option<chrono::DateTime<chrono::Utc>> = row
        .try_get("canceled_at")
        .map_err(|e| get_err("canceled_at", e))?;

    let amount = Currency::new(&currency)
        .and_then(|c| Money::new(amount_minor, c))
        .map_err(|e| DomainError::database(format!("Invalid stored amount: {}", e)))?;

    Ok(Subscription {
        id: SubscriptionId::from_uuid(id),
        user_id: UserId::new(user_id)
            .map_err(|e| DomainError::database(format!("Invalid stored user id: {}", e)))?,
        plan_ref,
        status: status.parse().map_err(|_| {
            DomainError::database(format!("Invalid subscription status: {}", status))
        })?,
        next_payment_date: Timestamp::from_datetime(next_payment_date),
        amount,
        metadata: SubscriptionMetadata {
            paused_at: paused_at.map(Timestamp::from_datetime),
            resumed_at: resumed_at.map(Timestamp::from_datetime),
        },
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
        canceled_at: canceled_at.map(Timestamp::from_datetime),
    })
}
