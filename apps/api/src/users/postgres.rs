use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{usage_period, UsageCounter, User, UserDraft, UserRow};
use crate::users::store::{unknown_user, UserStore};

/// PostgreSQL-backed user store over the single `users` table
/// (schema in `migrations/0001_create_users.sql`).
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies `update` to the user's counter inside a transaction holding the row
    /// lock (`SELECT ... FOR UPDATE`), so concurrent updates serialize per user.
    async fn update_usage<T>(
        &self,
        user_id: Uuid,
        update: impl FnOnce(&mut UsageCounter, &str) -> T + Send,
    ) -> Result<T, AppError>
    where
        T: Send,
    {
        let period = usage_period(Utc::now());
        let mut tx = self.pool.begin().await?;

        let (stored_period, stored_count) = sqlx::query_as::<_, (Option<String>, i32)>(
            "SELECT usage_period, usage_count FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| unknown_user(user_id))?;

        let mut counter = UsageCounter {
            period: stored_period,
            count: stored_count.max(0) as u32,
        };
        let before = counter.clone();
        let outcome = update(&mut counter, &period);

        if counter != before {
            sqlx::query("UPDATE users SET usage_period = $2, usage_count = $3 WHERE id = $1")
                .bind(user_id)
                .bind(&counter.period)
                .bind(counter.count as i32)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(outcome)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn lookup_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        let period = usage_period(Utc::now());
        Ok(row.map(|r| r.into_user(&period)))
    }

    async fn increment_usage(&self, user_id: Uuid) -> Result<(), AppError> {
        self.update_usage(user_id, |usage, period| {
            usage.try_reserve(period, None);
        })
        .await
    }

    async fn reserve_usage(&self, user_id: Uuid, limit: u32) -> Result<bool, AppError> {
        self.update_usage(user_id, |usage, period| {
            usage.try_reserve(period, Some(limit))
        })
        .await
    }

    async fn release_usage(&self, user_id: Uuid) -> Result<(), AppError> {
        self.update_usage(user_id, |usage, period| usage.release(period))
            .await
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;

        let period = usage_period(Utc::now());
        Ok(rows.into_iter().map(|r| r.into_user(&period)).collect())
    }

    async fn create_user(&self, draft: UserDraft) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, tier, subscription_status, stripe_customer_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&draft.email)
        .bind(draft.tier.as_str())
        .bind(&draft.subscription_status)
        .bind(&draft.stripe_customer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_user(&usage_period(Utc::now())))
    }
}
