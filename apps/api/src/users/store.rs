//! User Store — the storage seam behind user lookup and usage counting.
//!
//! The generation core only ever sees `Arc<dyn UserStore>`. Two backends:
//! - `InMemoryUserStore`: default, process-local, used by tests.
//! - `PgUserStore` (see `postgres.rs`): selected when `DATABASE_URL` is set.
//!
//! Usage changes are atomic per user: a reservation checks the limit and counts the
//! generation in one step, so concurrent requests cannot overshoot a quota.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{usage_period, Tier, UsageCounter, User, UserDraft};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn lookup_user(&self, user_id: Uuid) -> Result<Option<User>, AppError>;

    /// Records one more generation for the user in the current usage period.
    async fn increment_usage(&self, user_id: Uuid) -> Result<(), AppError>;

    /// Records one more generation only if the user is below `limit` for the current
    /// period. Returns `false`, changing nothing, when the limit is already reached.
    async fn reserve_usage(&self, user_id: Uuid, limit: u32) -> Result<bool, AppError>;

    /// Undoes one reservation made in the current period.
    async fn release_usage(&self, user_id: Uuid) -> Result<(), AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    async fn create_user(&self, draft: UserDraft) -> Result<User, AppError>;
}

pub(crate) fn unknown_user(user_id: Uuid) -> AppError {
    AppError::Internal(anyhow::anyhow!(
        "cannot record usage for unknown user {user_id}"
    ))
}

struct UserRecord {
    id: Uuid,
    email: String,
    tier: Tier,
    subscription_status: String,
    stripe_customer_id: Option<String>,
    usage: UsageCounter,
    created_at: DateTime<Utc>,
}

impl UserRecord {
    fn to_user(&self, current_period: &str) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            tier: self.tier,
            subscription_status: self.subscription_status.clone(),
            stripe_customer_id: self.stripe_customer_id.clone(),
            usage_this_period: self.usage.in_period(current_period),
            created_at: self.created_at,
        }
    }
}

/// Process-local user store. State lives in the instance, never in statics.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `update` to the user's counter while holding the write lock.
    async fn update_usage<T>(
        &self,
        user_id: Uuid,
        update: impl FnOnce(&mut UsageCounter, &str) -> T + Send,
    ) -> Result<T, AppError>
    where
        T: Send,
    {
        let period = usage_period(Utc::now());
        let mut users = self.users.write().await;
        let record = users.get_mut(&user_id).ok_or_else(|| unknown_user(user_id))?;
        Ok(update(&mut record.usage, &period))
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn lookup_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let period = usage_period(Utc::now());
        let users = self.users.read().await;
        Ok(users.get(&user_id).map(|r| r.to_user(&period)))
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
        let period = usage_period(Utc::now());
        let users = self.users.read().await;
        let mut list: Vec<User> = users.values().map(|r| r.to_user(&period)).collect();
        list.sort_by_key(|u| u.created_at);
        Ok(list)
    }

    async fn create_user(&self, draft: UserDraft) -> Result<User, AppError> {
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: draft.email,
            tier: draft.tier,
            subscription_status: draft.subscription_status,
            stripe_customer_id: draft.stripe_customer_id,
            usage: UsageCounter::default(),
            created_at: Utc::now(),
        };
        let user = record.to_user(&usage_period(Utc::now()));
        self.users.write().await.insert(record.id, record);
        Ok(user)
    }
}
