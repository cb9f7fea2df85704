use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

/// Subscription level of a user. Controls feature access and quota.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Premium,
    Pro,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Premium => "premium",
            Tier::Pro => "pro",
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, Tier::Free)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "premium" => Ok(Tier::Premium),
            "pro" => Ok(Tier::Pro),
            other => Err(format!("unknown tier '{other}'")),
        }
    }
}

pub const ACTIVE_SUBSCRIPTION: &str = "active";

/// A user as seen by the generation core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub tier: Tier,
    pub subscription_status: String,
    pub stripe_customer_id: Option<String>,
    /// Generations recorded in the current usage period.
    pub usage_this_period: u32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn subscription_active(&self) -> bool {
        self.subscription_status == ACTIVE_SUBSCRIPTION
    }

    /// The tier used for entitlement decisions. A lapsed subscription falls back to free.
    pub fn effective_tier(&self) -> Tier {
        if self.subscription_active() {
            self.tier
        } else {
            Tier::Free
        }
    }
}

/// Request body for creating a user. The tier is not caller-controlled: new users
/// start on free and only billing changes it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub subscription_status: Option<String>,
}

/// Validated fields for a user insert.
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub email: String,
    pub tier: Tier,
    pub subscription_status: String,
    pub stripe_customer_id: Option<String>,
}

#[cfg(test)]
impl UserDraft {
    /// An active user on `tier`. Used to seed stores directly.
    pub fn active(email: impl Into<String>, tier: Tier) -> Self {
        Self {
            email: email.into(),
            tier,
            subscription_status: ACTIVE_SUBSCRIPTION.to_string(),
            stripe_customer_id: None,
        }
    }
}

impl TryFrom<NewUser> for UserDraft {
    type Error = AppError;

    fn try_from(new_user: NewUser) -> Result<Self, Self::Error> {
        let email = new_user
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;

        Ok(UserDraft {
            email,
            tier: Tier::Free,
            subscription_status: new_user
                .subscription_status
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| ACTIVE_SUBSCRIPTION.to_string()),
            stripe_customer_id: new_user.stripe_customer_id.filter(|s| !s.is_empty()),
        })
    }
}

/// Per-user generation counter, scoped to one usage period.
///
/// Every store applies usage changes through this type so the rollover and limit
/// rules live in one place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageCounter {
    pub period: Option<String>,
    pub count: u32,
}

impl UsageCounter {
    pub fn in_period(&self, period: &str) -> u32 {
        match self.period.as_deref() {
            Some(p) if p == period => self.count,
            _ => 0,
        }
    }

    /// Counts one generation in `period` unless that would exceed `limit`.
    /// Returns whether the generation was counted.
    pub fn try_reserve(&mut self, period: &str, limit: Option<u32>) -> bool {
        let used = self.in_period(period);
        if limit.is_some_and(|limit| used >= limit) {
            return false;
        }
        self.period = Some(period.to_string());
        self.count = used + 1;
        true
    }

    /// Gives back one generation counted in `period`. A counter that has since
    /// rolled over is left alone.
    pub fn release(&mut self, period: &str) {
        if self.period.as_deref() == Some(period) {
            self.count = self.count.saturating_sub(1);
        }
    }
}

/// Row shape of the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub tier: String,
    pub subscription_status: String,
    pub stripe_customer_id: Option<String>,
    pub usage_period: Option<String>,
    pub usage_count: i32,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    /// Converts the row, counting usage only if it was recorded in `current_period`.
    pub fn into_user(self, current_period: &str) -> User {
        let tier = self.tier.parse::<Tier>().unwrap_or_else(|e| {
            tracing::warn!("User {} has {e}; treating as free", self.id);
            Tier::Free
        });
        let usage_this_period = UsageCounter {
            period: self.usage_period,
            count: self.usage_count.max(0) as u32,
        }
        .in_period(current_period);

        User {
            id: self.id,
            email: self.email,
            tier,
            subscription_status: self.subscription_status,
            stripe_customer_id: self.stripe_customer_id,
            usage_this_period,
            created_at: self.created_at,
        }
    }
}

/// The usage period containing `now`, as `YYYY-MM` (UTC calendar month).
pub fn usage_period(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(tier: &str, period: Option<&str>, count: i32) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "dev@example.com".to_string(),
            tier: tier.to_string(),
            subscription_status: "active".to_string(),
            stripe_customer_id: None,
            usage_period: period.map(str::to_string),
            usage_count: count,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_tier_parses_case_insensitively() {
        assert_eq!("Premium".parse::<Tier>().unwrap(), Tier::Premium);
        assert_eq!("pro".parse::<Tier>().unwrap(), Tier::Pro);
        assert!("gold".parse::<Tier>().is_err());
    }

    #[test]
    fn test_tier_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Tier::Premium).unwrap(), r#""premium""#);
        let tier: Tier = serde_json::from_str(r#""free""#).unwrap();
        assert_eq!(tier, Tier::Free);
    }

    #[test]
    fn test_lapsed_subscription_falls_back_to_free() {
        let mut user = row("pro", None, 0).into_user("2026-10");
        assert_eq!(user.effective_tier(), Tier::Pro);

        user.subscription_status = "canceled".to_string();
        assert_eq!(user.effective_tier(), Tier::Free);
    }

    #[test]
    fn test_usage_from_previous_period_is_not_counted() {
        let user = row("free", Some("2026-09"), 3).into_user("2026-10");
        assert_eq!(user.usage_this_period, 0);

        let user = row("free", Some("2026-10"), 3).into_user("2026-10");
        assert_eq!(user.usage_this_period, 3);
    }

    #[test]
    fn test_unknown_tier_in_row_is_treated_as_free() {
        let user = row("platinum", None, 0).into_user("2026-10");
        assert_eq!(user.tier, Tier::Free);
    }

    #[test]
    fn test_reserve_respects_limit_within_period() {
        let mut counter = UsageCounter::default();
        assert!(counter.try_reserve("2026-10", Some(2)));
        assert!(counter.try_reserve("2026-10", Some(2)));
        assert!(!counter.try_reserve("2026-10", Some(2)));
        assert_eq!(counter.in_period("2026-10"), 2);
    }

    #[test]
    fn test_reserve_rolls_over_to_new_period() {
        let mut counter = UsageCounter {
            period: Some("2026-09".to_string()),
            count: 7,
        };
        assert_eq!(counter.in_period("2026-10"), 0);
        assert!(counter.try_reserve("2026-10", Some(1)));
        assert_eq!(
            counter,
            UsageCounter {
                period: Some("2026-10".to_string()),
                count: 1,
            }
        );
    }

    #[test]
    fn test_unlimited_reserve_always_counts() {
        let mut counter = UsageCounter::default();
        for _ in 0..5 {
            assert!(counter.try_reserve("2026-10", None));
        }
        assert_eq!(counter.in_period("2026-10"), 5);
    }

    #[test]
    fn test_release_gives_back_a_slot() {
        let mut counter = UsageCounter::default();
        assert!(counter.try_reserve("2026-10", Some(1)));
        counter.release("2026-10");
        assert_eq!(counter.in_period("2026-10"), 0);
        assert!(counter.try_reserve("2026-10", Some(1)));
    }

    #[test]
    fn test_release_ignores_other_period_and_never_underflows() {
        let mut counter = UsageCounter {
            period: Some("2026-10".to_string()),
            count: 0,
        };
        counter.release("2026-10");
        assert_eq!(counter.count, 0);

        counter.count = 3;
        counter.release("2026-09");
        assert_eq!(counter.count, 3);
    }

    #[test]
    fn test_new_user_always_starts_free() {
        let body: NewUser = serde_json::from_value(serde_json::json!({
            "email": "ada@example.com",
            "tier": "pro"
        }))
        .unwrap();
        let draft = UserDraft::try_from(body).unwrap();
        assert_eq!(draft.tier, Tier::Free);
        assert_eq!(draft.subscription_status, "active");
    }

    #[test]
    fn test_new_user_requires_email() {
        let err = UserDraft::try_from(NewUser {
            email: Some("   ".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Email is required"));
    }

    #[test]
    fn test_usage_period_is_year_month() {
        let now = Utc.with_ymd_and_hms(2026, 1, 31, 23, 59, 59).unwrap();
        assert_eq!(usage_period(now), "2026-01");
    }
}
