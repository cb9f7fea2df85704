//! Entitlement check — decides whether a tier may generate a content type.
//!
//! Usage counts and quotas are owned elsewhere (the user store and config); this
//! module only consumes them.

use std::fmt;

use crate::errors::AppError;
use crate::generation::models::ContentType;
use crate::models::user::Tier;

/// Monthly generation allowance for the free tier. Paid tiers are unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub free_monthly_quota: u32,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            free_monthly_quota: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    LinkedinRequiresPaidTier,
    QuotaExceeded { used: u32, quota: u32 },
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::LinkedinRequiresPaidTier => f.write_str("linkedin requires paid tier"),
            DenialReason::QuotaExceeded { .. } => f.write_str("quota exceeded"),
        }
    }
}

impl From<DenialReason> for AppError {
    fn from(reason: DenialReason) -> Self {
        AppError::Entitlement(reason.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entitlement {
    Allowed,
    Denied(DenialReason),
}

impl Entitlement {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Entitlement::Allowed)
    }

    /// Converts a denial into the `EntitlementError` surfaced to the caller.
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Entitlement::Allowed => Ok(()),
            Entitlement::Denied(reason) => {
                if let DenialReason::QuotaExceeded { used, quota } = reason {
                    tracing::info!("Free tier quota exhausted ({used}/{quota})");
                }
                Err(reason.into())
            }
        }
    }
}

/// LinkedIn content is paid-only; the free tier is capped at `quota.free_monthly_quota`
/// generations per period. The content-type rule is checked first.
pub fn check_entitlement(
    tier: Tier,
    content_type: ContentType,
    usage_this_period: u32,
    quota: &QuotaPolicy,
) -> Entitlement {
    if content_type == ContentType::Linkedin && !tier.is_paid() {
        return Entitlement::Denied(DenialReason::LinkedinRequiresPaidTier);
    }

    if !tier.is_paid() && usage_this_period >= quota.free_monthly_quota {
        return Entitlement::Denied(DenialReason::QuotaExceeded {
            used: usage_this_period,
            quota: quota.free_monthly_quota,
        });
    }

    Entitlement::Allowed
}
