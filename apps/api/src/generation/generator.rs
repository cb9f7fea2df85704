//! Generation — orchestrates one request end to end.
//!
//! Flow: lookup_user → entitlement → reserve quota (free tier) → build_prompt →
//!       one completion call → extract_sections → record usage → return result.
//!
//! Nothing is retried. A free-tier generation reserves its quota slot before the
//! completion call and gives it back if the call fails. Paid tiers have no quota, so
//! their usage is recorded only after a successful completion.

use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::entitlement::{check_entitlement, DenialReason, QuotaPolicy};
use crate::generation::extractor::extract_sections;
use crate::generation::models::{ContentType, GenerationRequest, GenerationResult};
use crate::generation::prompts::build_prompt;
use crate::llm_client::{CompletionProvider, CompletionRequest, LlmError};
use crate::users::store::UserStore;

pub const TEMPERATURE: f32 = 0.7;
pub const MAX_OUTPUT_TOKENS: u32 = 1500;

const GENERIC_UPSTREAM_ERROR: &str = "OpenAI API error";

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::NotConfigured => {
                AppError::Configuration(LlmError::NotConfigured.to_string())
            }
            LlmError::Api { message, .. } => AppError::Upstream(message),
            LlmError::Http(e) => AppError::Upstream(e.to_string()),
            LlmError::Parse(_) => AppError::Upstream(GENERIC_UPSTREAM_ERROR.to_string()),
        }
    }
}

/// Runs one generation for `user_id`.
pub async fn generate(
    users: &dyn UserStore,
    llm: &dyn CompletionProvider,
    quota: &QuotaPolicy,
    user_id: Uuid,
    input: String,
    content_type: ContentType,
) -> Result<GenerationResult, AppError> {
    let user = users
        .lookup_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("user not found".to_string()))?;

    let request = GenerationRequest {
        input,
        content_type,
        user_tier: user.effective_tier(),
    };

    check_entitlement(
        request.user_tier,
        request.content_type,
        user.usage_this_period,
        quota,
    )
    .into_result()?;

    let reserved = !request.user_tier.is_paid();
    if reserved && !users.reserve_usage(user_id, quota.free_monthly_quota).await? {
        // Another request took the last slot between lookup and reservation.
        return Err(DenialReason::QuotaExceeded {
            used: user.usage_this_period.max(quota.free_monthly_quota),
            quota: quota.free_monthly_quota,
        }
        .into());
    }

    info!(
        "Generating {:?} for user {} (tier {})",
        request.content_type, user_id, request.user_tier
    );

    let completion = CompletionRequest {
        prompt: build_prompt(&request.input, request.content_type),
        temperature: TEMPERATURE,
        max_tokens: MAX_OUTPUT_TOKENS,
    };
    let raw_text = match llm.complete(&completion).await {
        Ok(text) => text,
        Err(e) => {
            if reserved {
                if let Err(release_err) = users.release_usage(user_id).await {
                    warn!("Failed to release quota slot for user {user_id}: {release_err}");
                }
            }
            return Err(e.into());
        }
    };

    let result = extract_sections(&raw_text, request.content_type);

    if !reserved {
        if let Err(e) = users.increment_usage(user_id).await {
            warn!("Failed to record usage for user {user_id}: {e}");
        }
    }

    Ok(result)
}
