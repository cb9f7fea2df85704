//! Axum route handlers for the Generation API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::CallerId;
use crate::errors::AppError;
use crate::generation::generator::generate;
use crate::generation::models::{ContentType, GenerationResult};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// Raw request body. Fields stay loosely typed so bad values surface as
/// `{ "error": ... }` validation errors rather than extractor rejections.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateBody {
    pub input: Option<Value>,
    #[serde(rename = "contentType", alias = "type")]
    pub content_type: Option<String>,
}

impl GenerateBody {
    /// Returns the verbatim input and the requested content type (default: resume).
    pub fn validate(self) -> Result<(String, ContentType), AppError> {
        let input = match self.input {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => return Err(AppError::Validation("Missing or invalid input".to_string())),
        };

        let content_type = match self.content_type {
            None => ContentType::default(),
            Some(raw) => raw.parse::<ContentType>().map_err(AppError::Validation)?,
        };

        Ok((input, content_type))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/generate
///
/// Generates resume + cover letter, or LinkedIn profile sections, for the caller.
pub async fn handle_generate(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    payload: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<GenerationResult>, AppError> {
    let Json(body) = payload?;
    let (input, content_type) = body.validate()?;

    let result = generate(
        state.users.as_ref(),
        state.llm.as_ref(),
        &state.quota,
        user_id,
        input,
        content_type,
    )
    .await?;

    Ok(Json(result))
}
