use anyhow::{Context, Result};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Application configuration loaded from environment variables.
///
/// Nothing here is required at startup: a missing `OPENAI_API_KEY` is reported per
/// request as a configuration error, and a missing `DATABASE_URL` selects the
/// in-memory user store.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_api_base: String,
    pub database_url: Option<String>,
    pub free_tier_monthly_quota: u32,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_api_base: optional_env("OPENAI_API_BASE")
                .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string()),
            database_url: optional_env("DATABASE_URL"),
            free_tier_monthly_quota: optional_env("FREE_TIER_MONTHLY_QUOTA")
                .unwrap_or_else(|| "1".to_string())
                .parse::<u32>()
                .context("FREE_TIER_MONTHLY_QUOTA must be a non-negative integer")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Reads an env var, treating an empty or whitespace-only value as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
