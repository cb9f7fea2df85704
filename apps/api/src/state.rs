use std::sync::Arc;

use crate::generation::entitlement::QuotaPolicy;
use crate::llm_client::CompletionProvider;
use crate::users::store::UserStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable user store. Default: InMemoryUserStore. PgUserStore when DATABASE_URL is set.
    pub users: Arc<dyn UserStore>,
    /// Completion provider. Production: LlmClient (OpenAI chat completions).
    pub llm: Arc<dyn CompletionProvider>,
    pub quota: QuotaPolicy,
}
