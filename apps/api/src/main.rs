mod auth;
mod config;
mod db;
mod errors;
mod generation;
mod llm_client;
mod models;
mod routes;
mod state;
mod users;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::generation::entitlement::QuotaPolicy;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::users::postgres::PgUserStore;
use crate::users::store::{InMemoryUserStore, UserStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ResumeBot API v{}", env!("CARGO_PKG_VERSION"));

    // User store: PostgreSQL when configured, otherwise process-local
    let users: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => Arc::new(PgUserStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL not set; using in-memory user store");
            Arc::new(InMemoryUserStore::new())
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new(config.openai_api_key.clone(), &config.openai_api_base)?;
    if llm.is_configured() {
        info!("LLM client initialized (model: {})", llm_client::MODEL);
    } else {
        warn!("OPENAI_API_KEY not set; generation requests will fail with a configuration error");
    }

    let quota = QuotaPolicy {
        free_monthly_quota: config.free_tier_monthly_quota,
    };
    info!("Free tier quota: {} generation(s) per month", quota.free_monthly_quota);

    let state = AppState {
        users,
        llm: Arc::new(llm),
        quota,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the frontend origin

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
