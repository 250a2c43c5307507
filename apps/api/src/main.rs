mod analysis;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod routes;
mod session;
mod state;
mod tailoring;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::taxonomy::Taxonomy;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::session::store::{InMemorySessionStore, PgSessionStore, SessionStore};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Session store: Postgres when configured, in-memory otherwise
    let store: Arc<dyn SessionStore> = match &config.database_url {
        Some(url) => Arc::new(PgSessionStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL not set; sessions are kept in memory and lost on restart");
            Arc::new(InMemorySessionStore::new())
        }
    };

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.oracle_timeout)
        .context("Failed to build LLM client")?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Domain term list and matcher, built once
    let taxonomy = Taxonomy::builtin().context("Failed to build keyword matcher")?;
    info!("Keyword taxonomy loaded ({} terms)", taxonomy.terms().len());

    let state = AppState::new(
        store,
        Arc::new(llm),
        Arc::new(taxonomy),
        config.tailoring.clone(),
    );

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
