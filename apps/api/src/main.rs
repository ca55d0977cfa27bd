mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod ranking;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::ranking::build_scorer;
use crate::ranking::engine::RankingEngine;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::build_store;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on invalid or missing values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Talent Match API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize candidate roster source
    let store = build_store(&config).await?;

    // Initialize scorer (heuristic by default — swap via MATCH_STRATEGY)
    let scorer = build_scorer(&config)?;
    let engine = Arc::new(RankingEngine::new(scorer));
    info!(
        "Ranking engine initialized (strategy: {}, top_k: {})",
        config.strategy, config.top_k
    );

    let state = AppState {
        engine,
        store,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
