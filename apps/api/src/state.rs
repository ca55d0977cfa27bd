use std::sync::Arc;

use crate::config::Config;
use crate::ranking::engine::RankingEngine;
use crate::store::CandidateStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Ranking engine wrapping the scorer selected by `MATCH_STRATEGY`.
    pub engine: Arc<RankingEngine>,
    /// Roster source. JSON file or PostgreSQL, optionally cached.
    pub store: Arc<dyn CandidateStore>,
    pub config: Config,
}
