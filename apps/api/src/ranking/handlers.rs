//! Axum route handlers for the matching API.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::JobDescription;
use crate::models::ranking::RankingResult;
use crate::ranking::engine::RankingEngine;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub job: JobDescription,
    /// Overrides the configured shortlist size for this request.
    #[serde(default)]
    pub top_k: Option<i64>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /match
///
/// Validates the request, loads the roster, ranks it against the job and returns the shortlist,
/// best first.
pub async fn handle_match(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<RankingResult>, AppError> {
    let span = info_span!(
        "match",
        request_id = %Uuid::new_v4(),
        backend = state.engine.backend()
    );

    async move {
        let top_k = request.top_k.unwrap_or(state.config.top_k);
        RankingEngine::validate(&request.job, top_k)?;
        let candidates = state.store.load_candidates().await?;

        let shortlist = state
            .engine
            .rank(&request.job, &candidates, top_k)
            .await?;

        info!(
            "Matched '{}' for {}: {} of {} candidates shortlisted",
            request.job.title,
            request.job.cst_name,
            shortlist.len(),
            candidates.len()
        );

        Ok::<_, AppError>(Json(shortlist))
    }
    .instrument(span)
    .await
}

/// POST /candidates/refresh
///
/// Invalidates the cached roster. A no-op when caching is disabled.
pub async fn handle_refresh_candidates(State(state): State<AppState>) -> StatusCode {
    state.store.invalidate().await;
    StatusCode::NO_CONTENT
}
