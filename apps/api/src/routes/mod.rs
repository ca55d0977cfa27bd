pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::ranking::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/match", post(handlers::handle_match))
        .route(
            "/candidates/refresh",
            post(handlers::handle_refresh_candidates),
        )
        .with_state(state)
}
