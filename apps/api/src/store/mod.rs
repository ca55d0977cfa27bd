//! Candidate stores — where the roster comes from.
//!
//! `AppState` holds an `Arc<dyn CandidateStore>`, chosen at startup:
//! PostgreSQL when `DATABASE_URL` is set, the JSON file otherwise, optionally
//! wrapped in a process-wide cache.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::config::Config;
use crate::db::create_pool;
use crate::errors::AppError;
use crate::models::candidate::CandidateRecord;

pub mod cache;
pub mod json_file;
pub mod postgres;

pub use cache::CachedStore;
pub use json_file::JsonFileStore;
pub use postgres::PgCandidateStore;

#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Loads the full roster. Missing or malformed data is `DataUnavailable`.
    async fn load_candidates(&self) -> Result<Vec<CandidateRecord>, AppError>;

    /// Drops any cached roster so the next load reads the backing source.
    async fn invalidate(&self) {}
}

pub async fn build_store(config: &Config) -> Result<Arc<dyn CandidateStore>> {
    let store: Arc<dyn CandidateStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            info!("Candidate roster source: PostgreSQL");
            wrap(PgCandidateStore::new(pool), config.candidate_cache)
        }
        None => {
            info!(
                "Candidate roster source: {}",
                config.candidates_file.display()
            );
            wrap(
                JsonFileStore::new(config.candidates_file.clone()),
                config.candidate_cache,
            )
        }
    };
    Ok(store)
}

fn wrap<S: CandidateStore + 'static>(store: S, cached: bool) -> Arc<dyn CandidateStore> {
    if cached {
        info!("Candidate roster cache enabled (invalidate via POST /candidates/refresh)");
        Arc::new(CachedStore::new(store))
    } else {
        Arc::new(store)
    }
}
