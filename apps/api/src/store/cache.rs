use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::candidate::CandidateRecord;
use crate::store::CandidateStore;

/// Serves the last successfully loaded roster until [`CandidateStore::invalidate`]
/// is called. Failed loads are not cached.
pub struct CachedStore<S> {
    inner: S,
    roster: RwLock<Option<Vec<CandidateRecord>>>,
}

impl<S: CandidateStore> CachedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            roster: RwLock::new(None),
        }
    }
}

#[async_trait]
impl<S: CandidateStore> CandidateStore for CachedStore<S> {
    async fn load_candidates(&self) -> Result<Vec<CandidateRecord>, AppError> {
        if let Some(roster) = self.roster.read().await.as_ref() {
            debug!("Serving {} candidates from cache", roster.len());
            return Ok(roster.clone());
        }

        let mut slot = self.roster.write().await;
        // Another request may have filled the cache while we waited.
        if let Some(roster) = slot.as_ref() {
            return Ok(roster.clone());
        }

        let roster = self.inner.load_candidates().await?;
        info!("Cached {} candidates", roster.len());
        *slot = Some(roster.clone());
        Ok(roster)
    }

    async fn invalidate(&self) {
        *self.roster.write().await = None;
        self.inner.invalidate().await;
        info!("Candidate cache invalidated");
    }
}
