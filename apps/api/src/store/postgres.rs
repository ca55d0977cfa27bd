use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::candidate::{validate_roster, CandidateRecord, CandidateRow};
use crate::store::CandidateStore;

const SELECT_CANDIDATES: &str = r#"
    SELECT id, first_name, last_name, title, skills, is_staffed,
           staffing_end_date, years_experience, industry_experience, location
    FROM candidates
    ORDER BY id
"#;

/// Roster stored in the `candidates` table.
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn load_candidates(&self) -> Result<Vec<CandidateRecord>, AppError> {
        let rows = sqlx::query_as::<_, CandidateRow>(SELECT_CANDIDATES)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DataUnavailable(format!("candidates query failed: {e}")))?;

        let candidates = rows
            .into_iter()
            .map(CandidateRecord::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(AppError::DataUnavailable)?;

        validate_roster(&candidates)?;
        Ok(candidates)
    }
}
