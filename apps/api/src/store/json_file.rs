use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::candidate::{validate_roster, CandidateRecord};
use crate::store::CandidateStore;

/// Roster stored as a JSON array of candidate records.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl CandidateStore for JsonFileStore {
    async fn load_candidates(&self) -> Result<Vec<CandidateRecord>, AppError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => AppError::DataUnavailable(format!(
                    "candidates file not found: {}",
                    self.path.display()
                )),
                _ => AppError::DataUnavailable(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )),
            })?;

        let candidates: Vec<CandidateRecord> = serde_json::from_str(&raw).map_err(|e| {
            AppError::DataUnavailable(format!(
                "invalid JSON in {}: {e}",
                self.path.display()
            ))
        })?;

        validate_roster(&candidates)?;
        Ok(candidates)
    }
}
