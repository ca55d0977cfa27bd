use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::errors::AppError;

/// A person in the roster. Read-only for the duration of a ranking call.
///
/// Text fields missing from the source default to empty strings and numbers to
/// zero; they simply contribute nothing when scored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub title: String,
    /// Comma-separated.
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub is_staffed: bool,
    #[serde(default)]
    pub staffing_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub years_experience: u32,
    #[serde(default)]
    pub industry_experience: String,
    #[serde(default)]
    pub location: String,
}

impl CandidateRecord {
    /// "first last", trimmed. Degrades to whichever part is present, and to
    /// `candidate <id>` when both are blank.
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            format!("candidate {}", self.id)
        } else {
            name.to_string()
        }
    }

    /// A staffed candidate must carry an end date; an unstaffed one must not.
    pub fn check_staffing(&self) -> Result<(), String> {
        match (self.is_staffed, self.staffing_end_date) {
            (true, None) => Err(format!(
                "candidate {} is staffed but has no staffing_end_date",
                self.id
            )),
            (false, Some(_)) => Err(format!(
                "candidate {} is not staffed but has a staffing_end_date",
                self.id
            )),
            _ => Ok(()),
        }
    }
}

/// Row shape of the `candidates` table.
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub skills: String,
    pub is_staffed: bool,
    pub staffing_end_date: Option<NaiveDate>,
    pub years_experience: i32,
    pub industry_experience: String,
    pub location: String,
}

impl TryFrom<CandidateRow> for CandidateRecord {
    type Error = String;

    fn try_from(row: CandidateRow) -> Result<Self, Self::Error> {
        let years_experience = u32::try_from(row.years_experience).map_err(|_| {
            format!(
                "candidate {} has negative years_experience ({})",
                row.id, row.years_experience
            )
        })?;

        Ok(CandidateRecord {
            id: i64::from(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            title: row.title,
            skills: row.skills,
            is_staffed: row.is_staffed,
            staffing_end_date: row.staffing_end_date,
            years_experience,
            industry_experience: row.industry_experience,
            location: row.location,
        })
    }
}

/// Checks roster-wide invariants: unique ids and the staffing-date rule.
pub fn validate_roster(candidates: &[CandidateRecord]) -> Result<(), AppError> {
    let mut seen = HashSet::with_capacity(candidates.len());
    for candidate in candidates {
        if !seen.insert(candidate.id) {
            return Err(AppError::DataUnavailable(format!(
                "duplicate candidate id {}",
                candidate.id
            )));
        }
        candidate
            .check_staffing()
            .map_err(AppError::DataUnavailable)?;
    }
    Ok(())
}
