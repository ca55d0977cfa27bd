use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// The role being filled. Built once per inbound request and never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobDescription {
    /// Client name.
    #[serde(default)]
    pub cst_name: String,
    #[serde(default)]
    pub client_problem_statement: String,
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub industry: String,
    /// Comma-separated; semantically a set. See [`JobDescription::skill_set`].
    #[serde(default)]
    pub required_skills: String,
    #[serde(default)]
    pub years_experience: u32,
}

impl JobDescription {
    /// Required skills as trimmed, lower-cased, non-empty, de-duplicated tokens.
    ///
    /// A `BTreeSet` keeps iteration order stable so explanations are reproducible.
    pub fn skill_set(&self) -> BTreeSet<String> {
        self.required_skills
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Lower-cased whitespace tokens of the title.
    pub fn title_tokens(&self) -> Vec<String> {
        self.title
            .split_whitespace()
            .map(str::to_lowercase)
            .collect()
    }

    /// Rejects job descriptions that cannot be matched against anything.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "job.title cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
