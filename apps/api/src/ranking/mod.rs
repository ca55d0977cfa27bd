//! Candidate ranking: one engine, swappable scorers.
//!
//! Default: `HeuristicScorer` (pure-Rust, deterministic with a fixed seed).
//! Alternative: `GenerativeScorer` (delegates to the text-generation upstream).
//!
//! `AppState` holds an `Arc<RankingEngine>` built at startup from `MATCH_STRATEGY`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::models::candidate::CandidateRecord;
use crate::models::job::JobDescription;
use crate::models::ranking::ScoredCandidate;

pub mod engine;
pub mod generative;
pub mod handlers;
pub mod heuristic;
pub mod prompts;
pub mod response;

use generative::GenerativeScorer;
use heuristic::{HeuristicScorer, Perturbation};

/// The scorer trait. Implement this to swap backends without touching
/// the engine, handler, or caller code.
///
/// Returns one entry per scored candidate, in no particular order. Sorting and
/// truncation belong to [`engine::RankingEngine`].
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Short label for logs and `/health`.
    fn backend(&self) -> &'static str;

    async fn score(
        &self,
        job: &JobDescription,
        candidates: &[CandidateRecord],
    ) -> Result<Vec<ScoredCandidate>, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringStrategy {
    Heuristic,
    Generative,
}

impl FromStr for ScoringStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "heuristic" | "keyword" => Ok(Self::Heuristic),
            "generative" | "llm" => Ok(Self::Generative),
            other => Err(format!(
                "unknown strategy '{other}' (expected 'heuristic' or 'generative')"
            )),
        }
    }
}

impl fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heuristic => f.write_str("heuristic"),
            Self::Generative => f.write_str("generative"),
        }
    }
}

/// Builds the scorer selected by configuration, with its dependencies injected.
pub fn build_scorer(config: &Config) -> Result<Arc<dyn Scorer>> {
    let scorer: Arc<dyn Scorer> = match config.strategy {
        ScoringStrategy::Heuristic => {
            let perturbation = match (config.heuristic_jitter, config.heuristic_seed) {
                (false, _) => Perturbation::Disabled,
                (true, Some(seed)) => Perturbation::Seeded(seed),
                (true, None) => Perturbation::Entropy,
            };
            Arc::new(HeuristicScorer::new(perturbation))
        }
        ScoringStrategy::Generative => {
            let llm = LlmClient::new(config.llm.clone())?;
            tracing::info!(
                "LLM client initialized (model: {}, mode: {:?})",
                llm.model(),
                config.generative.mode
            );
            Arc::new(GenerativeScorer::new(Arc::new(llm), config.generative.clone()))
        }
    };
    Ok(scorer)
}
