//! Generative scorer: delegates scoring and explanations to the text-generation
//! upstream and validates what comes back.
//!
//! Batch mode sends one prompt for the whole roster. Per-candidate mode sends
//! one prompt per candidate through a semaphore-bounded `JoinSet`; failures are
//! skipped or abort the call depending on [`FailurePolicy`].

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::llm_client::{LlmError, TextGenerator};
use crate::models::candidate::CandidateRecord;
use crate::models::job::JobDescription;
use crate::models::ranking::ScoredCandidate;
use crate::ranking::prompts::{batch_prompt, candidate_prompt, system_prompt};
use crate::ranking::response::{parse_batch, parse_single};
use crate::ranking::Scorer;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerativeMode {
    Batch,
    PerCandidate,
}

impl FromStr for GenerativeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "batch" => Ok(Self::Batch),
            "per_candidate" => Ok(Self::PerCandidate),
            other => Err(format!(
                "unknown generative mode '{other}' (expected 'batch' or 'per_candidate')"
            )),
        }
    }
}

/// What per-candidate mode does when one candidate's call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure and keep the other candidates.
    Skip,
    /// Abort the whole scoring call with the first failure.
    FailFast,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "skip" => Ok(Self::Skip),
            "fail_fast" => Ok(Self::FailFast),
            other => Err(format!(
                "unknown failure policy '{other}' (expected 'skip' or 'fail_fast')"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerativeConfig {
    pub mode: GenerativeMode,
    pub failure_policy: FailurePolicy,
    /// Batch mode only: ask the upstream for just the best N candidates.
    pub batch_top_n: Option<usize>,
    pub max_output_tokens: u32,
    /// Maximum in-flight upstream calls in per-candidate mode.
    pub concurrency: usize,
    pub call_timeout: Duration,
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            mode: GenerativeMode::Batch,
            failure_policy: FailurePolicy::Skip,
            batch_top_n: None,
            max_output_tokens: 1500,
            concurrency: 4,
            call_timeout: Duration::from_secs(30),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scorer
// ────────────────────────────────────────────────────────────────────────────

pub struct GenerativeScorer {
    generator: Arc<dyn TextGenerator>,
    config: GenerativeConfig,
}

impl GenerativeScorer {
    pub fn new(generator: Arc<dyn TextGenerator>, config: GenerativeConfig) -> Self {
        Self { generator, config }
    }

    async fn score_batch(
        &self,
        job: &JobDescription,
        candidates: &[CandidateRecord],
    ) -> Result<Vec<ScoredCandidate>, AppError> {
        let prompt = batch_prompt(job, candidates, self.config.batch_top_n);
        let raw = call_upstream(
            self.generator.as_ref(),
            &system_prompt(),
            &prompt,
            self.config.max_output_tokens,
            self.config.call_timeout,
        )
        .await?;

        let scored = parse_batch(&raw)?;
        debug!(
            "Batch scoring returned {} entries for {} candidates",
            scored.len(),
            candidates.len()
        );
        reconcile_with_roster(scored, candidates)
    }

    async fn score_each(
        &self,
        job: &JobDescription,
        candidates: &[CandidateRecord],
    ) -> Result<Vec<ScoredCandidate>, AppError> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let system = Arc::new(system_prompt());
        let mut join_set = JoinSet::new();

        for (index, candidate) in candidates.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let generator = Arc::clone(&self.generator);
            let system = Arc::clone(&system);
            let prompt = candidate_prompt(job, candidate);
            let full_name = candidate.full_name();
            let max_tokens = self.config.max_output_tokens;
            let call_timeout = self.config.call_timeout;

            join_set.spawn(async move {
                let result = async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| AppError::Internal(anyhow!("semaphore closed: {e}")))?;
                    let raw = call_upstream(
                        generator.as_ref(),
                        &system,
                        &prompt,
                        max_tokens,
                        call_timeout,
                    )
                    .await?;
                    let verdict = parse_single(&raw)?;
                    // The roster name is authoritative for a single-candidate prompt.
                    Ok::<_, AppError>(ScoredCandidate {
                        full_name,
                        ..verdict
                    })
                }
                .await;
                (index, result)
            });
        }

        let mut slots: Vec<Option<Result<ScoredCandidate, AppError>>> =
            (0..candidates.len()).map(|_| None).collect();

        while let Some(joined) = join_set.join_next().await {
            let (index, result) = joined
                .map_err(|e| AppError::Internal(anyhow!("candidate scoring task failed: {e}")))?;

            match result {
                Err(e) if self.config.failure_policy == FailurePolicy::FailFast => {
                    warn!(
                        "Scoring candidate {} failed, aborting (fail_fast): {e}",
                        candidates[index].id
                    );
                    join_set.abort_all();
                    return Err(e);
                }
                result => slots[index] = Some(result),
            }
        }

        assemble(slots, candidates)
    }
}

#[async_trait]
impl Scorer for GenerativeScorer {
    fn backend(&self) -> &'static str {
        "generative"
    }

    async fn score(
        &self,
        job: &JobDescription,
        candidates: &[CandidateRecord],
    ) -> Result<Vec<ScoredCandidate>, AppError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        match self.config.mode {
            GenerativeMode::Batch => self.score_batch(job, candidates).await,
            GenerativeMode::PerCandidate => self.score_each(job, candidates).await,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// One upstream call under the per-call timeout. Every failure maps to `Upstream`.
async fn call_upstream(
    generator: &dyn TextGenerator,
    system: &str,
    prompt: &str,
    max_tokens: u32,
    call_timeout: Duration,
) -> Result<String, AppError> {
    match tokio::time::timeout(call_timeout, generator.generate(system, prompt, max_tokens)).await
    {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(AppError::Upstream(e.to_string())),
        Err(_) => Err(AppError::Upstream(
            LlmError::Timeout(call_timeout).to_string(),
        )),
    }
}

/// Collects per-candidate outcomes in roster order under the skip policy.
///
/// Failures are logged and dropped. If every candidate failed, the first
/// failure (by roster position) is returned: an empty shortlist would hide an
/// upstream outage.
fn assemble(
    slots: Vec<Option<Result<ScoredCandidate, AppError>>>,
    candidates: &[CandidateRecord],
) -> Result<Vec<ScoredCandidate>, AppError> {
    let mut scored = Vec::with_capacity(slots.len());
    let mut first_error = None;

    for (slot, candidate) in slots.into_iter().zip(candidates) {
        match slot {
            Some(Ok(s)) => scored.push(s),
            Some(Err(e)) => {
                warn!("Skipping candidate {}: {e}", candidate.id);
                first_error.get_or_insert(e);
            }
            None => {}
        }
    }

    match first_error {
        Some(e) if scored.is_empty() => Err(e),
        _ => Ok(scored),
    }
}

/// Reconciles batch results with the roster: one entry per candidate, in
/// roster order, so equal scores keep roster order after the engine's stable
/// sort.
///
/// Names are matched case-insensitively and replaced by the roster's spelling.
/// The first valid entry for a candidate wins; later duplicates and names the
/// roster does not know are dropped. A non-empty reply with nothing left after
/// reconciliation is `MalformedResponse`.
fn reconcile_with_roster(
    scored: Vec<ScoredCandidate>,
    candidates: &[CandidateRecord],
) -> Result<Vec<ScoredCandidate>, AppError> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(candidates.len());
    for (i, c) in candidates.iter().enumerate() {
        positions.entry(c.full_name().to_lowercase()).or_insert(i);
    }

    let returned = scored.len();
    let mut slots: Vec<Option<ScoredCandidate>> = (0..candidates.len()).map(|_| None).collect();

    for s in scored {
        let Some(&index) = positions.get(&s.full_name.to_lowercase()) else {
            warn!("Dropping upstream entry for a name not in the roster: {:?}", s.full_name);
            continue;
        };
        if slots[index].is_some() {
            warn!("Dropping duplicate upstream entry for {:?}", s.full_name);
            continue;
        }
        slots[index] = Some(ScoredCandidate {
            full_name: candidates[index].full_name(),
            ..s
        });
    }

    let reconciled: Vec<ScoredCandidate> = slots.into_iter().flatten().collect();
    if returned > 0 && reconciled.is_empty() {
        return Err(AppError::MalformedResponse(
            "no batch entry matched a roster candidate".to_string(),
        ));
    }
    Ok(reconciled)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
