//! Ranking engine — runs the configured scorer and turns its output into a shortlist.
//!
//! Flow: validate job/top_k → scorer.score() → clamp → stable sort (desc) → truncate.
//! Scorer errors propagate unchanged; recovery policy lives in the scorer.

use std::sync::Arc;

use tracing::debug;

use crate::errors::AppError;
use crate::models::candidate::CandidateRecord;
use crate::models::job::JobDescription;
use crate::models::ranking::{clamp_score, RankingResult};
use crate::ranking::Scorer;

#[derive(Clone)]
pub struct RankingEngine {
    scorer: Arc<dyn Scorer>,
}

impl RankingEngine {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self { scorer }
    }

    pub fn backend(&self) -> &'static str {
        self.scorer.backend()
    }

    /// Checks the request before any roster is loaded. Returns `top_k` as a count.
    pub fn validate(job: &JobDescription, top_k: i64) -> Result<usize, AppError> {
        let top_k = usize::try_from(top_k)
            .map_err(|_| AppError::InvalidArgument(format!("top_k must be >= 0, got {top_k}")))?;
        job.validate()?;
        Ok(top_k)
    }

    /// Scores `candidates` against `job` and returns at most `top_k` of them,
    /// best first. Equal scores keep the scorer's (roster) order.
    pub async fn rank(
        &self,
        job: &JobDescription,
        candidates: &[CandidateRecord],
        top_k: i64,
    ) -> Result<RankingResult, AppError> {
        let top_k = Self::validate(job, top_k)?;

        if top_k == 0 || candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored = self.scorer.score(job, candidates).await?;
        let returned = scored.len();

        for candidate in &mut scored {
            candidate.score = clamp_score(candidate.score);
        }
        // `sort_by` is stable.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);

        debug!(
            "Ranked {} of {} scored candidates with {} backend",
            scored.len(),
            returned,
            self.scorer.backend()
        );

        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ranking::ScoredCandidate;
    use crate::ranking::heuristic::{HeuristicScorer, Perturbation};
    use async_trait::async_trait;

    /// Returns a fixed list regardless of input.
    struct FixedScorer(Vec<(&'static str, f64)>);

    #[async_trait]
    impl Scorer for FixedScorer {
        fn backend(&self) -> &'static str {
            "fixed"
        }

        async fn score(
            &self,
            _job: &JobDescription,
            _candidates: &[CandidateRecord],
        ) -> Result<Vec<ScoredCandidate>, AppError> {
            Ok(self
                .0
                .iter()
                .map(|(name, score)| ScoredCandidate {
                    full_name: name.to_string(),
                    score: *score,
                    explanation: format!("{name} explanation"),
                })
                .collect())
        }
    }

    struct FailingScorer;

    #[async_trait]
    impl Scorer for FailingScorer {
        fn backend(&self) -> &'static str {
            "failing"
        }

        async fn score(
            &self,
            _job: &JobDescription,
            _candidates: &[CandidateRecord],
        ) -> Result<Vec<ScoredCandidate>, AppError> {
            Err(AppError::Upstream("connection refused".to_string()))
        }
    }

    fn job() -> JobDescription {
        JobDescription {
            title: "Backend Engineer".to_string(),
            location: "New York".to_string(),
            industry: "Tech".to_string(),
            required_skills: "Python, PostgreSQL".to_string(),
            years_experience: 5,
            ..Default::default()
        }
    }

    fn roster(n: i64) -> Vec<CandidateRecord> {
        (1..=n)
            .map(|id| CandidateRecord {
                id,
                first_name: format!("C{id}"),
                title: if id % 2 == 0 { "Backend Engineer" } else { "Designer" }.to_string(),
                skills: "Python".to_string(),
                years_experience: id as u32,
                location: "New York".to_string(),
                ..Default::default()
            })
            .collect()
    }

    fn fixed(scores: Vec<(&'static str, f64)>) -> RankingEngine {
        RankingEngine::new(Arc::new(FixedScorer(scores)))
    }

    #[tokio::test]
    async fn test_sorts_descending_and_truncates() {
        let engine = fixed(vec![("a", 3.0), ("b", 9.0), ("c", 5.5), ("d", 7.0)]);
        let result = engine.rank(&job(), &roster(4), 3).await.unwrap();
        let names: Vec<&str> = result.iter().map(|s| s.full_name.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "c"]);
    }

    #[tokio::test]
    async fn test_ties_keep_scorer_order() {
        let engine = fixed(vec![("first", 5.0), ("second", 8.0), ("third", 5.0), ("fourth", 5.0)]);
        let result = engine.rank(&job(), &roster(4), 4).await.unwrap();
        let names: Vec<&str> = result.iter().map(|s| s.full_name.as_str()).collect();
        assert_eq!(names, vec!["second", "first", "third", "fourth"]);
    }

    #[tokio::test]
    async fn test_scores_are_clamped() {
        let engine = fixed(vec![("high", 42.0), ("low", -3.0), ("nan", f64::NAN)]);
        let result = engine.rank(&job(), &roster(3), 3).await.unwrap();
        assert_eq!(result[0].score, 10.0);
        assert_eq!(result[1].score, 0.0);
        assert_eq!(result[2].score, 0.0);
    }

    #[tokio::test]
    async fn test_top_k_zero_is_empty() {
        let engine = fixed(vec![("a", 3.0)]);
        assert!(engine.rank(&job(), &roster(1), 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_negative_top_k_is_invalid_argument() {
        let engine = fixed(vec![("a", 3.0)]);
        let err = engine.rank(&job(), &roster(1), -1).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_blank_title_is_invalid_argument() {
        let engine = fixed(vec![("a", 3.0)]);
        let mut job = job();
        job.title = String::new();
        let err = engine.rank(&job, &roster(1), 3).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_empty_roster_is_empty() {
        let engine = RankingEngine::new(Arc::new(FailingScorer));
        assert!(engine.rank(&job(), &[], 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scorer_errors_propagate() {
        let engine = RankingEngine::new(Arc::new(FailingScorer));
        let err = engine.rank(&job(), &roster(2), 3).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_heuristic_with_seed_is_reproducible() {
        let engine = RankingEngine::new(Arc::new(HeuristicScorer::new(Perturbation::Seeded(11))));
        let candidates = roster(8);
        let first = engine.rank(&job(), &candidates, 3).await.unwrap();
        let second = engine.rank(&job(), &candidates, 3).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert!(first.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(first.iter().all(|s| (0.0..=10.0).contains(&s.score)));
    }

    #[tokio::test]
    async fn test_heuristic_without_jitter_ties_follow_roster() {
        let engine = RankingEngine::new(Arc::new(HeuristicScorer::new(Perturbation::Disabled)));
        let candidates: Vec<CandidateRecord> = (1..=3)
            .map(|id| CandidateRecord {
                id,
                first_name: format!("Twin{id}"),
                title: "Backend Engineer".to_string(),
                years_experience: 5,
                ..Default::default()
            })
            .collect();
        let result = engine.rank(&job(), &candidates, 2).await.unwrap();
        let names: Vec<&str> = result.iter().map(|s| s.full_name.as_str()).collect();
        assert_eq!(names, vec!["Twin1", "Twin2"]);
    }

    #[tokio::test]
    async fn test_result_never_longer_than_roster() {
        let engine = RankingEngine::new(Arc::new(HeuristicScorer::new(Perturbation::Seeded(3))));
        let result = engine.rank(&job(), &roster(2), 10).await.unwrap();
        assert_eq!(result.len(), 2);
    }
}
