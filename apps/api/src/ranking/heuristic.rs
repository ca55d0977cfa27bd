//! Heuristic scorer: additive lexical-overlap points between the job and each
//! candidate, capped at [`MAX_SCORE`], plus a small seeded tie-break jitter.
//!
//! | Criterion  | Rule                                                  | Points      |
//! |------------|-------------------------------------------------------|-------------|
//! | Title      | any job-title token is a substring of candidate title | 2.0         |
//! | Skills     | each required skill found in candidate skills         | 1.5 each    |
//! | Location   | substring either direction                            | 1.5         |
//! | Industry   | job industry found in candidate industry experience   | 2.0         |
//! | Experience | year gap ≤ 2 / ≤ 4                                    | 2.0 / 1.0   |

use std::collections::BTreeSet;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::errors::AppError;
use crate::models::candidate::CandidateRecord;
use crate::models::job::JobDescription;
use crate::models::ranking::{clamp_score, ScoredCandidate, MAX_SCORE};
use crate::ranking::Scorer;

const TITLE_POINTS: f64 = 2.0;
const SKILL_POINTS: f64 = 1.5;
const LOCATION_POINTS: f64 = 1.5;
const INDUSTRY_POINTS: f64 = 2.0;
const CLOSE_EXPERIENCE_POINTS: f64 = 2.0;
const NEAR_EXPERIENCE_POINTS: f64 = 1.0;

/// Half-width of the uniform tie-break perturbation.
pub const JITTER: f64 = 0.3;

const NO_MATCH_EXPLANATION: &str = "No significant matches were found for this candidate.";

/// Source of the tie-break perturbation.
///
/// A fresh generator is created for every `score` call, so no random state is
/// shared between requests and a fixed seed reproduces results exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perturbation {
    /// No jitter; scores are the raw clamped point totals.
    Disabled,
    Seeded(u64),
    /// Seeded from OS entropy on every call.
    Entropy,
}

impl Perturbation {
    fn rng(&self) -> Option<StdRng> {
        match self {
            Perturbation::Disabled => None,
            Perturbation::Seeded(seed) => Some(StdRng::seed_from_u64(*seed)),
            Perturbation::Entropy => Some(StdRng::from_entropy()),
        }
    }
}

pub struct HeuristicScorer {
    perturbation: Perturbation,
}

impl HeuristicScorer {
    pub fn new(perturbation: Perturbation) -> Self {
        Self { perturbation }
    }
}

#[async_trait]
impl Scorer for HeuristicScorer {
    fn backend(&self) -> &'static str {
        "heuristic"
    }

    async fn score(
        &self,
        job: &JobDescription,
        candidates: &[CandidateRecord],
    ) -> Result<Vec<ScoredCandidate>, AppError> {
        Ok(score_all(job, candidates, self.perturbation.rng()))
    }
}

/// Job fields normalized once per call instead of once per candidate.
struct JobTerms {
    title_tokens: Vec<String>,
    skills: BTreeSet<String>,
    location: String,
    industry: String,
    years_experience: u32,
}

impl JobTerms {
    fn new(job: &JobDescription) -> Self {
        Self {
            title_tokens: job.title_tokens(),
            skills: job.skill_set(),
            location: job.location.trim().to_lowercase(),
            industry: job.industry.trim().to_lowercase(),
            years_experience: job.years_experience,
        }
    }
}

/// Point total and triggered reasons for one candidate, before jitter.
#[derive(Debug, Clone, PartialEq)]
struct Evaluation {
    points: f64,
    reasons: Vec<String>,
}

fn score_all(
    job: &JobDescription,
    candidates: &[CandidateRecord],
    mut rng: Option<StdRng>,
) -> Vec<ScoredCandidate> {
    let terms = JobTerms::new(job);

    candidates
        .iter()
        .map(|candidate| {
            let evaluation = evaluate(&terms, candidate);
            if evaluation.reasons.is_empty() {
                return ScoredCandidate {
                    full_name: candidate.full_name(),
                    score: 0.0,
                    explanation: NO_MATCH_EXPLANATION.to_string(),
                };
            }

            let base = evaluation.points.min(MAX_SCORE);
            let jitter = rng
                .as_mut()
                .map(|r| r.gen_range(-JITTER..=JITTER))
                .unwrap_or(0.0);

            ScoredCandidate {
                full_name: candidate.full_name(),
                score: clamp_score(base + jitter),
                explanation: explain(&evaluation.reasons),
            }
        })
        .collect()
}

fn evaluate(terms: &JobTerms, candidate: &CandidateRecord) -> Evaluation {
    let mut points = 0.0;
    let mut reasons = Vec::new();

    let title = candidate.title.to_lowercase();
    if terms.title_tokens.iter().any(|t| title.contains(t.as_str())) {
        points += TITLE_POINTS;
        reasons.push(format!("Job title match (+{TITLE_POINTS:.1})"));
    }

    let skills = candidate.skills.to_lowercase();
    let matched = terms
        .skills
        .iter()
        .filter(|s| skills.contains(s.as_str()))
        .count();
    if matched > 0 {
        let skill_points = matched as f64 * SKILL_POINTS;
        points += skill_points;
        let noun = if matched == 1 { "skill" } else { "skills" };
        reasons.push(format!(
            "{matched} required {noun} matched (+{skill_points:.1})"
        ));
    }

    let location = candidate.location.trim().to_lowercase();
    if !terms.location.is_empty()
        && !location.is_empty()
        && (terms.location.contains(&location) || location.contains(&terms.location))
    {
        points += LOCATION_POINTS;
        reasons.push(format!("Location match (+{LOCATION_POINTS:.1})"));
    }

    if !terms.industry.is_empty()
        && candidate
            .industry_experience
            .to_lowercase()
            .contains(&terms.industry)
    {
        points += INDUSTRY_POINTS;
        reasons.push(format!("Industry experience match (+{INDUSTRY_POINTS:.1})"));
    }

    let gap = candidate.years_experience.abs_diff(terms.years_experience);
    if gap <= 2 {
        points += CLOSE_EXPERIENCE_POINTS;
        reasons.push(format!(
            "Experience within 2 years of requirement (+{CLOSE_EXPERIENCE_POINTS:.1})"
        ));
    } else if gap <= 4 {
        points += NEAR_EXPERIENCE_POINTS;
        reasons.push(format!(
            "Experience within 4 years of requirement (+{NEAR_EXPERIENCE_POINTS:.1})"
        ));
    }

    Evaluation { points, reasons }
}

/// "This candidate <reason>, <reason>."
fn explain(reasons: &[String]) -> String {
    let joined = reasons
        .iter()
        .map(|r| r.to_lowercase())
        .collect::<Vec<_>>()
        .join(", ");
    format!("This candidate {joined}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend_job() -> JobDescription {
        JobDescription {
            cst_name: "Acme Inc".to_string(),
            client_problem_statement: "Optimize data pipeline performance.".to_string(),
            title: "Senior Backend Engineer".to_string(),
            location: "New York".to_string(),
            industry: "Tech".to_string(),
            required_skills: "Python, FastAPI, PostgreSQL".to_string(),
            years_experience: 5,
        }
    }

    fn backend_candidate() -> CandidateRecord {
        CandidateRecord {
            id: 1,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            title: "Backend Engineer".to_string(),
            skills: "Python, PostgreSQL, Docker".to_string(),
            is_staffed: false,
            staffing_end_date: None,
            years_experience: 5,
            industry_experience: "Tech, Retail".to_string(),
            location: "New York".to_string(),
        }
    }

    #[test]
    fn test_reference_scenario_sums_to_10_5() {
        let evaluation = evaluate(&JobTerms::new(&backend_job()), &backend_candidate());
        assert!((evaluation.points - 10.5).abs() < f64::EPSILON);
        assert_eq!(evaluation.reasons.len(), 5);
        assert_eq!(evaluation.reasons[0], "Job title match (+2.0)");
        assert_eq!(evaluation.reasons[1], "2 required skills matched (+3.0)");
    }

    #[test]
    fn test_reference_scenario_clamps_to_10_without_jitter() {
        let scored = score_all(&backend_job(), &[backend_candidate()], None);
        assert_eq!(scored[0].score, 10.0);
        assert_eq!(scored[0].full_name, "Jane Doe");
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let scored = score_all(
            &backend_job(),
            &[backend_candidate()],
            Perturbation::Seeded(7).rng(),
        );
        assert!(scored[0].score <= 10.0);
        assert!(scored[0].score >= 10.0 - JITTER);
    }

    #[test]
    fn test_explanation_format() {
        let scored = score_all(&backend_job(), &[backend_candidate()], None);
        let explanation = &scored[0].explanation;
        assert!(explanation.starts_with("This candidate job title match (+2.0), "));
        assert!(explanation.contains("2 required skills matched (+3.0)"));
        assert!(explanation.ends_with('.'));
        let reasons = &explanation["This candidate ".len()..];
        assert_eq!(reasons, reasons.to_lowercase());
    }

    #[test]
    fn test_no_match_scores_zero() {
        let candidate = CandidateRecord {
            id: 2,
            first_name: "Sam".to_string(),
            title: "Florist".to_string(),
            skills: "Arranging".to_string(),
            years_experience: 20,
            industry_experience: "Retail".to_string(),
            location: "Lisbon".to_string(),
            ..Default::default()
        };
        let scored = score_all(&backend_job(), &[candidate], Perturbation::Seeded(1).rng());
        assert_eq!(scored[0].score, 0.0);
        assert_eq!(scored[0].explanation, NO_MATCH_EXPLANATION);
    }

    #[test]
    fn test_missing_fields_do_not_match_on_empty_strings() {
        let job = JobDescription {
            title: "Engineer".to_string(),
            years_experience: 30,
            ..Default::default()
        };
        let candidate = CandidateRecord {
            id: 3,
            ..Default::default()
        };
        let evaluation = evaluate(&JobTerms::new(&job), &candidate);
        assert!(evaluation.reasons.is_empty());
        assert_eq!(evaluation.points, 0.0);
    }

    #[test]
    fn test_empty_required_skills_yield_no_skill_points() {
        let mut job = backend_job();
        job.required_skills = String::new();
        let evaluation = evaluate(&JobTerms::new(&job), &backend_candidate());
        assert!((evaluation.points - 7.5).abs() < f64::EPSILON);
        assert!(!evaluation.reasons.iter().any(|r| r.contains("skill")));
    }

    #[test]
    fn test_single_skill_reason_is_singular() {
        let mut job = backend_job();
        job.required_skills = "Docker".to_string();
        let evaluation = evaluate(&JobTerms::new(&job), &backend_candidate());
        assert!(evaluation
            .reasons
            .contains(&"1 required skill matched (+1.5)".to_string()));
    }

    #[test]
    fn test_location_matches_in_either_direction() {
        let mut candidate = backend_candidate();
        candidate.location = "new york, ny".to_string();
        let evaluation = evaluate(&JobTerms::new(&backend_job()), &candidate);
        assert!(evaluation.reasons.iter().any(|r| r.starts_with("Location")));

        let mut job = backend_job();
        job.location = "Greater New York Area".to_string();
        candidate.location = "New York".to_string();
        let evaluation = evaluate(&JobTerms::new(&job), &candidate);
        assert!(evaluation.reasons.iter().any(|r| r.starts_with("Location")));
    }

    #[test]
    fn test_experience_proximity_tiers() {
        let job = backend_job();
        let terms = JobTerms::new(&job);
        let experience_points = |years: u32| {
            let candidate = CandidateRecord {
                id: 9,
                years_experience: years,
                ..Default::default()
            };
            evaluate(&terms, &candidate).points
        };
        assert_eq!(experience_points(3), 2.0);
        assert_eq!(experience_points(7), 2.0);
        assert_eq!(experience_points(9), 1.0);
        assert_eq!(experience_points(1), 1.0);
        assert_eq!(experience_points(10), 0.0);
    }

    #[test]
    fn test_same_seed_same_scores() {
        let roster = vec![backend_candidate(), backend_candidate()];
        let a = score_all(&backend_job(), &roster, Perturbation::Seeded(42).rng());
        let b = score_all(&backend_job(), &roster, Perturbation::Seeded(42).rng());
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_scorer_returns_one_entry_per_candidate() {
        let scorer = HeuristicScorer::new(Perturbation::Entropy);
        let roster = vec![backend_candidate(), CandidateRecord { id: 2, ..Default::default() }];
        let scored = scorer.score(&backend_job(), &roster).await.unwrap();
        assert_eq!(scored.len(), 2);
        assert!(scored.iter().all(|s| (0.0..=10.0).contains(&s.score)));
        assert_eq!(scorer.backend(), "heuristic");
    }
}
