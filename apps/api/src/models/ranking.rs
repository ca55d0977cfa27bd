use serde::{Deserialize, Serialize};

/// Upper bound of every score.
pub const MAX_SCORE: f64 = 10.0;

/// One entry of the shortlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub full_name: String,
    pub score: f64,
    pub explanation: String,
}

/// Ordered shortlist: at most `top_k` entries, score non-increasing.
pub type RankingResult = Vec<ScoredCandidate>;

/// Clamps a raw score into `0.0..=MAX_SCORE`. Non-finite values become `0.0`.
pub fn clamp_score(score: f64) -> f64 {
    if !score.is_finite() {
        return 0.0;
    }
    score.clamp(0.0, MAX_SCORE)
}
