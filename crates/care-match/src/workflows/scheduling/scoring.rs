use serde::Serialize;

use super::domain::Caregiver;

const PERFORMANCE_WEIGHT: f64 = 0.6;
const RELIABILITY_WEIGHT: f64 = 0.4;
const PERFORMANCE_SCALE: f64 = 5.0;

/// Weighted quality metric used by the batch scheduler, in the range 0.0 to 1.0.
pub fn score(caregiver: &Caregiver) -> f64 {
    let performance = normalize(caregiver.performance_rating, PERFORMANCE_SCALE);
    let reliability = normalize(caregiver.reliability_score, 1.0);
    PERFORMANCE_WEIGHT * performance + RELIABILITY_WEIGHT * reliability
}

fn normalize(value: Option<f64>, scale: f64) -> f64 {
    match value {
        Some(raw) if raw.is_finite() => (raw / scale).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Eligible caregiver paired with the score that placed it.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub caregiver: Caregiver,
    pub score: f64,
}

/// Orders candidates best-first. Exact ties keep their incoming order.
pub fn rank(candidates: Vec<Caregiver>) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|caregiver| ScoredCandidate {
            score: score(&caregiver),
            caregiver,
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}
