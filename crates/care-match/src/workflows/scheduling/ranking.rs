//! Boundary with the externally hosted ranking oracle used by the quick-assign flow.
//!
//! The oracle ranks candidates for a single shift with its own model; nothing here reuses
//! the batch scoring weights. A human picks one suggestion and it is committed through the
//! shared assignment transaction.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::assignment::{AssignmentError, AssignmentService};
use super::domain::{Assignment, AssignmentMethod, CaregiverId, ShiftId};
use super::repository::SchedulingRepository;

/// One suggestion returned by the ranking oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMatch {
    pub caregiver_id: CaregiverId,
    /// 0 to 100.
    pub match_score: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Typed view of an oracle response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RankingOutcome {
    Ranked { matches: Vec<RankedMatch> },
    Unavailable { reason: String },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OraclePayload {
    Matches(Vec<RankedMatch>),
    Wrapped { matches: Vec<RankedMatch> },
    Failure { error: String },
}

impl RankingOutcome {
    /// Parse a raw oracle response body. Matches come back best-first; out-of-range scores
    /// are clamped into 0..=100.
    pub fn from_oracle_payload(body: &[u8]) -> Result<Self, OracleError> {
        let payload: OraclePayload = serde_json::from_slice(body)?;
        let outcome = match payload {
            OraclePayload::Matches(matches) | OraclePayload::Wrapped { matches } => {
                let matches = matches
                    .into_iter()
                    .map(|mut entry| {
                        entry.match_score = if entry.match_score.is_finite() {
                            entry.match_score.clamp(0.0, 100.0)
                        } else {
                            0.0
                        };
                        entry
                    })
                    .collect();
                RankingOutcome::Ranked { matches }
            }
            OraclePayload::Failure { error } => RankingOutcome::Unavailable { reason: error },
        };
        Ok(outcome)
    }

    pub fn matches(&self) -> &[RankedMatch] {
        match self {
            RankingOutcome::Ranked { matches } => matches,
            RankingOutcome::Unavailable { .. } => &[],
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("ranking oracle returned a malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Commits a human-selected oracle suggestion.
pub struct InteractiveRanker<R> {
    assignments: Arc<AssignmentService<R>>,
}

impl<R> InteractiveRanker<R>
where
    R: SchedulingRepository + 'static,
{
    pub fn new(assignments: Arc<AssignmentService<R>>) -> Self {
        Self { assignments }
    }

    /// No eligibility or scoring is re-run here; the assignment invariants still apply.
    pub fn accept_match(
        &self,
        shift_id: &ShiftId,
        caregiver_id: &CaregiverId,
        rank_metadata: &RankedMatch,
    ) -> Result<Assignment, AssignmentError> {
        if rank_metadata.caregiver_id != *caregiver_id {
            warn!(
                %shift_id,
                %caregiver_id,
                ranked_caregiver = %rank_metadata.caregiver_id,
                "rank metadata refers to a different caregiver"
            );
        }
        info!(
            %shift_id,
            %caregiver_id,
            match_score = rank_metadata.match_score,
            warnings = rank_metadata.warnings.len(),
            "accepting ranked match"
        );

        self.assignments
            .assign(shift_id, caregiver_id, AssignmentMethod::AiSuggested)
    }
}
