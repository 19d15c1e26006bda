//! Auto-scheduling of every open shift of an agency for one week.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::assignment::{AssignmentError, AssignmentService};
use super::calendar::WeekRange;
use super::domain::{
    AgencyId, AssignmentId, AssignmentMethod, Caregiver, CaregiverId, Shift, ShiftId,
};
use super::eligibility::eligible;
use super::repository::{RepositoryError, SchedulingRepository};
use super::scoring::rank;

/// Shared flag that stops a batch from scheduling further shifts. Assignments committed
/// before the flag is raised stay committed.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Drives eligibility, scoring, and the assignment transaction across open shifts.
pub struct AutoScheduler<R> {
    repository: Arc<R>,
    assignments: Arc<AssignmentService<R>>,
}

impl<R> AutoScheduler<R>
where
    R: SchedulingRepository + 'static,
{
    pub fn new(repository: Arc<R>, assignments: Arc<AssignmentService<R>>) -> Self {
        Self {
            repository,
            assignments,
        }
    }

    pub fn run_auto_schedule(
        &self,
        agency_id: &AgencyId,
        week: WeekRange,
    ) -> Result<BatchResult, BatchError> {
        self.run_with_cancellation(agency_id, week, &CancellationFlag::default())
    }

    /// Per-shift failures are recorded in the result; only failing to list the open shifts
    /// aborts the run.
    pub fn run_with_cancellation(
        &self,
        agency_id: &AgencyId,
        week: WeekRange,
        cancellation: &CancellationFlag,
    ) -> Result<BatchResult, BatchError> {
        let shifts: Vec<Shift> = self
            .repository
            .open_shifts(agency_id, &week)
            .map_err(|source| BatchError::ShiftFetchFailed {
                agency_id: agency_id.clone(),
                source,
            })?
            .into_iter()
            .filter(|shift| shift.is_open() && week.contains(shift.shift_date))
            .collect();

        if shifts.is_empty() {
            info!(%agency_id, %week, "no open shifts to schedule");
            return Ok(BatchResult::new(
                agency_id.clone(),
                week,
                BatchStatus::NoWorkToDo,
                Vec::new(),
            ));
        }

        // One roster snapshot per run, shared by every shift in it.
        let roster = match self.repository.active_roster(agency_id) {
            Ok(roster) => Ok(roster
                .into_iter()
                .filter(|caregiver| caregiver.is_active && caregiver.agency_id == *agency_id)
                .collect::<Vec<Caregiver>>()),
            Err(err) => {
                warn!(%agency_id, error = %err, "roster fetch failed; open shifts left untouched");
                Err(err.to_string())
            }
        };

        info!(
            %agency_id,
            %week,
            open_shifts = shifts.len(),
            "auto-schedule run started"
        );

        let mut status = BatchStatus::Completed;
        let mut outcomes = Vec::with_capacity(shifts.len());
        for shift in &shifts {
            if cancellation.is_cancelled() {
                warn!(%agency_id, processed = outcomes.len(), "auto-schedule run cancelled");
                status = BatchStatus::Cancelled;
                break;
            }

            let outcome = match &roster {
                Ok(roster) => self.schedule_shift(shift, roster),
                Err(message) => ShiftOutcome::Error {
                    kind: FailureKind::RosterFetchFailed,
                    caregiver_id: None,
                    message: format!("failed to fetch caregiver roster: {message}"),
                },
            };
            outcomes.push(ShiftReport {
                shift_id: shift.id.clone(),
                outcome,
            });
        }

        let result = BatchResult::new(agency_id.clone(), week, status, outcomes);
        info!(
            %agency_id,
            assigned = result.assigned_count(),
            no_match = result.no_match_count(),
            errors = result.error_count(),
            "auto-schedule run finished"
        );
        Ok(result)
    }

    fn schedule_shift(&self, shift: &Shift, roster: &[Caregiver]) -> ShiftOutcome {
        let Some(best) = rank(eligible(shift, roster)).into_iter().next() else {
            debug!(shift_id = %shift.id, care_type = %shift.care_type_code, "no eligible caregiver");
            return ShiftOutcome::NoMatch;
        };
        let caregiver_id = best.caregiver.id;

        match self
            .assignments
            .assign(&shift.id, &caregiver_id, AssignmentMethod::Auto)
        {
            Ok(assignment) => ShiftOutcome::Assigned {
                caregiver_id,
                assignment_id: assignment.id,
                score: best.score,
            },
            Err(err) => {
                warn!(shift_id = %shift.id, %caregiver_id, error = %err, "auto-assignment failed");
                let mut message = err.to_string();
                if let AssignmentError::PartialAssignment { assignment_id, .. } = &err {
                    // Leave the shift exactly as found: open and without an active assignment.
                    match self.assignments.compensate(assignment_id) {
                        Ok(()) => message.push_str("; assignment cancelled"),
                        Err(compensation) => message.push_str(&format!("; {compensation}")),
                    }
                }
                ShiftOutcome::Error {
                    kind: FailureKind::from(&err),
                    caregiver_id: Some(caregiver_id),
                    message,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Completed,
    NoWorkToDo,
    Cancelled,
}

impl BatchStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BatchStatus::Completed => "completed",
            BatchStatus::NoWorkToDo => "no work to do",
            BatchStatus::Cancelled => "cancelled",
        }
    }
}

/// Why a shift ended a run in the error bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    RosterFetchFailed,
    AlreadyAssigned,
    AssignmentWriteFailed,
    PartialAssignment,
    Rejected,
}

impl From<&AssignmentError> for FailureKind {
    fn from(err: &AssignmentError) -> Self {
        match err {
            AssignmentError::AlreadyAssigned(_) => FailureKind::AlreadyAssigned,
            AssignmentError::AssignmentWriteFailed { .. } => FailureKind::AssignmentWriteFailed,
            AssignmentError::PartialAssignment { .. }
            | AssignmentError::CompensationFailed { .. } => FailureKind::PartialAssignment,
            _ => FailureKind::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShiftOutcome {
    Assigned {
        caregiver_id: CaregiverId,
        assignment_id: AssignmentId,
        score: f64,
    },
    NoMatch,
    Error {
        kind: FailureKind,
        caregiver_id: Option<CaregiverId>,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShiftReport {
    pub shift_id: ShiftId,
    pub outcome: ShiftOutcome,
}

/// Aggregated outcome of one batch run.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub agency_id: AgencyId,
    pub week: WeekRange,
    pub status: BatchStatus,
    pub outcomes: Vec<ShiftReport>,
}

impl BatchResult {
    fn new(
        agency_id: AgencyId,
        week: WeekRange,
        status: BatchStatus,
        outcomes: Vec<ShiftReport>,
    ) -> Self {
        Self {
            agency_id,
            week,
            status,
            outcomes,
        }
    }

    pub fn assigned_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, ShiftOutcome::Assigned { .. }))
    }

    pub fn no_match_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, ShiftOutcome::NoMatch))
    }

    pub fn error_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, ShiftOutcome::Error { .. }))
    }

    fn count(&self, predicate: impl Fn(&ShiftOutcome) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }

    pub fn summary(&self) -> BatchSummary {
        let details = self
            .outcomes
            .iter()
            .map(|report| match &report.outcome {
                ShiftOutcome::Assigned {
                    caregiver_id,
                    assignment_id,
                    score,
                } => OutcomeDetail {
                    shift_id: report.shift_id.clone(),
                    outcome: OutcomeKind::Assigned,
                    caregiver_id: Some(caregiver_id.clone()),
                    failure: None,
                    message: format!(
                        "assigned to {caregiver_id} (score {score:.2}, assignment {assignment_id})"
                    ),
                },
                ShiftOutcome::NoMatch => OutcomeDetail {
                    shift_id: report.shift_id.clone(),
                    outcome: OutcomeKind::NoMatch,
                    caregiver_id: None,
                    failure: None,
                    message: "no eligible caregiver; assign manually".to_string(),
                },
                ShiftOutcome::Error {
                    kind,
                    caregiver_id,
                    message,
                } => OutcomeDetail {
                    shift_id: report.shift_id.clone(),
                    outcome: OutcomeKind::Error,
                    caregiver_id: caregiver_id.clone(),
                    failure: Some(*kind),
                    message: message.clone(),
                },
            })
            .collect();

        BatchSummary {
            agency_id: self.agency_id.clone(),
            week: self.week,
            status: self.status,
            assigned_count: self.assigned_count(),
            no_match_count: self.no_match_count(),
            error_count: self.error_count(),
            details,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Assigned,
    NoMatch,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutcomeDetail {
    pub shift_id: ShiftId,
    pub outcome: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caregiver_id: Option<CaregiverId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    pub message: String,
}

/// Exit summary handed to the reporting layer.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub agency_id: AgencyId,
    pub week: WeekRange,
    pub status: BatchStatus,
    pub assigned_count: usize,
    pub no_match_count: usize,
    pub error_count: usize,
    pub details: Vec<OutcomeDetail>,
}

/// The one failure that aborts a whole run.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("failed to fetch open shifts for agency {agency_id}: {source}")]
    ShiftFetchFailed {
        agency_id: AgencyId,
        source: RepositoryError,
    },
}
