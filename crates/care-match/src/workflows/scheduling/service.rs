use std::sync::Arc;

use chrono::NaiveDate;

use super::assignment::{AssignmentError, AssignmentService};
use super::batch::{AutoScheduler, BatchError, BatchResult, CancellationFlag};
use super::calendar::{week_range, WeekSelection};
use super::domain::{AgencyId, Assignment, AssignmentId, AssignmentMethod, CaregiverId, ShiftId};
use super::eligibility::eligible;
use super::ranking::{InteractiveRanker, RankedMatch};
use super::repository::{RepositoryError, SchedulingRepository};
use super::scoring::{rank, ScoredCandidate};

/// Service composing the assignment transaction, batch scheduler, and ranker adapter over one
/// repository.
pub struct SchedulingService<R> {
    repository: Arc<R>,
    assignments: Arc<AssignmentService<R>>,
    scheduler: AutoScheduler<R>,
    ranker: InteractiveRanker<R>,
}

impl<R> SchedulingService<R>
where
    R: SchedulingRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        let assignments = Arc::new(AssignmentService::new(repository.clone()));
        let scheduler = AutoScheduler::new(repository.clone(), assignments.clone());
        let ranker = InteractiveRanker::new(assignments.clone());

        Self {
            repository,
            assignments,
            scheduler,
            ranker,
        }
    }

    /// Run the batch scheduler for the week selected relative to `today`.
    pub fn auto_schedule(
        &self,
        agency_id: &AgencyId,
        selection: WeekSelection,
        today: NaiveDate,
    ) -> Result<BatchResult, SchedulingServiceError> {
        self.auto_schedule_with_cancellation(
            agency_id,
            selection,
            today,
            &CancellationFlag::default(),
        )
    }

    pub fn auto_schedule_with_cancellation(
        &self,
        agency_id: &AgencyId,
        selection: WeekSelection,
        today: NaiveDate,
        cancellation: &CancellationFlag,
    ) -> Result<BatchResult, SchedulingServiceError> {
        let week = week_range(selection, today);
        let result = self
            .scheduler
            .run_with_cancellation(agency_id, week, cancellation)?;
        Ok(result)
    }

    /// Eligible caregivers for one shift, best-first. Read-only.
    pub fn candidates(
        &self,
        shift_id: &ShiftId,
    ) -> Result<Vec<ScoredCandidate>, SchedulingServiceError> {
        let shift = self
            .repository
            .shift(shift_id)?
            .ok_or_else(|| SchedulingServiceError::ShiftNotFound(shift_id.clone()))?;
        let roster = self.repository.active_roster(&shift.agency_id)?;
        Ok(rank(eligible(&shift, &roster)))
    }

    pub fn accept_match(
        &self,
        shift_id: &ShiftId,
        caregiver_id: &CaregiverId,
        rank_metadata: &RankedMatch,
    ) -> Result<Assignment, SchedulingServiceError> {
        let outcome = self
            .ranker
            .accept_match(shift_id, caregiver_id, rank_metadata);
        self.settle(outcome)
    }

    /// Manual pick-up of an open shift by a caregiver.
    pub fn pick_up(
        &self,
        shift_id: &ShiftId,
        caregiver_id: &CaregiverId,
    ) -> Result<Assignment, SchedulingServiceError> {
        let outcome = self
            .assignments
            .assign(shift_id, caregiver_id, AssignmentMethod::PickedUp);
        self.settle(outcome)
    }

    pub fn compensate(&self, assignment_id: &AssignmentId) -> Result<(), SchedulingServiceError> {
        self.assignments.compensate(assignment_id)?;
        Ok(())
    }

    /// Cancels the dangling row of a partial assignment so the shift is left as found.
    fn settle(
        &self,
        outcome: Result<Assignment, AssignmentError>,
    ) -> Result<Assignment, SchedulingServiceError> {
        match outcome {
            Ok(assignment) => Ok(assignment),
            Err(AssignmentError::PartialAssignment {
                assignment_id,
                shift_id,
                source,
            }) => {
                self.assignments.compensate(&assignment_id)?;
                Err(SchedulingServiceError::RolledBack {
                    assignment_id,
                    shift_id,
                    source,
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Error raised by the scheduling service.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingServiceError {
    #[error("shift {0} not found")]
    ShiftNotFound(ShiftId),
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(
        "shift {shift_id} status update failed ({source}); assignment {assignment_id} cancelled"
    )]
    RolledBack {
        assignment_id: AssignmentId,
        shift_id: ShiftId,
        source: RepositoryError,
    },
}

impl SchedulingServiceError {
    /// Assignment row touched by a failed write, when one was created.
    pub fn assignment_id(&self) -> Option<&AssignmentId> {
        match self {
            SchedulingServiceError::RolledBack { assignment_id, .. }
            | SchedulingServiceError::Assignment(AssignmentError::PartialAssignment {
                assignment_id,
                ..
            })
            | SchedulingServiceError::Assignment(AssignmentError::CompensationFailed {
                assignment_id,
                ..
            }) => Some(assignment_id),
            _ => None,
        }
    }
}
