use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{
    Assignment, AssignmentId, AssignmentMethod, AssignmentStatus, CaregiverId, ShiftId,
    ShiftStatus,
};
use super::repository::{RepositoryError, SchedulingRepository};

static ASSIGNMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_assignment_id() -> AssignmentId {
    let id = ASSIGNMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AssignmentId(format!("asg-{id:06}"))
}

/// Commits caregiver-to-shift bindings.
///
/// The assignment row is always written before the shift status, so a reader can never see
/// an `assigned` shift without its assignment. The store's conditional insert decides races:
/// of several concurrent attempts on one shift exactly one gets through.
pub struct AssignmentService<R> {
    repository: Arc<R>,
}

impl<R> AssignmentService<R>
where
    R: SchedulingRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn assign(
        &self,
        shift_id: &ShiftId,
        caregiver_id: &CaregiverId,
        method: AssignmentMethod,
    ) -> Result<Assignment, AssignmentError> {
        let shift = self
            .repository
            .shift(shift_id)
            .map_err(AssignmentError::Lookup)?
            .ok_or_else(|| AssignmentError::ShiftNotFound(shift_id.clone()))?;

        match method {
            AssignmentMethod::AiSuggested => {
                // Later lifecycle states are never moved back to assigned.
                if !matches!(shift.status, ShiftStatus::Open | ShiftStatus::Assigned) {
                    return Err(AssignmentError::ShiftNotOpen {
                        shift_id: shift_id.clone(),
                        status: shift.status,
                    });
                }
                let existing = self
                    .repository
                    .active_assignment(shift_id)
                    .map_err(AssignmentError::Lookup)?;
                if existing.is_some() {
                    return Err(AssignmentError::AlreadyAssigned(shift_id.clone()));
                }
                if shift.status == ShiftStatus::Assigned {
                    warn!(%shift_id, "shift marked assigned without an active assignment; rebinding");
                }
            }
            AssignmentMethod::Auto | AssignmentMethod::PickedUp => match shift.status {
                ShiftStatus::Open => {}
                ShiftStatus::Assigned => {
                    return Err(AssignmentError::AlreadyAssigned(shift_id.clone()))
                }
                status => {
                    return Err(AssignmentError::ShiftNotOpen {
                        shift_id: shift_id.clone(),
                        status,
                    })
                }
            },
        }

        let caregiver = self
            .repository
            .caregiver(caregiver_id)
            .map_err(AssignmentError::Lookup)?
            .ok_or_else(|| AssignmentError::CaregiverNotFound(caregiver_id.clone()))?;
        if !caregiver.is_active {
            return Err(AssignmentError::CaregiverInactive(caregiver_id.clone()));
        }

        let assignment = Assignment {
            id: next_assignment_id(),
            shift_id: shift_id.clone(),
            caregiver_id: caregiver_id.clone(),
            status: AssignmentStatus::Scheduled,
            assignment_method: method,
            clock_in_time: None,
            clock_out_time: None,
        };

        let created = match self.repository.insert_assignment(assignment) {
            Ok(created) => created,
            Err(RepositoryError::Conflict) => {
                return Err(AssignmentError::AlreadyAssigned(shift_id.clone()))
            }
            Err(source) => {
                return Err(AssignmentError::AssignmentWriteFailed {
                    shift_id: shift_id.clone(),
                    source,
                })
            }
        };

        if let Err(source) = self.repository.mark_shift_assigned(shift_id, caregiver_id) {
            warn!(
                %shift_id,
                assignment_id = %created.id,
                error = %source,
                "assignment written but shift status update failed"
            );
            return Err(AssignmentError::PartialAssignment {
                assignment_id: created.id,
                shift_id: shift_id.clone(),
                source,
            });
        }

        info!(
            %shift_id,
            %caregiver_id,
            assignment_id = %created.id,
            method = method.label(),
            "shift assigned"
        );
        Ok(created)
    }

    /// Cancel the assignment left behind by a [`AssignmentError::PartialAssignment`].
    pub fn compensate(&self, assignment_id: &AssignmentId) -> Result<(), AssignmentError> {
        self.repository
            .cancel_assignment(assignment_id)
            .map_err(|source| AssignmentError::CompensationFailed {
                assignment_id: assignment_id.clone(),
                source,
            })?;
        info!(%assignment_id, "dangling assignment cancelled");
        Ok(())
    }
}

/// Failure modes of the assignment transaction.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("shift {0} not found")]
    ShiftNotFound(ShiftId),
    #[error("shift {shift_id} is {} and cannot be assigned", .status.label())]
    ShiftNotOpen {
        shift_id: ShiftId,
        status: ShiftStatus,
    },
    #[error("caregiver {0} not found")]
    CaregiverNotFound(CaregiverId),
    #[error("caregiver {0} is inactive")]
    CaregiverInactive(CaregiverId),
    #[error("shift {0} is already assigned")]
    AlreadyAssigned(ShiftId),
    #[error("failed to write assignment for shift {shift_id}: {source}")]
    AssignmentWriteFailed {
        shift_id: ShiftId,
        source: RepositoryError,
    },
    #[error(
        "assignment {assignment_id} written but shift {shift_id} status update failed: {source}"
    )]
    PartialAssignment {
        assignment_id: AssignmentId,
        shift_id: ShiftId,
        source: RepositoryError,
    },
    #[error("failed to cancel assignment {assignment_id}: {source}")]
    CompensationFailed {
        assignment_id: AssignmentId,
        source: RepositoryError,
    },
    #[error("scheduling store lookup failed: {0}")]
    Lookup(#[source] RepositoryError),
}
