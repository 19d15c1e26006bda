use super::calendar::WeekRange;
use super::domain::{
    AgencyId, Assignment, AssignmentId, Caregiver, CaregiverId, Shift, ShiftId,
};

/// Access to the shift, roster, and assignment tables owned by the surrounding application.
///
/// The engine keeps no state of its own between calls; every operation reads through this
/// trait. Implementations back onto a store without multi-statement transactions, so the
/// two assignment writes are issued separately.
pub trait SchedulingRepository: Send + Sync {
    /// Shifts of the agency in `open` status dated within `range` (inclusive).
    fn open_shifts(
        &self,
        agency_id: &AgencyId,
        range: &WeekRange,
    ) -> Result<Vec<Shift>, RepositoryError>;

    fn shift(&self, id: &ShiftId) -> Result<Option<Shift>, RepositoryError>;

    /// Active caregivers of the agency with skills and availability loaded.
    fn active_roster(&self, agency_id: &AgencyId) -> Result<Vec<Caregiver>, RepositoryError>;

    fn caregiver(&self, id: &CaregiverId) -> Result<Option<Caregiver>, RepositoryError>;

    /// The non-cancelled assignment referencing the shift, if any.
    fn active_assignment(&self, shift_id: &ShiftId)
        -> Result<Option<Assignment>, RepositoryError>;

    /// Conditional insert: must fail with [`RepositoryError::Conflict`] when a non-cancelled
    /// assignment already references the same shift. Concurrent callers are serialized here.
    /// The store may replace an id that is already taken; callers use the returned record.
    fn insert_assignment(&self, assignment: Assignment) -> Result<Assignment, RepositoryError>;

    /// Flip the shift to `assigned` and bind the caregiver.
    fn mark_shift_assigned(
        &self,
        shift_id: &ShiftId,
        caregiver_id: &CaregiverId,
    ) -> Result<(), RepositoryError>;

    /// Move an assignment to `cancelled`, releasing its shift.
    fn cancel_assignment(&self, id: &AssignmentId) -> Result<(), RepositoryError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("scheduling store unavailable: {0}")]
    Unavailable(String),
}
