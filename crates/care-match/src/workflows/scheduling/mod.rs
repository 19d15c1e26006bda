//! Shift/caregiver matching and assignment engine.
//!
//! Eligibility filtering and scoring are pure functions over records fetched through
//! [`SchedulingRepository`]. The assignment transaction is the only writer, and both the batch
//! scheduler and the interactive ranker adapter go through it.

pub mod assignment;
pub mod batch;
pub mod calendar;
pub mod domain;
pub mod eligibility;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use assignment::{AssignmentError, AssignmentService};
pub use batch::{
    AutoScheduler, BatchError, BatchResult, BatchStatus, BatchSummary, CancellationFlag,
    FailureKind, OutcomeDetail, OutcomeKind, ShiftOutcome, ShiftReport,
};
pub use calendar::{week_range, WeekRange, WeekSelection};
pub use domain::{
    AgencyId, Assignment, AssignmentId, AssignmentMethod, AssignmentStatus, AvailabilityWindow,
    Caregiver, CaregiverId, ClientId, Shift, ShiftId, ShiftStatus, Skill,
};
pub use eligibility::{eligible, is_eligible};
pub use ranking::{InteractiveRanker, OracleError, RankedMatch, RankingOutcome};
pub use repository::{RepositoryError, SchedulingRepository};
pub use router::{scheduling_router, status_for};
pub use scoring::{rank, score, ScoredCandidate};
pub use service::{SchedulingService, SchedulingServiceError};
pub use snapshot::{ScheduleSnapshot, SnapshotError};
