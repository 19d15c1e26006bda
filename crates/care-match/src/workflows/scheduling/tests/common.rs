use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;

use crate::workflows::scheduling::batch::CancellationFlag;
use crate::workflows::scheduling::calendar::WeekRange;
use crate::workflows::scheduling::domain::{
    AgencyId, Assignment, AssignmentId, AssignmentStatus, AvailabilityWindow, Caregiver,
    CaregiverId, ClientId, Shift, ShiftId, ShiftStatus, Skill,
};
use crate::workflows::scheduling::repository::{RepositoryError, SchedulingRepository};
use crate::workflows::scheduling::{scheduling_router, SchedulingService};

pub(super) const AGENCY: &str = "agency-1";
pub(super) const MONDAY: u8 = 1;

/// Monday 2026-10-19, inside the "next" week when today is [`today`].
pub(super) fn next_monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
}

/// Wednesday 2026-10-14.
pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 14).expect("valid date")
}

pub(super) fn next_week() -> WeekRange {
    WeekRange::starting(next_monday())
}

pub(super) fn time(raw: &str) -> NaiveTime {
    NaiveTime::parse_from_str(raw, "%H:%M").expect("valid time")
}

pub(super) fn shift(id: &str, date: NaiveDate, start: &str, end: &str) -> Shift {
    Shift {
        id: ShiftId::new(id),
        agency_id: AgencyId::new(AGENCY),
        client_id: ClientId::new("client-1"),
        caregiver_id: None,
        shift_date: date,
        start_time: time(start),
        end_time: time(end),
        duration_hours: 4.0,
        care_type_code: "personal_care".to_string(),
        status: ShiftStatus::Open,
    }
}

pub(super) fn window(day: u8, start: &str, end: &str) -> AvailabilityWindow {
    AvailabilityWindow {
        day_of_week: day,
        start_time: time(start),
        end_time: time(end),
        is_available: true,
    }
}

pub(super) fn caregiver(
    id: &str,
    skill: &str,
    availability: Vec<AvailabilityWindow>,
    rating: f64,
    reliability: f64,
) -> Caregiver {
    Caregiver {
        id: CaregiverId::new(id),
        agency_id: AgencyId::new(AGENCY),
        is_active: true,
        employment_type: Some("full_time".to_string()),
        hourly_rate: Some(26.0),
        performance_rating: Some(rating),
        reliability_score: Some(reliability),
        skills: vec![Skill::new(skill)],
        availability,
    }
}

/// Caregiver A from the reference scenario: fully covers Monday 09:00-13:00.
pub(super) fn caregiver_a() -> Caregiver {
    caregiver(
        "cg-a",
        "personal_care",
        vec![window(MONDAY, "08:00", "14:00")],
        4.5,
        0.9,
    )
}

/// Caregiver B: right skill, but availability ends at noon.
pub(super) fn caregiver_b() -> Caregiver {
    caregiver(
        "cg-b",
        "personal_care",
        vec![window(MONDAY, "09:00", "12:00")],
        5.0,
        1.0,
    )
}

pub(super) fn reference_shift() -> Shift {
    shift("shift-1", next_monday(), "09:00", "13:00")
}

#[derive(Default)]
pub(super) struct StoreTables {
    pub(super) shifts: Vec<Shift>,
    pub(super) caregivers: Vec<Caregiver>,
    pub(super) assignments: Vec<Assignment>,
}

/// In-memory store with switchable failures and a write counter.
#[derive(Default)]
pub(super) struct MemoryStore {
    pub(super) tables: Mutex<StoreTables>,
    pub(super) writes: AtomicUsize,
    pub(super) fail_shift_listing: AtomicBool,
    pub(super) fail_roster: AtomicBool,
    pub(super) fail_assignment_insert: AtomicBool,
    pub(super) fail_shift_update: AtomicBool,
    /// Raised after every successful shift update, to cancel a batch mid-run.
    pub(super) cancel_after_shift_update: Mutex<Option<CancellationFlag>>,
}

impl MemoryStore {
    pub(super) fn with(shifts: Vec<Shift>, caregivers: Vec<Caregiver>) -> Arc<Self> {
        let store = Self::default();
        {
            let mut tables = store.tables.lock().expect("store mutex poisoned");
            tables.shifts = shifts;
            tables.caregivers = caregivers;
        }
        Arc::new(store)
    }

    pub(super) fn shift_snapshot(&self, id: &str) -> Shift {
        let tables = self.tables.lock().expect("store mutex poisoned");
        tables
            .shifts
            .iter()
            .find(|shift| shift.id.as_str() == id)
            .cloned()
            .expect("shift present")
    }

    pub(super) fn assignments_for(&self, id: &str) -> Vec<Assignment> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        tables
            .assignments
            .iter()
            .filter(|assignment| assignment.shift_id.as_str() == id)
            .cloned()
            .collect()
    }

    pub(super) fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn offline(flag: &AtomicBool) -> Result<(), RepositoryError> {
        if flag.load(Ordering::SeqCst) {
            Err(RepositoryError::Unavailable("database offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl SchedulingRepository for MemoryStore {
    fn open_shifts(
        &self,
        agency_id: &AgencyId,
        range: &WeekRange,
    ) -> Result<Vec<Shift>, RepositoryError> {
        Self::offline(&self.fail_shift_listing)?;
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables
            .shifts
            .iter()
            .filter(|shift| {
                shift.agency_id == *agency_id && shift.is_open() && range.contains(shift.shift_date)
            })
            .cloned()
            .collect())
    }

    fn shift(&self, id: &ShiftId) -> Result<Option<Shift>, RepositoryError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables.shifts.iter().find(|shift| shift.id == *id).cloned())
    }

    fn active_roster(&self, agency_id: &AgencyId) -> Result<Vec<Caregiver>, RepositoryError> {
        Self::offline(&self.fail_roster)?;
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables
            .caregivers
            .iter()
            .filter(|caregiver| caregiver.agency_id == *agency_id && caregiver.is_active)
            .cloned()
            .collect())
    }

    fn caregiver(&self, id: &CaregiverId) -> Result<Option<Caregiver>, RepositoryError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables
            .caregivers
            .iter()
            .find(|caregiver| caregiver.id == *id)
            .cloned())
    }

    fn active_assignment(
        &self,
        shift_id: &ShiftId,
    ) -> Result<Option<Assignment>, RepositoryError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        Ok(tables
            .assignments
            .iter()
            .find(|assignment| assignment.shift_id == *shift_id && assignment.is_active())
            .cloned())
    }

    fn insert_assignment(&self, assignment: Assignment) -> Result<Assignment, RepositoryError> {
        Self::offline(&self.fail_assignment_insert)?;
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        if tables
            .assignments
            .iter()
            .any(|existing| existing.shift_id == assignment.shift_id && existing.is_active())
        {
            return Err(RepositoryError::Conflict);
        }
        tables.assignments.push(assignment.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(assignment)
    }

    fn mark_shift_assigned(
        &self,
        shift_id: &ShiftId,
        caregiver_id: &CaregiverId,
    ) -> Result<(), RepositoryError> {
        Self::offline(&self.fail_shift_update)?;
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        let shift = tables
            .shifts
            .iter_mut()
            .find(|shift| shift.id == *shift_id)
            .ok_or(RepositoryError::NotFound)?;
        shift.status = ShiftStatus::Assigned;
        shift.caregiver_id = Some(caregiver_id.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(flag) = self
            .cancel_after_shift_update
            .lock()
            .expect("hook mutex poisoned")
            .as_ref()
        {
            flag.cancel();
        }
        Ok(())
    }

    fn cancel_assignment(&self, id: &AssignmentId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        let assignment = tables
            .assignments
            .iter_mut()
            .find(|assignment| assignment.id == *id)
            .ok_or(RepositoryError::NotFound)?;
        assignment.status = AssignmentStatus::Cancelled;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(super) fn build_service(
    shifts: Vec<Shift>,
    caregivers: Vec<Caregiver>,
) -> (SchedulingService<MemoryStore>, Arc<MemoryStore>) {
    let store = MemoryStore::with(shifts, caregivers);
    (SchedulingService::new(store.clone()), store)
}

pub(super) fn router_with_service(service: SchedulingService<MemoryStore>) -> axum::Router {
    scheduling_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
