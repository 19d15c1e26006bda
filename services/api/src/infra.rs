use care_match::workflows::scheduling::{
    AgencyId, Assignment, AssignmentId, AssignmentStatus, Caregiver, CaregiverId,
    RepositoryError, ScheduleSnapshot, SchedulingRepository, Shift, ShiftId, ShiftStatus,
    WeekRange,
};
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local scheduling store. One mutex guards all three tables so the
/// conditional assignment insert is atomic.
#[derive(Default, Clone)]
pub(crate) struct InMemorySchedulingStore {
    tables: Arc<Mutex<ScheduleSnapshot>>,
}

impl InMemorySchedulingStore {
    pub(crate) fn from_snapshot(snapshot: ScheduleSnapshot) -> Self {
        Self {
            tables: Arc::new(Mutex::new(snapshot)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ScheduleSnapshot>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl SchedulingRepository for InMemorySchedulingStore {
    fn open_shifts(
        &self,
        agency_id: &AgencyId,
        range: &WeekRange,
    ) -> Result<Vec<Shift>, RepositoryError> {
        let guard = self.lock()?;
        let mut shifts: Vec<Shift> = guard
            .shifts
            .iter()
            .filter(|shift| {
                shift.agency_id == *agency_id && shift.is_open() && range.contains(shift.shift_date)
            })
            .cloned()
            .collect();
        shifts.sort_by(|a, b| {
            (a.shift_date, a.start_time).cmp(&(b.shift_date, b.start_time))
        });
        Ok(shifts)
    }

    fn shift(&self, id: &ShiftId) -> Result<Option<Shift>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.shifts.iter().find(|shift| shift.id == *id).cloned())
    }

    fn active_roster(&self, agency_id: &AgencyId) -> Result<Vec<Caregiver>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard
            .caregivers
            .iter()
            .filter(|caregiver| caregiver.agency_id == *agency_id && caregiver.is_active)
            .cloned()
            .collect())
    }

    fn caregiver(&self, id: &CaregiverId) -> Result<Option<Caregiver>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard
            .caregivers
            .iter()
            .find(|caregiver| caregiver.id == *id)
            .cloned())
    }

    fn active_assignment(&self, shift_id: &ShiftId) -> Result<Option<Assignment>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard
            .assignments
            .iter()
            .find(|assignment| assignment.shift_id == *shift_id && assignment.is_active())
            .cloned())
    }

    fn insert_assignment(&self, mut assignment: Assignment) -> Result<Assignment, RepositoryError> {
        let mut guard = self.lock()?;
        if guard
            .assignments
            .iter()
            .any(|existing| existing.shift_id == assignment.shift_id && existing.is_active())
        {
            return Err(RepositoryError::Conflict);
        }
        if guard
            .assignments
            .iter()
            .any(|existing| existing.id == assignment.id)
        {
            assignment.id = next_free_id(&guard.assignments);
        }
        guard.assignments.push(assignment.clone());
        Ok(assignment)
    }

    fn mark_shift_assigned(
        &self,
        shift_id: &ShiftId,
        caregiver_id: &CaregiverId,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let shift = guard
            .shifts
            .iter_mut()
            .find(|shift| shift.id == *shift_id)
            .ok_or(RepositoryError::NotFound)?;
        shift.status = ShiftStatus::Assigned;
        shift.caregiver_id = Some(caregiver_id.clone());
        Ok(())
    }

    fn cancel_assignment(&self, id: &AssignmentId) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let assignment = guard
            .assignments
            .iter_mut()
            .find(|assignment| assignment.id == *id)
            .ok_or(RepositoryError::NotFound)?;
        assignment.status = AssignmentStatus::Cancelled;
        Ok(())
    }
}

/// Smallest `asg-` key above every key already stored. Seeded rows share the namespace
/// with the engine's process-local sequence, which restarts on every launch.
fn next_free_id(assignments: &[Assignment]) -> AssignmentId {
    let highest = assignments
        .iter()
        .filter_map(|assignment| assignment.id.0.strip_prefix("asg-"))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    let mut candidate = highest + 1;
    loop {
        let id = AssignmentId(format!("asg-{candidate:06}"));
        if !assignments.iter().any(|existing| existing.id == id) {
            return id;
        }
        candidate += 1;
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
