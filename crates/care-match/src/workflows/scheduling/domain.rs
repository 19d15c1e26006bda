use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    /// Identifier of a unit of care work.
    ShiftId
);
identifier!(
    /// Identifier of a worker on an agency roster.
    CaregiverId
);
identifier!(
    /// Identifier of the agency owning shifts and caregivers.
    AgencyId
);
identifier!(ClientId);
identifier!(
    /// Identifier of a persisted caregiver-to-shift binding.
    AssignmentId
);

/// Lifecycle of a shift. Only the assignment transaction moves a shift out of `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Open,
    Assigned,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl ShiftStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ShiftStatus::Open => "open",
            ShiftStatus::Assigned => "assigned",
            ShiftStatus::Confirmed => "confirmed",
            ShiftStatus::InProgress => "in_progress",
            ShiftStatus::Completed => "completed",
            ShiftStatus::Cancelled => "cancelled",
        }
    }
}

/// Shift record as exchanged with the surrounding scheduling application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub agency_id: AgencyId,
    pub client_id: ClientId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caregiver_id: Option<CaregiverId>,
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_hours: f64,
    pub care_type_code: String,
    pub status: ShiftStatus,
}

impl Shift {
    /// Weekday of the shift date, 0 = Sunday through 6 = Saturday.
    pub fn day_of_week(&self) -> u8 {
        self.shift_date.weekday().num_days_from_sunday() as u8
    }

    /// Same-day time window of the shift. `None` when the end does not fall after the start.
    /// A shift ending at 00:00 counts as overnight.
    pub fn time_window(&self) -> Option<(NaiveTime, NaiveTime)> {
        (self.end_time > self.start_time).then_some((self.start_time, self.end_time))
    }

    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }
}

/// Care-type qualification held by a caregiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub care_type_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proficiency_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_experience: Option<u32>,
}

impl Skill {
    pub fn new(care_type_code: impl Into<String>) -> Self {
        Self {
            care_type_code: care_type_code.into(),
            proficiency_level: None,
            years_experience: None,
        }
    }
}

/// Recurring weekly slot in which a caregiver can (or explicitly cannot) work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}

impl AvailabilityWindow {
    pub fn contains(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.start_time <= start && end <= self.end_time
    }
}

/// Caregiver record with skills and availability eager-loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caregiver {
    pub id: CaregiverId,
    pub agency_id: AgencyId,
    pub is_active: bool,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    /// 0 to 5 scale.
    #[serde(default)]
    pub performance_rating: Option<f64>,
    /// 0 to 1 scale.
    #[serde(default)]
    pub reliability_score: Option<f64>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub availability: Vec<AvailabilityWindow>,
}

impl Caregiver {
    pub fn has_skill(&self, care_type_code: &str) -> bool {
        self.skills
            .iter()
            .any(|skill| skill.care_type_code == care_type_code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    NoShow,
    Cancelled,
}

impl AssignmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AssignmentStatus::Scheduled => "scheduled",
            AssignmentStatus::Confirmed => "confirmed",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::NoShow => "no_show",
            AssignmentStatus::Cancelled => "cancelled",
        }
    }

    /// Every status except `Cancelled` holds the shift.
    pub const fn is_active(self) -> bool {
        !matches!(self, AssignmentStatus::Cancelled)
    }
}

/// How an assignment came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMethod {
    Auto,
    PickedUp,
    AiSuggested,
}

impl AssignmentMethod {
    pub const fn label(self) -> &'static str {
        match self {
            AssignmentMethod::Auto => "auto",
            AssignmentMethod::PickedUp => "picked_up",
            AssignmentMethod::AiSuggested => "ai_suggested",
        }
    }
}

/// Persisted binding of one caregiver to one shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub shift_id: ShiftId,
    pub caregiver_id: CaregiverId,
    pub status: AssignmentStatus,
    pub assignment_method: AssignmentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock_in_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock_out_time: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(raw: &str) -> NaiveTime {
        NaiveTime::parse_from_str(raw, "%H:%M:%S").expect("valid time")
    }

    fn shift(date: NaiveDate, start: &str, end: &str) -> Shift {
        Shift {
            id: ShiftId::new("shift-1"),
            agency_id: AgencyId::new("agency-1"),
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

    #[test]
    fn day_of_week_counts_from_sunday() {
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date");
        let saturday = NaiveDate::from_ymd_opt(2026, 10, 24).expect("valid date");
        assert_eq!(shift(sunday, "09:00:00", "10:00:00").day_of_week(), 0);
        assert_eq!(shift(saturday, "09:00:00", "10:00:00").day_of_week(), 6);
    }

    #[test]
    fn overnight_shift_has_no_time_window() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date");
        assert!(shift(date, "22:00:00", "06:00:00").time_window().is_none());
        assert!(shift(date, "09:00:00", "09:00:00").time_window().is_none());
        assert!(shift(date, "09:00:00", "13:00:00").time_window().is_some());
    }

    #[test]
    fn shift_ending_at_midnight_counts_as_overnight() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date");
        let evening = shift(date, "20:00:00", "00:00:00");
        assert!(evening.time_window().is_none());
        assert!(shift(date, "20:00:00", "23:59:00").time_window().is_some());
    }

    #[test]
    fn shift_record_uses_wire_field_names() {
        let payload = serde_json::json!({
            "id": "s-1",
            "agency_id": "a-1",
            "client_id": "c-1",
            "shift_date": "2026-10-19",
            "start_time": "09:00:00",
            "end_time": "13:00:00",
            "duration_hours": 4.0,
            "care_type_code": "personal_care",
            "status": "in_progress"
        });

        let shift: Shift = serde_json::from_value(payload).expect("shift parses");
        assert_eq!(shift.id, ShiftId::new("s-1"));
        assert_eq!(shift.status, ShiftStatus::InProgress);
        assert!(shift.caregiver_id.is_none());

        let encoded = serde_json::to_value(&shift).expect("shift encodes");
        assert_eq!(encoded["start_time"], "09:00:00");
        assert!(encoded.get("caregiver_id").is_none());
    }

    #[test]
    fn cancelled_assignments_release_the_shift() {
        assert!(AssignmentStatus::Scheduled.is_active());
        assert!(AssignmentStatus::NoShow.is_active());
        assert!(!AssignmentStatus::Cancelled.is_active());
        assert_eq!(AssignmentMethod::AiSuggested.label(), "ai_suggested");
    }
}
