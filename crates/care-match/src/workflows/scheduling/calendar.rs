use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Which upcoming scheduling week a batch run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekSelection {
    #[default]
    Next,
    Following,
}

impl WeekSelection {
    pub const fn label(self) -> &'static str {
        match self {
            WeekSelection::Next => "next",
            WeekSelection::Following => "following",
        }
    }
}

impl FromStr for WeekSelection {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "next" => Ok(Self::Next),
            "following" => Ok(Self::Following),
            other => Err(format!(
                "unknown week '{other}', expected 'next' or 'following'"
            )),
        }
    }
}

/// Monday-to-Sunday range; both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekRange {
    pub fn starting(monday: NaiveDate) -> Self {
        Self {
            start: monday,
            end: monday + Duration::days(6),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for WeekRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.start, self.end)
    }
}

/// Week range relative to `today`. "Next" always begins on a Monday strictly after `today`,
/// so running on a Monday skips the current week.
pub fn week_range(selection: WeekSelection, today: NaiveDate) -> WeekRange {
    let days_from_monday = i64::from(today.weekday().num_days_from_monday());
    let next_monday = today + Duration::days(7 - days_from_monday);

    match selection {
        WeekSelection::Next => WeekRange::starting(next_monday),
        WeekSelection::Following => WeekRange::starting(next_monday + Duration::days(7)),
    }
}
