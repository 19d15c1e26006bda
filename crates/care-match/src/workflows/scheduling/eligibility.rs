//! Skill and availability filtering of an agency roster against a single shift.

use super::domain::{Caregiver, Shift};

/// Caregivers from `roster` who may work `shift`, in roster order.
///
/// An empty result means nobody qualifies; callers record that as a no-match outcome rather
/// than a failure.
pub fn eligible(shift: &Shift, roster: &[Caregiver]) -> Vec<Caregiver> {
    if shift.time_window().is_none() {
        return Vec::new();
    }

    roster
        .iter()
        .filter(|caregiver| is_eligible(shift, caregiver))
        .cloned()
        .collect()
}

/// Skill plus full-containment availability check for one caregiver.
pub fn is_eligible(shift: &Shift, caregiver: &Caregiver) -> bool {
    caregiver.is_active
        && caregiver.has_skill(&shift.care_type_code)
        && is_available(shift, caregiver)
}

fn is_available(shift: &Shift, caregiver: &Caregiver) -> bool {
    let Some((start, end)) = shift.time_window() else {
        return false;
    };
    let weekday = shift.day_of_week();

    caregiver.availability.iter().any(|window| {
        window.is_available && window.day_of_week == weekday && window.contains(start, end)
    })
}
