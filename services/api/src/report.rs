use crate::infra::InMemorySchedulingStore;
use care_match::error::AppError;
use care_match::workflows::scheduling::{
    AgencyId, BatchSummary, OutcomeKind, ScheduleSnapshot, ScoredCandidate, SchedulingService,
    ShiftId, WeekSelection,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScheduleArgs {
    /// Schedule snapshot (JSON with shifts, caregivers, assignments)
    #[arg(long)]
    pub(crate) data: PathBuf,
    /// Agency whose open shifts are scheduled
    #[arg(long)]
    pub(crate) agency: String,
    /// Target week relative to today: next or following
    #[arg(long, default_value = "next")]
    pub(crate) week: WeekSelection,
    /// Override the reference date (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct CandidatesArgs {
    /// Schedule snapshot (JSON with shifts, caregivers, assignments)
    #[arg(long)]
    pub(crate) data: PathBuf,
    /// Shift to rank caregivers for
    #[arg(long)]
    pub(crate) shift: String,
}

pub(crate) fn run_schedule(args: ScheduleArgs) -> Result<(), AppError> {
    let ScheduleArgs {
        data,
        agency,
        week,
        today,
    } = args;

    let service = load_service(&data)?;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let result = service.auto_schedule(&AgencyId::new(agency), week, today)?;

    render_batch_summary(&result.summary());
    Ok(())
}

pub(crate) fn run_candidates(args: CandidatesArgs) -> Result<(), AppError> {
    let service = load_service(&args.data)?;
    let shift_id = ShiftId::new(args.shift);
    let candidates = service.candidates(&shift_id)?;

    render_candidates(&shift_id, &candidates);
    Ok(())
}

fn load_service(path: &Path) -> Result<SchedulingService<InMemorySchedulingStore>, AppError> {
    let snapshot = ScheduleSnapshot::from_path(path)?;
    let store = InMemorySchedulingStore::from_snapshot(snapshot);
    Ok(SchedulingService::new(Arc::new(store)))
}

pub(crate) fn render_batch_summary(summary: &BatchSummary) {
    println!("Auto-schedule run for {}", summary.agency_id);
    println!(
        "Week: {} (status {})",
        summary.week,
        summary.status.label()
    );
    println!(
        "Assigned: {}, no match: {}, errors: {}",
        summary.assigned_count, summary.no_match_count, summary.error_count
    );

    if summary.details.is_empty() {
        println!("\nShifts: none");
        return;
    }

    println!("\nShifts");
    for detail in &summary.details {
        match detail.outcome {
            OutcomeKind::Assigned => println!(
                "- {}: assigned to {}",
                detail.shift_id,
                detail
                    .caregiver_id
                    .as_ref()
                    .map(|id| id.as_str())
                    .unwrap_or("unknown")
            ),
            OutcomeKind::NoMatch => println!("- {}: no eligible caregiver", detail.shift_id),
            OutcomeKind::Error => println!("- {}: error, {}", detail.shift_id, detail.message),
        }
    }
}

fn render_candidates(shift_id: &ShiftId, candidates: &[ScoredCandidate]) {
    println!("Candidates for shift {shift_id}");
    if candidates.is_empty() {
        println!("- none eligible");
        return;
    }

    for (position, candidate) in candidates.iter().enumerate() {
        println!(
            "{}. {} (score {:.3}, rating {}, reliability {})",
            position + 1,
            candidate.caregiver.id,
            candidate.score,
            display_metric(candidate.caregiver.performance_rating),
            display_metric(candidate.caregiver.reliability_score),
        );
    }
}

fn display_metric(value: Option<f64>) -> String {
    value
        .map(|value| format!("{value:.2}"))
        .unwrap_or_else(|| "n/a".to_string())
}
