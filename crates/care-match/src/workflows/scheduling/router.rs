use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::assignment::AssignmentError;
use super::calendar::WeekSelection;
use super::domain::{AgencyId, AssignmentId, CaregiverId, ShiftId};
use super::ranking::RankedMatch;
use super::repository::{RepositoryError, SchedulingRepository};
use super::service::{SchedulingService, SchedulingServiceError};

/// Body of an auto-schedule request. `week` defaults to next week, `today` to the local date.
#[derive(Debug, Deserialize)]
pub struct AutoScheduleRequest {
    pub agency_id: AgencyId,
    #[serde(default)]
    pub week: WeekSelection,
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct PickUpRequest {
    pub caregiver_id: CaregiverId,
}

/// Router builder exposing the matching engine over HTTP.
pub fn scheduling_router<R>(service: Arc<SchedulingService<R>>) -> Router
where
    R: SchedulingRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/scheduling/auto-schedule",
            post(auto_schedule_handler::<R>),
        )
        .route(
            "/api/v1/scheduling/shifts/:shift_id/candidates",
            get(candidates_handler::<R>),
        )
        .route(
            "/api/v1/scheduling/shifts/:shift_id/accept-match",
            post(accept_match_handler::<R>),
        )
        .route(
            "/api/v1/scheduling/shifts/:shift_id/pick-up",
            post(pick_up_handler::<R>),
        )
        .route(
            "/api/v1/scheduling/assignments/:assignment_id/compensate",
            post(compensate_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn auto_schedule_handler<R>(
    State(service): State<Arc<SchedulingService<R>>>,
    axum::Json(request): axum::Json<AutoScheduleRequest>,
) -> Response
where
    R: SchedulingRepository + 'static,
{
    let today = request.today.unwrap_or_else(|| Local::now().date_naive());
    match service.auto_schedule(&request.agency_id, request.week, today) {
        Ok(result) => (StatusCode::OK, axum::Json(result.summary())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn candidates_handler<R>(
    State(service): State<Arc<SchedulingService<R>>>,
    Path(shift_id): Path<String>,
) -> Response
where
    R: SchedulingRepository + 'static,
{
    match service.candidates(&ShiftId(shift_id)) {
        Ok(candidates) => (StatusCode::OK, axum::Json(candidates)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn accept_match_handler<R>(
    State(service): State<Arc<SchedulingService<R>>>,
    Path(shift_id): Path<String>,
    axum::Json(ranked): axum::Json<RankedMatch>,
) -> Response
where
    R: SchedulingRepository + 'static,
{
    let shift_id = ShiftId(shift_id);
    match service.accept_match(&shift_id, &ranked.caregiver_id, &ranked) {
        Ok(assignment) => (StatusCode::CREATED, axum::Json(assignment)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn pick_up_handler<R>(
    State(service): State<Arc<SchedulingService<R>>>,
    Path(shift_id): Path<String>,
    axum::Json(request): axum::Json<PickUpRequest>,
) -> Response
where
    R: SchedulingRepository + 'static,
{
    match service.pick_up(&ShiftId(shift_id), &request.caregiver_id) {
        Ok(assignment) => (StatusCode::CREATED, axum::Json(assignment)).into_response(),
        Err(err) => error_response(err),
    }
}

/// Cancels an assignment left behind by a partial write.
pub(crate) async fn compensate_handler<R>(
    State(service): State<Arc<SchedulingService<R>>>,
    Path(assignment_id): Path<String>,
) -> Response
where
    R: SchedulingRepository + 'static,
{
    match service.compensate(&AssignmentId(assignment_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

/// HTTP status for a scheduling failure. Store failures are the only 500s.
pub fn status_for(err: &SchedulingServiceError) -> StatusCode {
    match err {
        SchedulingServiceError::ShiftNotFound(_)
        | SchedulingServiceError::Assignment(AssignmentError::ShiftNotFound(_))
        | SchedulingServiceError::Assignment(AssignmentError::CaregiverNotFound(_))
        | SchedulingServiceError::Assignment(AssignmentError::CompensationFailed {
            source: RepositoryError::NotFound,
            ..
        }) => StatusCode::NOT_FOUND,
        SchedulingServiceError::Assignment(AssignmentError::AlreadyAssigned(_))
        | SchedulingServiceError::Assignment(AssignmentError::ShiftNotOpen { .. }) => {
            StatusCode::CONFLICT
        }
        SchedulingServiceError::Assignment(AssignmentError::CaregiverInactive(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: SchedulingServiceError) -> Response {
    let mut payload = json!({
        "error": err.to_string(),
    });
    if let Some(assignment_id) = err.assignment_id() {
        payload["assignment_id"] = json!(assignment_id);
        payload["rolled_back"] = json!(matches!(err, SchedulingServiceError::RolledBack { .. }));
    }
    (status_for(&err), axum::Json(payload)).into_response()
}
