use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use care_match::workflows::scheduling::{
    scheduling_router, SchedulingRepository, SchedulingService,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_scheduling_routes<R>(service: Arc<SchedulingService<R>>) -> axum::Router
where
    R: SchedulingRepository + 'static,
{
    scheduling_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemorySchedulingStore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use care_match::workflows::scheduling::{
        AgencyId, AvailabilityWindow, Caregiver, CaregiverId, ClientId, ScheduleSnapshot, Shift,
        ShiftId, ShiftStatus, Skill,
    };
    use chrono::{NaiveDate, NaiveTime};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn at(hour: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, 0, 0).expect("valid time")
    }

    fn seeded_store() -> InMemorySchedulingStore {
        let shift = Shift {
            id: ShiftId::new("shift-1"),
            agency_id: AgencyId::new("agency-1"),
            client_id: ClientId::new("client-1"),
            caregiver_id: None,
            shift_date: NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date"),
            start_time: at(9),
            end_time: at(13),
            duration_hours: 4.0,
            care_type_code: "personal_care".to_string(),
            status: ShiftStatus::Open,
        };
        let caregiver = Caregiver {
            id: CaregiverId::new("cg-a"),
            agency_id: AgencyId::new("agency-1"),
            is_active: true,
            employment_type: None,
            hourly_rate: None,
            performance_rating: Some(4.5),
            reliability_score: Some(0.9),
            skills: vec![Skill::new("personal_care")],
            availability: vec![AvailabilityWindow {
                day_of_week: 1,
                start_time: at(8),
                end_time: at(14),
                is_available: true,
            }],
        };
        InMemorySchedulingStore::from_snapshot(ScheduleSnapshot {
            shifts: vec![shift],
            caregivers: vec![caregiver],
            assignments: Vec::new(),
        })
    }

    fn app(ready: bool) -> axum::Router {
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let service = Arc::new(SchedulingService::new(Arc::new(seeded_store())));
        with_scheduling_routes(service).layer(Extension(state))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let response = app(true)
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("route");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_tracks_flag() {
        let response = app(false)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("route");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let state = AppState {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        state.readiness.store(true, Ordering::Release);
        let response = readiness_endpoint(Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn scheduling_routes_are_mounted_alongside_probes() {
        let response = app(true)
            .oneshot(
                Request::post("/api/v1/scheduling/auto-schedule")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "agency_id": "agency-1", "today": "2026-10-14" }).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("route");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["assigned_count"], 1);
        assert_eq!(payload["details"][0]["caregiver_id"], "cg-a");
    }
}
