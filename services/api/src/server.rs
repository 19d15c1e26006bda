use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemorySchedulingStore};
use crate::routes::with_scheduling_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use care_match::config::AppConfig;
use care_match::error::AppError;
use care_match::telemetry;
use care_match::workflows::scheduling::{ScheduleSnapshot, SchedulingService};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = match &config.store.seed_path {
        Some(path) => {
            let snapshot = ScheduleSnapshot::from_path(path)?;
            info!(
                path = %path.display(),
                shifts = snapshot.shifts.len(),
                caregivers = snapshot.caregivers.len(),
                "seeded scheduling store"
            );
            InMemorySchedulingStore::from_snapshot(snapshot)
        }
        None => InMemorySchedulingStore::default(),
    };
    let scheduling_service = Arc::new(SchedulingService::new(Arc::new(store)));

    let app = with_scheduling_routes(scheduling_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "care match service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
