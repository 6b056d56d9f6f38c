use crate::cli::ServeArgs;
use crate::infra::{build_service, AppState, Channels};
use crate::routes::with_booking_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use booking_core::config::AppConfig;
use booking_core::error::AppError;
use booking_core::telemetry;
use booking_core::workflows::bookings::{MemoryJobStore, SystemClock};
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

    let service = build_service(
        config.booking.clone(),
        MemoryJobStore::default(),
        Arc::new(SystemClock),
        Channels::logging(),
    );

    let app = with_booking_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "booking service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
