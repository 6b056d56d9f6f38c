use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use booking_core::workflows::bookings::{booking_router, BookingService, Directory, JobStore};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_booking_routes<S, D>(service: Arc<BookingService<S, D>>) -> axum::Router
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    booking_router(service)
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
    use crate::infra::{build_service, Channels, Outboxes, DEMO_CUSTOMER};
    use axum::body::Body;
    use axum::http::Request;
    use booking_core::workflows::bookings::{
        BookingConfig, FixedClock, MemoryJobStore, ACTOR_HEADER,
    };
    use chrono::NaiveDate;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool) -> axum::Router {
        let now = NaiveDate::from_ymd_opt(2026, 4, 1)
            .and_then(|date| date.and_hms_opt(9, 0, 0))
            .expect("valid timestamp");
        let service = build_service(
            BookingConfig::default(),
            MemoryJobStore::default(),
            Arc::new(FixedClock::new(now)),
            Channels::from(&Outboxes::default()),
        );
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_booking_routes(service).layer(Extension(state))
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_bound() {
        let response = app(false)
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router is infallible");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app(true)
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router is infallible");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn booking_routes_are_mounted_next_to_health() {
        let response = app(true)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router is infallible");
        assert_eq!(response.status(), StatusCode::OK);

        let body = json!({
            "from_language_id": 1,
            "immediate": "yes",
            "duration": "20",
        });
        let response = app(true)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/jobs")
                    .header("content-type", "application/json")
                    .header(ACTOR_HEADER, DEMO_CUSTOMER.to_string())
                    .body(Body::from(body.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("router is infallible");
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
