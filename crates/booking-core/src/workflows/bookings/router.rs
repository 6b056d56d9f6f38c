use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{Assignment, Job, JobId, UserId};
use super::lifecycle::{
    AdminUpdate, BookingDetails, BookingError, BookingRequest, BookingService, JobInformation,
};
use super::repository::{Directory, JobStore, RepositoryError};

/// Header carrying the acting user's id. Authentication happens upstream.
pub const ACTOR_HEADER: &str = "x-user-id";

type SharedService<S, D> = State<Arc<BookingService<S, D>>>;

/// Router exposing the booking lifecycle over HTTP.
pub fn booking_router<S, D>(service: Arc<BookingService<S, D>>) -> Router
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    Router::new()
        .route("/api/v1/jobs", post(create_handler::<S, D>))
        .route("/api/v1/jobs/:job_id", get(job_handler::<S, D>))
        .route("/api/v1/jobs/:job_id/confirm", post(confirm_handler::<S, D>))
        .route("/api/v1/jobs/:job_id/accept", post(accept_handler::<S, D>))
        .route("/api/v1/jobs/:job_id/cancel", post(cancel_handler::<S, D>))
        .route("/api/v1/jobs/:job_id/end", post(end_handler::<S, D>))
        .route(
            "/api/v1/jobs/:job_id/customer-not-call",
            post(customer_not_call_handler::<S, D>),
        )
        .route("/api/v1/jobs/:job_id/reopen", post(reopen_handler::<S, D>))
        .route("/api/v1/jobs/:job_id/sms", post(sms_handler::<S, D>))
        .route(
            "/api/v1/jobs/:job_id/resend-push",
            post(resend_push_handler::<S, D>),
        )
        .route("/api/v1/admin/jobs/:job_id", put(admin_update_handler::<S, D>))
        .route(
            "/api/v1/admin/jobs/:job_id/information",
            put(information_handler::<S, D>),
        )
        .route(
            "/api/v1/translators/:user_id/potential-jobs",
            get(potential_jobs_handler::<S, D>),
        )
        .route("/api/v1/users/:user_id/jobs", get(user_jobs_handler::<S, D>))
        .route(
            "/api/v1/users/:user_id/jobs/history",
            get(user_history_handler::<S, D>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HistoryQuery {
    page: Option<usize>,
}

#[derive(Serialize)]
struct JobView {
    job: Job,
    assignments: Vec<Assignment>,
}

fn actor(headers: &HeaderMap) -> Result<UserId, Response> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(UserId)
        .ok_or_else(|| {
            let payload = json!({
                "status": "fail",
                "message": format!("missing or invalid {ACTOR_HEADER} header"),
                "field_name": serde_json::Value::Null,
            });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        })
}

pub(crate) fn status_for(error: &BookingError) -> StatusCode {
    match error {
        BookingError::Validation(_)
        | BookingError::TransitionRejected(_)
        | BookingError::InvalidState { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        BookingError::Forbidden { .. } => StatusCode::FORBIDDEN,
        BookingError::AlreadyBooked { .. }
        | BookingError::AlreadyTaken { .. }
        | BookingError::TooLateToCancel { .. } => StatusCode::CONFLICT,
        BookingError::NotFound(_) | BookingError::Repository(RepositoryError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        BookingError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        BookingError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub(crate) fn error_response(error: BookingError) -> Response {
    let status = status_for(&error);
    let message = match &error {
        BookingError::Validation(validation) => validation.message.clone(),
        other => other.to_string(),
    };
    let payload = json!({
        "status": "fail",
        "message": message,
        "field_name": error.field_name(),
    });
    (status, Json(payload)).into_response()
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, BookingError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_handler<S, D>(
    State(service): SharedService<S, D>,
    headers: HeaderMap,
    Json(request): Json<BookingRequest>,
) -> Response
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    let requester = match actor(&headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    respond(StatusCode::CREATED, service.create(requester, request))
}

pub(crate) async fn job_handler<S, D>(
    State(service): SharedService<S, D>,
    Path(job_id): Path<u64>,
) -> Response
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    let id = JobId(job_id);
    let view = service.job(id).and_then(|job| {
        let assignments = service.assignments(id)?;
        Ok(JobView { job, assignments })
    });
    respond(StatusCode::OK, view)
}

pub(crate) async fn confirm_handler<S, D>(
    State(service): SharedService<S, D>,
    Path(job_id): Path<u64>,
    Json(details): Json<BookingDetails>,
) -> Response
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    respond(StatusCode::OK, service.confirm_booking(JobId(job_id), details))
}

pub(crate) async fn accept_handler<S, D>(
    State(service): SharedService<S, D>,
    Path(job_id): Path<u64>,
    headers: HeaderMap,
) -> Response
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    let translator = match actor(&headers) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.accept(JobId(job_id), translator) {
        Ok(outcome) => {
            let payload = json!({
                "status": "success",
                "message": outcome.message,
                "job": outcome.job,
                "assignment": outcome.assignment,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_handler<S, D>(
    State(service): SharedService<S, D>,
    Path(job_id): Path<u64>,
    headers: HeaderMap,
) -> Response
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    match actor(&headers) {
        Ok(id) => respond(StatusCode::OK, service.cancel(JobId(job_id), id)),
        Err(response) => response,
    }
}

pub(crate) async fn end_handler<S, D>(
    State(service): SharedService<S, D>,
    Path(job_id): Path<u64>,
    headers: HeaderMap,
) -> Response
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    match actor(&headers) {
        Ok(id) => respond(StatusCode::OK, service.end_job(JobId(job_id), id)),
        Err(response) => response,
    }
}

pub(crate) async fn customer_not_call_handler<S, D>(
    State(service): SharedService<S, D>,
    Path(job_id): Path<u64>,
    headers: HeaderMap,
) -> Response
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    match actor(&headers) {
        Ok(id) => respond(StatusCode::OK, service.customer_not_call(JobId(job_id), id)),
        Err(response) => response,
    }
}

pub(crate) async fn reopen_handler<S, D>(
    State(service): SharedService<S, D>,
    Path(job_id): Path<u64>,
    headers: HeaderMap,
) -> Response
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    match actor(&headers) {
        Ok(id) => respond(StatusCode::OK, service.reopen(JobId(job_id), id)),
        Err(response) => response,
    }
}

pub(crate) async fn sms_handler<S, D>(
    State(service): SharedService<S, D>,
    Path(job_id): Path<u64>,
) -> Response
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    let sent = service
        .notify_sms(JobId(job_id))
        .map(|sent| json!({ "job_id": job_id, "sent": sent }));
    respond(StatusCode::OK, sent)
}

pub(crate) async fn resend_push_handler<S, D>(
    State(service): SharedService<S, D>,
    Path(job_id): Path<u64>,
) -> Response
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    let report = service
        .resend_notifications(JobId(job_id))
        .map(|report| json!({ "status": "success", "job_id": job_id, "report": report }));
    respond(StatusCode::OK, report)
}

pub(crate) async fn admin_update_handler<S, D>(
    State(service): SharedService<S, D>,
    Path(job_id): Path<u64>,
    headers: HeaderMap,
    Json(update): Json<AdminUpdate>,
) -> Response
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    match actor(&headers) {
        Ok(id) => respond(
            StatusCode::OK,
            service.update_by_admin(JobId(job_id), update, id),
        ),
        Err(response) => response,
    }
}

pub(crate) async fn potential_jobs_handler<S, D>(
    State(service): SharedService<S, D>,
    Path(user_id): Path<u64>,
) -> Response
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    respond(StatusCode::OK, service.potential_jobs(UserId(user_id)))
}

pub(crate) async fn information_handler<S, D>(
    State(service): SharedService<S, D>,
    Path(job_id): Path<u64>,
    headers: HeaderMap,
    Json(information): Json<JobInformation>,
) -> Response
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    match actor(&headers) {
        Ok(id) => respond(
            StatusCode::OK,
            service.update_job_information(JobId(job_id), information, id),
        ),
        Err(response) => response,
    }
}

pub(crate) async fn user_jobs_handler<S, D>(
    State(service): SharedService<S, D>,
    Path(user_id): Path<u64>,
) -> Response
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    respond(StatusCode::OK, service.user_jobs(UserId(user_id)))
}

pub(crate) async fn user_history_handler<S, D>(
    State(service): SharedService<S, D>,
    Path(user_id): Path<u64>,
    Query(query): Query<HistoryQuery>,
) -> Response
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    let page = query.page.unwrap_or(1);
    respond(StatusCode::OK, service.user_jobs_history(UserId(user_id), page))
}
