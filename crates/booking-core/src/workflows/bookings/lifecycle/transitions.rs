//! Admin status handlers, one per current status.
//!
//! Handlers mutate the in-memory job only. The caller commits the job and then carries out
//! the returned effects, so a rejected handler leaves nothing persisted. A target a handler
//! does not support leaves the status alone, and the rest of the update still applies.

use chrono::NaiveDateTime;

use super::super::audit::FieldChange;
use super::super::clock::TimePolicy;
use super::super::domain::{Job, JobStatus, SessionDuration};
use super::error::TransitionRejected;

/// Follow-up work owed once the status change is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEffect {
    /// Tell the customer a timed-out job is open again and offer it to the pool.
    Reopened,
    /// Tell the customer an admin found them a translator.
    AcceptedToCustomer,
    /// Invoice and salary mails for a session the admin closed.
    SessionEnded(SessionDuration),
    /// Tell the customer a pending job will not be served.
    StatusChangedToCustomer,
    /// Confirm to both parties and remind them of the session.
    TranslatorAssigned,
    /// Cancellation mails to the customer and the serving translator.
    Withdrawn,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransitionOutcome {
    pub changed: bool,
    pub change: Option<FieldChange>,
    pub effects: Vec<StatusEffect>,
}

impl TransitionOutcome {
    pub fn unchanged() -> Self {
        Self::default()
    }

    fn moved(job: &mut Job, to: JobStatus, effects: Vec<StatusEffect>) -> Self {
        let from = job.status;
        job.status = to;
        Self {
            changed: true,
            change: Some(FieldChange::Status { old: from, new: to }),
            effects,
        }
    }
}

/// Status change requested through an admin update.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StatusRequest<'a> {
    pub target: JobStatus,
    /// Comment sent with this update, not the one already stored on the job.
    pub comment: Option<&'a str>,
    pub session_time: Option<&'a str>,
    pub translator_changed: bool,
    pub now: NaiveDateTime,
}

impl StatusRequest<'_> {
    fn has_comment(&self) -> bool {
        self.comment.is_some_and(|comment| !comment.trim().is_empty())
    }

    fn reject(&self, from: JobStatus, reason: &str) -> TransitionRejected {
        TransitionRejected::new(from, self.target, reason)
    }
}

const COMMENT_REQUIRED: &str = "an admin comment is required";

pub(crate) fn apply(
    job: &mut Job,
    request: &StatusRequest<'_>,
    policy: &TimePolicy,
) -> Result<TransitionOutcome, TransitionRejected> {
    if request.target == job.status {
        return Ok(TransitionOutcome::unchanged());
    }

    match job.status {
        JobStatus::TimedOut => from_timed_out(job, request, policy),
        JobStatus::Completed => from_completed(job, request),
        JobStatus::Started => from_started(job, request),
        JobStatus::Pending => from_pending(job, request),
        JobStatus::WithdrawAfter24 => from_withdrawn_late(job, request),
        JobStatus::Assigned => from_assigned(job, request),
        JobStatus::WithdrawBefore24 | JobStatus::NotCarriedOutCustomer => {
            Ok(TransitionOutcome::unchanged())
        }
    }
}

fn from_timed_out(
    job: &mut Job,
    request: &StatusRequest<'_>,
    policy: &TimePolicy,
) -> Result<TransitionOutcome, TransitionRejected> {
    if request.target == JobStatus::Pending {
        job.created_at = request.now;
        job.expires_at = policy.compute_expiry(job.due, request.now);
        return Ok(TransitionOutcome::moved(
            job,
            JobStatus::Pending,
            vec![StatusEffect::Reopened],
        ));
    }
    if request.translator_changed {
        return Ok(TransitionOutcome::moved(
            job,
            request.target,
            vec![StatusEffect::AcceptedToCustomer],
        ));
    }
    Ok(TransitionOutcome::unchanged())
}

fn from_completed(
    job: &mut Job,
    request: &StatusRequest<'_>,
) -> Result<TransitionOutcome, TransitionRejected> {
    if request.target == JobStatus::TimedOut && !request.has_comment() {
        return Err(request.reject(job.status, COMMENT_REQUIRED));
    }
    Ok(TransitionOutcome::moved(job, request.target, Vec::new()))
}

fn from_started(
    job: &mut Job,
    request: &StatusRequest<'_>,
) -> Result<TransitionOutcome, TransitionRejected> {
    if !request.has_comment() {
        return Err(request.reject(job.status, COMMENT_REQUIRED));
    }
    if request.target != JobStatus::Completed {
        return Ok(TransitionOutcome::moved(job, request.target, Vec::new()));
    }

    let session = request
        .session_time
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| request.reject(job.status, "a session time is required"))
        .and_then(|raw| {
            SessionDuration::parse(raw)
                .ok_or_else(|| request.reject(job.status, "session time must be h:m or h:m:s"))
        })?;
    job.ended_at = Some(request.now);
    job.session_time = Some(session);
    Ok(TransitionOutcome::moved(
        job,
        JobStatus::Completed,
        vec![StatusEffect::SessionEnded(session)],
    ))
}

fn from_pending(
    job: &mut Job,
    request: &StatusRequest<'_>,
) -> Result<TransitionOutcome, TransitionRejected> {
    if request.target == JobStatus::TimedOut && !request.has_comment() {
        return Err(request.reject(job.status, COMMENT_REQUIRED));
    }

    if request.target == JobStatus::Assigned {
        if !request.translator_changed {
            return Err(request.reject(
                job.status,
                "assigning a job requires choosing a translator",
            ));
        }
        return Ok(TransitionOutcome::moved(
            job,
            JobStatus::Assigned,
            vec![StatusEffect::TranslatorAssigned],
        ));
    }

    Ok(TransitionOutcome::moved(
        job,
        request.target,
        vec![StatusEffect::StatusChangedToCustomer],
    ))
}

fn from_withdrawn_late(
    job: &mut Job,
    request: &StatusRequest<'_>,
) -> Result<TransitionOutcome, TransitionRejected> {
    if request.target != JobStatus::TimedOut {
        return Ok(TransitionOutcome::unchanged());
    }
    if !request.has_comment() {
        return Err(request.reject(job.status, COMMENT_REQUIRED));
    }
    Ok(TransitionOutcome::moved(job, JobStatus::TimedOut, Vec::new()))
}

fn from_assigned(
    job: &mut Job,
    request: &StatusRequest<'_>,
) -> Result<TransitionOutcome, TransitionRejected> {
    match request.target {
        JobStatus::TimedOut => {
            if !request.has_comment() {
                return Err(request.reject(job.status, COMMENT_REQUIRED));
            }
            Ok(TransitionOutcome::moved(job, JobStatus::TimedOut, Vec::new()))
        }
        JobStatus::WithdrawBefore24 | JobStatus::WithdrawAfter24 => Ok(TransitionOutcome::moved(
            job,
            request.target,
            vec![StatusEffect::Withdrawn],
        )),
        _ => Ok(TransitionOutcome::unchanged()),
    }
}
