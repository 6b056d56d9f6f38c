use serde::Serialize;
use tracing::info;

use super::super::audit::{AuditAction, FieldChange};
use super::super::domain::{Job, JobId, JobStatus, Role, SessionDuration, UserId};
use super::super::notifications::BroadcastReport;
use super::super::repository::{Changeset, Directory, JobStore};
use super::error::BookingError;
use super::BookingService;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndOutcome {
    pub job: Job,
    /// False when the job was not `started` and nothing was touched.
    pub changed: bool,
    pub session: Option<SessionDuration>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReopenOutcome {
    pub job: Job,
    pub reopened_from: JobId,
    pub broadcast: Option<BroadcastReport>,
}

impl<S, D> BookingService<S, D>
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    /// Close a started session. Other statuses succeed without changes.
    pub fn end_job(&self, job_id: JobId, actor: UserId) -> Result<EndOutcome, BookingError> {
        let mut job = self.load_job(job_id)?;
        if job.status != JobStatus::Started {
            return Ok(EndOutcome {
                job,
                changed: false,
                session: None,
            });
        }

        let now = self.now();
        let session = SessionDuration::between(job.due, now);
        let active = self.active_assignment(job_id)?;

        job.status = JobStatus::Completed;
        job.ended_at = Some(now);
        job.session_time = Some(session);

        let mut changes = Changeset::default().update_job(job.clone());
        if let Some(active) = &active {
            let mut closed = active.clone();
            closed.completed_at = Some(now);
            closed.completed_by = Some(actor);
            changes = changes.update_assignment(closed);
        }
        self.store.commit(changes)?;

        let translator_id = active.as_ref().map(|assignment| assignment.translator_id);
        let counterpart = if actor == job.requester_id {
            translator_id
        } else {
            Some(job.requester_id)
        };
        let mut audit = vec![
            FieldChange::Status {
                old: JobStatus::Started,
                new: JobStatus::Completed,
            },
            FieldChange::note(format!("session {session}")),
        ];
        if let Some(counterpart) = counterpart {
            audit.push(FieldChange::note(format!("counterpart notified: user {counterpart}")));
        }
        self.record(job_id, Some(actor), AuditAction::Ended, audit);
        info!(%job_id, %actor, session = %session, "session ended");

        let customer = self.post_commit_user(job.requester_id);
        let translator = translator_id.and_then(|id| self.post_commit_user(id));
        if let (Some(customer), Some(translator)) = (&customer, &translator) {
            self.notifier.session_ended(&job, customer, translator, session);
        }

        Ok(EndOutcome {
            job,
            changed: true,
            session: Some(session),
        })
    }

    /// Mark a started session as not carried out because the customer never called.
    pub fn customer_not_call(&self, job_id: JobId, actor: UserId) -> Result<Job, BookingError> {
        let mut job = self.load_job(job_id)?;
        if job.status != JobStatus::Started {
            return Err(BookingError::InvalidState {
                operation: "customer not call",
                status: job.status,
            });
        }

        let now = self.now();
        let session = SessionDuration::between(job.due, now);
        job.status = JobStatus::NotCarriedOutCustomer;
        job.ended_at = Some(now);

        let mut changes = Changeset::default().update_job(job.clone());
        if let Some(active) = self.active_assignment(job_id)? {
            let mut closed = active.clone();
            closed.completed_at = Some(now);
            closed.completed_by = Some(active.translator_id);
            changes = changes.update_assignment(closed);
        }
        self.store.commit(changes)?;

        self.record(
            job_id,
            Some(actor),
            AuditAction::CustomerNotCall,
            vec![
                FieldChange::Status {
                    old: JobStatus::Started,
                    new: JobStatus::NotCarriedOutCustomer,
                },
                FieldChange::note(format!("elapsed {session}")),
            ],
        );
        info!(%job_id, "session not carried out by customer");
        Ok(job)
    }

    /// Put a job back on offer. Timed-out jobs are copied into a new booking.
    pub fn reopen(&self, job_id: JobId, actor: UserId) -> Result<ReopenOutcome, BookingError> {
        let admin = self.user(actor)?;
        if !matches!(admin.role, Role::Admin | Role::SuperAdmin) {
            return Err(BookingError::Forbidden { role: admin.role });
        }

        let original = self.load_job(job_id)?;
        let now = self.now();
        let expires_at = self.policy.compute_expiry(original.due, now);

        let mut changes = Changeset::default();
        for assignment in self.store.assignments(job_id)? {
            if assignment.cancelled_at.is_none() {
                let mut cancelled = assignment;
                cancelled.cancelled_at = Some(now);
                changes = changes.update_assignment(cancelled);
            }
        }

        let job = if original.status == JobStatus::TimedOut {
            let copy = Job {
                id: self.store.next_job_id()?,
                status: JobStatus::Pending,
                created_at: now,
                expires_at,
                admin_comments: format!("This booking is a reopening of booking #{job_id}"),
                ended_at: None,
                session_time: None,
                withdrawn_at: None,
                ..original.clone()
            };
            changes = changes.insert_job(copy.clone());
            copy
        } else {
            let mut job = original.clone();
            job.status = JobStatus::Pending;
            job.created_at = now;
            job.expires_at = expires_at;
            changes = changes.update_job(job.clone());
            job
        };

        self.store.commit(changes)?;
        self.record(
            job.id,
            Some(actor),
            AuditAction::Reopened,
            vec![
                FieldChange::Status {
                    old: original.status,
                    new: JobStatus::Pending,
                },
                FieldChange::note(format!("reopened from booking #{job_id}")),
            ],
        );
        info!(%job_id, new_job_id = %job.id, "booking reopened");

        let broadcast = self.rebroadcast(&job, None);
        Ok(ReopenOutcome {
            job,
            reopened_from: job_id,
            broadcast,
        })
    }
}
