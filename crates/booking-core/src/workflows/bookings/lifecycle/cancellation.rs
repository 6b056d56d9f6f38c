use serde::Serialize;
use tracing::info;

use super::super::audit::{AuditAction, FieldChange};
use super::super::domain::{Job, JobId, JobStatus, Role, UserId};
use super::super::notifications::{BroadcastReport, MessageKey};
use super::super::repository::{Changeset, Directory, JobStore};
use super::error::{BookingError, Missing};
use super::BookingService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Canceller {
    Customer,
    Translator,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelOutcome {
    pub job: Job,
    pub cancelled_by: Canceller,
    /// Offer round sent after a translator backed out.
    pub rebroadcast: Option<BroadcastReport>,
}

impl<S, D> BookingService<S, D>
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    /// Route a cancellation by the actor's role.
    pub fn cancel(&self, job_id: JobId, actor: UserId) -> Result<CancelOutcome, BookingError> {
        let account = self.user(actor)?;
        match account.role {
            Role::Customer => self.cancel_by_customer(job_id, actor),
            Role::Translator => self.cancel_by_translator(job_id, actor),
            role => Err(BookingError::Forbidden { role }),
        }
    }

    /// Withdraw a pending or assigned job. Less than a full window of notice is a late withdrawal.
    pub fn cancel_by_customer(
        &self,
        job_id: JobId,
        actor: UserId,
    ) -> Result<CancelOutcome, BookingError> {
        let mut job = self.load_job(job_id)?;
        if !matches!(job.status, JobStatus::Pending | JobStatus::Assigned) {
            return Err(BookingError::InvalidState {
                operation: "customer cancellation",
                status: job.status,
            });
        }

        let translator = self.active_translator(job_id)?;
        let now = self.now();
        let previous = job.status;
        job.withdrawn_at = Some(now);
        job.status = if self.policy.is_early_withdrawal(job.due, now) {
            JobStatus::WithdrawBefore24
        } else {
            JobStatus::WithdrawAfter24
        };

        self.store.commit(Changeset::default().update_job(job.clone()))?;
        self.record(
            job_id,
            Some(actor),
            AuditAction::CustomerCancelled,
            vec![FieldChange::Status {
                old: previous,
                new: job.status,
            }],
        );
        info!(%job_id, status = job.status.label(), "booking withdrawn by customer");

        if let Some(translator) = &translator {
            self.notifier.customer_cancelled(translator, &job, now);
        }

        Ok(CancelOutcome {
            job,
            cancelled_by: Canceller::Customer,
            rebroadcast: None,
        })
    }

    /// Drop the translator's assignment and put the job back on offer.
    pub fn cancel_by_translator(
        &self,
        job_id: JobId,
        translator_id: UserId,
    ) -> Result<CancelOutcome, BookingError> {
        let mut job = self.load_job(job_id)?;
        let assignment = self
            .active_assignment(job_id)?
            .filter(|assignment| assignment.translator_id == translator_id)
            .ok_or(BookingError::NotFound(Missing::ActiveAssignment(job_id)))?;

        let now = self.now();
        if !self.policy.allows_translator_cancellation(job.due, now) {
            let message = self.notifier.message(
                MessageKey::TooLateToCancel,
                &[("support_phone", self.config.support_phone.clone())],
            );
            return Err(BookingError::TooLateToCancel { message });
        }

        let previous = job.status;
        job.status = JobStatus::Pending;
        job.created_at = now;
        job.expires_at = self.policy.compute_expiry(job.due, now);

        self.store.commit(
            Changeset::default()
                .update_job(job.clone())
                .delete_assignment(assignment.id),
        )?;
        self.record(
            job_id,
            Some(translator_id),
            AuditAction::TranslatorCancelled,
            vec![FieldChange::Status {
                old: previous,
                new: JobStatus::Pending,
            }],
        );
        info!(%job_id, %translator_id, "booking cancelled by translator");

        if let Some(customer) = self.post_commit_user(job.requester_id) {
            self.notifier.translator_cancelled(&customer, &job, now);
        }
        let rebroadcast = self.rebroadcast(&job, Some(translator_id));

        Ok(CancelOutcome {
            job,
            cancelled_by: Canceller::Translator,
            rebroadcast,
        })
    }
}
