use serde::Serialize;
use tracing::info;

use super::super::audit::{AuditAction, FieldChange};
use super::super::domain::{Assignment, Job, JobId, JobStatus, Role, UserId};
use super::super::notifications::MessageKey;
use super::super::repository::{Directory, JobStore};
use super::error::BookingError;
use super::BookingService;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptOutcome {
    pub job: Job,
    pub assignment: Assignment,
    pub message: String,
}

impl<S, D> BookingService<S, D>
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    /// Claim a pending job for a translator. The store arbitrates concurrent claims.
    pub fn accept(
        &self,
        job_id: JobId,
        translator_id: UserId,
    ) -> Result<AcceptOutcome, BookingError> {
        let translator = self.user(translator_id)?;
        if translator.role != Role::Translator {
            return Err(BookingError::Forbidden {
                role: translator.role,
            });
        }
        self.load_job(job_id)?;

        let now = self.now();
        let assignment = Assignment::new(
            self.store.next_assignment_id()?,
            job_id,
            translator_id,
            now,
        );
        let job = self.store.accept(assignment.clone())?;

        self.record(
            job_id,
            Some(translator_id),
            AuditAction::Accepted,
            vec![
                FieldChange::Translator {
                    old: None,
                    new: translator_id,
                },
                FieldChange::Status {
                    old: JobStatus::Pending,
                    new: JobStatus::Assigned,
                },
            ],
        );
        info!(%job_id, %translator_id, "booking accepted");

        if let Some(customer) = self.post_commit_user(job.requester_id) {
            self.notifier.job_accepted(&job, &customer);
            self.notifier.job_accepted_push(&job, &customer, now);
        }

        let message = self
            .notifier
            .message(MessageKey::AcceptConfirmation, &self.notifier.job_params(&job));
        Ok(AcceptOutcome {
            job,
            assignment,
            message,
        })
    }
}
