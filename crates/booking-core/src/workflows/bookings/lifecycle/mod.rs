//! Job lifecycle state machine.
//!
//! Each operation loads what it needs, computes a [`Changeset`], commits it atomically, and
//! only then appends to the audit log and dispatches notifications.

mod acceptance;
mod admin;
mod broadcast;
mod cancellation;
mod completion;
mod error;
mod information;
mod intake;
mod listings;
mod transitions;

pub use acceptance::AcceptOutcome;
pub use admin::{AdminUpdate, AdminUpdateOutcome, ChangeNotice};
pub use cancellation::{CancelOutcome, Canceller};
pub use completion::{EndOutcome, ReopenOutcome};
pub use error::{BookingError, Missing, TransitionRejected, ValidationError};
pub use information::JobInformation;
pub use intake::{BookingDetails, BookingReceipt, BookingRequest, BookingType};
pub use listings::{JobHistory, UserJobs, UserType, HISTORY_PAGE_SIZE};
pub use transitions::{StatusEffect, TransitionOutcome};

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::warn;

use super::audit::{AuditAction, AuditEntry, AuditLog, FieldChange};
use super::clock::{Clock, TimePolicy};
use super::config::BookingConfig;
use super::domain::{
    Assignment, Job, JobId, RequesterProfile, TranslatorProfile, UserAccount, UserId,
};
use super::notifications::NotificationDispatcher;
use super::repository::{Directory, JobStore, Locale, Mailer, PushChannel, SmsChannel};

/// External collaborators shared by every lifecycle operation.
#[derive(Clone)]
pub struct Collaborators {
    pub mailer: Arc<dyn Mailer>,
    pub push: Arc<dyn PushChannel>,
    pub sms: Arc<dyn SmsChannel>,
    pub locale: Arc<dyn Locale>,
    pub clock: Arc<dyn Clock>,
    pub audit: Arc<dyn AuditLog>,
}

/// Service composing the job store, user directory, and notification dispatch.
pub struct BookingService<S, D> {
    store: Arc<S>,
    directory: Arc<D>,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditLog>,
    notifier: NotificationDispatcher,
    policy: TimePolicy,
    config: BookingConfig,
}

impl<S, D> BookingService<S, D>
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    pub fn new(
        store: Arc<S>,
        directory: Arc<D>,
        collaborators: Collaborators,
        config: BookingConfig,
    ) -> Self {
        let policy = config.time_policy();
        let notifier = NotificationDispatcher::new(
            collaborators.mailer,
            collaborators.push,
            collaborators.sms,
            collaborators.locale,
            policy,
            config.sms_number.clone(),
        );

        Self {
            store,
            directory,
            clock: collaborators.clock,
            audit: collaborators.audit,
            notifier,
            policy,
            config,
        }
    }

    pub fn policy(&self) -> &TimePolicy {
        &self.policy
    }

    pub fn notifier(&self) -> &NotificationDispatcher {
        &self.notifier
    }

    /// Fetch a job for API responses.
    pub fn job(&self, id: JobId) -> Result<Job, BookingError> {
        self.load_job(id)
    }

    pub fn assignments(&self, id: JobId) -> Result<Vec<Assignment>, BookingError> {
        self.load_job(id)?;
        Ok(self.store.assignments(id)?)
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    fn load_job(&self, id: JobId) -> Result<Job, BookingError> {
        self.store
            .job(id)?
            .ok_or(BookingError::NotFound(Missing::Job(id)))
    }

    fn user(&self, id: UserId) -> Result<UserAccount, BookingError> {
        self.directory
            .user(id)?
            .ok_or(BookingError::NotFound(Missing::User(id)))
    }

    fn requester(&self, id: UserId) -> Result<RequesterProfile, BookingError> {
        self.directory
            .requester(id)?
            .ok_or(BookingError::NotFound(Missing::Requester(id)))
    }

    fn translator(&self, id: UserId) -> Result<TranslatorProfile, BookingError> {
        self.directory
            .translator(id)?
            .ok_or(BookingError::NotFound(Missing::Translator(id)))
    }

    fn active_assignment(&self, job_id: JobId) -> Result<Option<Assignment>, BookingError> {
        Ok(self
            .store
            .assignments(job_id)?
            .into_iter()
            .find(Assignment::is_active))
    }

    /// Account of the translator currently serving the job, if any.
    fn active_translator(&self, job_id: JobId) -> Result<Option<UserAccount>, BookingError> {
        match self.active_assignment(job_id)? {
            Some(assignment) => Ok(self.directory.user(assignment.translator_id)?),
            None => Ok(None),
        }
    }

    fn record(
        &self,
        job_id: JobId,
        actor: Option<UserId>,
        action: AuditAction,
        changes: Vec<FieldChange>,
    ) {
        let entry = AuditEntry {
            at: self.now(),
            actor,
            job_id,
            action,
            changes,
        };
        if let Err(error) = self.audit.append(entry) {
            warn!(%job_id, action = action.label(), %error, "audit append failed");
        }
    }
}
