use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::domain::{
    Assignment, AssignmentId, Job, JobId, JobStatus, LanguageId, RequesterProfile,
    TranslatorProfile, UserAccount, UserId,
};

/// Storage abstraction for jobs and their assignments.
pub trait JobStore: Send + Sync {
    fn job(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;
    fn jobs_with_status(&self, status: JobStatus) -> Result<Vec<Job>, RepositoryError>;
    fn assignments(&self, job_id: JobId) -> Result<Vec<Assignment>, RepositoryError>;
    fn jobs_for_requester(&self, requester: UserId) -> Result<Vec<Job>, RepositoryError>;
    /// Every assignment the translator ever held, cancelled ones included.
    fn translator_assignments(
        &self,
        translator: UserId,
    ) -> Result<Vec<Assignment>, RepositoryError>;
    /// Jobs the translator currently holds an active assignment on.
    fn active_bookings(&self, translator: UserId) -> Result<Vec<Job>, RepositoryError>;
    fn next_job_id(&self) -> Result<JobId, RepositoryError>;
    fn next_assignment_id(&self) -> Result<AssignmentId, RepositoryError>;

    /// Atomically check double booking, `pending` status and that no assignment on the job
    /// is still active, then insert the assignment and mark the job `assigned`.
    fn accept(&self, assignment: Assignment) -> Result<Job, AcceptError>;

    /// Apply every change or none of them.
    fn commit(&self, changes: Changeset) -> Result<(), RepositoryError>;
}

/// Write set applied by [`JobStore::commit`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    pub insert_jobs: Vec<Job>,
    pub update_jobs: Vec<Job>,
    pub insert_assignments: Vec<Assignment>,
    pub update_assignments: Vec<Assignment>,
    pub delete_assignments: Vec<AssignmentId>,
}

impl Changeset {
    pub fn is_empty(&self) -> bool {
        self.insert_jobs.is_empty()
            && self.update_jobs.is_empty()
            && self.insert_assignments.is_empty()
            && self.update_assignments.is_empty()
            && self.delete_assignments.is_empty()
    }

    pub fn insert_job(mut self, job: Job) -> Self {
        self.insert_jobs.push(job);
        self
    }

    pub fn update_job(mut self, job: Job) -> Self {
        self.update_jobs.push(job);
        self
    }

    pub fn insert_assignment(mut self, assignment: Assignment) -> Self {
        self.insert_assignments.push(assignment);
        self
    }

    pub fn update_assignment(mut self, assignment: Assignment) -> Self {
        self.update_assignments.push(assignment);
        self
    }

    pub fn delete_assignment(mut self, id: AssignmentId) -> Self {
        self.delete_assignments.push(id);
        self
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a failed [`JobStore::accept`].
#[derive(Debug, thiserror::Error)]
pub enum AcceptError {
    #[error("translator already holds a booking due at {due}")]
    AlreadyBooked { due: NaiveDateTime },
    #[error("job {job_id} is no longer open")]
    AlreadyTaken { job_id: JobId },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Read-only view over accounts and their profiles.
pub trait Directory: Send + Sync {
    fn user(&self, id: UserId) -> Result<Option<UserAccount>, RepositoryError>;
    fn user_by_email(&self, email: &str) -> Result<Option<UserAccount>, RepositoryError>;
    fn requester(&self, id: UserId) -> Result<Option<RequesterProfile>, RepositoryError>;
    fn translator(&self, id: UserId) -> Result<Option<TranslatorProfile>, RepositoryError>;
    /// Every translator profile, in a stable order.
    fn translators(&self) -> Result<Vec<TranslatorProfile>, RepositoryError>;
}

/// Mail templates known to the booking workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MailTemplate {
    JobCreated,
    JobAccepted,
    SessionEnded,
    JobChangedDate,
    JobChangedLang,
    JobChangedTranslatorCustomer,
    JobChangedTranslatorOldTranslator,
    JobChangedTranslatorNewTranslator,
    JobChangeStatusToCustomer,
    StatusChangedFromPendingOrAssignedCustomer,
    JobCancelTranslator,
}

impl MailTemplate {
    pub const fn key(self) -> &'static str {
        match self {
            MailTemplate::JobCreated => "emails.job-created",
            MailTemplate::JobAccepted => "emails.job-accepted",
            MailTemplate::SessionEnded => "emails.session-ended",
            MailTemplate::JobChangedDate => "emails.job-changed-date",
            MailTemplate::JobChangedLang => "emails.job-changed-lang",
            MailTemplate::JobChangedTranslatorCustomer => "emails.job-changed-translator-customer",
            MailTemplate::JobChangedTranslatorOldTranslator => {
                "emails.job-changed-translator-old-translator"
            }
            MailTemplate::JobChangedTranslatorNewTranslator => {
                "emails.job-changed-translator-new-translator"
            }
            MailTemplate::JobChangeStatusToCustomer => "emails.job-change-status-to-customer",
            MailTemplate::StatusChangedFromPendingOrAssignedCustomer => {
                "emails.status-changed-from-pending-or-assigned-customer"
            }
            MailTemplate::JobCancelTranslator => "emails.job-cancel-translator",
        }
    }
}

/// Mail handed to the transport; rendering happens on the far side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMail {
    pub address: String,
    pub display_name: String,
    pub subject: String,
    pub template: MailTemplate,
    pub data: serde_json::Value,
}

pub trait Mailer: Send + Sync {
    fn send(&self, mail: OutboundMail) -> Result<(), ChannelError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushSound {
    Default,
    NormalBooking,
    EmergencyBooking,
}

impl PushSound {
    pub const fn android(self) -> &'static str {
        match self {
            PushSound::Default => "default",
            PushSound::NormalBooking => "normal_booking",
            PushSound::EmergencyBooking => "emergency_booking",
        }
    }

    pub const fn ios(self) -> &'static str {
        match self {
            PushSound::Default => "default",
            PushSound::NormalBooking => "normal_booking.mp3",
            PushSound::EmergencyBooking => "emergency_booking.mp3",
        }
    }
}

/// Batched push addressed by e-mail tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushNotification {
    /// Lower-cased e-mail addresses.
    pub targets: Vec<String>,
    pub job_id: JobId,
    pub payload: serde_json::Value,
    pub message: String,
    pub sound: PushSound,
    pub send_after: Option<NaiveDateTime>,
}

impl PushNotification {
    /// Target list as the push vendor's tag filter expression.
    pub fn tag_filter(&self) -> serde_json::Value {
        let mut filters = Vec::with_capacity(self.targets.len() * 2);
        for (index, email) in self.targets.iter().enumerate() {
            if index > 0 {
                filters.push(serde_json::json!({ "operator": "OR" }));
            }
            filters.push(serde_json::json!({
                "key": "email",
                "relation": "=",
                "value": email,
            }));
        }
        serde_json::Value::Array(filters)
    }
}

pub trait PushChannel: Send + Sync {
    fn send(&self, notification: PushNotification) -> Result<(), ChannelError>;
}

/// Delivery status reported by the SMS gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsStatus {
    pub accepted: bool,
    pub reference: Option<String>,
}

pub trait SmsChannel: Send + Sync {
    fn send(&self, from: &str, to: &str, message: &str) -> Result<SmsStatus, ChannelError>;
}

/// Message lookup. `template` overrides the built-in English wording when it returns text.
pub trait Locale: Send + Sync {
    fn language_name(&self, id: LanguageId) -> String;

    fn template(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Transport error.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel transport unavailable: {0}")]
    Transport(String),
    #[error("recipient rejected: {0}")]
    Rejected(String),
}
