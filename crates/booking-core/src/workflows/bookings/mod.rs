//! Interpreter booking lifecycle: intake, translator matching, acceptance, admin edits,
//! cancellation, completion, and the notifications each step fans out.
//!
//! Storage, accounts, and delivery channels sit behind traits in [`repository`]. The
//! [`memory`] module provides in-process implementations of all of them.

pub mod audit;
pub mod clock;
pub mod config;
pub mod domain;
pub mod lifecycle;
pub mod matching;
pub mod memory;
pub mod notifications;
pub mod repository;
mod router;

#[cfg(test)]
mod tests;

pub use audit::{AuditAction, AuditEntry, AuditError, AuditLog, FieldChange, TracingAuditLog};
pub use clock::{Clock, DueError, FixedClock, SystemClock, TimePolicy};
pub use config::BookingConfig;
pub use domain::{
    Assignment, AssignmentId, CertificationRequirement, ConsumerCategory, DeliveryMode, Gender,
    Job, JobId, JobStatus, JobType, LanguageId, NotificationPreferences, NotificationTarget,
    RequesterProfile, Role, SessionDuration, TranslatorCategory, TranslatorLevel,
    TranslatorProfile, UserAccount, UserId,
};
pub use lifecycle::{
    AcceptOutcome, AdminUpdate, AdminUpdateOutcome, BookingDetails, BookingError,
    BookingReceipt, BookingRequest, BookingService, BookingType, CancelOutcome, Canceller,
    ChangeNotice, Collaborators, EndOutcome, JobHistory, JobInformation, Missing, ReopenOutcome,
    UserJobs, UserType, ValidationError, HISTORY_PAGE_SIZE,
};
pub use matching::{assignment_check, eligibility, find_candidates, AssignmentCheck};
pub use memory::{
    MemoryAuditLog, MemoryDirectory, MemoryJobStore, RecordingMailer, RecordingPush,
    RecordingSms, SentSms, StaticLocale,
};
pub use notifications::{BroadcastReport, MessageKey, NotificationDispatcher, NotificationType};
pub use repository::{
    AcceptError, Changeset, ChannelError, Directory, JobStore, Locale, MailTemplate, Mailer,
    OutboundMail, PushChannel, PushNotification, PushSound, RepositoryError, SmsChannel,
    SmsStatus,
};
pub use router::{booking_router, ACTOR_HEADER};
pub(crate) use router::status_for;
