//! In-process adapters for the booking ports.
//!
//! Used by the API demo mode and the test suites. The job store keeps all state behind one
//! mutex so `accept` and `commit` are atomic with respect to each other.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::audit::{AuditEntry, AuditError, AuditLog};
use super::domain::{
    Assignment, AssignmentId, Job, JobId, JobStatus, LanguageId, RequesterProfile,
    TranslatorProfile, UserAccount, UserId,
};
use super::repository::{
    AcceptError, Changeset, ChannelError, Directory, JobStore, Locale, Mailer, OutboundMail,
    PushChannel, PushNotification, RepositoryError, SmsChannel, SmsStatus,
};

fn poisoned<T>(_: PoisonError<T>) -> RepositoryError {
    RepositoryError::Unavailable("in-memory state lock poisoned".to_string())
}

/// Read access for inspection helpers, where a poisoned lock still holds valid data.
fn snapshot<T: Clone>(lock: &Mutex<T>) -> T {
    lock.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

#[derive(Debug, Default)]
struct StoreState {
    jobs: BTreeMap<JobId, Job>,
    assignments: BTreeMap<AssignmentId, Assignment>,
    last_job_id: u64,
    last_assignment_id: u64,
}

impl StoreState {
    fn translator_conflict(&self, assignment: &Assignment, due: chrono::NaiveDateTime) -> bool {
        self.assignments.values().any(|held| {
            held.translator_id == assignment.translator_id
                && held.job_id != assignment.job_id
                && held.is_active()
                && self
                    .jobs
                    .get(&held.job_id)
                    .is_some_and(|job| job.due == due)
        })
    }

    fn has_active_assignment(&self, job_id: JobId) -> bool {
        self.assignments
            .values()
            .any(|held| held.job_id == job_id && held.is_active())
    }

    fn validate(&self, changes: &Changeset) -> Result<(), RepositoryError> {
        let mut inserted_jobs = BTreeSet::new();
        for job in &changes.insert_jobs {
            if self.jobs.contains_key(&job.id) || !inserted_jobs.insert(job.id) {
                return Err(RepositoryError::Conflict);
            }
        }
        for job in &changes.update_jobs {
            if !self.jobs.contains_key(&job.id) && !inserted_jobs.contains(&job.id) {
                return Err(RepositoryError::NotFound);
            }
        }

        let mut inserted_assignments = BTreeSet::new();
        for assignment in &changes.insert_assignments {
            if self.assignments.contains_key(&assignment.id)
                || !inserted_assignments.insert(assignment.id)
            {
                return Err(RepositoryError::Conflict);
            }
            if !self.jobs.contains_key(&assignment.job_id)
                && !inserted_jobs.contains(&assignment.job_id)
            {
                return Err(RepositoryError::NotFound);
            }
        }
        let known_assignment = |id: &AssignmentId| {
            self.assignments.contains_key(id) || inserted_assignments.contains(id)
        };
        if !changes
            .update_assignments
            .iter()
            .all(|assignment| known_assignment(&assignment.id))
            || !changes.delete_assignments.iter().all(known_assignment)
        {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn apply(&mut self, changes: Changeset) {
        for job in changes.insert_jobs.into_iter().chain(changes.update_jobs) {
            self.last_job_id = self.last_job_id.max(job.id.0);
            self.jobs.insert(job.id, job);
        }
        for assignment in changes
            .insert_assignments
            .into_iter()
            .chain(changes.update_assignments)
        {
            self.last_assignment_id = self.last_assignment_id.max(assignment.id.0);
            self.assignments.insert(assignment.id, assignment);
        }
        for id in changes.delete_assignments {
            self.assignments.remove(&id);
        }
    }
}

/// Job store backed by ordered maps.
#[derive(Debug, Default, Clone)]
pub struct MemoryJobStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryJobStore {
    fn state(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state.lock().map_err(poisoned)
    }

    pub fn jobs(&self) -> Vec<Job> {
        let guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        guard.jobs.values().cloned().collect()
    }
}

impl JobStore for MemoryJobStore {
    fn job(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.state()?.jobs.get(&id).cloned())
    }

    fn jobs_with_status(&self, status: JobStatus) -> Result<Vec<Job>, RepositoryError> {
        Ok(self
            .state()?
            .jobs
            .values()
            .filter(|job| job.status == status)
            .cloned()
            .collect())
    }

    fn assignments(&self, job_id: JobId) -> Result<Vec<Assignment>, RepositoryError> {
        Ok(self
            .state()?
            .assignments
            .values()
            .filter(|assignment| assignment.job_id == job_id)
            .cloned()
            .collect())
    }

    fn jobs_for_requester(&self, requester: UserId) -> Result<Vec<Job>, RepositoryError> {
        Ok(self
            .state()?
            .jobs
            .values()
            .filter(|job| job.requester_id == requester)
            .cloned()
            .collect())
    }

    fn translator_assignments(
        &self,
        translator: UserId,
    ) -> Result<Vec<Assignment>, RepositoryError> {
        Ok(self
            .state()?
            .assignments
            .values()
            .filter(|assignment| assignment.translator_id == translator)
            .cloned()
            .collect())
    }

    fn active_bookings(&self, translator: UserId) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.state()?;
        Ok(guard
            .assignments
            .values()
            .filter(|assignment| assignment.translator_id == translator && assignment.is_active())
            .filter_map(|assignment| guard.jobs.get(&assignment.job_id).cloned())
            .collect())
    }

    fn next_job_id(&self) -> Result<JobId, RepositoryError> {
        let mut guard = self.state()?;
        guard.last_job_id += 1;
        Ok(JobId(guard.last_job_id))
    }

    fn next_assignment_id(&self) -> Result<AssignmentId, RepositoryError> {
        let mut guard = self.state()?;
        guard.last_assignment_id += 1;
        Ok(AssignmentId(guard.last_assignment_id))
    }

    fn accept(&self, assignment: Assignment) -> Result<Job, AcceptError> {
        let mut guard = self.state()?;
        let job = guard
            .jobs
            .get(&assignment.job_id)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;

        if guard.translator_conflict(&assignment, job.due) {
            return Err(AcceptError::AlreadyBooked { due: job.due });
        }
        if job.status != JobStatus::Pending || guard.has_active_assignment(job.id) {
            return Err(AcceptError::AlreadyTaken { job_id: job.id });
        }

        let mut job = job;
        job.status = JobStatus::Assigned;
        guard.jobs.insert(job.id, job.clone());
        guard.last_assignment_id = guard.last_assignment_id.max(assignment.id.0);
        guard.assignments.insert(assignment.id, assignment);
        Ok(job)
    }

    fn commit(&self, changes: Changeset) -> Result<(), RepositoryError> {
        if changes.is_empty() {
            return Ok(());
        }
        let mut guard = self.state()?;
        guard.validate(&changes)?;
        guard.apply(changes);
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
struct DirectoryState {
    users: BTreeMap<UserId, UserAccount>,
    requesters: BTreeMap<UserId, RequesterProfile>,
    translators: BTreeMap<UserId, TranslatorProfile>,
}

/// Account directory seeded up front.
#[derive(Debug, Default, Clone)]
pub struct MemoryDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

impl MemoryDirectory {
    fn state(&self) -> Result<MutexGuard<'_, DirectoryState>, RepositoryError> {
        self.state.lock().map_err(poisoned)
    }

    fn seed(self, apply: impl FnOnce(&mut DirectoryState)) -> Self {
        {
            let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            apply(&mut guard);
        }
        self
    }

    pub fn with_user(self, account: UserAccount) -> Self {
        self.seed(|state| {
            state.users.insert(account.id, account);
        })
    }

    pub fn with_requester(self, profile: RequesterProfile) -> Self {
        self.seed(|state| {
            state.users.insert(profile.account.id, profile.account.clone());
            state.requesters.insert(profile.account.id, profile);
        })
    }

    pub fn with_translator(self, profile: TranslatorProfile) -> Self {
        self.seed(|state| {
            state.users.insert(profile.account.id, profile.account.clone());
            state.translators.insert(profile.account.id, profile);
        })
    }

    /// Replace a translator after seeding, e.g. to change notification settings.
    pub fn update_translator(&self, profile: TranslatorProfile) -> Result<(), RepositoryError> {
        let mut guard = self.state()?;
        guard.users.insert(profile.account.id, profile.account.clone());
        guard.translators.insert(profile.account.id, profile);
        Ok(())
    }
}

impl Directory for MemoryDirectory {
    fn user(&self, id: UserId) -> Result<Option<UserAccount>, RepositoryError> {
        Ok(self.state()?.users.get(&id).cloned())
    }

    fn user_by_email(&self, email: &str) -> Result<Option<UserAccount>, RepositoryError> {
        let email = email.trim();
        Ok(self
            .state()?
            .users
            .values()
            .find(|account| account.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    fn requester(&self, id: UserId) -> Result<Option<RequesterProfile>, RepositoryError> {
        Ok(self.state()?.requesters.get(&id).cloned())
    }

    fn translator(&self, id: UserId) -> Result<Option<TranslatorProfile>, RepositoryError> {
        Ok(self.state()?.translators.get(&id).cloned())
    }

    fn translators(&self) -> Result<Vec<TranslatorProfile>, RepositoryError> {
        Ok(self.state()?.translators.values().cloned().collect())
    }
}

/// Switch shared by the recording channels to simulate a transport outage.
#[derive(Debug, Default, Clone)]
struct Outage(Arc<AtomicBool>);

impl Outage {
    fn set(&self, failing: bool) {
        self.0.store(failing, Ordering::SeqCst);
    }

    fn check(&self, channel: &str) -> Result<(), ChannelError> {
        if self.0.load(Ordering::SeqCst) {
            return Err(ChannelError::Transport(format!("{channel} offline")));
        }
        Ok(())
    }
}

/// Mailer that keeps every message it was handed.
#[derive(Debug, Default, Clone)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<OutboundMail>>>,
    outage: Outage,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutboundMail> {
        snapshot(&self.sent)
    }

    pub fn set_failing(&self, failing: bool) {
        self.outage.set(failing);
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, mail: OutboundMail) -> Result<(), ChannelError> {
        self.outage.check("mailer")?;
        debug!(address = %mail.address, template = mail.template.key(), "mail recorded");
        self.sent
            .lock()
            .map_err(|_| ChannelError::Transport("mail outbox lock poisoned".to_string()))?
            .push(mail);
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct RecordingPush {
    sent: Arc<Mutex<Vec<PushNotification>>>,
    outage: Outage,
}

impl RecordingPush {
    pub fn sent(&self) -> Vec<PushNotification> {
        snapshot(&self.sent)
    }

    pub fn set_failing(&self, failing: bool) {
        self.outage.set(failing);
    }
}

impl PushChannel for RecordingPush {
    fn send(&self, notification: PushNotification) -> Result<(), ChannelError> {
        self.outage.check("push")?;
        debug!(
            job_id = %notification.job_id,
            filter = %notification.tag_filter(),
            "push recorded"
        );
        self.sent
            .lock()
            .map_err(|_| ChannelError::Transport("push outbox lock poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}

/// One text message accepted by [`RecordingSms`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentSms {
    pub from: String,
    pub to: String,
    pub message: String,
}

#[derive(Debug, Default, Clone)]
pub struct RecordingSms {
    sent: Arc<Mutex<Vec<SentSms>>>,
    outage: Outage,
}

impl RecordingSms {
    pub fn sent(&self) -> Vec<SentSms> {
        snapshot(&self.sent)
    }

    pub fn set_failing(&self, failing: bool) {
        self.outage.set(failing);
    }
}

impl SmsChannel for RecordingSms {
    fn send(&self, from: &str, to: &str, message: &str) -> Result<SmsStatus, ChannelError> {
        self.outage.check("sms gateway")?;
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| ChannelError::Transport("sms outbox lock poisoned".to_string()))?;
        sent.push(SentSms {
            from: from.to_string(),
            to: to.to_string(),
            message: message.to_string(),
        });
        Ok(SmsStatus {
            accepted: true,
            reference: Some(format!("sms-{}", sent.len())),
        })
    }
}

/// Fixed language names plus optional message overrides.
#[derive(Debug, Default, Clone)]
pub struct StaticLocale {
    languages: BTreeMap<LanguageId, String>,
    templates: BTreeMap<String, String>,
}

impl StaticLocale {
    pub fn with_language(mut self, id: LanguageId, name: impl Into<String>) -> Self {
        self.languages.insert(id, name.into());
        self
    }

    pub fn with_template(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.templates.insert(key.into(), text.into());
        self
    }
}

impl Locale for StaticLocale {
    fn language_name(&self, id: LanguageId) -> String {
        self.languages
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("language #{id}"))
    }

    fn template(&self, key: &str) -> Option<String> {
        self.templates.get(key).cloned()
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryAuditLog {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
    outage: Arc<AtomicBool>,
}

impl MemoryAuditLog {
    pub fn entries(&self) -> Vec<AuditEntry> {
        snapshot(&self.entries)
    }

    pub fn for_job(&self, job_id: JobId) -> Vec<AuditEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.job_id == job_id)
            .collect()
    }

    pub fn set_failing(&self, failing: bool) {
        self.outage.store(failing, Ordering::SeqCst);
    }
}

impl AuditLog for MemoryAuditLog {
    fn append(&self, entry: AuditEntry) -> Result<(), AuditError> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(AuditError::Unavailable("audit sink offline".to_string()));
        }
        self.entries
            .lock()
            .map_err(|_| AuditError::Unavailable("audit lock poisoned".to_string()))?
            .push(entry);
        Ok(())
    }
}
