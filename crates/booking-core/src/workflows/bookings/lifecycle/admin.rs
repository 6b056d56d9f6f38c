use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::super::audit::{AuditAction, FieldChange};
use super::super::domain::{
    Assignment, Job, JobId, JobStatus, LanguageId, Role, UserAccount, UserId,
};
use super::super::repository::{Changeset, Directory, JobStore};
use super::error::{BookingError, ValidationError};
use super::transitions::{self, StatusEffect, StatusRequest, TransitionOutcome};
use super::BookingService;

/// Fields an admin may change on an existing job. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUpdate {
    #[serde(default)]
    pub translator: Option<UserId>,
    /// Takes priority over `translator` when both are given.
    #[serde(default)]
    pub translator_email: Option<String>,
    #[serde(default)]
    pub due: Option<NaiveDateTime>,
    #[serde(default)]
    pub from_language_id: Option<LanguageId>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub admin_comments: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub session_time: Option<String>,
}

/// Change mails sent after an admin update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeNotice {
    DateChanged,
    TranslatorChanged,
    LanguageChanged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminUpdateOutcome {
    pub job: Job,
    pub status_changed: bool,
    pub notifications: Vec<ChangeNotice>,
}

struct TranslatorSwap {
    previous: Option<UserId>,
    current: UserId,
}

impl<S, D> BookingService<S, D>
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    /// Apply an admin edit: translator, due, language, status, then comment and reference.
    pub fn update_by_admin(
        &self,
        job_id: JobId,
        update: AdminUpdate,
        actor: UserId,
    ) -> Result<AdminUpdateOutcome, BookingError> {
        let admin = self.user(actor)?;
        if !matches!(admin.role, Role::Admin | Role::SuperAdmin) {
            return Err(BookingError::Forbidden { role: admin.role });
        }

        let mut job = self.load_job(job_id)?;
        let now = self.now();
        let mut changes = Changeset::default();
        let mut audit = Vec::new();

        let assignments = self.store.assignments(job_id)?;
        let serving = assignments
            .iter()
            .find(|assignment| assignment.is_active())
            .or_else(|| {
                assignments
                    .iter()
                    .find(|assignment| assignment.completed_at.is_some())
            })
            .cloned();

        let swap = match self.requested_translator(&update)? {
            Some(requested) => match &serving {
                Some(current) if current.translator_id == requested => None,
                Some(current) => {
                    let mut cancelled = current.clone();
                    cancelled.cancelled_at = Some(now);
                    changes = changes.update_assignment(cancelled);
                    Some(TranslatorSwap {
                        previous: Some(current.translator_id),
                        current: requested,
                    })
                }
                None => Some(TranslatorSwap {
                    previous: None,
                    current: requested,
                }),
            },
            None => None,
        };
        let mut inserted = None;
        if let Some(swap) = &swap {
            inserted = Some(Assignment::new(
                self.store.next_assignment_id()?,
                job_id,
                swap.current,
                now,
            ));
            audit.push(FieldChange::Translator {
                old: swap.previous,
                new: swap.current,
            });
        }

        let mut old_due = None;
        if let Some(due) = update.due.filter(|due| *due != job.due) {
            audit.push(FieldChange::Due {
                old: job.due,
                new: due,
            });
            old_due = Some(job.due);
            job.due = due;
        }

        let mut old_language = None;
        if let Some(language) = update
            .from_language_id
            .filter(|language| *language != job.from_language_id)
        {
            audit.push(FieldChange::Language {
                old: job.from_language_id,
                new: language,
            });
            old_language = Some(job.from_language_id);
            job.from_language_id = language;
        }

        let previous_status = job.status;
        // A translator picked for a pending job serves it, so the job cannot stay open.
        let target = match update.status.filter(|status| *status != job.status) {
            None if swap.is_some() && job.status == JobStatus::Pending => {
                Some(JobStatus::Assigned)
            }
            target => target,
        };
        let outcome = match target {
            Some(target) => {
                let request = StatusRequest {
                    target,
                    comment: update.admin_comments.as_deref(),
                    session_time: update.session_time.as_deref(),
                    translator_changed: swap.is_some(),
                    now,
                };
                transitions::apply(&mut job, &request, &self.policy)?
            }
            None => TransitionOutcome::unchanged(),
        };
        if let Some(change) = outcome.change.clone() {
            audit.push(change);
        }

        if previous_status == JobStatus::Started && job.status == JobStatus::Completed {
            match inserted.as_mut() {
                Some(assignment) => {
                    assignment.completed_at = Some(now);
                    assignment.completed_by = Some(actor);
                }
                None => {
                    if let Some(active) = serving.as_ref().filter(|held| held.is_active()) {
                        let mut closed = active.clone();
                        closed.completed_at = Some(now);
                        closed.completed_by = Some(actor);
                        changes = changes.update_assignment(closed);
                    }
                }
            }
        }
        if let Some(assignment) = inserted {
            changes = changes.insert_assignment(assignment);
        }

        if let Some(comment) = update.admin_comments {
            job.admin_comments = comment;
        }
        if let Some(reference) = update.reference {
            job.reference = reference;
        }

        self.store.commit(changes.update_job(job.clone()))?;
        self.record(job_id, Some(actor), AuditAction::AdminUpdated, audit);
        info!(
            %job_id,
            admin = %admin.id,
            status_changed = outcome.changed,
            "booking updated by admin"
        );

        let serving_account = match &swap {
            Some(swap) => self.post_commit_user(swap.current),
            None => serving
                .as_ref()
                .and_then(|assignment| self.post_commit_user(assignment.translator_id)),
        };
        let customer = self.post_commit_user(job.requester_id);

        if let Some(customer) = &customer {
            self.dispatch_status_effects(
                &job,
                customer,
                serving_account.as_ref(),
                &outcome.effects,
                now,
            );
        }

        let mut notifications = Vec::new();
        if job.due > now {
            if let Some(customer) = &customer {
                if let Some(old_due) = old_due {
                    self.notifier
                        .date_changed(&job, customer, serving_account.as_ref(), old_due);
                    notifications.push(ChangeNotice::DateChanged);
                }
                if let (Some(swap), Some(current)) = (&swap, serving_account.as_ref()) {
                    let previous = swap.previous.and_then(|id| self.post_commit_user(id));
                    self.notifier
                        .translator_changed(&job, customer, previous.as_ref(), current);
                    notifications.push(ChangeNotice::TranslatorChanged);
                }
                if let Some(old_language) = old_language {
                    self.notifier.language_changed(
                        &job,
                        customer,
                        serving_account.as_ref(),
                        old_language,
                    );
                    notifications.push(ChangeNotice::LanguageChanged);
                }
            }
        }

        Ok(AdminUpdateOutcome {
            job,
            status_changed: outcome.changed,
            notifications,
        })
    }

    fn requested_translator(&self, update: &AdminUpdate) -> Result<Option<UserId>, BookingError> {
        let email = update
            .translator_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty());

        let requested = match email {
            Some(email) => {
                let account = self.directory.user_by_email(email)?.ok_or_else(|| {
                    ValidationError::new(
                        "translator_email",
                        "No translator uses that e-mail address",
                    )
                })?;
                Some(account.id)
            }
            None => update.translator.filter(|id| id.0 != 0),
        };

        if let Some(id) = requested {
            self.translator(id)?;
        }
        Ok(requested)
    }

    fn dispatch_status_effects(
        &self,
        job: &Job,
        customer: &UserAccount,
        translator: Option<&UserAccount>,
        effects: &[StatusEffect],
        now: NaiveDateTime,
    ) {
        for effect in effects {
            match effect {
                StatusEffect::Reopened => {
                    self.notifier.reopened(job, customer);
                    self.rebroadcast(job, None);
                }
                StatusEffect::AcceptedToCustomer => {
                    self.notifier.job_accepted(job, customer);
                }
                StatusEffect::SessionEnded(session) => {
                    if let Some(translator) = translator {
                        self.notifier
                            .session_ended(job, customer, translator, *session);
                    }
                }
                StatusEffect::StatusChangedToCustomer => {
                    self.notifier.status_changed_to_customer(job, customer);
                }
                StatusEffect::TranslatorAssigned => {
                    self.notifier.job_accepted(job, customer);
                    if let Some(translator) = translator {
                        self.notifier.new_translator(job, translator);
                        self.notifier.session_start_reminder(customer, job, now);
                        self.notifier.session_start_reminder(translator, job, now);
                    }
                }
                StatusEffect::Withdrawn => {
                    self.notifier.withdrawn(job, customer, translator);
                }
            }
        }
    }
}
