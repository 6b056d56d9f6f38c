//! Mail, push, and SMS fan-out for booking events.
//!
//! Every send is fire-and-forget. Transport failures are logged with the job id and target
//! and never reach the caller.

mod messages;
mod payload;

pub use messages::{render, MessageKey};
pub use payload::{job_for_labels, job_payload};

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::clock::{due_parts, format_duration, TimePolicy};
use super::domain::{
    Job, LanguageId, NotificationTarget, SessionDuration, TranslatorProfile, UserAccount,
};
use super::repository::{
    Locale, MailTemplate, Mailer, OutboundMail, PushChannel, PushNotification, PushSound,
    SmsChannel,
};
use payload::{with_type, DUE_DISPLAY};

/// `notification_type` values carried in push payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    SuitableJob,
    JobAccepted,
    JobCancelled,
    SessionStartRemind,
    JobExpired,
}

impl NotificationType {
    pub const fn code(self) -> &'static str {
        match self {
            NotificationType::SuitableJob => "suitable_job",
            NotificationType::JobAccepted => "job_accepted",
            NotificationType::JobCancelled => "job_cancelled",
            NotificationType::SessionStartRemind => "session_start_remind",
            NotificationType::JobExpired => "job_expired",
        }
    }
}

/// Counts of translators offered a job, split by delivery timing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub immediate: usize,
    pub delayed: usize,
}

impl BroadcastReport {
    pub fn total(&self) -> usize {
        self.immediate + self.delayed
    }
}

pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
    push: Arc<dyn PushChannel>,
    sms: Arc<dyn SmsChannel>,
    locale: Arc<dyn Locale>,
    policy: TimePolicy,
    sms_from: String,
}

impl NotificationDispatcher {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        push: Arc<dyn PushChannel>,
        sms: Arc<dyn SmsChannel>,
        locale: Arc<dyn Locale>,
        policy: TimePolicy,
        sms_from: impl Into<String>,
    ) -> Self {
        Self {
            mailer,
            push,
            sms,
            locale,
            policy,
            sms_from: sms_from.into(),
        }
    }

    pub fn language_name(&self, id: LanguageId) -> String {
        self.locale.language_name(id)
    }

    pub fn message(&self, key: MessageKey, params: &[(&str, String)]) -> String {
        render(self.locale.as_ref(), key, params)
    }

    /// Language, duration, due, and id parameters shared by most job messages.
    pub fn job_params(&self, job: &Job) -> Vec<(&'static str, String)> {
        vec![
            ("language", self.language_name(job.from_language_id)),
            ("duration", job.duration_minutes.to_string()),
            ("due", job.due.format(DUE_DISPLAY).to_string()),
            ("job_id", job.id.to_string()),
        ]
    }

    pub fn should_delay(&self, user: &UserAccount, now: NaiveDateTime) -> bool {
        self.policy.is_night(now) && user.notifications.defer_at_night
    }

    fn deliver_mail(&self, mail: OutboundMail) -> bool {
        let address = mail.address.clone();
        let template = mail.template.key();
        match self.mailer.send(mail) {
            Ok(()) => {
                debug!(%address, template, "mail queued");
                true
            }
            Err(error) => {
                warn!(%address, template, %error, "mail delivery failed");
                false
            }
        }
    }

    fn deliver_push(&self, notification: PushNotification) -> bool {
        let job_id = notification.job_id;
        let targets = notification.targets.clone();
        let payload = notification.payload.to_string();
        info!(
            %job_id,
            targets = targets.len(),
            delayed = notification.send_after.is_some(),
            "push send for job"
        );
        match self.push.send(notification) {
            Ok(()) => true,
            Err(error) => {
                warn!(%job_id, ?targets, %payload, %error, "push delivery failed");
                false
            }
        }
    }

    fn mail_to(
        &self,
        address: &str,
        recipient: &UserAccount,
        subject: String,
        template: MailTemplate,
        job: &Job,
        extra: Value,
    ) -> bool {
        let mut data = json!({
            "user": { "id": recipient.id, "name": recipient.name, "email": recipient.email },
            "job": job,
        });
        if let (Value::Object(map), Value::Object(extra)) = (&mut data, extra) {
            map.extend(extra);
        }
        self.deliver_mail(OutboundMail {
            address: address.to_string(),
            display_name: recipient.name.clone(),
            subject,
            template,
            data,
        })
    }

    fn subject(&self, key: MessageKey, job: &Job) -> String {
        self.message(key, &self.job_params(job))
    }

    /// Single-recipient push honouring the user's opt-outs and night deferral.
    pub fn push_to_user(
        &self,
        user: &UserAccount,
        job: &Job,
        kind: NotificationType,
        message: String,
        now: NaiveDateTime,
    ) -> bool {
        if !user.notifications.push_enabled {
            debug!(job_id = %job.id, user_id = %user.id, "push skipped, user opted out");
            return false;
        }
        let send_after = self
            .should_delay(user, now)
            .then(|| self.policy.next_business_time(now));
        self.deliver_push(PushNotification {
            targets: vec![user.email.to_lowercase()],
            job_id: job.id,
            payload: json!({ "notification_type": kind.code(), "job_id": job.id }),
            message,
            sound: PushSound::Default,
            send_after,
        })
    }

    /// Offer a job to the computed audience in an immediate and a deferred batch.
    pub fn broadcast(
        &self,
        job: &Job,
        customer_type: &str,
        audience: &[NotificationTarget],
        now: NaiveDateTime,
    ) -> BroadcastReport {
        let (delayed, immediate): (Vec<_>, Vec<_>) =
            audience.iter().partition(|target| target.delay);

        let language = self.language_name(job.from_language_id);
        let payload = with_type(
            job_payload(job, customer_type),
            NotificationType::SuitableJob.code(),
            &[("language", Value::String(language))],
        );
        let (key, sound) = if job.immediate {
            (MessageKey::SuitableImmediateJob, PushSound::EmergencyBooking)
        } else {
            (MessageKey::SuitableJob, PushSound::NormalBooking)
        };
        let message = self.message(key, &self.job_params(job));

        let batches = [
            (&immediate, None),
            (&delayed, Some(self.policy.next_business_time(now))),
        ];
        for (group, send_after) in batches {
            if group.is_empty() {
                continue;
            }
            self.deliver_push(PushNotification {
                targets: group
                    .iter()
                    .map(|target| target.translator.account.email.to_lowercase())
                    .collect(),
                job_id: job.id,
                payload: payload.clone(),
                message: message.clone(),
                sound,
                send_after,
            });
        }

        BroadcastReport {
            immediate: immediate.len(),
            delayed: delayed.len(),
        }
    }

    /// Text every matched translator with a mobile number. Returns successful sends.
    pub fn sms_offers(
        &self,
        job: &Job,
        town: Option<&str>,
        translators: &[TranslatorProfile],
    ) -> usize {
        let params = vec![
            ("date", job.due.format("%d.%m.%Y").to_string()),
            ("time", job.due.format("%H:%M").to_string()),
            ("duration", format_duration(job.duration_minutes)),
            ("job_id", job.id.to_string()),
            ("town", town.unwrap_or_default().to_string()),
        ];
        let message = if job.delivery.phone {
            self.message(MessageKey::SmsPhoneJob, &params)
        } else if job.delivery.physical {
            self.message(MessageKey::SmsPhysicalJob, &params)
        } else {
            warn!(job_id = %job.id, "job has no delivery mode, sending empty sms");
            String::new()
        };

        let mut sent = 0;
        for translator in translators {
            let Some(mobile) = translator.account.mobile.as_deref() else {
                debug!(translator_id = %translator.id(), "no mobile number, sms skipped");
                continue;
            };
            match self.sms.send(&self.sms_from, mobile, &message) {
                Ok(status) => {
                    info!(
                        job_id = %job.id,
                        email = %translator.account.email,
                        %mobile,
                        accepted = status.accepted,
                        "sms sent to translator"
                    );
                    sent += 1;
                }
                Err(error) => {
                    warn!(job_id = %job.id, %mobile, %error, "sms delivery failed");
                }
            }
        }
        sent
    }

    pub fn job_created(&self, job: &Job, customer: &UserAccount) -> bool {
        self.mail_to(
            job.customer_email(customer),
            customer,
            self.subject(MessageKey::JobCreatedSubject, job),
            MailTemplate::JobCreated,
            job,
            json!({}),
        )
    }

    pub fn job_accepted(&self, job: &Job, customer: &UserAccount) -> bool {
        self.mail_to(
            job.customer_email(customer),
            customer,
            self.subject(MessageKey::JobAcceptedSubject, job),
            MailTemplate::JobAccepted,
            job,
            json!({}),
        )
    }

    pub fn job_accepted_push(&self, job: &Job, customer: &UserAccount, now: NaiveDateTime) -> bool {
        let message = self.message(MessageKey::JobAcceptedPush, &self.job_params(job));
        self.push_to_user(customer, job, NotificationType::JobAccepted, message, now)
    }

    /// Invoice mail to the customer and salary mail to the translator.
    pub fn session_ended(
        &self,
        job: &Job,
        customer: &UserAccount,
        translator: &UserAccount,
        session: SessionDuration,
    ) {
        let subject = self.subject(MessageKey::SessionEndedSubject, job);
        self.mail_to(
            job.customer_email(customer),
            customer,
            subject.clone(),
            MailTemplate::SessionEnded,
            job,
            json!({ "session_time": session.describe(), "for_text": "invoice" }),
        );
        self.mail_to(
            &translator.email,
            translator,
            subject,
            MailTemplate::SessionEnded,
            job,
            json!({ "session_time": session.describe(), "for_text": "salary" }),
        );
    }

    pub fn date_changed(
        &self,
        job: &Job,
        customer: &UserAccount,
        translator: Option<&UserAccount>,
        old_due: NaiveDateTime,
    ) {
        let subject = self.subject(MessageKey::BookingChangedSubject, job);
        let extra = json!({ "old_time": old_due.format(DUE_DISPLAY).to_string() });
        self.mail_to(
            job.customer_email(customer),
            customer,
            subject.clone(),
            MailTemplate::JobChangedDate,
            job,
            extra.clone(),
        );
        if let Some(translator) = translator {
            self.mail_to(
                &translator.email,
                translator,
                subject,
                MailTemplate::JobChangedDate,
                job,
                extra,
            );
        }
    }

    pub fn language_changed(
        &self,
        job: &Job,
        customer: &UserAccount,
        translator: Option<&UserAccount>,
        old_language: LanguageId,
    ) {
        let subject = self.subject(MessageKey::BookingChangedSubject, job);
        let extra = json!({ "old_lang": self.language_name(old_language) });
        self.mail_to(
            job.customer_email(customer),
            customer,
            subject.clone(),
            MailTemplate::JobChangedLang,
            job,
            extra.clone(),
        );
        if let Some(translator) = translator {
            self.mail_to(
                &translator.email,
                translator,
                subject,
                MailTemplate::JobChangedLang,
                job,
                extra,
            );
        }
    }

    pub fn translator_changed(
        &self,
        job: &Job,
        customer: &UserAccount,
        previous: Option<&UserAccount>,
        current: &UserAccount,
    ) {
        let subject = self.subject(MessageKey::TranslatorChangedSubject, job);
        self.mail_to(
            job.customer_email(customer),
            customer,
            subject.clone(),
            MailTemplate::JobChangedTranslatorCustomer,
            job,
            json!({}),
        );
        if let Some(previous) = previous {
            self.mail_to(
                &previous.email,
                previous,
                subject.clone(),
                MailTemplate::JobChangedTranslatorOldTranslator,
                job,
                json!({}),
            );
        }
        self.mail_to(
            &current.email,
            current,
            subject,
            MailTemplate::JobChangedTranslatorNewTranslator,
            job,
            json!({}),
        );
    }

    /// Admin moved a pending or assigned job to a non-served status.
    pub fn status_changed_to_customer(&self, job: &Job, customer: &UserAccount) -> bool {
        self.mail_to(
            job.customer_email(customer),
            customer,
            self.subject(MessageKey::CancellationSubject, job),
            MailTemplate::StatusChangedFromPendingOrAssignedCustomer,
            job,
            json!({}),
        )
    }

    pub fn withdrawn(&self, job: &Job, customer: &UserAccount, translator: Option<&UserAccount>) {
        self.status_changed_to_customer(job, customer);
        if let Some(translator) = translator {
            self.mail_to(
                &translator.email,
                translator,
                self.subject(MessageKey::CancellationSubject, job),
                MailTemplate::JobCancelTranslator,
                job,
                json!({}),
            );
        }
    }

    pub fn reopened(&self, job: &Job, customer: &UserAccount) -> bool {
        self.mail_to(
            job.customer_email(customer),
            customer,
            self.subject(MessageKey::ReopenedSubject, job),
            MailTemplate::JobChangeStatusToCustomer,
            job,
            json!({}),
        )
    }

    pub fn new_translator(&self, job: &Job, translator: &UserAccount) -> bool {
        self.mail_to(
            &translator.email,
            translator,
            self.subject(MessageKey::JobAcceptedSubject, job),
            MailTemplate::JobChangedTranslatorNewTranslator,
            job,
            json!({}),
        )
    }

    pub fn session_start_reminder(
        &self,
        user: &UserAccount,
        job: &Job,
        now: NaiveDateTime,
    ) -> bool {
        let (date, time) = due_parts(job.due);
        let params = vec![
            ("language", self.language_name(job.from_language_id)),
            ("town", job.town.clone().unwrap_or_default()),
            ("time", time),
            ("date", date),
            ("duration", job.duration_minutes.to_string()),
        ];
        let key = if job.delivery.physical {
            MessageKey::SessionReminderPhysical
        } else {
            MessageKey::SessionReminderPhone
        };
        let message = self.message(key, &params);
        self.push_to_user(user, job, NotificationType::SessionStartRemind, message, now)
    }

    pub fn expired(&self, job: &Job, customer: &UserAccount, now: NaiveDateTime) -> bool {
        let message = self.message(MessageKey::JobExpiredPush, &self.job_params(job));
        self.push_to_user(customer, job, NotificationType::JobExpired, message, now)
    }

    pub fn customer_cancelled(
        &self,
        translator: &UserAccount,
        job: &Job,
        now: NaiveDateTime,
    ) -> bool {
        let message = self.message(MessageKey::CustomerCancelledPush, &self.job_params(job));
        self.push_to_user(translator, job, NotificationType::JobCancelled, message, now)
    }

    pub fn translator_cancelled(
        &self,
        customer: &UserAccount,
        job: &Job,
        now: NaiveDateTime,
    ) -> bool {
        let message = self.message(MessageKey::TranslatorCancelledPush, &self.job_params(job));
        self.push_to_user(customer, job, NotificationType::JobCancelled, message, now)
    }
}
