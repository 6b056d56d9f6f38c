use booking_core::workflows::bookings::{
    BookingConfig, BookingService, ChannelError, Clock, Collaborators, ConsumerCategory, Gender,
    LanguageId, Mailer, MemoryDirectory, MemoryJobStore, NotificationPreferences, OutboundMail,
    PushChannel, PushNotification, RecordingMailer, RecordingPush, RecordingSms,
    RequesterProfile, Role, SmsChannel, SmsStatus, StaticLocale, TracingAuditLog,
    TranslatorCategory, TranslatorLevel, TranslatorProfile, UserAccount, UserId,
};
use chrono::NaiveDateTime;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type ApiService = BookingService<MemoryJobStore, MemoryDirectory>;

pub(crate) const SWEDISH: LanguageId = LanguageId(1);
pub(crate) const ARABIC: LanguageId = LanguageId(2);
pub(crate) const DEMO_CUSTOMER: UserId = UserId(1);
pub(crate) const DEMO_ADMIN: UserId = UserId(2);
pub(crate) const DEMO_TRANSLATORS: [UserId; 3] = [UserId(10), UserId(11), UserId(12)];

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Outboxes kept by the in-process channels so the demo can print what was sent.
#[derive(Default, Clone)]
pub(crate) struct Outboxes {
    pub(crate) mail: RecordingMailer,
    pub(crate) push: RecordingPush,
    pub(crate) sms: RecordingSms,
}

/// Mail, push, and SMS handed off as log lines. Used when no vendor is configured.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, mail: OutboundMail) -> Result<(), ChannelError> {
        info!(
            address = %mail.address,
            subject = %mail.subject,
            template = ?mail.template,
            "mail handed off"
        );
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LogPush;

impl PushChannel for LogPush {
    fn send(&self, notification: PushNotification) -> Result<(), ChannelError> {
        info!(
            job_id = %notification.job_id,
            targets = notification.targets.len(),
            sound = ?notification.sound,
            send_after = ?notification.send_after,
            "push handed off"
        );
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LogSms;

impl SmsChannel for LogSms {
    fn send(&self, from: &str, to: &str, message: &str) -> Result<SmsStatus, ChannelError> {
        info!(from, to, length = message.chars().count(), "sms handed off");
        Ok(SmsStatus {
            accepted: true,
            reference: None,
        })
    }
}

/// Delivery channels handed to the booking service.
#[derive(Clone)]
pub(crate) struct Channels {
    pub(crate) mailer: Arc<dyn Mailer>,
    pub(crate) push: Arc<dyn PushChannel>,
    pub(crate) sms: Arc<dyn SmsChannel>,
}

impl Channels {
    pub(crate) fn logging() -> Self {
        Self {
            mailer: Arc::new(LogMailer),
            push: Arc::new(LogPush),
            sms: Arc::new(LogSms),
        }
    }
}

impl From<&Outboxes> for Channels {
    fn from(outboxes: &Outboxes) -> Self {
        Self {
            mailer: Arc::new(outboxes.mail.clone()),
            push: Arc::new(outboxes.push.clone()),
            sms: Arc::new(outboxes.sms.clone()),
        }
    }
}

fn account(id: UserId, name: &str, role: Role, mobile: Option<&str>) -> UserAccount {
    UserAccount {
        id,
        name: name.to_string(),
        email: format!("{}@demo.bookings", name.to_lowercase().replace(' ', ".")),
        role,
        mobile: mobile.map(str::to_string),
        active: true,
        notifications: NotificationPreferences::default(),
    }
}

fn translator(
    id: UserId,
    name: &str,
    level: TranslatorLevel,
    gender: Gender,
    languages: &[LanguageId],
    town: &str,
) -> TranslatorProfile {
    let mobile = format!("+46700{:06}", id.0);
    TranslatorProfile {
        account: account(id, name, Role::Translator, Some(&mobile)),
        category: TranslatorCategory::Contracted,
        level,
        gender: Some(gender),
        languages: languages.iter().copied().collect(),
        localities: BTreeSet::from([town.to_string()]),
        blocked_by: BTreeSet::new(),
    }
}

/// Seed users for running the service without an external directory.
pub(crate) fn demo_directory() -> MemoryDirectory {
    let [first, second, third] = DEMO_TRANSLATORS;
    MemoryDirectory::default()
        .with_requester(RequesterProfile {
            account: account(DEMO_CUSTOMER, "City Clinic", Role::Customer, None),
            consumer: ConsumerCategory::Paid,
            customer_type: "healthcare".to_string(),
            city: Some("Göteborg".to_string()),
            address: Some("Vasagatan 12".to_string()),
            instructions: Some("Ask for the duty nurse".to_string()),
            localities: BTreeSet::from(["Göteborg".to_string()]),
        })
        .with_user(account(DEMO_ADMIN, "Booking Desk", Role::Admin, None))
        .with_translator(translator(
            first,
            "Amira",
            TranslatorLevel::CertifiedInHealth,
            Gender::Female,
            &[SWEDISH, ARABIC],
            "Göteborg",
        ))
        .with_translator(translator(
            second,
            "Erik",
            TranslatorLevel::Certified,
            Gender::Male,
            &[SWEDISH],
            "Borås",
        ))
        .with_translator(translator(
            third,
            "Sami",
            TranslatorLevel::Layman,
            Gender::Male,
            &[ARABIC],
            "Göteborg",
        ))
}

pub(crate) fn demo_locale() -> StaticLocale {
    StaticLocale::default()
        .with_language(SWEDISH, "Swedish")
        .with_language(ARABIC, "Arabic")
}

pub(crate) fn build_service(
    config: BookingConfig,
    store: MemoryJobStore,
    clock: Arc<dyn Clock>,
    channels: Channels,
) -> Arc<ApiService> {
    let collaborators = Collaborators {
        mailer: channels.mailer,
        push: channels.push,
        sms: channels.sms,
        locale: Arc::new(demo_locale()),
        clock,
        audit: Arc::new(TracingAuditLog),
    };
    Arc::new(BookingService::new(
        Arc::new(store),
        Arc::new(demo_directory()),
        collaborators,
        config,
    ))
}

pub(crate) fn parse_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD HH:MM ({err})"))
}
