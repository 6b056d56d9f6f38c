use std::collections::BTreeSet;
use std::sync::Arc;

use axum::response::Response;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::workflows::bookings::{
    booking_router, AdminUpdate, BookingConfig, BookingDetails, BookingRequest, BookingService,
    Changeset, Collaborators, ConsumerCategory, FixedClock, Gender, Job, JobId, JobStatus,
    JobStore, LanguageId, MemoryAuditLog, MemoryDirectory, MemoryJobStore,
    NotificationPreferences, RecordingMailer, RecordingPush, RecordingSms, RequesterProfile, Role,
    StaticLocale, TranslatorCategory, TranslatorLevel, TranslatorProfile, UserAccount, UserId,
};

pub(super) const SWEDISH: LanguageId = LanguageId(1);
pub(super) const ARABIC: LanguageId = LanguageId(2);

pub(super) const CUSTOMER: UserId = UserId(1);
pub(super) const ADMIN: UserId = UserId(9);
/// Certified, female, speaks Swedish and Arabic, lives in Stockholm.
pub(super) const ANNA: UserId = UserId(10);
/// Layman, male, speaks Swedish, lives in Uppsala.
pub(super) const BORIS: UserId = UserId(11);
/// Volunteer, never matches paid jobs.
pub(super) const VERA: UserId = UserId(12);

pub(super) type TestService = BookingService<MemoryJobStore, MemoryDirectory>;

/// Monday 2026-03-02 10:00.
pub(super) fn now() -> NaiveDateTime {
    at(2026, 3, 2, 10, 0)
}

pub(super) fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("valid timestamp")
}

pub(super) fn account(id: UserId, name: &str, role: Role) -> UserAccount {
    UserAccount {
        id,
        name: name.to_string(),
        email: format!("{}@example.se", name.to_lowercase()),
        role,
        mobile: None,
        active: true,
        notifications: NotificationPreferences::default(),
    }
}

pub(super) fn customer() -> RequesterProfile {
    RequesterProfile {
        account: account(CUSTOMER, "Clara", Role::Customer),
        consumer: ConsumerCategory::Paid,
        customer_type: "municipality".to_string(),
        city: Some("Stockholm".to_string()),
        address: Some("Drottninggatan 1".to_string()),
        instructions: Some("Ring on arrival".to_string()),
        localities: BTreeSet::from(["Stockholm".to_string()]),
    }
}

pub(super) fn translator(
    id: UserId,
    name: &str,
    level: TranslatorLevel,
    gender: Gender,
    languages: &[LanguageId],
    town: &str,
) -> TranslatorProfile {
    let mut account = account(id, name, Role::Translator);
    account.mobile = Some(format!("+4670000{}", id.0));
    TranslatorProfile {
        account,
        category: TranslatorCategory::Contracted,
        level,
        gender: Some(gender),
        languages: languages.iter().copied().collect(),
        localities: BTreeSet::from([town.to_string()]),
        blocked_by: BTreeSet::new(),
    }
}

pub(super) fn anna() -> TranslatorProfile {
    translator(
        ANNA,
        "Anna",
        TranslatorLevel::Certified,
        Gender::Female,
        &[SWEDISH, ARABIC],
        "Stockholm",
    )
}

pub(super) fn boris() -> TranslatorProfile {
    translator(
        BORIS,
        "Boris",
        TranslatorLevel::Layman,
        Gender::Male,
        &[SWEDISH],
        "Uppsala",
    )
}

pub(super) fn vera() -> TranslatorProfile {
    let mut vera = translator(
        VERA,
        "Vera",
        TranslatorLevel::Certified,
        Gender::Female,
        &[SWEDISH],
        "Stockholm",
    );
    vera.category = TranslatorCategory::Volunteer;
    vera
}

pub(super) fn directory() -> MemoryDirectory {
    MemoryDirectory::default()
        .with_requester(customer())
        .with_user(account(ADMIN, "Ada", Role::Admin))
        .with_translator(anna())
        .with_translator(boris())
        .with_translator(vera())
}

pub(super) fn locale() -> StaticLocale {
    StaticLocale::default()
        .with_language(SWEDISH, "Swedish")
        .with_language(ARABIC, "Arabic")
}

pub(super) struct Harness {
    pub(super) service: Arc<TestService>,
    pub(super) store: MemoryJobStore,
    pub(super) directory: MemoryDirectory,
    pub(super) mailer: RecordingMailer,
    pub(super) push: RecordingPush,
    pub(super) sms: RecordingSms,
    pub(super) audit: MemoryAuditLog,
    pub(super) clock: Arc<FixedClock>,
}

pub(super) fn harness() -> Harness {
    harness_with(directory())
}

pub(super) fn harness_with(directory: MemoryDirectory) -> Harness {
    let store = MemoryJobStore::default();
    let mailer = RecordingMailer::default();
    let push = RecordingPush::default();
    let sms = RecordingSms::default();
    let audit = MemoryAuditLog::default();
    let clock = Arc::new(FixedClock::new(now()));

    let collaborators = Collaborators {
        mailer: Arc::new(mailer.clone()),
        push: Arc::new(push.clone()),
        sms: Arc::new(sms.clone()),
        locale: Arc::new(locale()),
        clock: clock.clone(),
        audit: Arc::new(audit.clone()),
    };
    let config = BookingConfig {
        sms_number: "+46701234567".to_string(),
        ..BookingConfig::default()
    };
    let service = Arc::new(BookingService::new(
        Arc::new(store.clone()),
        Arc::new(directory.clone()),
        collaborators,
        config,
    ));

    Harness {
        service,
        store,
        directory,
        mailer,
        push,
        sms,
        audit,
        clock,
    }
}

/// Phone booking for Swedish, one hour long, due the given number of hours from [`now`].
pub(super) fn scheduled_request(hours_ahead: i64) -> BookingRequest {
    let due = now() + Duration::hours(hours_ahead);
    BookingRequest {
        from_language_id: Some(SWEDISH),
        immediate: false,
        due_date: Some(due.format("%m/%d/%Y").to_string()),
        due_time: Some(due.format("%H:%M").to_string()),
        customer_phone_type: true,
        customer_physical_type: false,
        duration: Some("60".to_string()),
        job_for: Vec::new(),
        by_admin: false,
    }
}

impl Harness {
    pub(super) fn job(&self, id: JobId) -> Job {
        self.store
            .job(id)
            .expect("store readable")
            .expect("job exists")
    }

    /// Created and confirmed, so the pool has been notified.
    pub(super) fn book(&self, request: BookingRequest) -> JobId {
        let receipt = self
            .service
            .create(CUSTOMER, request)
            .expect("booking created");
        self.service
            .confirm_booking(receipt.id, BookingDetails::default())
            .expect("booking confirmed");
        receipt.id
    }

    pub(super) fn book_hours_ahead(&self, hours_ahead: i64) -> JobId {
        self.book(scheduled_request(hours_ahead))
    }

    pub(super) fn assigned(&self, hours_ahead: i64, translator: UserId) -> JobId {
        let id = self.book_hours_ahead(hours_ahead);
        self.service.accept(id, translator).expect("accepted");
        id
    }

    /// Status changes outside the admin handlers, e.g. the session start.
    pub(super) fn force_status(&self, id: JobId, status: JobStatus) {
        let mut job = self.job(id);
        job.status = status;
        self.store
            .commit(Changeset::default().update_job(job))
            .expect("status forced");
    }

    /// Assigned to Anna, due in two hours, and moved to `started` once due.
    pub(super) fn started(&self) -> JobId {
        let id = self.assigned(2, ANNA);
        self.clock.advance(Duration::hours(2));
        self.force_status(id, JobStatus::Started);
        id
    }

    pub(super) fn admin_update(&self, id: JobId, update: AdminUpdate) -> Job {
        self.service
            .update_by_admin(id, update, ADMIN)
            .expect("admin update applied")
            .job
    }

    pub(super) fn outbox_counts(&self) -> (usize, usize) {
        (self.mailer.sent().len(), self.push.sent().len())
    }

    pub(super) fn router(&self) -> axum::Router {
        booking_router(self.service.clone())
    }
}

pub(super) fn status_update(status: JobStatus, comment: &str) -> AdminUpdate {
    AdminUpdate {
        status: Some(status),
        admin_comments: Some(comment.to_string()),
        ..AdminUpdate::default()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1 << 16)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
