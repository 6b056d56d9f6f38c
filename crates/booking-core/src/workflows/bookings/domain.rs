use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

/// Identifier wrapper for customers, translators, and admins alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

/// Identifier wrapper for translator/job relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageId(pub u32);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Booking status tracked by the lifecycle engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "assigned")]
    Assigned,
    #[serde(rename = "started")]
    Started,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "withdrawbefore24")]
    WithdrawBefore24,
    #[serde(rename = "withdrawafter24")]
    WithdrawAfter24,
    #[serde(rename = "timedout")]
    TimedOut,
    #[serde(rename = "not_carried_out_customer")]
    NotCarriedOutCustomer,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Assigned => "assigned",
            JobStatus::Started => "started",
            JobStatus::Completed => "completed",
            JobStatus::WithdrawBefore24 => "withdrawbefore24",
            JobStatus::WithdrawAfter24 => "withdrawafter24",
            JobStatus::TimedOut => "timedout",
            JobStatus::NotCarriedOutCustomer => "not_carried_out_customer",
        }
    }

    /// States only an explicit admin reopen can leave.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed
                | JobStatus::WithdrawBefore24
                | JobStatus::WithdrawAfter24
                | JobStatus::NotCarriedOutCustomer
        )
    }

    pub const fn is_withdrawn(self) -> bool {
        matches!(self, JobStatus::WithdrawBefore24 | JobStatus::WithdrawAfter24)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

/// Qualification the customer asked for, encoded with the booking system's `certified` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificationRequirement {
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "yes")]
    Certified,
    #[serde(rename = "law")]
    Law,
    #[serde(rename = "health")]
    Health,
    #[serde(rename = "both")]
    NormalOrCertified,
    #[serde(rename = "n_law")]
    NormalOrLaw,
    #[serde(rename = "n_health")]
    NormalOrHealth,
}

impl CertificationRequirement {
    pub const ALL: [CertificationRequirement; 7] = [
        CertificationRequirement::Normal,
        CertificationRequirement::Certified,
        CertificationRequirement::Law,
        CertificationRequirement::Health,
        CertificationRequirement::NormalOrCertified,
        CertificationRequirement::NormalOrLaw,
        CertificationRequirement::NormalOrHealth,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            CertificationRequirement::Normal => "normal",
            CertificationRequirement::Certified => "yes",
            CertificationRequirement::Law => "law",
            CertificationRequirement::Health => "health",
            CertificationRequirement::NormalOrCertified => "both",
            CertificationRequirement::NormalOrLaw => "n_law",
            CertificationRequirement::NormalOrHealth => "n_health",
        }
    }
}

/// Translator qualification tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TranslatorLevel {
    #[serde(rename = "Layman")]
    Layman,
    #[serde(rename = "Read Translation courses")]
    ReadTranslationCourses,
    #[serde(rename = "Certified")]
    Certified,
    #[serde(rename = "Certified with specialisation in law")]
    CertifiedInLaw,
    #[serde(rename = "Certified with specialisation in health care")]
    CertifiedInHealth,
}

impl TranslatorLevel {
    pub const ALL: [TranslatorLevel; 5] = [
        TranslatorLevel::Layman,
        TranslatorLevel::ReadTranslationCourses,
        TranslatorLevel::Certified,
        TranslatorLevel::CertifiedInLaw,
        TranslatorLevel::CertifiedInHealth,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            TranslatorLevel::Layman => "Layman",
            TranslatorLevel::ReadTranslationCourses => "Read Translation courses",
            TranslatorLevel::Certified => "Certified",
            TranslatorLevel::CertifiedInLaw => "Certified with specialisation in law",
            TranslatorLevel::CertifiedInHealth => "Certified with specialisation in health care",
        }
    }
}

/// Pool a job is offered to, derived from the requester's consumer category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "paid")]
    Standard,
    #[serde(rename = "rws")]
    Contracted,
    #[serde(rename = "unpaid")]
    Unpaid,
}

impl JobType {
    pub const fn code(self) -> &'static str {
        match self {
            JobType::Standard => "paid",
            JobType::Contracted => "rws",
            JobType::Unpaid => "unpaid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsumerCategory {
    #[serde(rename = "paid")]
    Paid,
    #[serde(rename = "rwsconsumer")]
    RwsConsumer,
    #[serde(rename = "ngo")]
    Ngo,
}

impl ConsumerCategory {
    pub const fn job_type(self) -> JobType {
        match self {
            ConsumerCategory::Paid => JobType::Standard,
            ConsumerCategory::RwsConsumer => JobType::Contracted,
            ConsumerCategory::Ngo => JobType::Unpaid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TranslatorCategory {
    #[serde(rename = "professional")]
    Contracted,
    #[serde(rename = "rwstranslator")]
    Agency,
    #[serde(rename = "volunteer")]
    Volunteer,
}

impl TranslatorCategory {
    /// The only job type this category of translator is offered.
    pub const fn job_type(self) -> JobType {
        match self {
            TranslatorCategory::Contracted => JobType::Standard,
            TranslatorCategory::Agency => JobType::Contracted,
            TranslatorCategory::Volunteer => JobType::Unpaid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Translator,
    Admin,
    SuperAdmin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Translator => "translator",
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
        }
    }
}

/// How the interpretation is delivered. At least one flag is set on every stored job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeliveryMode {
    pub phone: bool,
    pub physical: bool,
}

impl DeliveryMode {
    /// Physical-only jobs restrict matching to translators in the requester's localities.
    pub const fn requires_presence(self) -> bool {
        self.physical && !self.phone
    }

    pub const fn is_satisfiable(self) -> bool {
        self.phone || self.physical
    }
}

/// Elapsed interpretation time stored on completed jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionDuration {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl SessionDuration {
    pub fn from_seconds(total: i64) -> Self {
        let total = total.unsigned_abs();
        Self {
            hours: (total / 3600) as u32,
            minutes: ((total % 3600) / 60) as u32,
            seconds: (total % 60) as u32,
        }
    }

    /// Absolute distance between two instants.
    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self::from_seconds((end - start).num_seconds())
    }

    /// Parse an `h:m` or `h:m:s` value typed by an admin.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim().split(':');
        let hours = parts.next()?.trim().parse().ok()?;
        let minutes = parts.next()?.trim().parse().ok()?;
        let seconds = match parts.next() {
            Some(value) => value.trim().parse().ok()?,
            None => 0,
        };
        if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
            return None;
        }
        Some(Self {
            hours,
            minutes,
            seconds,
        })
    }

    pub fn describe(&self) -> String {
        format!("{}h {}min", self.hours, self.minutes)
    }
}

impl fmt::Display for SessionDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.hours, self.minutes, self.seconds)
    }
}

/// One interpretation booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub requester_id: UserId,
    pub from_language_id: LanguageId,
    pub immediate: bool,
    pub duration_minutes: u32,
    pub due: NaiveDateTime,
    pub status: JobStatus,
    pub gender: Option<Gender>,
    pub certification: Option<CertificationRequirement>,
    pub delivery: DeliveryMode,
    pub job_type: JobType,
    #[serde(default)]
    pub admin_comments: String,
    #[serde(default)]
    pub reference: String,
    /// Overrides the requester's account e-mail for booking correspondence.
    pub contact_email: Option<String>,
    pub address: Option<String>,
    pub instructions: Option<String>,
    pub town: Option<String>,
    pub by_admin: bool,
    /// Marked for follow-up by the booking desk.
    #[serde(default)]
    pub flagged: bool,
    #[serde(default)]
    pub manually_handled: bool,
    /// Travel distance and time reported for on-site sessions.
    #[serde(default)]
    pub distance: Option<String>,
    #[serde(default)]
    pub travel_time: Option<String>,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub ended_at: Option<NaiveDateTime>,
    pub session_time: Option<SessionDuration>,
    pub withdrawn_at: Option<NaiveDateTime>,
    /// Translators the job is reserved for. Empty means open to the whole pool.
    #[serde(default)]
    pub reserved_for: BTreeSet<UserId>,
}

impl Job {
    /// Address used for customer correspondence about this job.
    pub fn customer_email<'a>(&'a self, requester: &'a UserAccount) -> &'a str {
        match self.contact_email.as_deref() {
            Some(email) if !email.trim().is_empty() => email,
            _ => requester.email.as_str(),
        }
    }
}

/// Link between a job and the translator serving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub job_id: JobId,
    pub translator_id: UserId,
    pub assigned_at: NaiveDateTime,
    pub cancelled_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub completed_by: Option<UserId>,
}

impl Assignment {
    pub fn new(
        id: AssignmentId,
        job_id: JobId,
        translator_id: UserId,
        assigned_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            job_id,
            translator_id,
            assigned_at,
            cancelled_at: None,
            completed_at: None,
            completed_by: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancelled_at.is_none() && self.completed_at.is_none()
    }
}

/// Per-user notification opt-outs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub push_enabled: bool,
    pub emergency_alerts: bool,
    pub defer_at_night: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            push_enabled: true,
            emergency_alerts: true,
            defer_at_night: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub mobile: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub notifications: NotificationPreferences,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterProfile {
    pub account: UserAccount,
    pub consumer: ConsumerCategory,
    pub customer_type: String,
    pub city: Option<String>,
    pub address: Option<String>,
    pub instructions: Option<String>,
    #[serde(default)]
    pub localities: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatorProfile {
    pub account: UserAccount,
    pub category: TranslatorCategory,
    pub level: TranslatorLevel,
    pub gender: Option<Gender>,
    pub languages: BTreeSet<LanguageId>,
    #[serde(default)]
    pub localities: BTreeSet<String>,
    /// Requesters who asked never to be matched with this translator.
    #[serde(default)]
    pub blocked_by: BTreeSet<UserId>,
}

impl TranslatorProfile {
    pub fn id(&self) -> UserId {
        self.account.id
    }
}

/// A translator selected for a job offer plus whether the push waits for business hours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationTarget {
    pub translator: TranslatorProfile,
    pub delay: bool,
}

/// Accepts `yes`/`no` strings, booleans, or 0/1 for legacy booking forms.
pub(crate) mod yes_no {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Number(u64),
        Text(String),
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(false),
            Some(Raw::Bool(value)) => Ok(value),
            Some(Raw::Number(value)) => Ok(value != 0),
            Some(Raw::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
                "yes" | "true" | "1" | "on" => Ok(true),
                "no" | "false" | "0" | "" => Ok(false),
                other => Err(D::Error::custom(format!(
                    "expected yes/no flag, found '{other}'"
                ))),
            },
        }
    }
}
