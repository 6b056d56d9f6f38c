use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use super::super::audit::{AuditAction, FieldChange};
use super::super::clock::DueError;
use super::super::domain::{
    yes_no, CertificationRequirement, DeliveryMode, Gender, Job, JobId, JobStatus, LanguageId,
    Role, UserId,
};
use super::super::notifications::job_for_labels;
use super::super::repository::{Changeset, Directory, JobStore};
use super::error::{BookingError, ValidationError, MAKE_A_CHOICE};
use super::BookingService;

/// Customer booking form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    #[serde(default)]
    pub from_language_id: Option<LanguageId>,
    #[serde(default, deserialize_with = "yes_no::deserialize")]
    pub immediate: bool,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub due_time: Option<String>,
    #[serde(default, deserialize_with = "yes_no::deserialize")]
    pub customer_phone_type: bool,
    #[serde(default, deserialize_with = "yes_no::deserialize")]
    pub customer_physical_type: bool,
    #[serde(default, deserialize_with = "lenient_text")]
    pub duration: Option<String>,
    #[serde(default)]
    pub job_for: Vec<String>,
    #[serde(default, deserialize_with = "yes_no::deserialize")]
    pub by_admin: bool,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingType {
    Immediate,
    Regular,
}

/// Summary returned to the customer after a successful create.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingReceipt {
    pub id: JobId,
    #[serde(rename = "type")]
    pub booking_type: BookingType,
    pub customer_physical_type: bool,
    pub job_for: Vec<String>,
    pub customer_town: Option<String>,
    pub customer_type: String,
}

/// Contact details supplied after the booking form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDetails {
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    /// When present, address, instructions, and town are all rewritten.
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
}

fn gender_for(job_for: &[String]) -> Option<Gender> {
    let has = |value: &str| job_for.iter().any(|entry| entry == value);
    if has("male") {
        Some(Gender::Male)
    } else if has("female") {
        Some(Gender::Female)
    } else {
        None
    }
}

fn certification_for(job_for: &[String]) -> Option<CertificationRequirement> {
    let has = |value: &str| job_for.iter().any(|entry| entry == value);
    let health = has("certified_in_helth") || has("certified_in_health");

    if has("normal") {
        if has("certified") {
            return Some(CertificationRequirement::NormalOrCertified);
        }
        if has("certified_in_law") {
            return Some(CertificationRequirement::NormalOrLaw);
        }
        if health {
            return Some(CertificationRequirement::NormalOrHealth);
        }
        return Some(CertificationRequirement::Normal);
    }

    if has("certified") {
        Some(CertificationRequirement::Certified)
    } else if has("certified_in_law") {
        Some(CertificationRequirement::Law)
    } else if health {
        Some(CertificationRequirement::Health)
    } else {
        None
    }
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ValidationError> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(ValidationError::missing(field)),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

impl<S, D> BookingService<S, D>
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    /// Validate a customer booking form and persist it as a `pending` job.
    pub fn create(
        &self,
        requester_id: UserId,
        request: BookingRequest,
    ) -> Result<BookingReceipt, BookingError> {
        let account = self.user(requester_id)?;
        if account.role != Role::Customer {
            return Err(BookingError::Forbidden { role: account.role });
        }
        let profile = self.requester(requester_id)?;

        let language = request
            .from_language_id
            .ok_or_else(|| ValidationError::missing("from_language_id"))?;

        let (due_date, due_time) = if request.immediate {
            ("", "")
        } else {
            let due_date = required(&request.due_date, "due_date")?;
            let due_time = required(&request.due_time, "due_time")?;
            if !request.customer_phone_type && !request.customer_physical_type {
                return Err(ValidationError::new("customer_phone_type", MAKE_A_CHOICE).into());
            }
            (due_date, due_time)
        };
        let duration_minutes = required(&request.duration, "duration")?
            .parse::<u32>()
            .map_err(|_| ValidationError::new("duration", "Duration must be a number of minutes"))?;

        let now = self.now();
        let due = self
            .policy
            .compute_due(request.immediate, due_date, due_time, now)
            .map_err(|error| match error {
                DueError::InPast => ValidationError::new("due", error.to_string()),
                DueError::Unparsable { .. } => ValidationError::new("due_date", error.to_string()),
            })?;

        let delivery = DeliveryMode {
            phone: request.immediate || request.customer_phone_type,
            physical: request.customer_physical_type,
        };

        let job = Job {
            id: self.store.next_job_id()?,
            requester_id,
            from_language_id: language,
            immediate: request.immediate,
            duration_minutes,
            due,
            status: JobStatus::Pending,
            gender: gender_for(&request.job_for),
            certification: certification_for(&request.job_for),
            delivery,
            job_type: profile.consumer.job_type(),
            admin_comments: String::new(),
            reference: String::new(),
            contact_email: None,
            address: None,
            instructions: None,
            town: None,
            by_admin: request.by_admin,
            flagged: false,
            manually_handled: false,
            distance: None,
            travel_time: None,
            created_at: now,
            expires_at: self.policy.compute_expiry(due, now),
            ended_at: None,
            session_time: None,
            withdrawn_at: None,
            reserved_for: BTreeSet::new(),
        };

        self.store
            .commit(Changeset::default().insert_job(job.clone()))?;
        self.record(
            job.id,
            Some(requester_id),
            AuditAction::Created,
            vec![FieldChange::note(format!("due {}", job.due))],
        );
        info!(job_id = %job.id, immediate = job.immediate, "booking created");

        Ok(BookingReceipt {
            id: job.id,
            booking_type: if job.immediate {
                BookingType::Immediate
            } else {
                BookingType::Regular
            },
            customer_physical_type: job.delivery.physical,
            job_for: job_for_labels(&job),
            customer_town: profile.city.clone(),
            customer_type: profile.customer_type.clone(),
        })
    }

    /// Store contact details, mail the customer, and offer the job to the pool.
    pub fn confirm_booking(
        &self,
        job_id: JobId,
        details: BookingDetails,
    ) -> Result<Job, BookingError> {
        let mut job = self.load_job(job_id)?;
        let customer = self.user(job.requester_id)?;
        let profile = self.requester(job.requester_id)?;

        if let Some(email) = non_blank(details.user_email.as_deref()) {
            job.contact_email = Some(email);
        }
        job.reference = details.reference.unwrap_or_default();

        if details.address.is_some() {
            job.address = non_blank(details.address.as_deref()).or_else(|| profile.address.clone());
            job.instructions =
                non_blank(details.instructions.as_deref()).or_else(|| profile.instructions.clone());
            job.town = non_blank(details.town.as_deref()).or_else(|| profile.city.clone());
        }

        self.store.commit(Changeset::default().update_job(job.clone()))?;
        self.notifier.job_created(&job, &customer);
        self.record(job.id, Some(job.requester_id), AuditAction::Confirmed, Vec::new());
        self.notify_translators(&job, None)?;

        Ok(job)
    }
}
