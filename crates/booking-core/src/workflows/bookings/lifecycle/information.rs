use serde::{Deserialize, Serialize};
use tracing::info;

use super::super::audit::{AuditAction, FieldChange};
use super::super::domain::{Job, JobId, Role, SessionDuration, UserId};
use super::super::repository::{Changeset, Directory, JobStore};
use super::error::{BookingError, ValidationError};
use super::BookingService;

/// Desk bookkeeping kept next to the lifecycle. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInformation {
    #[serde(default)]
    pub flagged: Option<bool>,
    #[serde(default)]
    pub manually_handled: Option<bool>,
    #[serde(default)]
    pub by_admin: Option<bool>,
    /// `h:m` or `h:m:s`.
    #[serde(default)]
    pub session_time: Option<String>,
    #[serde(default)]
    pub admin_comment: Option<String>,
    #[serde(default)]
    pub distance: Option<String>,
    #[serde(default)]
    pub travel_time: Option<String>,
}

fn set_flag(field: &mut bool, value: Option<bool>, name: &str, notes: &mut Vec<FieldChange>) {
    if let Some(value) = value.filter(|value| *value != *field) {
        *field = value;
        notes.push(FieldChange::note(format!("{name} set to {value}")));
    }
}

fn set_text(
    field: &mut Option<String>,
    value: Option<&str>,
    name: &str,
    notes: &mut Vec<FieldChange>,
) {
    let Some(value) = value.map(str::trim) else {
        return;
    };
    let value = (!value.is_empty()).then(|| value.to_string());
    if *field != value {
        notes.push(FieldChange::note(format!(
            "{name} set to {}",
            value.as_deref().unwrap_or("nothing")
        )));
        *field = value;
    }
}

impl<S, D> BookingService<S, D>
where
    S: JobStore + 'static,
    D: Directory + 'static,
{
    /// Record flags, travel and session details without touching the status.
    pub fn update_job_information(
        &self,
        job_id: JobId,
        information: JobInformation,
        actor: UserId,
    ) -> Result<Job, BookingError> {
        let admin = self.user(actor)?;
        if !matches!(admin.role, Role::Admin | Role::SuperAdmin) {
            return Err(BookingError::Forbidden { role: admin.role });
        }

        let mut job = self.load_job(job_id)?;
        let mut notes = Vec::new();

        let session = information
            .session_time
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                SessionDuration::parse(raw).ok_or_else(|| {
                    ValidationError::new("session_time", "Session time must be h:m or h:m:s")
                })
            })
            .transpose()?;
        if let Some(session) = session.filter(|session| job.session_time != Some(*session)) {
            job.session_time = Some(session);
            notes.push(FieldChange::note(format!("session time set to {session}")));
        }

        set_flag(&mut job.flagged, information.flagged, "flagged", &mut notes);
        set_flag(
            &mut job.manually_handled,
            information.manually_handled,
            "manually handled",
            &mut notes,
        );
        set_flag(&mut job.by_admin, information.by_admin, "by admin", &mut notes);
        set_text(
            &mut job.distance,
            information.distance.as_deref(),
            "distance",
            &mut notes,
        );
        set_text(
            &mut job.travel_time,
            information.travel_time.as_deref(),
            "travel time",
            &mut notes,
        );
        if let Some(comment) = information
            .admin_comment
            .filter(|comment| *comment != job.admin_comments)
        {
            job.admin_comments = comment;
            notes.push(FieldChange::note("admin comment replaced"));
        }

        if notes.is_empty() {
            return Ok(job);
        }

        self.store.commit(Changeset::default().update_job(job.clone()))?;
        self.record(job_id, Some(actor), AuditAction::InformationUpdated, notes);
        info!(%job_id, admin = %admin.id, "job information updated");
        Ok(job)
    }
}
