use serde_json::{json, Value};

use super::super::clock::due_parts;
use super::super::domain::{CertificationRequirement, Job};

pub(crate) const DUE_DISPLAY: &str = "%Y-%m-%d %H:%M:%S";

fn flag(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Labels echoed back to customers and carried in offer payloads.
pub fn job_for_labels(job: &Job) -> Vec<String> {
    let mut labels = Vec::new();
    if let Some(gender) = job.gender {
        labels.push(gender.label().to_string());
    }
    match job.certification {
        Some(CertificationRequirement::NormalOrCertified) => {
            labels.push("normal".to_string());
            labels.push("certified".to_string());
        }
        Some(CertificationRequirement::Certified) => labels.push("certified".to_string()),
        Some(other) => labels.push(other.code().to_string()),
        None => {}
    }
    labels
}

/// Job summary sent as push `data`.
pub fn job_payload(job: &Job, customer_type: &str) -> Value {
    let (due_date, due_time) = due_parts(job.due);
    json!({
        "job_id": job.id,
        "from_language_id": job.from_language_id,
        "immediate": flag(job.immediate),
        "duration": job.duration_minutes,
        "status": job.status,
        "gender": job.gender,
        "certified": job.certification,
        "due": job.due.format(DUE_DISPLAY).to_string(),
        "job_type": job.job_type,
        "customer_phone_type": flag(job.delivery.phone),
        "customer_physical_type": flag(job.delivery.physical),
        "customer_town": job.town,
        "customer_type": customer_type,
        "due_date": due_date,
        "due_time": due_time,
        "job_for": job_for_labels(job),
    })
}

/// Attach the notification type and any extra fields to a payload object.
pub(crate) fn with_type(
    mut payload: Value,
    notification_type: &str,
    extra: &[(&str, Value)],
) -> Value {
    if let Value::Object(map) = &mut payload {
        map.insert(
            "notification_type".to_string(),
            Value::String(notification_type.to_string()),
        );
        for (key, value) in extra {
            map.insert((*key).to_string(), value.clone());
        }
    }
    payload
}
