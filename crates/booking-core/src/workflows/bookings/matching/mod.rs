//! Translator matching over already-loaded profiles.
//!
//! `eligibility` and `find_candidates` are pure. Whether a matched translator may actually be
//! offered the job depends on their current bookings and is decided by `assignment_check`.

mod certification;
mod rules;

pub use rules::Ineligibility;

use serde::Serialize;

use super::domain::{
    CertificationRequirement, Job, JobId, RequesterProfile, TranslatorLevel, TranslatorProfile,
    UserId,
};

/// Check every eligibility rule, reporting the first one that fails.
pub fn eligibility(
    job: &Job,
    requester: &RequesterProfile,
    translator: &TranslatorProfile,
) -> Result<(), Ineligibility> {
    rules::category_matches(job, translator)?;
    rules::speaks_language(job, translator)?;
    rules::gender_matches(job, translator)?;
    rules::certification_matches(job, translator)?;
    rules::not_blocked(requester, translator)?;
    rules::locality_matches(job, requester, translator)
}

/// Eligible translators in pool order.
pub fn find_candidates(
    job: &Job,
    requester: &RequesterProfile,
    pool: &[TranslatorProfile],
) -> Vec<TranslatorProfile> {
    pool.iter()
        .filter(|translator| eligibility(job, requester, translator).is_ok())
        .cloned()
        .collect()
}

pub fn accepted_levels(
    requirement: Option<CertificationRequirement>,
) -> &'static [TranslatorLevel] {
    certification::accepted_levels(requirement)
}

/// Reservation and double-booking status of a job for one translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum AssignmentCheck {
    Open,
    Reserved,
    ReservedForOthers,
    DoubleBooked { conflicting: JobId },
}

impl AssignmentCheck {
    pub const fn permits_offer(self) -> bool {
        matches!(self, AssignmentCheck::Open | AssignmentCheck::Reserved)
    }
}

/// `booked` holds the jobs the translator currently has an active assignment on.
pub fn assignment_check(job: &Job, translator: UserId, booked: &[Job]) -> AssignmentCheck {
    let reserved = !job.reserved_for.is_empty();
    if reserved && !job.reserved_for.contains(&translator) {
        return AssignmentCheck::ReservedForOthers;
    }

    if let Some(conflict) = booked
        .iter()
        .find(|other| other.id != job.id && other.due == job.due)
    {
        return AssignmentCheck::DoubleBooked {
            conflicting: conflict.id,
        };
    }

    if reserved {
        AssignmentCheck::Reserved
    } else {
        AssignmentCheck::Open
    }
}
