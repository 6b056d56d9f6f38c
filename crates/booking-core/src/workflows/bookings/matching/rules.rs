use serde::Serialize;

use super::super::domain::{
    CertificationRequirement, Gender, Job, JobType, LanguageId, RequesterProfile,
    TranslatorCategory, TranslatorLevel, TranslatorProfile,
};
use super::certification;

/// First eligibility rule a translator failed for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Ineligibility {
    CategoryMismatch {
        job_type: JobType,
        category: TranslatorCategory,
    },
    LanguageNotSpoken {
        language: LanguageId,
    },
    GenderMismatch {
        required: Gender,
    },
    CertificationInsufficient {
        required: CertificationRequirement,
        level: TranslatorLevel,
    },
    Blocked,
    OutsideLocality,
}

pub(crate) fn category_matches(
    job: &Job,
    translator: &TranslatorProfile,
) -> Result<(), Ineligibility> {
    if translator.category.job_type() == job.job_type {
        Ok(())
    } else {
        Err(Ineligibility::CategoryMismatch {
            job_type: job.job_type,
            category: translator.category,
        })
    }
}

pub(crate) fn speaks_language(
    job: &Job,
    translator: &TranslatorProfile,
) -> Result<(), Ineligibility> {
    if translator.languages.contains(&job.from_language_id) {
        Ok(())
    } else {
        Err(Ineligibility::LanguageNotSpoken {
            language: job.from_language_id,
        })
    }
}

pub(crate) fn gender_matches(
    job: &Job,
    translator: &TranslatorProfile,
) -> Result<(), Ineligibility> {
    match job.gender {
        Some(required) if translator.gender != Some(required) => {
            Err(Ineligibility::GenderMismatch { required })
        }
        _ => Ok(()),
    }
}

pub(crate) fn certification_matches(
    job: &Job,
    translator: &TranslatorProfile,
) -> Result<(), Ineligibility> {
    match job.certification {
        Some(required) if !certification::satisfies(Some(required), translator.level) => {
            Err(Ineligibility::CertificationInsufficient {
                required,
                level: translator.level,
            })
        }
        _ => Ok(()),
    }
}

pub(crate) fn not_blocked(
    requester: &RequesterProfile,
    translator: &TranslatorProfile,
) -> Result<(), Ineligibility> {
    if translator.blocked_by.contains(&requester.account.id) {
        Err(Ineligibility::Blocked)
    } else {
        Ok(())
    }
}

/// Physical-only jobs need a translator living in one of the requester's localities.
pub(crate) fn locality_matches(
    job: &Job,
    requester: &RequesterProfile,
    translator: &TranslatorProfile,
) -> Result<(), Ineligibility> {
    if !job.delivery.requires_presence() {
        return Ok(());
    }
    if translator
        .localities
        .iter()
        .any(|town| requester.localities.contains(town))
    {
        Ok(())
    } else {
        Err(Ineligibility::OutsideLocality)
    }
}
