use super::super::domain::{CertificationRequirement, TranslatorLevel};

const CERTIFIED_LEVELS: &[TranslatorLevel] = &[
    TranslatorLevel::Certified,
    TranslatorLevel::CertifiedInLaw,
    TranslatorLevel::CertifiedInHealth,
];
const LAW_LEVELS: &[TranslatorLevel] = &[TranslatorLevel::CertifiedInLaw];
const HEALTH_LEVELS: &[TranslatorLevel] = &[TranslatorLevel::CertifiedInHealth];
const NORMAL_LEVELS: &[TranslatorLevel] = &[
    TranslatorLevel::Layman,
    TranslatorLevel::ReadTranslationCourses,
];

/// Translator levels that satisfy a certification requirement.
pub(crate) fn accepted_levels(
    requirement: Option<CertificationRequirement>,
) -> &'static [TranslatorLevel] {
    match requirement {
        None => &TranslatorLevel::ALL,
        Some(CertificationRequirement::Certified)
        | Some(CertificationRequirement::NormalOrCertified) => CERTIFIED_LEVELS,
        Some(CertificationRequirement::Law) | Some(CertificationRequirement::NormalOrLaw) => {
            LAW_LEVELS
        }
        Some(CertificationRequirement::Health) | Some(CertificationRequirement::NormalOrHealth) => {
            HEALTH_LEVELS
        }
        // Legacy matching also lists `both` here, but that arm is never reached.
        Some(CertificationRequirement::Normal) => NORMAL_LEVELS,
    }
}

pub(crate) fn satisfies(
    requirement: Option<CertificationRequirement>,
    level: TranslatorLevel,
) -> bool {
    accepted_levels(requirement).contains(&level)
}
