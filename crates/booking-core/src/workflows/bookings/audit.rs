use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{JobId, JobStatus, LanguageId, UserId};

/// Append-only record of booking mutations.
pub trait AuditLog: Send + Sync {
    fn append(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: NaiveDateTime,
    pub actor: Option<UserId>,
    pub job_id: JobId,
    pub action: AuditAction,
    pub changes: Vec<FieldChange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Confirmed,
    Accepted,
    AdminUpdated,
    CustomerCancelled,
    TranslatorCancelled,
    Ended,
    CustomerNotCall,
    Reopened,
    InformationUpdated,
}

impl AuditAction {
    pub const fn label(self) -> &'static str {
        match self {
            AuditAction::Created => "created",
            AuditAction::Confirmed => "confirmed",
            AuditAction::Accepted => "accepted",
            AuditAction::AdminUpdated => "admin_updated",
            AuditAction::CustomerCancelled => "customer_cancelled",
            AuditAction::TranslatorCancelled => "translator_cancelled",
            AuditAction::Ended => "ended",
            AuditAction::CustomerNotCall => "customer_not_call",
            AuditAction::Reopened => "reopened",
            AuditAction::InformationUpdated => "information_updated",
        }
    }
}

/// Old/new pair for one audited field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum FieldChange {
    Translator {
        old: Option<UserId>,
        new: UserId,
    },
    Due {
        old: NaiveDateTime,
        new: NaiveDateTime,
    },
    Language {
        old: LanguageId,
        new: LanguageId,
    },
    Status {
        old: JobStatus,
        new: JobStatus,
    },
    Note {
        text: String,
    },
}

impl FieldChange {
    pub fn note(text: impl Into<String>) -> Self {
        FieldChange::Note { text: text.into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Writes entries to the `audit` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLog;

impl AuditLog for TracingAuditLog {
    fn append(&self, entry: AuditEntry) -> Result<(), AuditError> {
        let changes = serde_json::to_string(&entry.changes)
            .map_err(|err| AuditError::Unavailable(err.to_string()))?;
        info!(
            target: "audit",
            job_id = %entry.job_id,
            action = entry.action.label(),
            actor = ?entry.actor.map(|id| id.0),
            at = %entry.at,
            %changes,
            "booking audit entry"
        );
        Ok(())
    }
}
