use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::super::domain::{JobId, JobStatus, Role, UserId};
use super::super::repository::{AcceptError, RepositoryError};

pub(crate) const FILL_ALL_FIELDS: &str = "You must fill in all fields";
pub(crate) const MAKE_A_CHOICE: &str = "You must make a choice here";

/// Field-level rejection of booking input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn missing(field: &str) -> Self {
        Self::new(field, FILL_ALL_FIELDS)
    }
}

/// Record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Job(JobId),
    User(UserId),
    Requester(UserId),
    Translator(UserId),
    ActiveAssignment(JobId),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Job(id) => write!(f, "job {id}"),
            Missing::User(id) => write!(f, "user {id}"),
            Missing::Requester(id) => write!(f, "requester profile for user {id}"),
            Missing::Translator(id) => write!(f, "translator profile for user {id}"),
            Missing::ActiveAssignment(id) => write!(f, "active assignment on job {id}"),
        }
    }
}

/// A status handler refused the requested target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot move job from {from} to {to}: {reason}")]
pub struct TransitionRejected {
    pub from: JobStatus,
    pub to: JobStatus,
    pub reason: String,
}

impl TransitionRejected {
    pub(crate) fn new(from: JobStatus, to: JobStatus, reason: impl Into<String>) -> Self {
        Self {
            from,
            to,
            reason: reason.into(),
        }
    }
}

/// Error raised by the booking lifecycle engine.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{} accounts cannot perform this operation", .role.label())]
    Forbidden { role: Role },
    #[error("You already have a booking at {due}. You did not get this booking")]
    AlreadyBooked { due: NaiveDateTime },
    #[error("job {job_id} has already been accepted by another translator")]
    AlreadyTaken { job_id: JobId },
    #[error("{message}")]
    TooLateToCancel { message: String },
    #[error("{0} not found")]
    NotFound(Missing),
    #[error(transparent)]
    TransitionRejected(#[from] TransitionRejected),
    #[error("{operation} is not allowed while the job is {status}")]
    InvalidState {
        operation: &'static str,
        status: JobStatus,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl BookingError {
    /// Input field the error refers to, when there is one.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            BookingError::Validation(error) => Some(error.field.as_str()),
            _ => None,
        }
    }
}

impl From<AcceptError> for BookingError {
    fn from(value: AcceptError) -> Self {
        match value {
            AcceptError::AlreadyBooked { due } => BookingError::AlreadyBooked { due },
            AcceptError::AlreadyTaken { job_id } => BookingError::AlreadyTaken { job_id },
            AcceptError::Repository(error) => BookingError::Repository(error),
        }
    }
}
