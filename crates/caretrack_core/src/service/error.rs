//! Error taxonomy shared by the lifecycle engine and the query services.

use crate::model::validation::ValidationError;
use crate::repo::{Entity, RepoError};
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Stable error classification exposed to outer surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    TooEarly,
    NotStarted,
    InvalidTransition,
    Validation,
    Conflict,
    StorageFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::TooEarly => "too_early",
            Self::NotStarted => "not_started",
            Self::InvalidTransition => "invalid_transition",
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::StorageFailure => "storage_failure",
        }
    }
}

/// Service-level failure.
#[derive(Debug)]
pub enum ServiceError {
    NotFound { entity: Entity, id: i64 },
    /// Start attempted before the early-start grace window opened.
    TooEarly {
        schedule_id: i64,
        earliest_start: DateTime<Utc>,
    },
    /// End attempted without a recorded start.
    NotStarted { schedule_id: i64 },
    /// Cancel attempted from a terminal schedule status.
    InvalidTransition {
        schedule_id: i64,
        from: &'static str,
        operation: &'static str,
    },
    Validation(ValidationError),
    Conflict(String),
    /// Non-retryable or retry-exhausted persistence failure.
    StorageFailure(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::TooEarly { .. } => ErrorKind::TooEarly,
            Self::NotStarted { .. } => ErrorKind::NotStarted,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::StorageFailure(_) => ErrorKind::StorageFailure,
        }
    }

    pub(crate) fn not_found(entity: Entity, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::TooEarly {
                schedule_id,
                earliest_start,
            } => write!(
                f,
                "schedule {schedule_id} cannot be started before {}",
                earliest_start.to_rfc3339()
            ),
            Self::NotStarted { schedule_id } => {
                write!(f, "visit for schedule {schedule_id} has not been started")
            }
            Self::InvalidTransition {
                schedule_id,
                from,
                operation,
            } => write!(
                f,
                "cannot {operation} schedule {schedule_id} from status `{from}`"
            ),
            Self::Validation(err) => write!(f, "validation failed: {err}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::StorageFailure(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::StorageFailure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::Conflict(message) => Self::Conflict(message),
            other => Self::StorageFailure(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}
