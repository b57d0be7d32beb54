//! Input validation failures shared by model constructors and services.

use crate::model::visit::VisitStatus;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reasons a record or request is rejected before any storage mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required text field is empty after trimming.
    BlankField(&'static str),
    /// Reference id must be positive.
    InvalidId { field: &'static str, value: i64 },
    /// Latitude outside `[-90, 90]` (or not a number).
    LatitudeOutOfRange(f64),
    /// Longitude outside `[-180, 180]` (or not a number).
    LongitudeOutOfRange(f64),
    /// Schedule window does not end after it starts.
    EndNotAfterStart,
    /// Visit ends before it starts.
    VisitEndsBeforeStart,
    /// Visit status requires a field that is absent.
    MissingVisitField {
        status: VisitStatus,
        field: &'static str,
    },
    /// Status string does not name a known value.
    UnknownStatus { kind: &'static str, value: String },
    /// Status is known but cannot be targeted by this operation.
    StatusNotAllowed { kind: &'static str, value: String },
    /// `not_completed` task updates must carry a reason.
    ReasonRequired,
    /// Email is present but malformed.
    InvalidEmail(String),
    /// Calendar date string is not `YYYY-MM-DD`.
    InvalidDate(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} is required"),
            Self::InvalidId { field, value } => {
                write!(f, "{field} must be a positive id, got {value}")
            }
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude must be between -90 and 90, got {value}")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude must be between -180 and 180, got {value}")
            }
            Self::EndNotAfterStart => write!(f, "end_time must be after start_time"),
            Self::VisitEndsBeforeStart => write!(f, "end_time cannot be before start_time"),
            Self::MissingVisitField { status, field } => {
                write!(f, "{field} is required when status is {status}")
            }
            Self::UnknownStatus { kind, value } => write!(f, "invalid {kind} status: `{value}`"),
            Self::StatusNotAllowed { kind, value } => {
                write!(f, "{kind} status `{value}` is not allowed here")
            }
            Self::ReasonRequired => write!(f, "reason is required when status is not_completed"),
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`, expected YYYY-MM-DD"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_positive_id(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::InvalidId { field, value });
    }
    Ok(())
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}
