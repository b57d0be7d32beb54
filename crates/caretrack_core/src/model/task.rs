//! Checklist task model.
//!
//! # Invariants
//! - `reason` is present iff `status == NotCompleted`.
//! - `completed_at` is present iff `status == Completed`.
//! - `pending` is only an initial state; updates target the other two.

use crate::model::validation::{require_positive_id, require_text, ValidationError};
use crate::model::{ScheduleId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
    NotCompleted,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::NotCompleted => "not_completed",
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "not_completed" => Ok(Self::NotCompleted),
            other => Err(ValidationError::UnknownStatus {
                kind: "task",
                value: other.to_string(),
            }),
        }
    }
}

/// Care activity expected during a visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub schedule_id: ScheduleId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request model for adding a checklist item to a schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub schedule_id: ScheduleId,
    pub title: String,
    pub description: String,
}

impl NewTask {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive_id("schedule_id", self.schedule_id)?;
        require_text("title", &self.title)
    }
}

/// Validated task status update.
///
/// Construction enforces the target-status and reason rules, so a value of
/// this type can be written without further checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatusChange {
    status: TaskStatus,
    reason: Option<String>,
}

impl TaskStatusChange {
    /// Builds an update towards `completed` or `not_completed`.
    ///
    /// The reason is trimmed and kept only for `not_completed`, where it is
    /// mandatory.
    pub fn new(status: TaskStatus, reason: Option<&str>) -> Result<Self, ValidationError> {
        let reason = reason.map(str::trim).filter(|value| !value.is_empty());
        match status {
            TaskStatus::Pending => Err(ValidationError::StatusNotAllowed {
                kind: "task",
                value: status.as_str().to_string(),
            }),
            TaskStatus::Completed => Ok(Self {
                status,
                reason: None,
            }),
            TaskStatus::NotCompleted => {
                let reason = reason.ok_or(ValidationError::ReasonRequired)?;
                Ok(Self {
                    status,
                    reason: Some(reason.to_string()),
                })
            }
        }
    }

    /// Parses the status from its wire string before applying [`Self::new`].
    pub fn parse(status: &str, reason: Option<&str>) -> Result<Self, ValidationError> {
        Self::new(status.trim().parse()?, reason)
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Completion stamp to persist alongside this change.
    pub fn completed_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        (self.status == TaskStatus::Completed).then_some(now)
    }
}
