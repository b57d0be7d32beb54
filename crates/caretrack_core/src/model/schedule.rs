//! Schedule domain model.
//!
//! # Responsibility
//! - Define the planned caregiver-to-client appointment window.
//! - Define the enriched read model returned by schedule queries.
//!
//! # Invariants
//! - `end_time > start_time`, enforced at creation only.
//! - `status` is changed by the lifecycle engine, never by callers directly.

use crate::model::client::Client;
use crate::model::task::Task;
use crate::model::validation::{require_positive_id, ValidationError};
use crate::model::visit::Visit;
use crate::model::{CaregiverId, ClientId, ScheduleId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Nominal state of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Planned, no visit in progress.
    Scheduled,
    /// Visit started and not yet ended.
    InProgress,
    /// Visit ended.
    Completed,
    /// Window elapsed without a visit start.
    Missed,
}

impl ScheduleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Missed => "missed",
        }
    }
}

impl Display for ScheduleStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "scheduled" => Ok(Self::Scheduled),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "missed" => Ok(Self::Missed),
            other => Err(ValidationError::UnknownStatus {
                kind: "schedule",
                value: other.to_string(),
            }),
        }
    }
}

/// Persisted caregiver-to-client appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub client_id: ClientId,
    pub caregiver_id: CaregiverId,
    pub service_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ScheduleStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request model for scheduling a new appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSchedule {
    pub client_id: ClientId,
    pub caregiver_id: CaregiverId,
    pub service_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub notes: String,
}

impl NewSchedule {
    /// Validates references and the appointment window.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_positive_id("client_id", self.client_id)?;
        require_positive_id("caregiver_id", self.caregiver_id)?;
        if self.end_time <= self.start_time {
            return Err(ValidationError::EndNotAfterStart);
        }
        Ok(())
    }
}

/// Schedule enriched with its client, visit and checklist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleDetails {
    #[serde(flatten)]
    pub schedule: Schedule,
    pub client: Option<Client>,
    pub visit: Option<Visit>,
    pub tasks: Vec<Task>,
}

/// Per-caregiver dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStats {
    /// Every schedule of the caregiver.
    pub total: u32,
    /// Schedules persisted as `missed`.
    pub missed: u32,
    /// Schedules persisted as `scheduled` that start today.
    pub upcoming: u32,
    /// Schedules persisted as `completed` that start today.
    pub completed: u32,
}
