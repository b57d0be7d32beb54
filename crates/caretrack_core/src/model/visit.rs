//! Visit domain model.
//!
//! # Responsibility
//! - Record the real-world start/end of a caregiver's presence for a schedule.
//! - Provide the state helpers used by the lifecycle engine.
//!
//! # Invariants
//! - `in_progress` implies start time and start location are set.
//! - `completed` implies start/end time and both locations are set and
//!   `end_time >= start_time`.
//! - Coordinates always lie within latitude `[-90, 90]` and longitude
//!   `[-180, 180]`; `GeoPoint` cannot be built otherwise.

use crate::model::validation::ValidationError;
use crate::model::{ScheduleId, VisitId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Observed progress of a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl VisitStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl Display for VisitStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(ValidationError::UnknownStatus {
                kind: "visit",
                value: other.to_string(),
            }),
        }
    }
}

/// Validated WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Builds a coordinate pair, rejecting out-of-range values.
    ///
    /// Boundaries are inclusive; values are never clamped.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Factual record of a caregiver's presence for one schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visit {
    /// `None` until storage assigns an id.
    pub id: Option<VisitId>,
    pub schedule_id: ScheduleId,
    pub start_time: Option<DateTime<Utc>>,
    pub start_location: Option<GeoPoint>,
    pub end_time: Option<DateTime<Utc>>,
    pub end_location: Option<GeoPoint>,
    pub status: VisitStatus,
    pub notes: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Visit {
    /// Creates an unsaved, not-started visit for a schedule.
    pub fn new(schedule_id: ScheduleId) -> Self {
        Self {
            id: None,
            schedule_id,
            start_time: None,
            start_location: None,
            end_time: None,
            end_location: None,
            status: VisitStatus::NotStarted,
            notes: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Whether a start event has been recorded.
    pub fn has_started(&self) -> bool {
        self.start_time.is_some()
    }

    /// Records the start event and moves the visit to `in_progress`.
    pub fn begin(&mut self, at: DateTime<Utc>, location: GeoPoint) {
        self.start_time = Some(at);
        self.start_location = Some(location);
        self.status = VisitStatus::InProgress;
    }

    /// Records the end event and moves the visit to `completed`.
    ///
    /// Notes are only replaced when non-blank notes are supplied.
    pub fn finish(&mut self, at: DateTime<Utc>, location: GeoPoint, notes: Option<&str>) {
        self.end_time = Some(at);
        self.end_location = Some(location);
        self.status = VisitStatus::Completed;
        if let Some(notes) = notes.filter(|value| !value.trim().is_empty()) {
            self.notes = notes.to_string();
        }
    }

    /// Returns the visit to `not_started`, clearing every recorded event.
    pub fn reset(&mut self) {
        self.start_time = None;
        self.start_location = None;
        self.end_time = None;
        self.end_location = None;
        self.status = VisitStatus::NotStarted;
        self.notes.clear();
    }

    /// Checks status/field consistency before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schedule_id <= 0 {
            return Err(ValidationError::InvalidId {
                field: "schedule_id",
                value: self.schedule_id,
            });
        }

        match self.status {
            VisitStatus::NotStarted => {}
            VisitStatus::InProgress => {
                self.require(self.start_time.is_some(), "start_time")?;
                self.require(self.start_location.is_some(), "start location")?;
            }
            VisitStatus::Completed => {
                self.require(self.start_time.is_some(), "start_time")?;
                self.require(self.end_time.is_some(), "end_time")?;
                self.require(self.start_location.is_some(), "start location")?;
                self.require(self.end_location.is_some(), "end location")?;
                if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
                    if end < start {
                        return Err(ValidationError::VisitEndsBeforeStart);
                    }
                }
            }
        }

        Ok(())
    }

    fn require(&self, present: bool, field: &'static str) -> Result<(), ValidationError> {
        if present {
            return Ok(());
        }
        Err(ValidationError::MissingVisitField {
            status: self.status,
            field,
        })
    }
}
