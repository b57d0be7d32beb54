//! Domain model for caregiver visit tracking.
//!
//! # Responsibility
//! - Define the records shared by repositories, services and the CLI.
//! - Own record-level invariants (`validate`) and visit state helpers.
//!
//! # Invariants
//! - Identifiers are storage-assigned positive integers.
//! - Status values round-trip through their snake_case string form.

pub mod client;
pub mod schedule;
pub mod task;
pub mod validation;
pub mod visit;

/// Storage id of a client.
pub type ClientId = i64;
/// Storage id of a schedule.
pub type ScheduleId = i64;
/// Storage id of a visit.
pub type VisitId = i64;
/// Storage id of a task.
pub type TaskId = i64;
/// Caregiver reference. Caregivers are not stored by this system.
pub type CaregiverId = i64;
