//! Core domain logic for caretrack, a caregiver visit tracker.
//! This crate is the single source of truth for visit lifecycle invariants.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, DayRange, FixedClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::client::{Client, ClientPatch, NewClient};
pub use model::schedule::{NewSchedule, Schedule, ScheduleDetails, ScheduleStats, ScheduleStatus};
pub use model::task::{NewTask, Task, TaskStatus, TaskStatusChange};
pub use model::validation::ValidationError;
pub use model::visit::{GeoPoint, Visit, VisitStatus};
pub use repo::client_repo::{ClientListQuery, ClientRepository};
pub use repo::schedule_repo::{ScheduleListQuery, ScheduleRepository};
pub use repo::task_repo::TaskRepository;
pub use repo::visit_repo::VisitRepository;
pub use repo::{Entity, RepoError, RepoResult, SqliteStore};
pub use service::client_service::ClientService;
pub use service::error::{ErrorKind, ServiceError, ServiceResult};
pub use service::lifecycle::{LifecycleConfig, VisitLifecycle, VisitTransition};
pub use service::retry::RetryPolicy;
pub use service::schedule_service::{ScheduleFilter, ScheduleService};
pub use service::status::derive_display_status;
pub use service::task_service::TaskService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
