//! Visit lifecycle engine.
//!
//! # Responsibility
//! - Apply the start/end/cancel transitions over a schedule and its visit.
//! - Route every status write through the busy/locked retry policy.
//!
//! # Invariants
//! - Start is rejected before `schedule.start_time - early_start_grace`;
//!   the boundary instant itself is accepted.
//! - End requires a visit with a recorded start time.
//! - Cancel is only allowed from `scheduled` or `in_progress` and always
//!   leaves the schedule `scheduled`.
//! - Each transition is a read-then-write sequence without locking;
//!   concurrent callers on one schedule are last-writer-wins.

use crate::clock::Clock;
use crate::model::schedule::{Schedule, ScheduleStatus};
use crate::model::visit::{GeoPoint, Visit};
use crate::model::ScheduleId;
use crate::repo::schedule_repo::ScheduleRepository;
use crate::repo::visit_repo::VisitRepository;
use crate::repo::Entity;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::retry::RetryPolicy;
use chrono::Duration;
use log::{info, warn};
use serde::Serialize;
use std::time::Instant;

const DEFAULT_EARLY_START_GRACE_MINUTES: i64 = 30;

/// Engine configuration, passed in at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// How long before the scheduled start a visit may begin.
    pub early_start_grace: Duration,
    pub retry: RetryPolicy,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            early_start_grace: Duration::minutes(DEFAULT_EARLY_START_GRACE_MINUTES),
            retry: RetryPolicy::default(),
        }
    }
}

/// State of a schedule and its visit after a successful transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitTransition {
    pub schedule: Schedule,
    /// `None` only after cancelling a schedule that never had a visit.
    pub visit: Option<Visit>,
}

/// Lifecycle engine over a persistence gateway and a clock.
pub struct VisitLifecycle<R, C>
where
    R: ScheduleRepository + VisitRepository,
    C: Clock,
{
    repo: R,
    clock: C,
    config: LifecycleConfig,
}

impl<R, C> VisitLifecycle<R, C>
where
    R: ScheduleRepository + VisitRepository,
    C: Clock,
{
    pub fn new(repo: R, clock: C, config: LifecycleConfig) -> Self {
        Self {
            repo,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Starts (or restarts) the visit of a schedule at the current instant.
    ///
    /// # Errors
    /// - `NotFound` when the schedule does not exist.
    /// - `TooEarly` when now is before the early-start window.
    pub fn start_visit(
        &self,
        schedule_id: ScheduleId,
        location: GeoPoint,
    ) -> ServiceResult<VisitTransition> {
        self.observe("visit_start", schedule_id, || {
            let mut schedule = self.load_schedule(schedule_id)?;
            let now = self.clock.now();
            // No lower bound when the window reaches past the calendar minimum.
            if let Some(earliest_start) = schedule
                .start_time
                .checked_sub_signed(self.config.early_start_grace)
            {
                if now < earliest_start {
                    return Err(ServiceError::TooEarly {
                        schedule_id,
                        earliest_start,
                    });
                }
            }

            match self.repo.get_visit_by_schedule(schedule_id)? {
                Some(mut visit) => {
                    visit.begin(now, location);
                    self.config
                        .retry
                        .run("update_visit", || self.repo.update_visit(&visit))?;
                }
                None => {
                    let mut visit = Visit::new(schedule_id);
                    visit.begin(now, location);
                    self.config
                        .retry
                        .run("create_visit", || self.repo.create_visit(&visit))?;
                }
            }

            schedule.status = ScheduleStatus::InProgress;
            self.write_schedule(&schedule)?;
            self.read_back(schedule_id)
        })
    }

    /// Ends a started visit at the current instant.
    ///
    /// Blank notes keep the existing notes.
    ///
    /// # Errors
    /// - `NotFound` when the schedule does not exist.
    /// - `NotStarted` when no visit exists or it has no start time.
    /// - `Validation` (`VisitEndsBeforeStart`) when the clock reads earlier
    ///   than the recorded start, e.g. after a wall-clock step backwards.
    pub fn end_visit(
        &self,
        schedule_id: ScheduleId,
        location: GeoPoint,
        notes: Option<&str>,
    ) -> ServiceResult<VisitTransition> {
        self.observe("visit_end", schedule_id, || {
            let mut schedule = self.load_schedule(schedule_id)?;
            let mut visit = self
                .repo
                .get_visit_by_schedule(schedule_id)?
                .filter(Visit::has_started)
                .ok_or(ServiceError::NotStarted { schedule_id })?;

            visit.finish(self.clock.now(), location, notes);
            self.config
                .retry
                .run("update_visit", || self.repo.update_visit(&visit))?;

            schedule.status = ScheduleStatus::Completed;
            self.write_schedule(&schedule)?;
            self.read_back(schedule_id)
        })
    }

    /// Returns a live schedule to `scheduled`.
    ///
    /// From `in_progress` the visit (if any) is reset to `not_started`.
    /// From `scheduled` nothing but the schedule row is written.
    ///
    /// # Errors
    /// - `NotFound` when the schedule does not exist.
    /// - `InvalidTransition` from `completed` or `missed`.
    pub fn cancel_visit(&self, schedule_id: ScheduleId) -> ServiceResult<VisitTransition> {
        self.observe("visit_cancel", schedule_id, || {
            let mut schedule = self.load_schedule(schedule_id)?;
            match schedule.status {
                ScheduleStatus::Scheduled => {}
                ScheduleStatus::InProgress => {
                    if let Some(mut visit) = self.repo.get_visit_by_schedule(schedule_id)? {
                        visit.reset();
                        self.config
                            .retry
                            .run("update_visit", || self.repo.update_visit(&visit))?;
                    }
                }
                from @ (ScheduleStatus::Completed | ScheduleStatus::Missed) => {
                    return Err(ServiceError::InvalidTransition {
                        schedule_id,
                        from: from.as_str(),
                        operation: "cancel",
                    });
                }
            }

            schedule.status = ScheduleStatus::Scheduled;
            self.write_schedule(&schedule)?;
            self.read_back(schedule_id)
        })
    }

    /// Visit recorded for a schedule, if any.
    ///
    /// # Errors
    /// - `NotFound` when the schedule does not exist.
    pub fn get_visit(&self, schedule_id: ScheduleId) -> ServiceResult<Option<Visit>> {
        self.load_schedule(schedule_id)?;
        Ok(self.repo.get_visit_by_schedule(schedule_id)?)
    }

    fn load_schedule(&self, schedule_id: ScheduleId) -> ServiceResult<Schedule> {
        self.repo
            .get_schedule(schedule_id)?
            .ok_or_else(|| ServiceError::not_found(Entity::Schedule, schedule_id))
    }

    fn write_schedule(&self, schedule: &Schedule) -> ServiceResult<()> {
        self.config
            .retry
            .run("update_schedule", || self.repo.update_schedule(schedule))?;
        Ok(())
    }

    fn read_back(&self, schedule_id: ScheduleId) -> ServiceResult<VisitTransition> {
        let schedule = self.load_schedule(schedule_id)?;
        let visit = self.repo.get_visit_by_schedule(schedule_id)?;
        Ok(VisitTransition { schedule, visit })
    }

    fn observe<F>(
        &self,
        event: &'static str,
        schedule_id: ScheduleId,
        transition: F,
    ) -> ServiceResult<VisitTransition>
    where
        F: FnOnce() -> ServiceResult<VisitTransition>,
    {
        let started_at = Instant::now();
        info!("event={event} module=lifecycle status=start schedule_id={schedule_id}");

        let result = transition();
        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(outcome) => info!(
                "event={event} module=lifecycle status=ok schedule_id={schedule_id} schedule_status={} visit_status={} duration_ms={duration_ms}",
                outcome.schedule.status,
                outcome
                    .visit
                    .as_ref()
                    .map_or("none", |visit| visit.status.as_str()),
            ),
            Err(err) => warn!(
                "event={event} module=lifecycle status=error schedule_id={schedule_id} error_code={} duration_ms={duration_ms}",
                err.kind().as_str(),
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::{LifecycleConfig, VisitLifecycle};
    use crate::clock::{DayRange, FixedClock};
    use crate::db::DbError;
    use crate::model::schedule::{NewSchedule, Schedule, ScheduleStats, ScheduleStatus};
    use crate::model::visit::{GeoPoint, Visit, VisitStatus};
    use crate::model::{CaregiverId, ScheduleId, VisitId};
    use crate::repo::schedule_repo::{ScheduleListQuery, ScheduleRepository};
    use crate::repo::visit_repo::VisitRepository;
    use crate::repo::{Entity, RepoError, RepoResult};
    use crate::service::error::ErrorKind;
    use crate::service::retry::RetryPolicy;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rusqlite::ffi;
    use std::cell::{Cell, RefCell};

    /// In-memory gateway that can fail a number of visit writes as busy.
    struct FakeGateway {
        schedule: RefCell<Schedule>,
        visit: RefCell<Option<Visit>>,
        busy_visit_writes: Cell<u32>,
        visit_writes: Cell<u32>,
    }

    impl FakeGateway {
        fn new(schedule: Schedule) -> Self {
            Self {
                schedule: RefCell::new(schedule),
                visit: RefCell::new(None),
                busy_visit_writes: Cell::new(0),
                visit_writes: Cell::new(0),
            }
        }

        fn take_busy(&self) -> RepoResult<()> {
            self.visit_writes.set(self.visit_writes.get() + 1);
            let remaining = self.busy_visit_writes.get();
            if remaining == 0 {
                return Ok(());
            }
            self.busy_visit_writes.set(remaining - 1);
            Err(RepoError::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(
                ffi::Error::new(ffi::SQLITE_BUSY),
                None,
            ))))
        }
    }

    impl ScheduleRepository for FakeGateway {
        fn create_schedule(&self, _schedule: &NewSchedule) -> RepoResult<Schedule> {
            unimplemented!("not used by the engine")
        }

        fn get_schedule(&self, id: ScheduleId) -> RepoResult<Option<Schedule>> {
            let schedule = self.schedule.borrow();
            Ok((schedule.id == id).then(|| schedule.clone()))
        }

        fn update_schedule(&self, schedule: &Schedule) -> RepoResult<()> {
            *self.schedule.borrow_mut() = schedule.clone();
            Ok(())
        }

        fn list_schedules(&self, _query: &ScheduleListQuery) -> RepoResult<Vec<Schedule>> {
            Ok(vec![self.schedule.borrow().clone()])
        }

        fn schedule_stats(
            &self,
            _caregiver_id: CaregiverId,
            _today: DayRange,
        ) -> RepoResult<ScheduleStats> {
            Ok(ScheduleStats::default())
        }
    }

    impl VisitRepository for FakeGateway {
        fn get_visit_by_schedule(&self, schedule_id: ScheduleId) -> RepoResult<Option<Visit>> {
            Ok(self
                .visit
                .borrow()
                .clone()
                .filter(|visit| visit.schedule_id == schedule_id))
        }

        fn create_visit(&self, visit: &Visit) -> RepoResult<VisitId> {
            self.take_busy()?;
            let mut stored = visit.clone();
            stored.id = Some(1);
            *self.visit.borrow_mut() = Some(stored);
            Ok(1)
        }

        fn update_visit(&self, visit: &Visit) -> RepoResult<()> {
            self.take_busy()?;
            if self.visit.borrow().is_none() {
                return Err(RepoError::NotFound {
                    entity: Entity::Visit,
                    id: visit.id.unwrap_or_default(),
                });
            }
            *self.visit.borrow_mut() = Some(visit.clone());
            Ok(())
        }
    }

    fn scheduled_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 20, 14, 0, 0).unwrap()
    }

    fn schedule() -> Schedule {
        let start = scheduled_start();
        Schedule {
            id: 1,
            client_id: 1,
            caregiver_id: 1,
            service_name: "Medication Reminder".to_string(),
            start_time: start,
            end_time: start + Duration::hours(2),
            status: ScheduleStatus::Scheduled,
            notes: String::new(),
            created_at: start - Duration::days(2),
            updated_at: start - Duration::days(2),
        }
    }

    fn config(max_retries: u32) -> LifecycleConfig {
        LifecycleConfig {
            retry: RetryPolicy {
                max_retries,
                backoff_step: std::time::Duration::ZERO,
            },
            ..LifecycleConfig::default()
        }
    }

    fn point() -> GeoPoint {
        GeoPoint::new(40.7128, -74.0060).unwrap()
    }

    #[test]
    fn default_grace_is_thirty_minutes() {
        assert_eq!(
            LifecycleConfig::default().early_start_grace,
            Duration::minutes(30)
        );
    }

    #[test]
    fn start_retries_busy_visit_write() {
        let gateway = FakeGateway::new(schedule());
        gateway.busy_visit_writes.set(2);
        let clock = FixedClock::new(scheduled_start());
        let engine = VisitLifecycle::new(&gateway, &clock, config(3));

        let outcome = engine.start_visit(1, point()).unwrap();
        assert_eq!(outcome.schedule.status, ScheduleStatus::InProgress);
        assert_eq!(gateway.visit_writes.get(), 3);
    }

    #[test]
    fn exhausted_retries_surface_storage_failure() {
        let gateway = FakeGateway::new(schedule());
        gateway.busy_visit_writes.set(10);
        let clock = FixedClock::new(scheduled_start());
        let engine = VisitLifecycle::new(&gateway, &clock, config(3));

        let err = engine.start_visit(1, point()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageFailure);
        assert_eq!(gateway.visit_writes.get(), 4);
        assert_eq!(gateway.schedule.borrow().status, ScheduleStatus::Scheduled);
    }

    #[test]
    fn cancel_in_progress_without_visit_still_reschedules() {
        let mut in_progress = schedule();
        in_progress.status = ScheduleStatus::InProgress;
        let gateway = FakeGateway::new(in_progress);
        let clock = FixedClock::new(scheduled_start());
        let engine = VisitLifecycle::new(&gateway, &clock, config(0));

        let outcome = engine.cancel_visit(1).unwrap();
        assert_eq!(outcome.schedule.status, ScheduleStatus::Scheduled);
        assert!(outcome.visit.is_none());
        assert_eq!(gateway.visit_writes.get(), 0);
    }

    #[test]
    fn restart_after_end_keeps_end_fields() {
        let gateway = FakeGateway::new(schedule());
        let clock = FixedClock::new(scheduled_start());
        let engine = VisitLifecycle::new(&gateway, &clock, config(0));

        engine.start_visit(1, point()).unwrap();
        clock.advance(Duration::minutes(50));
        engine.end_visit(1, point(), Some("done")).unwrap();
        clock.advance(Duration::minutes(5));
        let outcome = engine.start_visit(1, point()).unwrap();

        let visit = outcome.visit.unwrap();
        assert_eq!(visit.status, VisitStatus::InProgress);
        assert_eq!(visit.start_time, Some(scheduled_start() + Duration::minutes(55)));
        assert!(visit.end_time.is_some());
        assert_eq!(visit.notes, "done");
    }
}
