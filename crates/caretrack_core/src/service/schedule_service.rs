//! Schedule use-case service.
//!
//! # Responsibility
//! - Create schedules for existing clients.
//! - Serve enriched schedule reads and the caregiver dashboard.
//!
//! # Invariants
//! - `get_schedule` and `list_schedules` return the persisted status.
//! - `today_schedules` replaces the status with the derived display status.
//! - Enrichment failures are returned, never dropped.

use crate::clock::{Clock, DayRange};
use crate::model::schedule::{NewSchedule, Schedule, ScheduleDetails, ScheduleStats, ScheduleStatus};
use crate::model::{CaregiverId, ScheduleId};
use crate::repo::client_repo::ClientRepository;
use crate::repo::schedule_repo::{ScheduleListQuery, ScheduleRepository};
use crate::repo::task_repo::TaskRepository;
use crate::repo::visit_repo::VisitRepository;
use crate::repo::Entity;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::status::derive_display_status;
use chrono::NaiveDate;
use log::{debug, info};

/// Filter for the general schedule list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleFilter {
    pub caregiver_id: Option<CaregiverId>,
    /// Local calendar day the schedule starts on.
    pub date: Option<NaiveDate>,
    pub status: Option<ScheduleStatus>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Schedule query service over the persistence gateway.
pub struct ScheduleService<R, C>
where
    R: ScheduleRepository + VisitRepository + TaskRepository + ClientRepository,
    C: Clock,
{
    repo: R,
    clock: C,
}

impl<R, C> ScheduleService<R, C>
where
    R: ScheduleRepository + VisitRepository + TaskRepository + ClientRepository,
    C: Clock,
{
    pub fn new(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Creates a schedule in `scheduled` status.
    ///
    /// # Errors
    /// - `Validation` for a non-positive caregiver id or an empty window.
    /// - `NotFound` when the client does not exist.
    pub fn create_schedule(&self, request: &NewSchedule) -> ServiceResult<Schedule> {
        request.validate()?;
        if self.repo.get_client(request.client_id)?.is_none() {
            return Err(ServiceError::not_found(Entity::Client, request.client_id));
        }

        let schedule = self.repo.create_schedule(request)?;
        info!(
            "event=schedule_create module=schedule status=ok schedule_id={} caregiver_id={}",
            schedule.id, schedule.caregiver_id
        );
        Ok(schedule)
    }

    /// Enriched schedule with its persisted status.
    pub fn get_schedule(&self, id: ScheduleId) -> ServiceResult<ScheduleDetails> {
        let schedule = self
            .repo
            .get_schedule(id)?
            .ok_or_else(|| ServiceError::not_found(Entity::Schedule, id))?;
        self.enrich(schedule)
    }

    /// Filtered schedules ordered by start time, persisted status verbatim.
    pub fn list_schedules(&self, filter: &ScheduleFilter) -> ServiceResult<Vec<ScheduleDetails>> {
        let query = ScheduleListQuery {
            caregiver_id: filter.caregiver_id,
            starts_within: filter.date.map(DayRange::for_local_date),
            status: filter.status,
            limit: filter.limit,
            offset: filter.offset,
        };
        let schedules = self.repo.list_schedules(&query)?;
        debug!(
            "event=schedule_list module=schedule status=ok count={}",
            schedules.len()
        );
        schedules
            .into_iter()
            .map(|schedule| self.enrich(schedule))
            .collect()
    }

    /// Caregiver's schedules starting today with live display status.
    pub fn today_schedules(&self, caregiver_id: CaregiverId) -> ServiceResult<Vec<ScheduleDetails>> {
        let now = self.clock.now();
        let query = ScheduleListQuery {
            caregiver_id: Some(caregiver_id),
            starts_within: Some(DayRange::containing(now)),
            ..ScheduleListQuery::default()
        };

        let mut details = Vec::new();
        for schedule in self.repo.list_schedules(&query)? {
            let mut enriched = self.enrich(schedule)?;
            enriched.schedule.status =
                derive_display_status(&enriched.schedule, enriched.visit.as_ref(), now);
            details.push(enriched);
        }

        debug!(
            "event=schedule_today module=schedule status=ok caregiver_id={} count={}",
            caregiver_id,
            details.len()
        );
        Ok(details)
    }

    /// Dashboard counters; "today" is the local day of the clock's now.
    pub fn schedule_stats(&self, caregiver_id: CaregiverId) -> ServiceResult<ScheduleStats> {
        let today = DayRange::containing(self.clock.now());
        Ok(self.repo.schedule_stats(caregiver_id, today)?)
    }

    fn enrich(&self, schedule: Schedule) -> ServiceResult<ScheduleDetails> {
        let client = self.repo.get_client(schedule.client_id)?;
        let visit = self.repo.get_visit_by_schedule(schedule.id)?;
        let tasks = self.repo.list_tasks_for_schedule(schedule.id)?;
        Ok(ScheduleDetails {
            schedule,
            client,
            visit,
            tasks,
        })
    }
}
