//! Task checklist service.
//!
//! # Invariants
//! - Tasks are only created for existing schedules and start `pending`.
//! - Status updates target `completed` or `not_completed` only; the
//!   completion stamp is set from the injected clock iff `completed`.
//! - Back-and-forth updates between the two targets are allowed.

use crate::clock::Clock;
use crate::model::task::{NewTask, Task, TaskStatusChange};
use crate::model::{ScheduleId, TaskId};
use crate::repo::schedule_repo::ScheduleRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::Entity;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::retry::RetryPolicy;
use log::info;

pub struct TaskService<R, C>
where
    R: ScheduleRepository + TaskRepository,
    C: Clock,
{
    repo: R,
    clock: C,
    retry: RetryPolicy,
}

impl<R, C> TaskService<R, C>
where
    R: ScheduleRepository + TaskRepository,
    C: Clock,
{
    pub fn new(repo: R, clock: C, retry: RetryPolicy) -> Self {
        Self { repo, clock, retry }
    }

    pub fn create_task(&self, request: &NewTask) -> ServiceResult<Task> {
        request.validate()?;
        self.require_schedule(request.schedule_id)?;
        let task = self.repo.create_task(request)?;
        info!(
            "event=task_create module=task status=ok task_id={} schedule_id={}",
            task.id, task.schedule_id
        );
        Ok(task)
    }

    pub fn list_tasks(&self, schedule_id: ScheduleId) -> ServiceResult<Vec<Task>> {
        self.require_schedule(schedule_id)?;
        Ok(self.repo.list_tasks_for_schedule(schedule_id)?)
    }

    pub fn get_task(&self, id: TaskId) -> ServiceResult<Task> {
        self.repo
            .get_task(id)?
            .ok_or_else(|| ServiceError::not_found(Entity::Task, id))
    }

    pub fn delete_task(&self, id: TaskId) -> ServiceResult<()> {
        self.repo.delete_task(id)?;
        info!("event=task_delete module=task status=ok task_id={id}");
        Ok(())
    }

    /// Applies a validated status change and returns the stored task.
    ///
    /// # Errors
    /// - `NotFound` when the task does not exist.
    /// - `StorageFailure` when the write stays busy past the retry budget.
    pub fn update_status(&self, id: TaskId, change: &TaskStatusChange) -> ServiceResult<Task> {
        let completed_at = change.completed_at(self.clock.now());
        self.retry.run("update_task_status", || {
            self.repo
                .update_task_status(id, change.status(), change.reason(), completed_at)
        })?;
        info!(
            "event=task_status module=task status=ok task_id={id} task_status={}",
            change.status()
        );
        self.get_task(id)
    }

    fn require_schedule(&self, schedule_id: ScheduleId) -> ServiceResult<()> {
        match self.repo.get_schedule(schedule_id)? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found(Entity::Schedule, schedule_id)),
        }
    }
}
