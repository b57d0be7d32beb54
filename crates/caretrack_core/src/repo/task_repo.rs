//! Task repository contract and SQLite implementation.

use crate::model::task::{NewTask, Task, TaskStatus};
use crate::model::{ScheduleId, TaskId};
use crate::repo::codec::{from_millis, from_optional_millis, parse_enum, to_millis};
use crate::repo::{Entity, RepoError, RepoResult, SqliteStore};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    schedule_id,
    title,
    description,
    status,
    reason,
    completed_at,
    created_at,
    updated_at
FROM tasks";

/// Repository interface for checklist tasks.
pub trait TaskRepository {
    fn create_task(&self, task: &NewTask) -> RepoResult<Task>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Tasks of one schedule in creation order.
    fn list_tasks_for_schedule(&self, schedule_id: ScheduleId) -> RepoResult<Vec<Task>>;
    /// Overwrites status, reason and completion stamp in one statement.
    fn update_task_status(
        &self,
        id: TaskId,
        status: TaskStatus,
        reason: Option<&str>,
        completed_at: Option<DateTime<Utc>>,
    ) -> RepoResult<()>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
}

impl<R: TaskRepository + ?Sized> TaskRepository for &R {
    fn create_task(&self, task: &NewTask) -> RepoResult<Task> {
        (**self).create_task(task)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        (**self).get_task(id)
    }

    fn list_tasks_for_schedule(&self, schedule_id: ScheduleId) -> RepoResult<Vec<Task>> {
        (**self).list_tasks_for_schedule(schedule_id)
    }

    fn update_task_status(
        &self,
        id: TaskId,
        status: TaskStatus,
        reason: Option<&str>,
        completed_at: Option<DateTime<Utc>>,
    ) -> RepoResult<()> {
        (**self).update_task_status(id, status, reason, completed_at)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        (**self).delete_task(id)
    }
}

impl TaskRepository for SqliteStore<'_> {
    fn create_task(&self, task: &NewTask) -> RepoResult<Task> {
        task.validate()?;

        self.conn().execute(
            "INSERT INTO tasks (schedule_id, title, description, status)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                task.schedule_id,
                task.title.trim(),
                task.description.as_str(),
                TaskStatus::Pending.as_str(),
            ],
        )?;

        let id = self.conn().last_insert_rowid();
        load_task(self.conn(), id)?.ok_or(RepoError::NotFound {
            entity: Entity::Task,
            id,
        })
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        load_task(self.conn(), id)
    }

    fn list_tasks_for_schedule(&self, schedule_id: ScheduleId) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn().prepare(&format!(
            "{TASK_SELECT_SQL} WHERE schedule_id = ?1 ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([schedule_id])?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn update_task_status(
        &self,
        id: TaskId,
        status: TaskStatus,
        reason: Option<&str>,
        completed_at: Option<DateTime<Utc>>,
    ) -> RepoResult<()> {
        let changed = self.conn().execute(
            "UPDATE tasks
             SET
                status = ?1,
                reason = ?2,
                completed_at = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?4;",
            params![status.as_str(), reason, completed_at.map(to_millis), id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Task,
                id,
            });
        }

        Ok(())
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn()
            .execute("DELETE FROM tasks WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Task,
                id,
            });
        }

        Ok(())
    }
}

fn load_task(conn: &Connection, id: TaskId) -> RepoResult<Option<Task>> {
    let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_task_row(row)?));
    }
    Ok(None)
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let status_text: String = row.get("status")?;
    Ok(Task {
        id: row.get("id")?,
        schedule_id: row.get("schedule_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: parse_enum(&status_text, "tasks.status")?,
        reason: row.get("reason")?,
        completed_at: from_optional_millis(row.get("completed_at")?, "tasks.completed_at")?,
        created_at: from_millis(row.get("created_at")?, "tasks.created_at")?,
        updated_at: from_millis(row.get("updated_at")?, "tasks.updated_at")?,
    })
}
