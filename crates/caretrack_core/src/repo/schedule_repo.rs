//! Schedule repository contract and SQLite implementation.
//!
//! # Invariants
//! - New schedules start as `scheduled`.
//! - Lists are ordered by `start_time ASC, id ASC`.
//! - Stats "today" predicates use the caller-supplied local day range.

use crate::clock::DayRange;
use crate::model::schedule::{NewSchedule, Schedule, ScheduleStats, ScheduleStatus};
use crate::model::{CaregiverId, ScheduleId};
use crate::repo::codec::{from_millis, parse_enum, to_millis};
use crate::repo::{Entity, RepoError, RepoResult, SqliteStore};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const SCHEDULE_SELECT_SQL: &str = "SELECT
    id,
    client_id,
    caregiver_id,
    service_name,
    start_time,
    end_time,
    status,
    notes,
    created_at,
    updated_at
FROM schedules";

/// Query options for listing schedules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleListQuery {
    pub caregiver_id: Option<CaregiverId>,
    /// Keeps schedules whose start time falls inside the range.
    pub starts_within: Option<DayRange>,
    pub status: Option<ScheduleStatus>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for schedule records.
pub trait ScheduleRepository {
    fn create_schedule(&self, schedule: &NewSchedule) -> RepoResult<Schedule>;
    fn get_schedule(&self, id: ScheduleId) -> RepoResult<Option<Schedule>>;
    /// Persists every mutable field, including `status`.
    fn update_schedule(&self, schedule: &Schedule) -> RepoResult<()>;
    fn list_schedules(&self, query: &ScheduleListQuery) -> RepoResult<Vec<Schedule>>;
    fn schedule_stats(&self, caregiver_id: CaregiverId, today: DayRange)
        -> RepoResult<ScheduleStats>;
}

impl<R: ScheduleRepository + ?Sized> ScheduleRepository for &R {
    fn create_schedule(&self, schedule: &NewSchedule) -> RepoResult<Schedule> {
        (**self).create_schedule(schedule)
    }

    fn get_schedule(&self, id: ScheduleId) -> RepoResult<Option<Schedule>> {
        (**self).get_schedule(id)
    }

    fn update_schedule(&self, schedule: &Schedule) -> RepoResult<()> {
        (**self).update_schedule(schedule)
    }

    fn list_schedules(&self, query: &ScheduleListQuery) -> RepoResult<Vec<Schedule>> {
        (**self).list_schedules(query)
    }

    fn schedule_stats(
        &self,
        caregiver_id: CaregiverId,
        today: DayRange,
    ) -> RepoResult<ScheduleStats> {
        (**self).schedule_stats(caregiver_id, today)
    }
}

impl ScheduleRepository for SqliteStore<'_> {
    fn create_schedule(&self, schedule: &NewSchedule) -> RepoResult<Schedule> {
        schedule.validate()?;

        self.conn().execute(
            "INSERT INTO schedules (
                client_id,
                caregiver_id,
                service_name,
                start_time,
                end_time,
                status,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                schedule.client_id,
                schedule.caregiver_id,
                schedule.service_name.as_str(),
                to_millis(schedule.start_time),
                to_millis(schedule.end_time),
                ScheduleStatus::Scheduled.as_str(),
                schedule.notes.as_str(),
            ],
        )?;

        let id = self.conn().last_insert_rowid();
        load_schedule(self.conn(), id)?.ok_or(RepoError::NotFound {
            entity: Entity::Schedule,
            id,
        })
    }

    fn get_schedule(&self, id: ScheduleId) -> RepoResult<Option<Schedule>> {
        load_schedule(self.conn(), id)
    }

    fn update_schedule(&self, schedule: &Schedule) -> RepoResult<()> {
        let changed = self.conn().execute(
            "UPDATE schedules
             SET
                client_id = ?1,
                caregiver_id = ?2,
                service_name = ?3,
                start_time = ?4,
                end_time = ?5,
                status = ?6,
                notes = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?8;",
            params![
                schedule.client_id,
                schedule.caregiver_id,
                schedule.service_name.as_str(),
                to_millis(schedule.start_time),
                to_millis(schedule.end_time),
                schedule.status.as_str(),
                schedule.notes.as_str(),
                schedule.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Schedule,
                id: schedule.id,
            });
        }

        Ok(())
    }

    fn list_schedules(&self, query: &ScheduleListQuery) -> RepoResult<Vec<Schedule>> {
        let mut sql = format!("{SCHEDULE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(caregiver_id) = query.caregiver_id {
            sql.push_str(" AND caregiver_id = ?");
            bind_values.push(Value::Integer(caregiver_id));
        }

        if let Some(range) = query.starts_within {
            sql.push_str(" AND start_time >= ? AND start_time < ?");
            bind_values.push(Value::Integer(to_millis(range.start)));
            bind_values.push(Value::Integer(to_millis(range.end)));
        }

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }

        sql.push_str(" ORDER BY start_time ASC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut schedules = Vec::new();

        while let Some(row) = rows.next()? {
            schedules.push(parse_schedule_row(row)?);
        }

        Ok(schedules)
    }

    fn schedule_stats(
        &self,
        caregiver_id: CaregiverId,
        today: DayRange,
    ) -> RepoResult<ScheduleStats> {
        let stats = self.conn().query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN status = 'missed' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE
                    WHEN status = 'scheduled' AND start_time >= ?2 AND start_time < ?3 THEN 1
                    ELSE 0
                END), 0),
                COALESCE(SUM(CASE
                    WHEN status = 'completed' AND start_time >= ?2 AND start_time < ?3 THEN 1
                    ELSE 0
                END), 0)
             FROM schedules
             WHERE caregiver_id = ?1;",
            params![caregiver_id, to_millis(today.start), to_millis(today.end)],
            |row| {
                Ok(ScheduleStats {
                    total: row.get(0)?,
                    missed: row.get(1)?,
                    upcoming: row.get(2)?,
                    completed: row.get(3)?,
                })
            },
        )?;

        Ok(stats)
    }
}

fn load_schedule(conn: &Connection, id: ScheduleId) -> RepoResult<Option<Schedule>> {
    let mut stmt = conn.prepare(&format!("{SCHEDULE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_schedule_row(row)?));
    }
    Ok(None)
}

fn parse_schedule_row(row: &Row<'_>) -> RepoResult<Schedule> {
    let status_text: String = row.get("status")?;
    Ok(Schedule {
        id: row.get("id")?,
        client_id: row.get("client_id")?,
        caregiver_id: row.get("caregiver_id")?,
        service_name: row.get("service_name")?,
        start_time: from_millis(row.get("start_time")?, "schedules.start_time")?,
        end_time: from_millis(row.get("end_time")?, "schedules.end_time")?,
        status: parse_enum(&status_text, "schedules.status")?,
        notes: row.get("notes")?,
        created_at: from_millis(row.get("created_at")?, "schedules.created_at")?,
        updated_at: from_millis(row.get("updated_at")?, "schedules.updated_at")?,
    })
}
