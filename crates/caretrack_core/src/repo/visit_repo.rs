//! Visit repository contract and SQLite implementation.
//!
//! # Invariants
//! - At most one visit row exists per schedule (`schedule_id UNIQUE`).
//! - Visits are validated before every insert and update.

use crate::model::visit::{GeoPoint, Visit};
use crate::model::{ScheduleId, VisitId};
use crate::repo::codec::{
    from_millis, from_optional_millis, location_from_columns, parse_enum, to_millis,
};
use crate::repo::{Entity, RepoError, RepoResult, SqliteStore};
use rusqlite::{params, Row};

const VISIT_SELECT_SQL: &str = "SELECT
    id,
    schedule_id,
    start_time,
    end_time,
    start_latitude,
    start_longitude,
    end_latitude,
    end_longitude,
    status,
    notes,
    created_at,
    updated_at
FROM visits";

/// Repository interface for visit records.
pub trait VisitRepository {
    fn get_visit_by_schedule(&self, schedule_id: ScheduleId) -> RepoResult<Option<Visit>>;
    /// Inserts a visit and returns the storage-assigned id.
    fn create_visit(&self, visit: &Visit) -> RepoResult<VisitId>;
    /// Updates an already persisted visit, matched by `visit.id`.
    fn update_visit(&self, visit: &Visit) -> RepoResult<()>;
}

impl<R: VisitRepository + ?Sized> VisitRepository for &R {
    fn get_visit_by_schedule(&self, schedule_id: ScheduleId) -> RepoResult<Option<Visit>> {
        (**self).get_visit_by_schedule(schedule_id)
    }

    fn create_visit(&self, visit: &Visit) -> RepoResult<VisitId> {
        (**self).create_visit(visit)
    }

    fn update_visit(&self, visit: &Visit) -> RepoResult<()> {
        (**self).update_visit(visit)
    }
}

impl VisitRepository for SqliteStore<'_> {
    fn get_visit_by_schedule(&self, schedule_id: ScheduleId) -> RepoResult<Option<Visit>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{VISIT_SELECT_SQL} WHERE schedule_id = ?1;"))?;
        let mut rows = stmt.query([schedule_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_visit_row(row)?));
        }
        Ok(None)
    }

    fn create_visit(&self, visit: &Visit) -> RepoResult<VisitId> {
        visit.validate()?;

        let (start_latitude, start_longitude) = location_columns(visit.start_location);
        let (end_latitude, end_longitude) = location_columns(visit.end_location);

        self.conn().execute(
            "INSERT INTO visits (
                schedule_id,
                start_time,
                end_time,
                start_latitude,
                start_longitude,
                end_latitude,
                end_longitude,
                status,
                notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                visit.schedule_id,
                visit.start_time.map(to_millis),
                visit.end_time.map(to_millis),
                start_latitude,
                start_longitude,
                end_latitude,
                end_longitude,
                visit.status.as_str(),
                visit.notes.as_str(),
            ],
        )?;

        Ok(self.conn().last_insert_rowid())
    }

    fn update_visit(&self, visit: &Visit) -> RepoResult<()> {
        visit.validate()?;

        let id = visit.id.ok_or(RepoError::NotFound {
            entity: Entity::Visit,
            id: 0,
        })?;
        let (start_latitude, start_longitude) = location_columns(visit.start_location);
        let (end_latitude, end_longitude) = location_columns(visit.end_location);

        let changed = self.conn().execute(
            "UPDATE visits
             SET
                start_time = ?1,
                end_time = ?2,
                start_latitude = ?3,
                start_longitude = ?4,
                end_latitude = ?5,
                end_longitude = ?6,
                status = ?7,
                notes = ?8,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?9;",
            params![
                visit.start_time.map(to_millis),
                visit.end_time.map(to_millis),
                start_latitude,
                start_longitude,
                end_latitude,
                end_longitude,
                visit.status.as_str(),
                visit.notes.as_str(),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: Entity::Visit,
                id,
            });
        }

        Ok(())
    }
}

fn location_columns(location: Option<GeoPoint>) -> (Option<f64>, Option<f64>) {
    match location {
        Some(point) => (Some(point.latitude()), Some(point.longitude())),
        None => (None, None),
    }
}

fn parse_visit_row(row: &Row<'_>) -> RepoResult<Visit> {
    let status_text: String = row.get("status")?;
    let visit = Visit {
        id: Some(row.get("id")?),
        schedule_id: row.get("schedule_id")?,
        start_time: from_optional_millis(row.get("start_time")?, "visits.start_time")?,
        start_location: location_from_columns(
            row.get("start_latitude")?,
            row.get("start_longitude")?,
            "visits.start_location",
        )?,
        end_time: from_optional_millis(row.get("end_time")?, "visits.end_time")?,
        end_location: location_from_columns(
            row.get("end_latitude")?,
            row.get("end_longitude")?,
            "visits.end_location",
        )?,
        status: parse_enum(&status_text, "visits.status")?,
        notes: row.get("notes")?,
        created_at: Some(from_millis(row.get("created_at")?, "visits.created_at")?),
        updated_at: Some(from_millis(row.get("updated_at")?, "visits.updated_at")?),
    };

    visit.validate().map_err(|err| {
        RepoError::InvalidData(format!(
            "inconsistent visit for schedule {}: {err}",
            visit.schedule_id
        ))
    })?;

    Ok(visit)
}
