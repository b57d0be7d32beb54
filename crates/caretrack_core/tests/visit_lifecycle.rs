use caretrack_core::db::open_db_in_memory;
use caretrack_core::{
    Clock, ClientService, ErrorKind, FixedClock, GeoPoint, LifecycleConfig, NewClient, NewSchedule,
    ScheduleRepository, ScheduleService, ScheduleStatus, ServiceError, SqliteStore,
    ValidationError, Visit, VisitLifecycle, VisitRepository, VisitStatus,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rusqlite::Connection;

fn scheduled_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap()
}

fn point() -> GeoPoint {
    GeoPoint::new(40.7128, -74.0060).unwrap()
}

/// Creates one client and one two-hour schedule starting at `scheduled_start()`.
fn seed_schedule(conn: &Connection, clock: &FixedClock) -> i64 {
    seed_schedule_at(conn, clock, scheduled_start())
}

fn seed_schedule_at(conn: &Connection, clock: &FixedClock, start: DateTime<Utc>) -> i64 {
    let store = SqliteStore::try_new(conn).unwrap();
    let client = ClientService::new(store)
        .create_client(&NewClient {
            name: "John Smith".to_string(),
            address: "123 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip_code: "62701".to_string(),
            latitude: 39.7817,
            longitude: -89.6501,
            ..NewClient::default()
        })
        .unwrap();

    ScheduleService::new(store, clock)
        .create_schedule(&NewSchedule {
            client_id: client.id,
            caregiver_id: 1,
            service_name: "Personal Care Service".to_string(),
            start_time: start,
            end_time: start + Duration::hours(2),
            notes: String::new(),
        })
        .unwrap()
        .id
}

#[test]
fn start_end_then_cancel_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(scheduled_start() - Duration::minutes(10));
    let schedule_id = seed_schedule(&conn, &clock);
    let engine = VisitLifecycle::new(
        SqliteStore::try_new(&conn).unwrap(),
        &clock,
        LifecycleConfig::default(),
    );

    let started = engine.start_visit(schedule_id, point()).unwrap();
    assert_eq!(started.schedule.status, ScheduleStatus::InProgress);
    let visit = started.visit.unwrap();
    assert_eq!(visit.status, VisitStatus::InProgress);
    assert_eq!(visit.start_time, Some(clock.now()));
    assert_eq!(visit.start_location, Some(point()));

    clock.set(scheduled_start() + Duration::hours(1));
    let ended = engine.end_visit(schedule_id, point(), Some("done")).unwrap();
    assert_eq!(ended.schedule.status, ScheduleStatus::Completed);
    let visit = ended.visit.unwrap();
    assert_eq!(visit.status, VisitStatus::Completed);
    assert_eq!(visit.notes, "done");
    assert_eq!(visit.end_time, Some(scheduled_start() + Duration::hours(1)));

    let err = engine.cancel_visit(schedule_id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);

    let store = SqliteStore::try_new(&conn).unwrap();
    let persisted = store.get_schedule(schedule_id).unwrap().unwrap();
    assert_eq!(persisted.status, ScheduleStatus::Completed);
}

#[test]
fn start_two_hours_early_is_too_early() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(scheduled_start() - Duration::hours(2));
    let schedule_id = seed_schedule(&conn, &clock);
    let store = SqliteStore::try_new(&conn).unwrap();
    let engine = VisitLifecycle::new(store, &clock, LifecycleConfig::default());

    let err = engine.start_visit(schedule_id, point()).unwrap_err();
    assert!(matches!(err, ServiceError::TooEarly { .. }));
    assert!(store.get_visit_by_schedule(schedule_id).unwrap().is_none());
    assert_eq!(
        store.get_schedule(schedule_id).unwrap().unwrap().status,
        ScheduleStatus::Scheduled
    );
}

#[test]
fn early_start_boundary_is_inclusive() {
    let conn = open_db_in_memory().unwrap();
    let boundary = scheduled_start() - Duration::minutes(30);
    let clock = FixedClock::new(boundary - Duration::milliseconds(1));
    let schedule_id = seed_schedule(&conn, &clock);
    let engine = VisitLifecycle::new(
        SqliteStore::try_new(&conn).unwrap(),
        &clock,
        LifecycleConfig::default(),
    );

    assert_eq!(
        engine.start_visit(schedule_id, point()).unwrap_err().kind(),
        ErrorKind::TooEarly
    );

    clock.set(boundary);
    let started = engine.start_visit(schedule_id, point()).unwrap();
    assert_eq!(started.schedule.status, ScheduleStatus::InProgress);
}

#[test]
fn start_near_calendar_minimum_has_no_lower_bound() {
    let conn = open_db_in_memory().unwrap();
    let start = DateTime::<Utc>::MIN_UTC + Duration::milliseconds(1);
    let clock = FixedClock::new(start);
    let schedule_id = seed_schedule_at(&conn, &clock, start);
    let engine = VisitLifecycle::new(
        SqliteStore::try_new(&conn).unwrap(),
        &clock,
        LifecycleConfig::default(),
    );

    let started = engine
        .start_visit(schedule_id, GeoPoint::new(0.0, 0.0).unwrap())
        .unwrap();
    assert_eq!(started.schedule.status, ScheduleStatus::InProgress);
    assert_eq!(started.visit.unwrap().start_time, Some(start));
}

#[test]
fn grace_reaching_past_calendar_minimum_admits_start() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(scheduled_start() - Duration::days(3));
    let schedule_id = seed_schedule(&conn, &clock);
    let engine = VisitLifecycle::new(
        SqliteStore::try_new(&conn).unwrap(),
        &clock,
        LifecycleConfig {
            early_start_grace: Duration::days(365 * 300_000),
            ..LifecycleConfig::default()
        },
    );

    let started = engine.start_visit(schedule_id, point()).unwrap();
    assert_eq!(started.schedule.status, ScheduleStatus::InProgress);
}

#[test]
fn end_without_start_is_not_started() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(scheduled_start());
    let schedule_id = seed_schedule(&conn, &clock);
    let engine = VisitLifecycle::new(
        SqliteStore::try_new(&conn).unwrap(),
        &clock,
        LifecycleConfig::default(),
    );

    let err = engine.end_visit(schedule_id, point(), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotStarted);
    assert!(engine.get_visit(schedule_id).unwrap().is_none());
}

#[test]
fn unknown_schedule_is_not_found_for_every_transition() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(scheduled_start());
    let engine = VisitLifecycle::new(
        SqliteStore::try_new(&conn).unwrap(),
        &clock,
        LifecycleConfig::default(),
    );

    assert_eq!(
        engine.start_visit(404, point()).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        engine.end_visit(404, point(), None).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(engine.cancel_visit(404).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(engine.get_visit(404).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn cancel_in_progress_resets_visit() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(scheduled_start());
    let schedule_id = seed_schedule(&conn, &clock);
    let engine = VisitLifecycle::new(
        SqliteStore::try_new(&conn).unwrap(),
        &clock,
        LifecycleConfig::default(),
    );

    engine.start_visit(schedule_id, point()).unwrap();
    let cancelled = engine.cancel_visit(schedule_id).unwrap();

    assert_eq!(cancelled.schedule.status, ScheduleStatus::Scheduled);
    let visit = cancelled.visit.unwrap();
    assert_eq!(visit.status, VisitStatus::NotStarted);
    assert!(visit.start_time.is_none());
    assert!(visit.start_location.is_none());
    assert!(visit.end_time.is_none());
    assert!(visit.end_location.is_none());
    assert!(visit.notes.is_empty());

    let err = engine.end_visit(schedule_id, point(), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotStarted);
}

#[test]
fn cancel_from_scheduled_leaves_visit_untouched() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(scheduled_start());
    let schedule_id = seed_schedule(&conn, &clock);
    let store = SqliteStore::try_new(&conn).unwrap();
    let engine = VisitLifecycle::new(store, &clock, LifecycleConfig::default());

    let cancelled = engine.cancel_visit(schedule_id).unwrap();
    assert_eq!(cancelled.schedule.status, ScheduleStatus::Scheduled);
    assert!(cancelled.visit.is_none());
    assert!(store.get_visit_by_schedule(schedule_id).unwrap().is_none());
}

#[test]
fn repeated_cancel_keeps_reset_visit_row() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(scheduled_start());
    let schedule_id = seed_schedule(&conn, &clock);
    let store = SqliteStore::try_new(&conn).unwrap();
    let engine = VisitLifecycle::new(store, &clock, LifecycleConfig::default());

    engine.start_visit(schedule_id, point()).unwrap();
    engine.cancel_visit(schedule_id).unwrap();
    let before = store.get_visit_by_schedule(schedule_id).unwrap().unwrap();
    assert_eq!(before.status, VisitStatus::NotStarted);

    clock.advance(Duration::minutes(10));
    let cancelled = engine.cancel_visit(schedule_id).unwrap();
    assert_eq!(cancelled.schedule.status, ScheduleStatus::Scheduled);
    assert_eq!(cancelled.visit.as_ref(), Some(&before));
    assert_eq!(store.get_visit_by_schedule(schedule_id).unwrap().unwrap(), before);
}

#[test]
fn cancel_from_scheduled_keeps_existing_in_progress_visit() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(scheduled_start());
    let schedule_id = seed_schedule(&conn, &clock);
    let store = SqliteStore::try_new(&conn).unwrap();

    let mut visit = Visit::new(schedule_id);
    visit.begin(scheduled_start(), point());
    store.create_visit(&visit).unwrap();
    let before = store.get_visit_by_schedule(schedule_id).unwrap().unwrap();
    assert_eq!(
        store.get_schedule(schedule_id).unwrap().unwrap().status,
        ScheduleStatus::Scheduled
    );

    let engine = VisitLifecycle::new(store, &clock, LifecycleConfig::default());
    let cancelled = engine.cancel_visit(schedule_id).unwrap();
    assert_eq!(cancelled.schedule.status, ScheduleStatus::Scheduled);

    let after = store.get_visit_by_schedule(schedule_id).unwrap().unwrap();
    assert_eq!(after, before);
    assert_eq!(after.status, VisitStatus::InProgress);
    assert_eq!(after.updated_at, before.updated_at);
}

#[test]
fn cancel_from_missed_is_invalid() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(scheduled_start());
    let schedule_id = seed_schedule(&conn, &clock);
    let store = SqliteStore::try_new(&conn).unwrap();

    let mut schedule = store.get_schedule(schedule_id).unwrap().unwrap();
    schedule.status = ScheduleStatus::Missed;
    store.update_schedule(&schedule).unwrap();

    let engine = VisitLifecycle::new(store, &clock, LifecycleConfig::default());
    let err = engine.cancel_visit(schedule_id).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidTransition {
            from: "missed",
            ..
        }
    ));
}

#[test]
fn blank_end_notes_keep_existing_notes() {
    let conn = open_db_in_memory().unwrap();
    let clock = FixedClock::new(scheduled_start());
    let schedule_id = seed_schedule(&conn, &clock);
    let engine = VisitLifecycle::new(
        SqliteStore::try_new(&conn).unwrap(),
        &clock,
        LifecycleConfig::default(),
    );

    engine.start_visit(schedule_id, point()).unwrap();
    engine
        .end_visit(schedule_id, point(), Some("first notes"))
        .unwrap();
    clock.advance(Duration::minutes(5));
    let again = engine.end_visit(schedule_id, point(), Some("   ")).unwrap();

    let visit = again.visit.unwrap();
    assert_eq!(visit.notes, "first notes");
    assert_eq!(visit.end_time, Some(scheduled_start() + Duration::minutes(5)));
}

#[test]
fn coordinate_bounds_are_enforced_before_any_write() {
    assert!(GeoPoint::new(90.0, 180.0).is_ok());
    assert!(GeoPoint::new(-90.0, -180.0).is_ok());
    assert_eq!(
        GeoPoint::new(91.0, 0.0),
        Err(ValidationError::LatitudeOutOfRange(91.0))
    );
    assert_eq!(
        GeoPoint::new(0.0, -181.0),
        Err(ValidationError::LongitudeOutOfRange(-181.0))
    );

    let err: ServiceError = GeoPoint::new(-91.0, 0.0).unwrap_err().into();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
