//! Read-path status derivation for the caregiver dashboard.
//!
//! Derivation never writes. It is applied by
//! [`crate::service::schedule_service::ScheduleService::today_schedules`]
//! only; by-id and filtered list reads return the persisted status.

use crate::model::schedule::{Schedule, ScheduleStatus};
use crate::model::visit::{Visit, VisitStatus};
use chrono::{DateTime, Utc};

/// Computes the live display status of a schedule.
///
/// Priority: completed visit, in-progress visit, elapsed window without a
/// recorded start (missed), otherwise scheduled.
pub fn derive_display_status(
    schedule: &Schedule,
    visit: Option<&Visit>,
    now: DateTime<Utc>,
) -> ScheduleStatus {
    match visit.map(|visit| visit.status) {
        Some(VisitStatus::Completed) => ScheduleStatus::Completed,
        Some(VisitStatus::InProgress) => ScheduleStatus::InProgress,
        _ => {
            let started = visit.is_some_and(Visit::has_started);
            if now > schedule.end_time && !started {
                ScheduleStatus::Missed
            } else {
                ScheduleStatus::Scheduled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::derive_display_status;
    use crate::model::schedule::{Schedule, ScheduleStatus};
    use crate::model::visit::{GeoPoint, Visit};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn schedule_at(start: DateTime<Utc>) -> Schedule {
        Schedule {
            id: 1,
            client_id: 1,
            caregiver_id: 1,
            service_name: "Personal Care".to_string(),
            start_time: start,
            end_time: start + Duration::hours(2),
            status: ScheduleStatus::Scheduled,
            notes: String::new(),
            created_at: start - Duration::days(1),
            updated_at: start - Duration::days(1),
        }
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 10, 9, 0, 0).unwrap()
    }

    #[test]
    fn elapsed_window_without_visit_is_missed() {
        let schedule = schedule_at(base());
        let after_end = schedule.end_time + Duration::minutes(1);
        assert_eq!(
            derive_display_status(&schedule, None, after_end),
            ScheduleStatus::Missed
        );
        assert_eq!(
            derive_display_status(&schedule, None, schedule.end_time),
            ScheduleStatus::Scheduled
        );
    }

    #[test]
    fn not_started_visit_still_counts_as_missed() {
        let schedule = schedule_at(base());
        let visit = Visit::new(schedule.id);
        assert_eq!(
            derive_display_status(&schedule, Some(&visit), schedule.end_time + Duration::hours(1)),
            ScheduleStatus::Missed
        );
    }

    #[test]
    fn visit_status_wins_over_clock() {
        let schedule = schedule_at(base());
        let point = GeoPoint::new(40.7128, -74.0060).unwrap();
        let late = schedule.end_time + Duration::hours(3);

        let mut visit = Visit::new(schedule.id);
        visit.begin(base(), point);
        assert_eq!(
            derive_display_status(&schedule, Some(&visit), late),
            ScheduleStatus::InProgress
        );

        visit.finish(base() + Duration::hours(1), point, None);
        assert_eq!(
            derive_display_status(&schedule, Some(&visit), late),
            ScheduleStatus::Completed
        );
    }

    #[test]
    fn persisted_status_is_ignored() {
        let mut schedule = schedule_at(base());
        schedule.status = ScheduleStatus::InProgress;
        assert_eq!(
            derive_display_status(&schedule, None, base()),
            ScheduleStatus::Scheduled
        );
    }
}
