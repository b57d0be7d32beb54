//! Injectable time source and calendar-day helpers.
//!
//! # Responsibility
//! - Give services a single seam for reading "now".
//! - Translate local calendar days into UTC half-open ranges for queries.
//!
//! # Invariants
//! - `DayRange` is `[start, end)` and `start < end`.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::cell::Cell;

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic callers and tests.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// UTC bounds of one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayRange {
    /// Local calendar day containing `instant`.
    pub fn containing(instant: DateTime<Utc>) -> Self {
        Self::for_local_date(instant.with_timezone(&Local).date_naive())
    }

    /// Bounds of `date` interpreted in the local time zone.
    pub fn for_local_date(date: NaiveDate) -> Self {
        let start = local_midnight(date);
        let end = date
            .succ_opt()
            .map(local_midnight)
            .unwrap_or_else(|| start + Duration::days(1));
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive: NaiveDateTime = date.and_time(NaiveTime::default());
    // DST gaps can skip midnight; fall back to treating it as UTC.
    naive
        .and_local_timezone(Local)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}
