//! Column codecs shared by the SQLite repositories.
//!
//! Timestamps are stored as UTC epoch milliseconds.

use crate::model::visit::GeoPoint;
use crate::repo::{RepoError, RepoResult};
use chrono::{DateTime, Utc};

pub(crate) fn to_millis(value: DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

pub(crate) fn from_millis(value: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value).ok_or_else(|| {
        RepoError::InvalidData(format!("timestamp `{value}` out of range in {column}"))
    })
}

pub(crate) fn from_optional_millis(
    value: Option<i64>,
    column: &str,
) -> RepoResult<Option<DateTime<Utc>>> {
    value.map(|millis| from_millis(millis, column)).transpose()
}

/// Rebuilds a location from its two nullable columns.
///
/// Both columns must be set or both must be NULL.
pub(crate) fn location_from_columns(
    latitude: Option<f64>,
    longitude: Option<f64>,
    column: &str,
) -> RepoResult<Option<GeoPoint>> {
    match (latitude, longitude) {
        (None, None) => Ok(None),
        (Some(latitude), Some(longitude)) => GeoPoint::new(latitude, longitude)
            .map(Some)
            .map_err(|err| RepoError::InvalidData(format!("{err} in {column}"))),
        _ => Err(RepoError::InvalidData(format!(
            "half-populated coordinates in {column}"
        ))),
    }
}

pub(crate) fn parse_enum<T>(value: &str, column: &str) -> RepoResult<T>
where
    T: std::str::FromStr,
{
    value
        .parse()
        .map_err(|_| RepoError::InvalidData(format!("invalid value `{value}` in {column}")))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean `{other}` in {column}"
        ))),
    }
}
