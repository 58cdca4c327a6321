//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools. Arrays are stored as JSON text and
//! timestamps as fixed-width RFC 3339 strings, so string comparison in SQL
//! orders them chronologically.

pub mod account;
pub mod api_key;
pub mod brand;
pub mod conversation;
pub mod media;
pub mod pool;
pub mod post;

use chrono::{DateTime, SecondsFormat, Utc};
use socialdesk_types::error::RepositoryError;

pub(crate) fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

/// Map UNIQUE violations to `Conflict`, everything else to `Query`.
pub(crate) fn write_err(e: sqlx::Error, what: impl FnOnce() -> String) -> RepositoryError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.message().contains("UNIQUE") => {
            RepositoryError::Conflict(what())
        }
        other => RepositoryError::Query(other.to_string()),
    }
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

pub(crate) fn parse_opt_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    s.map(parse_datetime).transpose()
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_id<T>(s: &str, what: &str) -> Result<T, RepositoryError>
where
    T: std::str::FromStr<Err = uuid::Error>,
{
    s.parse::<T>()
        .map_err(|e| RepositoryError::Query(format!("invalid {what} id: {e}")))
}

pub(crate) fn parse_enum<T>(s: &str) -> Result<T, RepositoryError>
where
    T: std::str::FromStr<Err = String>,
{
    s.parse::<T>().map_err(RepositoryError::Query)
}

pub(crate) fn parse_list(json: &str) -> Result<Vec<String>, RepositoryError> {
    serde_json::from_str(json).map_err(|e| RepositoryError::Query(format!("invalid JSON array: {e}")))
}

pub(crate) fn to_json(list: &[String]) -> Result<String, RepositoryError> {
    serde_json::to_string(list).map_err(|e| RepositoryError::Query(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_datetime_text_sorts_chronologically() {
        let a = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let b = a + chrono::Duration::milliseconds(1500);
        let c = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let (fa, fb, fc) = (format_datetime(&a), format_datetime(&b), format_datetime(&c));
        assert_eq!(fa, "2026-03-01T09:00:00.000000Z");
        assert!(fa < fb && fb < fc);
        assert_eq!(parse_datetime(&fb).unwrap(), b);
    }
}
