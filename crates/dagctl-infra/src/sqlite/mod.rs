//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod pool;
pub mod run;
pub mod user;
pub mod xcom;

use chrono::NaiveDateTime;
use dagctl_types::error::RepositoryError;

/// Storage format for naive timestamps. Fixed width, so text order is time order.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

pub(crate) fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

pub(crate) fn parse_datetime(s: &str) -> Result<NaiveDateTime, RepositoryError> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map_err(|e| RepositoryError::Query(format!("invalid datetime '{s}': {e}")))
}

/// True when `err` is a UNIQUE (or primary key) constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE"))
}
