//! Execution date codec.
//!
//! Runs are addressed by their logical execution date, which travels over the
//! API as `YYYY-MM-DDTHH:MM:SS` (no timezone, no fractional seconds). Parsing
//! is strict: the textual shape is checked byte-by-byte before chrono
//! validates field ranges, so inputs like `2024-1-01T00:00:00` or a trailing
//! `Z` are rejected rather than silently accepted.

use chrono::{NaiveDateTime, Timelike};
use thiserror::Error;

/// chrono format string for the wire representation.
pub const EXECUTION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Example shown to callers when their input does not parse.
pub const EXAMPLE_EXECUTION_DATE: &str = "2015-11-16T14:34:15";

/// The given text is not a valid execution date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Given execution date, {input}, could not be identified as a date. Example date format: {example}",
    example = EXAMPLE_EXECUTION_DATE
)]
pub struct InvalidExecutionDate {
    /// The offending input, echoed back verbatim.
    pub input: String,
}

/// Parse `YYYY-MM-DDTHH:MM:SS` into a naive instant.
pub fn parse_execution_date(text: &str) -> Result<NaiveDateTime, InvalidExecutionDate> {
    let invalid = || InvalidExecutionDate {
        input: text.to_string(),
    };

    if !has_execution_date_shape(text) {
        return Err(invalid());
    }

    NaiveDateTime::parse_from_str(text, EXECUTION_DATE_FORMAT).map_err(|_| invalid())
}

/// Byte-level shape check: digits everywhere except the fixed separators.
fn has_execution_date_shape(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.len() != 19 {
        return false;
    }

    bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        10 => *b == b'T',
        13 | 16 => *b == b':',
        _ => b.is_ascii_digit(),
    })
}

/// ISO-8601 text for an execution date.
///
/// Whole-second instants render exactly in the wire format; instants with a
/// sub-second part get a six-digit microsecond suffix.
pub fn iso_format(date: &NaiveDateTime) -> String {
    if date.nanosecond() == 0 {
        date.format(EXECUTION_DATE_FORMAT).to_string()
    } else {
        date.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}
