//! Cross-step exchange (XCom) entries.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A small keyed value scoped to one step instance of one run.
///
/// `(dag_id, task_id, execution_date, key)` identifies the entry; writing the
/// same coordinates again replaces `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XComEntry {
    pub dag_id: String,
    pub task_id: String,
    pub execution_date: NaiveDateTime,
    pub key: String,
    pub value: String,
    /// Time of the last write.
    pub timestamp: DateTime<Utc>,
}
