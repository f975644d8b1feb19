use chrono::NaiveDateTime;
use thiserror::Error;

use crate::execution_date::InvalidExecutionDate;

/// Errors from the control API's services.
///
/// Not-found variants name exactly which link of the
/// definition -> run -> step -> instance chain was missing.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    InvalidExecutionDate(#[from] InvalidExecutionDate),

    #[error("Dag id {0} not found")]
    DagNotFound(String),

    #[error("Dag Run for date {execution_date} not found in dag {dag_id}")]
    DagRunNotFound {
        dag_id: String,
        execution_date: NaiveDateTime,
    },

    #[error("Task {task_id} not found in dag {dag_id}")]
    TaskNotFound { dag_id: String, task_id: String },

    #[error("Task {task_id} instance for date {execution_date} not found")]
    TaskInstanceNotFound {
        task_id: String,
        execution_date: NaiveDateTime,
    },

    #[error("XCom {key} not found for task {task_id} in dag {dag_id} at {execution_date}")]
    XComNotFound {
        dag_id: String,
        task_id: String,
        execution_date: NaiveDateTime,
        key: String,
    },

    /// The run registry refused a second run with the same natural key or label.
    #[error("{0}")]
    DuplicateRun(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl ControlError {
    /// True for every missing-entity variant.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ControlError::DagNotFound(_)
                | ControlError::DagRunNotFound { .. }
                | ControlError::TaskNotFound { .. }
                | ControlError::TaskInstanceNotFound { .. }
                | ControlError::XComNotFound { .. }
        )
    }
}

/// Errors from repository operations (used by trait definitions in dagctl-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for ControlError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(msg) => ControlError::DuplicateRun(msg),
            other => ControlError::Storage(other.to_string()),
        }
    }
}
