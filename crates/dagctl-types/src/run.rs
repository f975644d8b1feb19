//! Run and step-instance types.
//!
//! A `WorkflowRun` is one execution of a definition at a logical execution
//! date; `(dag_id, execution_date)` is its natural key. Each run owns one
//! `StepInstance` per step of its definition.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::execution_date::iso_format;

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Success,
    Failed,
}

impl RunState {
    /// Whether a run in this state counts towards a DAG's active runs.
    pub fn is_active(&self) -> bool {
        matches!(self, RunState::Running)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Running => write!(f, "running"),
            RunState::Success => write!(f, "success"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for RunState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunState::Running),
            "success" => Ok(RunState::Success),
            "failed" => Ok(RunState::Failed),
            other => Err(format!("invalid run state: '{other}'")),
        }
    }
}

/// One execution of a workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// Surrogate key (UUIDv7).
    pub id: Uuid,
    pub dag_id: String,
    /// Caller-supplied or synthesized label, unique within the DAG.
    pub run_id: String,
    pub execution_date: NaiveDateTime,
    pub state: RunState,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    /// True when created through the API rather than the scheduler.
    pub external_trigger: bool,
    /// Opaque payload handed to the run's steps.
    pub conf: Option<serde_json::Value>,
}

impl fmt::Display for WorkflowRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<DagRun {} @ {}: {}, externally triggered: {}>",
            self.dag_id, self.execution_date, self.run_id, self.external_trigger
        )
    }
}

/// Request to trigger a new run. Every field is optional.
///
/// Accepts both `snake_case` and `camelCase` field names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerRequest {
    #[serde(default, alias = "runId")]
    pub run_id: Option<String>,
    /// Opaque payload; never inspected.
    #[serde(default)]
    pub conf: Option<serde_json::Value>,
    /// `YYYY-MM-DDTHH:MM:SS`; the current instant when absent.
    #[serde(default, alias = "executionDate")]
    pub execution_date: Option<String>,
}

/// Default run label for API-triggered runs.
pub fn manual_run_id(execution_date: &NaiveDateTime) -> String {
    format!("manual__{}", iso_format(execution_date))
}

/// Execution state of a step instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Scheduled,
    Queued,
    Running,
    Success,
    Failed,
    UpForRetry,
    UpstreamFailed,
    Skipped,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Scheduled => "scheduled",
            TaskState::Queued => "queued",
            TaskState::Running => "running",
            TaskState::Success => "success",
            TaskState::Failed => "failed",
            TaskState::UpForRetry => "up_for_retry",
            TaskState::UpstreamFailed => "upstream_failed",
            TaskState::Skipped => "skipped",
        };
        write!(f, "{s}")
    }
}

impl FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(TaskState::Scheduled),
            "queued" => Ok(TaskState::Queued),
            "running" => Ok(TaskState::Running),
            "success" => Ok(TaskState::Success),
            "failed" => Ok(TaskState::Failed),
            "up_for_retry" => Ok(TaskState::UpForRetry),
            "upstream_failed" => Ok(TaskState::UpstreamFailed),
            "skipped" => Ok(TaskState::Skipped),
            other => Err(format!("invalid task state: '{other}'")),
        }
    }
}

/// Execution record of one step within one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInstance {
    pub dag_id: String,
    pub task_id: String,
    pub execution_date: NaiveDateTime,
    /// `None` until the scheduler picks the instance up.
    pub state: Option<TaskState>,
    pub try_number: u32,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    /// Wall-clock seconds, set once the instance finishes.
    pub duration: Option<f64>,
    pub hostname: String,
    pub operator: String,
    pub pool: Option<String>,
    /// Worker process id; internal bookkeeping, never exposed by the API.
    pub pid: Option<u32>,
}

impl StepInstance {
    /// A fresh, not-yet-scheduled instance.
    pub fn pending(
        dag_id: &str,
        task_id: &str,
        execution_date: NaiveDateTime,
        operator: &str,
        pool: Option<String>,
    ) -> Self {
        Self {
            dag_id: dag_id.to_string(),
            task_id: task_id.to_string(),
            execution_date,
            state: None,
            try_number: 0,
            start_date: None,
            end_date: None,
            duration: None,
            hostname: String::new(),
            operator: operator.to_string(),
            pool,
            pid: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution_date::parse_execution_date;

    #[test]
    fn test_run_state_roundtrip() {
        for state in [RunState::Running, RunState::Success, RunState::Failed] {
            assert_eq!(state.to_string().parse::<RunState>().unwrap(), state);
        }
        assert!("paused".parse::<RunState>().is_err());
        assert!(RunState::Running.is_active());
        assert!(!RunState::Success.is_active());
    }

    #[test]
    fn test_task_state_serde_matches_display() {
        let json = serde_json::to_string(&TaskState::UpForRetry).unwrap();
        assert_eq!(json, "\"up_for_retry\"");
        assert_eq!(
            "upstream_failed".parse::<TaskState>().unwrap(),
            TaskState::UpstreamFailed
        );
    }

    #[test]
    fn test_run_display() {
        let date = parse_execution_date("2024-01-01T00:00:00").unwrap();
        let run = WorkflowRun {
            id: Uuid::now_v7(),
            dag_id: "etl_daily".to_string(),
            run_id: manual_run_id(&date),
            execution_date: date,
            state: RunState::Running,
            start_date: None,
            end_date: None,
            external_trigger: true,
            conf: None,
        };
        assert_eq!(
            run.to_string(),
            "<DagRun etl_daily @ 2024-01-01 00:00:00: manual__2024-01-01T00:00:00, externally triggered: true>"
        );
    }

    #[test]
    fn test_pending_instance() {
        let date = parse_execution_date("2024-01-01T00:00:00").unwrap();
        let ti = StepInstance::pending("d", "t", date, "bash", None);
        assert!(ti.state.is_none());
        assert_eq!(ti.try_number, 0);
        assert_eq!(ti.execution_date, date);
    }

    #[test]
    fn test_trigger_request_accepts_both_casings() {
        let snake: TriggerRequest =
            serde_json::from_str(r#"{"execution_date": "2024-01-01T00:00:00", "run_id": "r1"}"#)
                .unwrap();
        let camel: TriggerRequest =
            serde_json::from_str(r#"{"executionDate": "2024-01-01T00:00:00", "runId": "r1"}"#)
                .unwrap();
        assert_eq!(snake.execution_date, camel.execution_date);
        assert_eq!(snake.run_id.as_deref(), Some("r1"));
        assert_eq!(camel.run_id.as_deref(), Some("r1"));

        let empty: TriggerRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.run_id.is_none() && empty.conf.is_none() && empty.execution_date.is_none());
    }
}
