//! Public, stringly-typed views of DAGs, runs, steps, and step instances.
//!
//! Every entity exposes a fixed list of public fields; each value is rendered
//! to text before it reaches the wire. Field names beginning with `_` mark
//! internal attributes and are always dropped.

use chrono::NaiveDateTime;
use dagctl_types::dag::{Step, WorkflowDefinition};
use dagctl_types::execution_date::iso_format;
use dagctl_types::run::{StepInstance, WorkflowRun};
use serde_json::{Map, Value};

/// Text rendering of an absent value.
const NONE: &str = "None";

/// An entity that can be shown through the control API.
pub trait PublicView {
    /// `(name, rendered value)` pairs in display order.
    fn public_fields(&self) -> Vec<(&'static str, String)>;
}

/// Build the JSON view of an entity. Every value is a string.
pub fn to_view<T: PublicView + ?Sized>(entity: &T) -> Map<String, Value> {
    entity
        .public_fields()
        .into_iter()
        .filter(|(name, _)| !name.starts_with('_'))
        .map(|(name, value)| (name.to_string(), Value::String(value)))
        .collect()
}

/// Definition view plus `active_runs`, the execution dates of its running runs.
pub fn dag_view(def: &WorkflowDefinition, active_run_dates: &[NaiveDateTime]) -> Map<String, Value> {
    let mut view = to_view(def);
    view.insert(
        "active_runs".to_string(),
        Value::Array(
            active_run_dates
                .iter()
                .map(|d| Value::String(iso_format(d)))
                .collect(),
        ),
    );
    view
}

/// Run view plus `task_instances`, one instance view per step.
pub fn dag_run_view(run: &WorkflowRun, instances: &[StepInstance]) -> Map<String, Value> {
    let mut view = to_view(run);
    view.insert(
        "task_instances".to_string(),
        Value::Array(
            instances
                .iter()
                .map(|i| Value::Object(to_view(i)))
                .collect(),
        ),
    );
    view
}

fn opt<T: ToString>(value: Option<&T>) -> String {
    value.map_or_else(|| NONE.to_string(), ToString::to_string)
}

fn list(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| format!("{v:?}")).collect();
    format!("[{}]", quoted.join(", "))
}

fn json(value: &Value) -> String {
    if value.is_null() {
        NONE.to_string()
    } else {
        value.to_string()
    }
}

impl PublicView for WorkflowDefinition {
    fn public_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("dag_id", self.dag_id.clone()),
            ("description", opt(self.description.as_ref())),
            ("owner", self.owner.clone()),
            ("schedule_interval", opt(self.schedule_interval.as_ref())),
            ("start_date", opt(self.start_date.as_ref())),
            ("tags", list(&self.tags)),
            ("is_paused", self.is_paused.to_string()),
            ("max_active_runs", self.max_active_runs.to_string()),
            (
                "fileloc",
                opt(self.fileloc.as_ref().map(|p| p.display()).as_ref()),
            ),
            (
                "task_ids",
                list(&self.tasks.iter().map(|t| t.task_id.clone()).collect::<Vec<_>>()),
            ),
        ]
    }
}

impl PublicView for Step {
    fn public_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("task_id", self.task_id.clone()),
            ("dag_id", self.dag_id.clone()),
            ("operator", self.operator.clone()),
            ("owner", opt(self.owner.as_ref())),
            ("email", list(&self.email)),
            ("retries", self.retries.to_string()),
            ("retry_delay", format!("{}s", self.retry_delay_secs)),
            ("trigger_rule", self.trigger_rule.clone()),
            ("pool", opt(self.pool.as_ref())),
            ("upstream_task_ids", list(&self.upstream)),
            ("downstream_task_ids", list(&self.downstream)),
            ("params", json(&self.params)),
        ]
    }
}

impl PublicView for WorkflowRun {
    fn public_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("_id", self.id.to_string()),
            ("dag_id", self.dag_id.clone()),
            ("run_id", self.run_id.clone()),
            ("execution_date", self.execution_date.to_string()),
            ("state", self.state.to_string()),
            ("start_date", opt(self.start_date.as_ref())),
            ("end_date", opt(self.end_date.as_ref())),
            ("external_trigger", self.external_trigger.to_string()),
            ("conf", self.conf.as_ref().map_or_else(|| NONE.to_string(), json)),
        ]
    }
}

impl PublicView for StepInstance {
    fn public_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("dag_id", self.dag_id.clone()),
            ("task_id", self.task_id.clone()),
            ("execution_date", self.execution_date.to_string()),
            ("state", opt(self.state.as_ref())),
            ("try_number", self.try_number.to_string()),
            ("start_date", opt(self.start_date.as_ref())),
            ("end_date", opt(self.end_date.as_ref())),
            ("duration", opt(self.duration.as_ref())),
            ("hostname", self.hostname.clone()),
            ("operator", self.operator.clone()),
            ("pool", opt(self.pool.as_ref())),
            ("_pid", opt(self.pid.as_ref())),
        ]
    }
}
