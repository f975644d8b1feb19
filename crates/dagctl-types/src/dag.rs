//! Workflow definition types.
//!
//! A `WorkflowDefinition` (a "DAG") is the static shape of a workflow: its id,
//! scheduling metadata, and the set of `Step`s it contains. Definitions are
//! loaded from YAML files by the DAG registry and are read-only to the
//! control API.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A named, statically structured set of steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Unique DAG identifier.
    pub dag_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Default owner for steps that do not set one.
    #[serde(default = "default_owner")]
    pub owner: String,
    /// Cron expression or preset (e.g. "@daily"). Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default = "default_max_active_runs")]
    pub max_active_runs: u32,
    /// File the definition was loaded from. Set by the registry.
    #[serde(skip)]
    pub fileloc: Option<PathBuf>,
    /// Steps in declaration order.
    pub tasks: Vec<Step>,
}

fn default_owner() -> String {
    "dagctl".to_string()
}

fn default_max_active_runs() -> u32 {
    16
}

impl WorkflowDefinition {
    /// Look up a step by id.
    pub fn task(&self, task_id: &str) -> Option<&Step> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    /// Step ids in declaration order.
    pub fn task_ids(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.task_id.as_str()).collect()
    }

    /// Fill in back-references that YAML files leave implicit.
    ///
    /// Each step gets the owning `dag_id`, the DAG owner when it has none of
    /// its own, and its `downstream` list computed from other steps'
    /// `upstream` edges.
    pub fn link_tasks(&mut self) {
        let edges: Vec<(String, String)> = self
            .tasks
            .iter()
            .flat_map(|t| {
                t.upstream
                    .iter()
                    .map(move |up| (up.clone(), t.task_id.clone()))
            })
            .collect();

        for task in &mut self.tasks {
            task.dag_id = self.dag_id.clone();
            if task.owner.is_none() {
                task.owner = Some(self.owner.clone());
            }
            task.downstream = edges
                .iter()
                .filter(|(up, _)| *up == task.task_id)
                .map(|(_, down)| down.clone())
                .collect();
        }
    }
}

/// One unit of work within a definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub task_id: String,
    /// Owning DAG. Filled in by `WorkflowDefinition::link_tasks`.
    #[serde(default)]
    pub dag_id: String,
    /// Kind of step (e.g. "bash", "http", "sql"). Executed elsewhere.
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Notification addresses.
    #[serde(default)]
    pub email: Vec<String>,
    #[serde(default)]
    pub retries: u32,
    #[serde(default)]
    pub retry_delay_secs: u64,
    #[serde(default = "default_trigger_rule")]
    pub trigger_rule: String,
    #[serde(default)]
    pub pool: Option<String>,
    /// Step ids this step depends on.
    #[serde(default)]
    pub upstream: Vec<String>,
    /// Step ids depending on this step. Computed, never read from files.
    #[serde(skip)]
    pub downstream: Vec<String>,
    /// Operator parameters, passed through untouched.
    #[serde(default)]
    pub params: serde_json::Value,
}

fn default_trigger_rule() -> String {
    "all_success".to_string()
}
