//! Resolution of API path segments into entities.
//!
//! A path names a definition, then optionally a run (by execution date), a
//! step, or a step instance. Links are resolved strictly in the order
//! definition -> run -> step -> instance and the first missing link ends the
//! lookup with the error naming it.

use chrono::NaiveDateTime;
use dagctl_types::dag::{Step, WorkflowDefinition};
use dagctl_types::error::ControlError;
use dagctl_types::run::{StepInstance, WorkflowRun};

use crate::repository::dag::DagRegistry;
use crate::repository::run::RunRepository;

/// The segments present in a request path.
#[derive(Debug, Clone, Copy)]
pub struct LookupRequest<'a> {
    pub dag_id: &'a str,
    pub execution_date: Option<NaiveDateTime>,
    pub task_id: Option<&'a str>,
}

/// What a set of path segments resolved to.
#[derive(Debug, Clone)]
pub enum Resolution {
    Dag(WorkflowDefinition),
    DagRun(WorkflowRun),
    Task(Step),
    TaskInstance(StepInstance),
}

/// Read-only lookups over the registry and the run repository.
pub struct LookupChain<D: DagRegistry, R: RunRepository> {
    registry: D,
    runs: R,
}

impl<D: DagRegistry, R: RunRepository> LookupChain<D, R> {
    pub fn new(registry: D, runs: R) -> Self {
        Self { registry, runs }
    }

    /// Resolve the deepest entity the request names.
    pub async fn resolve(&self, request: LookupRequest<'_>) -> Result<Resolution, ControlError> {
        let def = self.dag(request.dag_id).await?;

        let Some(execution_date) = request.execution_date else {
            return Ok(match request.task_id {
                Some(task_id) => Resolution::Task(find_task(&def, task_id)?.clone()),
                None => Resolution::Dag(def),
            });
        };

        let run = self.find_run(&def.dag_id, execution_date).await?;

        let Some(task_id) = request.task_id else {
            return Ok(Resolution::DagRun(run));
        };

        find_task(&def, task_id)?;

        self.runs
            .get_task_instance(&def.dag_id, task_id, &execution_date)
            .await?
            .map(Resolution::TaskInstance)
            .ok_or_else(|| ControlError::TaskInstanceNotFound {
                task_id: task_id.to_string(),
                execution_date,
            })
    }

    /// The definition named `dag_id`.
    pub async fn dag(&self, dag_id: &str) -> Result<WorkflowDefinition, ControlError> {
        self.registry
            .get_dag(dag_id)
            .await?
            .ok_or_else(|| ControlError::DagNotFound(dag_id.to_string()))
    }

    /// The run of `dag_id` at `execution_date`.
    pub async fn dag_run(
        &self,
        dag_id: &str,
        execution_date: NaiveDateTime,
    ) -> Result<WorkflowRun, ControlError> {
        match self
            .resolve(LookupRequest {
                dag_id,
                execution_date: Some(execution_date),
                task_id: None,
            })
            .await?
        {
            Resolution::DagRun(run) => Ok(run),
            other => Err(unexpected(other)),
        }
    }

    /// The run at `execution_date` together with its step instances in
    /// step order. The definition is read once.
    pub async fn dag_run_with_instances(
        &self,
        dag_id: &str,
        execution_date: NaiveDateTime,
    ) -> Result<(WorkflowRun, Vec<StepInstance>), ControlError> {
        let def = self.dag(dag_id).await?;
        let run = self.find_run(&def.dag_id, execution_date).await?;
        let instances = self.task_instances(&def, execution_date).await?;
        Ok((run, instances))
    }

    /// The step `task_id` of `dag_id`.
    pub async fn task(&self, dag_id: &str, task_id: &str) -> Result<Step, ControlError> {
        match self
            .resolve(LookupRequest {
                dag_id,
                execution_date: None,
                task_id: Some(task_id),
            })
            .await?
        {
            Resolution::Task(step) => Ok(step),
            other => Err(unexpected(other)),
        }
    }

    /// The instance of step `task_id` in the run at `execution_date`.
    pub async fn task_instance(
        &self,
        dag_id: &str,
        task_id: &str,
        execution_date: NaiveDateTime,
    ) -> Result<StepInstance, ControlError> {
        match self
            .resolve(LookupRequest {
                dag_id,
                execution_date: Some(execution_date),
                task_id: Some(task_id),
            })
            .await?
        {
            Resolution::TaskInstance(instance) => Ok(instance),
            other => Err(unexpected(other)),
        }
    }

    /// Execution dates of the DAG's running runs.
    pub async fn active_run_dates(&self, dag_id: &str) -> Result<Vec<NaiveDateTime>, ControlError> {
        Ok(self.runs.list_active_run_dates(dag_id).await?)
    }

    /// Step instances of one run, in the definition's step order.
    ///
    /// Instances for steps no longer in the definition are appended last.
    pub async fn task_instances(
        &self,
        def: &WorkflowDefinition,
        execution_date: NaiveDateTime,
    ) -> Result<Vec<StepInstance>, ControlError> {
        let mut instances = self
            .runs
            .list_task_instances(&def.dag_id, &execution_date)
            .await?;
        let position = |task_id: &str| {
            def.tasks
                .iter()
                .position(|t| t.task_id == task_id)
                .unwrap_or(usize::MAX)
        };
        instances.sort_by_key(|i| position(&i.task_id));
        Ok(instances)
    }

    /// The most recent run of every DAG that has been run.
    pub async fn latest_runs(&self) -> Result<Vec<WorkflowRun>, ControlError> {
        Ok(self.runs.latest_runs().await?)
    }

    async fn find_run(
        &self,
        dag_id: &str,
        execution_date: NaiveDateTime,
    ) -> Result<WorkflowRun, ControlError> {
        self.runs
            .get_run(dag_id, &execution_date)
            .await?
            .ok_or_else(|| ControlError::DagRunNotFound {
                dag_id: dag_id.to_string(),
                execution_date,
            })
    }
}

fn find_task<'d>(def: &'d WorkflowDefinition, task_id: &str) -> Result<&'d Step, ControlError> {
    def.task(task_id).ok_or_else(|| ControlError::TaskNotFound {
        dag_id: def.dag_id.clone(),
        task_id: task_id.to_string(),
    })
}

/// `resolve` returns the variant matching the segments it was given.
fn unexpected(resolution: Resolution) -> ControlError {
    ControlError::Storage(format!("lookup resolved to an unexpected entity: {resolution:?}"))
}
