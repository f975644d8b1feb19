//! In-memory registry and repositories shared by the service tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDateTime;
use dagctl_types::dag::WorkflowDefinition;
use dagctl_types::error::RepositoryError;
use dagctl_types::run::{StepInstance, WorkflowRun};
use dagctl_types::xcom::XComEntry;

use crate::dagbag::parse_dag_yaml;
use crate::repository::dag::DagRegistry;
use crate::repository::run::RunRepository;
use crate::repository::xcom::XComRepository;

pub(crate) const ETL_DAILY: &str = r#"
dag_id: etl_daily
tasks:
  - task_id: extract
    operator: bash
  - task_id: load
    operator: sql
    upstream: [extract]
"#;

#[derive(Default)]
pub(crate) struct MockRegistry {
    dags: HashMap<String, WorkflowDefinition>,
    pub(crate) calls: AtomicUsize,
}

impl MockRegistry {
    pub(crate) fn with_etl() -> Self {
        let mut registry = Self::default();
        let def = parse_dag_yaml(ETL_DAILY).unwrap();
        registry.dags.insert(def.dag_id.clone(), def);
        registry
    }
}

impl DagRegistry for MockRegistry {
    async fn get_dag(&self, dag_id: &str) -> Result<Option<WorkflowDefinition>, RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.dags.get(dag_id).cloned())
    }

    async fn list_dags(&self) -> Result<Vec<WorkflowDefinition>, RepositoryError> {
        let mut dags: Vec<_> = self.dags.values().cloned().collect();
        dags.sort_by(|a, b| a.dag_id.cmp(&b.dag_id));
        Ok(dags)
    }
}

/// Runs and their instances, with a counter of read calls.
#[derive(Default)]
pub(crate) struct MockRuns {
    runs: Mutex<Vec<(WorkflowRun, Vec<StepInstance>)>>,
    pub(crate) reads: AtomicUsize,
    pub(crate) fail: bool,
}

impl MockRuns {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn stored(&self) -> Vec<(WorkflowRun, Vec<StepInstance>)> {
        self.runs.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.fail {
            Err(RepositoryError::Query("disk I/O error".to_string()))
        } else {
            Ok(())
        }
    }
}

impl RunRepository for MockRuns {
    async fn create_run(
        &self,
        run: &WorkflowRun,
        instances: &[StepInstance],
    ) -> Result<(), RepositoryError> {
        self.check()?;
        let mut runs = self.runs.lock().unwrap();
        for (existing, _) in runs.iter() {
            if existing.dag_id != run.dag_id {
                continue;
            }
            if existing.execution_date == run.execution_date {
                return Err(RepositoryError::Conflict(format!(
                    "A Dag Run already exists for dag id {} at {}",
                    run.dag_id, run.execution_date
                )));
            }
            if existing.run_id == run.run_id {
                return Err(RepositoryError::Conflict(format!(
                    "Run id {} already exists for dag id {}",
                    run.run_id, run.dag_id
                )));
            }
        }
        runs.push((run.clone(), instances.to_vec()));
        Ok(())
    }

    async fn get_run(
        &self,
        dag_id: &str,
        execution_date: &NaiveDateTime,
    ) -> Result<Option<WorkflowRun>, RepositoryError> {
        self.check()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .runs
            .lock()
            .unwrap()
            .iter()
            .find(|(r, _)| r.dag_id == dag_id && r.execution_date == *execution_date)
            .map(|(r, _)| r.clone()))
    }

    async fn list_active_run_dates(&self, dag_id: &str) -> Result<Vec<NaiveDateTime>, RepositoryError> {
        self.check()?;
        let mut dates: Vec<_> = self
            .runs
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r.dag_id == dag_id && r.state.is_active())
            .map(|(r, _)| r.execution_date)
            .collect();
        dates.sort();
        Ok(dates)
    }

    async fn list_task_instances(
        &self,
        dag_id: &str,
        execution_date: &NaiveDateTime,
    ) -> Result<Vec<StepInstance>, RepositoryError> {
        self.check()?;
        Ok(self
            .runs
            .lock()
            .unwrap()
            .iter()
            .find(|(r, _)| r.dag_id == dag_id && r.execution_date == *execution_date)
            .map(|(_, i)| i.clone())
            .unwrap_or_default())
    }

    async fn get_task_instance(
        &self,
        dag_id: &str,
        task_id: &str,
        execution_date: &NaiveDateTime,
    ) -> Result<Option<StepInstance>, RepositoryError> {
        self.check()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .list_task_instances(dag_id, execution_date)
            .await?
            .into_iter()
            .find(|i| i.task_id == task_id))
    }

    async fn latest_runs(&self) -> Result<Vec<WorkflowRun>, RepositoryError> {
        self.check()?;
        let mut latest: HashMap<String, WorkflowRun> = HashMap::new();
        for (run, _) in self.runs.lock().unwrap().iter() {
            match latest.get(&run.dag_id) {
                Some(existing) if existing.execution_date >= run.execution_date => {}
                _ => {
                    latest.insert(run.dag_id.clone(), run.clone());
                }
            }
        }
        let mut runs: Vec<_> = latest.into_values().collect();
        runs.sort_by(|a, b| a.dag_id.cmp(&b.dag_id));
        Ok(runs)
    }
}

#[derive(Default)]
pub(crate) struct MockXCom {
    entries: Mutex<HashMap<(String, String, NaiveDateTime, String), XComEntry>>,
}

impl MockXCom {
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

impl XComRepository for MockXCom {
    async fn set(&self, entry: &XComEntry) -> Result<(), RepositoryError> {
        let key = (
            entry.dag_id.clone(),
            entry.task_id.clone(),
            entry.execution_date,
            entry.key.clone(),
        );
        self.entries.lock().unwrap().insert(key, entry.clone());
        Ok(())
    }

    async fn get(
        &self,
        dag_id: &str,
        task_id: &str,
        execution_date: &NaiveDateTime,
        key: &str,
    ) -> Result<Option<XComEntry>, RepositoryError> {
        let key = (
            dag_id.to_string(),
            task_id.to_string(),
            *execution_date,
            key.to_string(),
        );
        Ok(self.entries.lock().unwrap().get(&key).cloned())
    }
}
