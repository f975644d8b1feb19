//! Run repository trait definition.
//!
//! Defines the storage interface for workflow runs and their step instances.
//! The infrastructure layer (dagctl-infra) implements this trait with SQLite
//! persistence.

use chrono::NaiveDateTime;
use dagctl_types::error::RepositoryError;
use dagctl_types::run::{StepInstance, WorkflowRun, manual_run_id};

/// Repository trait for run persistence.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait RunRepository: Send + Sync {
    /// Insert a run together with its step instances.
    ///
    /// Fails with `RepositoryError::Conflict` when the DAG already has a run
    /// at the same execution date or with the same `run_id`.
    fn create_run(
        &self,
        run: &WorkflowRun,
        instances: &[StepInstance],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get the run of `dag_id` at `execution_date`.
    fn get_run(
        &self,
        dag_id: &str,
        execution_date: &NaiveDateTime,
    ) -> impl std::future::Future<Output = Result<Option<WorkflowRun>, RepositoryError>> + Send;

    /// Execution dates of the DAG's runs that are still running, oldest first.
    fn list_active_run_dates(
        &self,
        dag_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<NaiveDateTime>, RepositoryError>> + Send;

    /// Step instances belonging to one run.
    fn list_task_instances(
        &self,
        dag_id: &str,
        execution_date: &NaiveDateTime,
    ) -> impl std::future::Future<Output = Result<Vec<StepInstance>, RepositoryError>> + Send;

    /// One step instance.
    fn get_task_instance(
        &self,
        dag_id: &str,
        task_id: &str,
        execution_date: &NaiveDateTime,
    ) -> impl std::future::Future<Output = Result<Option<StepInstance>, RepositoryError>> + Send;

    /// The most recent run (by execution date) of every DAG that has one.
    fn latest_runs(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<WorkflowRun>, RepositoryError>> + Send;

    /// Label for a run triggered without an explicit `run_id`.
    fn synthesize_run_id(&self, execution_date: &NaiveDateTime) -> String {
        manual_run_id(execution_date)
    }
}
