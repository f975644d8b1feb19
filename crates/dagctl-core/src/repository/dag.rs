//! DAG registry trait definition.

use dagctl_types::dag::WorkflowDefinition;
use dagctl_types::error::RepositoryError;

/// Read access to the set of known workflow definitions.
///
/// The registry is owned elsewhere (loaded from the DAG folder); services
/// receive it at construction and only ever read from it.
pub trait DagRegistry: Send + Sync {
    /// Get a definition by its `dag_id`.
    fn get_dag(
        &self,
        dag_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<WorkflowDefinition>, RepositoryError>> + Send;

    /// All definitions, ordered by `dag_id`.
    fn list_dags(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<WorkflowDefinition>, RepositoryError>> + Send;
}
