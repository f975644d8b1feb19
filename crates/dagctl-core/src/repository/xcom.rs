//! XCom repository trait definition.

use chrono::NaiveDateTime;
use dagctl_types::error::RepositoryError;
use dagctl_types::xcom::XComEntry;

/// Storage for cross-step exchange entries.
pub trait XComRepository: Send + Sync {
    /// Insert or overwrite the entry at its coordinates.
    fn set(
        &self,
        entry: &XComEntry,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Read one entry.
    fn get(
        &self,
        dag_id: &str,
        task_id: &str,
        execution_date: &NaiveDateTime,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<XComEntry>, RepositoryError>> + Send;
}
