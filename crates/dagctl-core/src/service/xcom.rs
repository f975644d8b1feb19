//! Cross-step exchange (XCom) reads and writes.

use chrono::Utc;
use dagctl_types::error::ControlError;
use dagctl_types::execution_date::parse_execution_date;
use dagctl_types::xcom::XComEntry;

use crate::repository::dag::DagRegistry;
use crate::repository::xcom::XComRepository;

/// Coordinates of one XCom entry as they arrive from a request path.
#[derive(Debug, Clone, Copy)]
pub struct XComAddress<'a> {
    pub dag_id: &'a str,
    pub task_id: &'a str,
    /// Unparsed `YYYY-MM-DDTHH:MM:SS`.
    pub execution_date: &'a str,
    pub key: &'a str,
}

pub struct XComService<D: DagRegistry, X: XComRepository> {
    registry: D,
    xcoms: X,
}

impl<D: DagRegistry, X: XComRepository> XComService<D, X> {
    pub fn new(registry: D, xcoms: X) -> Self {
        Self { registry, xcoms }
    }

    /// Store `value` at `address`, replacing any previous value.
    ///
    /// The step instance itself is not required to exist.
    pub async fn set(&self, address: XComAddress<'_>, value: &str) -> Result<XComEntry, ControlError> {
        tracing::info!(
            dag_id = address.dag_id,
            task_id = address.task_id,
            execution_date = address.execution_date,
            key = address.key,
            value,
            "setting xcom"
        );

        let execution_date = parse_execution_date(address.execution_date)?;
        self.require_dag(address.dag_id).await?;

        let entry = XComEntry {
            dag_id: address.dag_id.to_string(),
            task_id: address.task_id.to_string(),
            execution_date,
            key: address.key.to_string(),
            value: value.to_string(),
            timestamp: Utc::now(),
        };
        self.xcoms.set(&entry).await?;
        Ok(entry)
    }

    /// Read the entry at `address`.
    pub async fn get(&self, address: XComAddress<'_>) -> Result<XComEntry, ControlError> {
        let execution_date = parse_execution_date(address.execution_date)?;
        self.require_dag(address.dag_id).await?;

        self.xcoms
            .get(address.dag_id, address.task_id, &execution_date, address.key)
            .await?
            .ok_or_else(|| ControlError::XComNotFound {
                dag_id: address.dag_id.to_string(),
                task_id: address.task_id.to_string(),
                execution_date,
                key: address.key.to_string(),
            })
    }

    async fn require_dag(&self, dag_id: &str) -> Result<(), ControlError> {
        match self.registry.get_dag(dag_id).await? {
            Some(_) => Ok(()),
            None => Err(ControlError::DagNotFound(dag_id.to_string())),
        }
    }
}
