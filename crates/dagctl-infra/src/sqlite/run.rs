//! SQLite run repository implementation.
//!
//! Implements `RunRepository` from `dagctl-core`. A run and its step
//! instances are written in one transaction; the unique indexes on
//! `(dag_id, execution_date)` and `(dag_id, run_id)` reject duplicates.

use chrono::NaiveDateTime;
use dagctl_core::repository::run::RunRepository;
use dagctl_types::error::RepositoryError;
use dagctl_types::run::{RunState, StepInstance, TaskState, WorkflowRun};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, parse_datetime};

/// SQLite-backed implementation of `RunRepository`.
#[derive(Clone)]
pub struct SqliteRunRepository {
    pool: DatabasePool,
}

impl SqliteRunRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping `dag_runs` rows to `WorkflowRun`.
struct RunRow {
    id: String,
    dag_id: String,
    run_id: String,
    execution_date: String,
    state: String,
    start_date: Option<String>,
    end_date: Option<String>,
    external_trigger: bool,
    conf: Option<String>,
}

impl RunRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            dag_id: row.try_get("dag_id")?,
            run_id: row.try_get("run_id")?,
            execution_date: row.try_get("execution_date")?,
            state: row.try_get("state")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            external_trigger: row.try_get("external_trigger")?,
            conf: row.try_get("conf")?,
        })
    }

    fn into_run(self) -> Result<WorkflowRun, RepositoryError> {
        let id = self
            .id
            .parse::<Uuid>()
            .map_err(|e| RepositoryError::Query(format!("invalid run id: {e}")))?;

        let state: RunState = self
            .state
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        let conf: Option<serde_json::Value> = self
            .conf
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid conf JSON: {e}")))?;

        Ok(WorkflowRun {
            id,
            dag_id: self.dag_id,
            run_id: self.run_id,
            execution_date: parse_datetime(&self.execution_date)?,
            state,
            start_date: self.start_date.as_deref().map(parse_datetime).transpose()?,
            end_date: self.end_date.as_deref().map(parse_datetime).transpose()?,
            external_trigger: self.external_trigger,
            conf,
        })
    }
}

/// Internal row type for mapping `task_instances` rows to `StepInstance`.
struct InstanceRow {
    dag_id: String,
    task_id: String,
    execution_date: String,
    state: Option<String>,
    try_number: i64,
    start_date: Option<String>,
    end_date: Option<String>,
    duration: Option<f64>,
    hostname: String,
    operator: String,
    pool: Option<String>,
    pid: Option<i64>,
}

impl InstanceRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            dag_id: row.try_get("dag_id")?,
            task_id: row.try_get("task_id")?,
            execution_date: row.try_get("execution_date")?,
            state: row.try_get("state")?,
            try_number: row.try_get("try_number")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            duration: row.try_get("duration")?,
            hostname: row.try_get("hostname")?,
            operator: row.try_get("operator")?,
            pool: row.try_get("pool")?,
            pid: row.try_get("pid")?,
        })
    }

    fn into_instance(self) -> Result<StepInstance, RepositoryError> {
        let state = self
            .state
            .as_deref()
            .map(str::parse::<TaskState>)
            .transpose()
            .map_err(RepositoryError::Query)?;

        Ok(StepInstance {
            dag_id: self.dag_id,
            task_id: self.task_id,
            execution_date: parse_datetime(&self.execution_date)?,
            state,
            try_number: u32::try_from(self.try_number)
                .map_err(|e| RepositoryError::Query(format!("invalid try_number: {e}")))?,
            start_date: self.start_date.as_deref().map(parse_datetime).transpose()?,
            end_date: self.end_date.as_deref().map(parse_datetime).transpose()?,
            duration: self.duration,
            hostname: self.hostname,
            operator: self.operator,
            pool: self.pool,
            pid: self
                .pid
                .map(u32::try_from)
                .transpose()
                .map_err(|e| RepositoryError::Query(format!("invalid pid: {e}")))?,
        })
    }
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

fn rows_to_runs(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<WorkflowRun>, RepositoryError> {
    rows.iter()
        .map(|row| RunRow::from_row(row).map_err(query_err)?.into_run())
        .collect()
}

impl RunRepository for SqliteRunRepository {
    async fn create_run(
        &self,
        run: &WorkflowRun,
        instances: &[StepInstance],
    ) -> Result<(), RepositoryError> {
        let conf = run
            .conf
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        sqlx::query(
            "INSERT INTO dag_runs (id, dag_id, run_id, execution_date, state, start_date, end_date, external_trigger, conf)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(run.id.to_string())
        .bind(&run.dag_id)
        .bind(&run.run_id)
        .bind(format_datetime(&run.execution_date))
        .bind(run.state.to_string())
        .bind(run.start_date.as_ref().map(format_datetime))
        .bind(run.end_date.as_ref().map(format_datetime))
        .bind(run.external_trigger)
        .bind(conf)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if !is_unique_violation(&e) {
                return query_err(e);
            }
            if e.to_string().contains("execution_date") {
                RepositoryError::Conflict(format!(
                    "A Dag Run already exists for dag id {} at {}",
                    run.dag_id, run.execution_date
                ))
            } else {
                RepositoryError::Conflict(format!(
                    "Run id {} already exists for dag id {}",
                    run.run_id, run.dag_id
                ))
            }
        })?;

        for instance in instances {
            sqlx::query(
                "INSERT INTO task_instances (dag_id, task_id, execution_date, state, try_number, start_date, end_date, duration, hostname, operator, pool, pid)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&instance.dag_id)
            .bind(&instance.task_id)
            .bind(format_datetime(&instance.execution_date))
            .bind(instance.state.map(|s| s.to_string()))
            .bind(i64::from(instance.try_number))
            .bind(instance.start_date.as_ref().map(format_datetime))
            .bind(instance.end_date.as_ref().map(format_datetime))
            .bind(instance.duration)
            .bind(&instance.hostname)
            .bind(&instance.operator)
            .bind(&instance.pool)
            .bind(instance.pid.map(i64::from))
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;
        }

        tx.commit().await.map_err(query_err)?;

        tracing::debug!(
            dag_id = %run.dag_id,
            run_id = %run.run_id,
            instances = instances.len(),
            "stored run"
        );
        Ok(())
    }

    async fn get_run(
        &self,
        dag_id: &str,
        execution_date: &NaiveDateTime,
    ) -> Result<Option<WorkflowRun>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM dag_runs WHERE dag_id = ? AND execution_date = ?")
            .bind(dag_id)
            .bind(format_datetime(execution_date))
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_err)?;

        match row {
            Some(row) => Ok(Some(RunRow::from_row(&row).map_err(query_err)?.into_run()?)),
            None => Ok(None),
        }
    }

    async fn list_active_run_dates(
        &self,
        dag_id: &str,
    ) -> Result<Vec<NaiveDateTime>, RepositoryError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT execution_date FROM dag_runs WHERE dag_id = ? AND state = ? ORDER BY execution_date",
        )
        .bind(dag_id)
        .bind(RunState::Running.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        rows.iter().map(|(date,)| parse_datetime(date)).collect()
    }

    async fn list_task_instances(
        &self,
        dag_id: &str,
        execution_date: &NaiveDateTime,
    ) -> Result<Vec<StepInstance>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM task_instances WHERE dag_id = ? AND execution_date = ? ORDER BY rowid",
        )
        .bind(dag_id)
        .bind(format_datetime(execution_date))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        rows.iter()
            .map(|row| InstanceRow::from_row(row).map_err(query_err)?.into_instance())
            .collect()
    }

    async fn get_task_instance(
        &self,
        dag_id: &str,
        task_id: &str,
        execution_date: &NaiveDateTime,
    ) -> Result<Option<StepInstance>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM task_instances WHERE dag_id = ? AND task_id = ? AND execution_date = ?",
        )
        .bind(dag_id)
        .bind(task_id)
        .bind(format_datetime(execution_date))
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;

        match row {
            Some(row) => Ok(Some(
                InstanceRow::from_row(&row)
                    .map_err(query_err)?
                    .into_instance()?,
            )),
            None => Ok(None),
        }
    }

    async fn latest_runs(&self) -> Result<Vec<WorkflowRun>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT r.* FROM dag_runs r
             WHERE r.execution_date = (
                 SELECT MAX(execution_date) FROM dag_runs WHERE dag_id = r.dag_id
             )
             ORDER BY r.dag_id",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        rows_to_runs(&rows)
    }
}
