//! SQLite XCom repository implementation.

use chrono::{DateTime, NaiveDateTime, Utc};
use dagctl_core::repository::xcom::XComRepository;
use dagctl_types::error::RepositoryError;
use dagctl_types::xcom::XComEntry;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `XComRepository`.
#[derive(Clone)]
pub struct SqliteXComRepository {
    pool: DatabasePool,
}

impl SqliteXComRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid timestamp: {e}")))
}

impl XComRepository for SqliteXComRepository {
    async fn set(&self, entry: &XComEntry) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO xcom (dag_id, task_id, execution_date, key, value, timestamp)
               VALUES (?, ?, ?, ?, ?, ?)
               ON CONFLICT (dag_id, task_id, execution_date, key) DO UPDATE SET
                   value = excluded.value,
                   timestamp = excluded.timestamp"#,
        )
        .bind(&entry.dag_id)
        .bind(&entry.task_id)
        .bind(format_datetime(&entry.execution_date))
        .bind(&entry.key)
        .bind(&entry.value)
        .bind(entry.timestamp.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get(
        &self,
        dag_id: &str,
        task_id: &str,
        execution_date: &NaiveDateTime,
        key: &str,
    ) -> Result<Option<XComEntry>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM xcom WHERE dag_id = ? AND task_id = ? AND execution_date = ? AND key = ?",
        )
        .bind(dag_id)
        .bind(task_id)
        .bind(format_datetime(execution_date))
        .bind(key)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let get = |col: &str| -> Result<String, RepositoryError> {
            row.try_get(col)
                .map_err(|e| RepositoryError::Query(e.to_string()))
        };

        Ok(Some(XComEntry {
            dag_id: get("dag_id")?,
            task_id: get("task_id")?,
            execution_date: parse_datetime(&get("execution_date")?)?,
            key: get("key")?,
            value: get("value")?,
            timestamp: parse_timestamp(&get("timestamp")?)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagctl_types::execution_date::parse_execution_date;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    fn entry(key: &str, value: &str) -> XComEntry {
        XComEntry {
            dag_id: "etl_daily".to_string(),
            task_id: "extract".to_string(),
            execution_date: parse_execution_date("2024-01-01T00:00:00").unwrap(),
            key: key.to_string(),
            value: value.to_string(),
            timestamp: Utc::now(),
        }
    }

    async fn count(pool: &DatabasePool) -> i64 {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM xcom")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        n
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let repo = SqliteXComRepository::new(test_pool().await);
        let written = entry("rows", "42");
        repo.set(&written).await.unwrap();

        let read = repo
            .get("etl_daily", "extract", &written.execution_date, "rows")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.value, "42");
        assert_eq!(read.execution_date, written.execution_date);
        assert_eq!(read.timestamp.timestamp(), written.timestamp.timestamp());
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_row() {
        let pool = test_pool().await;
        let repo = SqliteXComRepository::new(pool.clone());

        repo.set(&entry("rows", "1")).await.unwrap();
        repo.set(&entry("rows", "2")).await.unwrap();
        repo.set(&entry("bytes", "9")).await.unwrap();

        assert_eq!(count(&pool).await, 2);
        let read = repo
            .get(
                "etl_daily",
                "extract",
                &parse_execution_date("2024-01-01T00:00:00").unwrap(),
                "rows",
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.value, "2");
    }

    #[tokio::test]
    async fn test_get_missing() {
        let repo = SqliteXComRepository::new(test_pool().await);
        let missing = repo
            .get(
                "etl_daily",
                "extract",
                &parse_execution_date("2024-01-01T00:00:00").unwrap(),
                "rows",
            )
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
