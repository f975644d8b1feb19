//! XCom read and write handlers.

use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Value, json};

use dagctl_core::service::xcom::XComAddress;
use dagctl_types::xcom::XComEntry;

use crate::http::error::AppError;
use crate::state::AppState;

/// POST /api/experimental/dags/{dag_id}/tasks/{task_id}/instances/{execution_date}/xcom/{key}/{value}
pub async fn set_xcom(
    State(state): State<AppState>,
    Path((dag_id, task_id, execution_date, key, value)): Path<(
        String,
        String,
        String,
        String,
        String,
    )>,
) -> Result<Json<Value>, AppError> {
    let address = XComAddress {
        dag_id: &dag_id,
        task_id: &task_id,
        execution_date: &execution_date,
        key: &key,
    };
    let entry = state.xcom_service.set(address, &value).await?;

    Ok(Json(json!({
        "message": format!(
            "XCom {} has been set to {} for task {} in DAG {} with the execution date {}",
            entry.key, entry.value, entry.task_id, entry.dag_id, entry.execution_date
        )
    })))
}

/// GET /api/experimental/dags/{dag_id}/tasks/{task_id}/instances/{execution_date}/xcom/{key}
pub async fn get_xcom(
    State(state): State<AppState>,
    Path((dag_id, task_id, execution_date, key)): Path<(String, String, String, String)>,
) -> Result<Json<XComEntry>, AppError> {
    let address = XComAddress {
        dag_id: &dag_id,
        task_id: &task_id,
        execution_date: &execution_date,
        key: &key,
    };
    Ok(Json(state.xcom_service.get(address).await?))
}
