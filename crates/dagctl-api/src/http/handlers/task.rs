//! Step and step-instance introspection handlers.

use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Map, Value};

use dagctl_core::view::to_view;
use dagctl_types::execution_date::parse_execution_date;

use crate::http::error::AppError;
use crate::state::AppState;

/// GET /api/experimental/dags/{dag_id}/tasks/{task_id}
pub async fn get_task(
    State(state): State<AppState>,
    Path((dag_id, task_id)): Path<(String, String)>,
) -> Result<Json<Map<String, Value>>, AppError> {
    let step = state.lookup.task(&dag_id, &task_id).await?;
    Ok(Json(to_view(&step)))
}

/// GET /api/experimental/dags/{dag_id}/dag_runs/{execution_date}/tasks/{task_id}
pub async fn get_task_instance(
    State(state): State<AppState>,
    Path((dag_id, execution_date, task_id)): Path<(String, String, String)>,
) -> Result<Json<Map<String, Value>>, AppError> {
    let execution_date = parse_execution_date(&execution_date)?;
    let instance = state
        .lookup
        .task_instance(&dag_id, &task_id, execution_date)
        .await?;
    Ok(Json(to_view(&instance)))
}
