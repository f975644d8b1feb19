//! DAG introspection handlers.

use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Map, Value};

use dagctl_core::view::dag_view;

use crate::http::error::AppError;
use crate::state::AppState;

/// GET /api/experimental/dags/{dag_id} - Definition view plus its running runs.
pub async fn get_dag(
    State(state): State<AppState>,
    Path(dag_id): Path<String>,
) -> Result<Json<Map<String, Value>>, AppError> {
    let def = state.lookup.dag(&dag_id).await?;
    let active = state.lookup.active_run_dates(&def.dag_id).await?;
    Ok(Json(dag_view(&def, &active)))
}
