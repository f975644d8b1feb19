//! Run handlers: trigger, run introspection, and the latest-runs listing.

use std::fmt::Write as _;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value, json};

use dagctl_core::view::dag_run_view;
use dagctl_types::auth::Identity;
use dagctl_types::execution_date::{iso_format, parse_execution_date};
use dagctl_types::run::{TriggerRequest, WorkflowRun};

use crate::http::error::AppError;
use crate::state::AppState;

/// One entry of `GET /latest_runs`.
#[derive(Debug, Serialize)]
pub struct LatestRunItem {
    pub dag_id: String,
    pub execution_date: String,
    pub start_date: String,
    pub dag_run_url: String,
}

/// POST /api/experimental/dags/{dag_id}/dag_runs - Trigger a new run.
///
/// The body is read regardless of content type; an empty body triggers with
/// defaults.
pub async fn trigger_dag(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
    Path(dag_id): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let request = parse_trigger_body(&body)?;
    let run = state.trigger_service.trigger(&dag_id, request).await?;

    let user = identity.map_or(Identity::Anonymous, |Extension(identity)| identity);
    tracing::info!(dag_id = %run.dag_id, run_id = %run.run_id, "User {user} created {run}");

    Ok(Json(json!({ "message": format!("Created {run}") })))
}

/// GET /api/experimental/dags/{dag_id}/dag_runs/{execution_date}
pub async fn get_dag_run(
    State(state): State<AppState>,
    Path((dag_id, execution_date)): Path<(String, String)>,
) -> Result<Json<Map<String, Value>>, AppError> {
    let execution_date = parse_execution_date(&execution_date)?;

    let (run, instances) = state
        .lookup
        .dag_run_with_instances(&dag_id, execution_date)
        .await?;

    Ok(Json(dag_run_view(&run, &instances)))
}

/// GET /api/experimental/latest_runs - The most recent run of every DAG.
pub async fn latest_runs(
    State(state): State<AppState>,
) -> Result<Json<Vec<LatestRunItem>>, AppError> {
    let runs = state.lookup.latest_runs().await?;
    let base = state.config.server.web_base_url.trim_end_matches('/');

    Ok(Json(
        runs.iter().map(|run| latest_run_item(run, base)).collect(),
    ))
}

fn parse_trigger_body(body: &[u8]) -> Result<TriggerRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(TriggerRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))
}

fn latest_run_item(run: &WorkflowRun, web_base_url: &str) -> LatestRunItem {
    LatestRunItem {
        dag_id: run.dag_id.clone(),
        execution_date: short_format(&run.execution_date),
        start_date: run.start_date.as_ref().map(short_format).unwrap_or_default(),
        dag_run_url: format!(
            "{web_base_url}/graph?dag_id={}&execution_date={}",
            encode_query_component(&run.dag_id),
            encode_query_component(&iso_format(&run.execution_date)),
        ),
    }
}

fn short_format(date: &NaiveDateTime) -> String {
    date.format("%Y-%m-%d %H:%M").to_string()
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_query_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagctl_types::run::RunState;

    #[test]
    fn test_parse_trigger_body() {
        assert!(parse_trigger_body(b"").unwrap().run_id.is_none());
        assert!(parse_trigger_body(b"  \n").unwrap().execution_date.is_none());

        let request = parse_trigger_body(br#"{"runId": "r1", "conf": {"a": 1}}"#).unwrap();
        assert_eq!(request.run_id.as_deref(), Some("r1"));
        assert_eq!(request.conf, Some(json!({"a": 1})));

        let err = parse_trigger_body(b"{not json").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_encode_query_component() {
        assert_eq!(encode_query_component("etl_daily"), "etl_daily");
        assert_eq!(
            encode_query_component("2024-01-01T00:00:00"),
            "2024-01-01T00%3A00%3A00"
        );
        assert_eq!(encode_query_component("a b&c"), "a%20b%26c");
    }

    #[test]
    fn test_latest_run_item() {
        let date = parse_execution_date("2024-01-01T06:30:00").unwrap();
        let mut run = WorkflowRun {
            id: uuid::Uuid::now_v7(),
            dag_id: "etl daily".to_string(),
            run_id: "r1".to_string(),
            execution_date: date,
            state: RunState::Running,
            start_date: None,
            end_date: None,
            external_trigger: true,
            conf: None,
        };

        let item = latest_run_item(&run, "/admin");
        assert_eq!(item.execution_date, "2024-01-01 06:30");
        assert_eq!(item.start_date, "");
        assert_eq!(
            item.dag_run_url,
            "/admin/graph?dag_id=etl%20daily&execution_date=2024-01-01T06%3A30%3A00"
        );

        run.start_date = Some(parse_execution_date("2024-01-02T07:45:10").unwrap());
        assert_eq!(latest_run_item(&run, "/admin").start_date, "2024-01-02 07:45");
    }
}
