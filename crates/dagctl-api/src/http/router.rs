//! Axum router configuration with middleware.
//!
//! All routes are under `/api/experimental/`. Every route except `/test` sits
//! behind the authentication gate.
//! Middleware: CORS, tracing.

use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::auth::require_authentication;
use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // DAGs and runs
        .route("/dags/{dag_id}", get(handlers::dag::get_dag))
        .route("/dags/{dag_id}/dag_runs", post(handlers::dag_run::trigger_dag))
        .route(
            "/dags/{dag_id}/dag_runs/{execution_date}",
            get(handlers::dag_run::get_dag_run),
        )
        // Steps
        .route("/dags/{dag_id}/tasks/{task_id}", get(handlers::task::get_task))
        .route(
            "/dags/{dag_id}/dag_runs/{execution_date}/tasks/{task_id}",
            get(handlers::task::get_task_instance),
        )
        // XCom
        .route(
            "/dags/{dag_id}/tasks/{task_id}/instances/{execution_date}/xcom/{key}",
            get(handlers::xcom::get_xcom),
        )
        .route(
            "/dags/{dag_id}/tasks/{task_id}/instances/{execution_date}/xcom/{key}/{value}",
            post(handlers::xcom::set_xcom),
        )
        .route("/latest_runs", get(handlers::dag_run::latest_runs))
        // Gates only the routes registered above.
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_authentication,
        ))
        .route("/test", get(test_endpoint));

    Router::new()
        .nest("/api/experimental", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /api/experimental/test - Liveness probe (no auth required).
async fn test_endpoint() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}
