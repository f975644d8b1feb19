//! Application error type mapping to HTTP status codes.
//!
//! Every failure body is `{"error": message}`. Missing entities and duplicate
//! runs both answer 404, which is what existing API clients expect.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use dagctl_types::error::ControlError;
use dagctl_types::execution_date::InvalidExecutionDate;

#[derive(Debug)]
pub enum AppError {
    /// A service-level failure.
    Control(ControlError),
    /// The request body could not be understood.
    BadRequest(String),
}

impl From<ControlError> for AppError {
    fn from(e: ControlError) -> Self {
        AppError::Control(e)
    }
}

impl From<InvalidExecutionDate> for AppError {
    fn from(e: InvalidExecutionDate) -> Self {
        AppError::Control(e.into())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Control(ControlError::InvalidExecutionDate(_)) => StatusCode::BAD_REQUEST,
            AppError::Control(ControlError::DuplicateRun(_)) => StatusCode::NOT_FOUND,
            AppError::Control(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            AppError::Control(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Control(e) => e.to_string(),
            AppError::BadRequest(msg) => msg,
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "request failed");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dagctl_types::execution_date::parse_execution_date;

    #[test]
    fn test_status_mapping() {
        let bad_date: AppError = parse_execution_date("nope").unwrap_err().into();
        assert_eq!(bad_date.status(), StatusCode::BAD_REQUEST);

        let body = AppError::BadRequest("Invalid JSON body".to_string());
        assert_eq!(body.status(), StatusCode::BAD_REQUEST);

        let missing: AppError = ControlError::DagNotFound("x".to_string()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let duplicate: AppError = ControlError::DuplicateRun("exists".to_string()).into();
        assert_eq!(duplicate.status(), StatusCode::NOT_FOUND);

        let storage: AppError = ControlError::Storage("disk full".to_string()).into();
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_error_body() {
        let response =
            AppError::from(ControlError::DagNotFound("etl_daily".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "Dag id etl_daily not found" }));
    }
}
