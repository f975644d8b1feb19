//! Authentication gate for the control API.
//!
//! Applied once with `route_layer`, so every route registered before it is
//! gated and handlers never check credentials themselves. A refused request
//! gets a bare `403 Forbidden`; the reason only goes to the log.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use dagctl_core::auth::CredentialVerifier;

use crate::state::AppState;

/// Resolve the caller and store the `Identity` in request extensions.
pub async fn require_authentication(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

    match state.verifier.authenticate(header.as_deref()).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(failure) => {
            tracing::info!(
                reason = %failure,
                path = %request.uri().path(),
                "API login failure"
            );
            forbidden()
        }
    }
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Forbidden",
    )
        .into_response()
}
