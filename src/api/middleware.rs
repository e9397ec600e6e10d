//! API middleware layers.
//!
//! Currently provides the `X-API-Key` credential check for `/api/*`.

use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::handlers::ApiState;
use crate::backend::API_KEY_HEADER;

/// Reject requests whose `X-API-Key` does not match `server.api_key`.
///
/// Pass-through when no key is configured. CORS preflight requests are
/// never challenged.
pub async fn require_api_key(
    State(state): State<ApiState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(request).await;
    };
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if presented == Some(expected) {
        next.run(request).await
    } else {
        tracing::warn!(path = %request.uri().path(), "Rejected request with bad API key");
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Authentication failed" })),
        )
            .into_response()
    }
}
