//! Response envelope for the decision hub endpoints and for every error.
//!
//! Successes are wrapped in [`ApiResponse`], failures in [`ApiErrorResponse`].
//! The pipeline-backed endpoints keep their historical bare shapes on
//! success but still report errors through [`ApiErrorResponse`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;

use crate::error::DecisionError;

/// Metadata included in every enveloped response.
#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
    pub version: &'static str,
}

impl Default for ResponseMeta {
    fn default() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Successful response: `{ "data": T, "meta": { ... } }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Response {
        let body = Self {
            data,
            meta: ResponseMeta::default(),
        };
        (StatusCode::OK, axum::Json(body)).into_response()
    }
}

/// Error detail inside [`ApiErrorResponse`].
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Error response: `{ "error": { "code": "...", "message": "..." }, "meta": { ... } }`
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ErrorDetail,
    pub meta: ResponseMeta,
}

impl ApiErrorResponse {
    fn build(status: StatusCode, code: &str, msg: impl Into<String>) -> Response {
        let body = Self {
            error: ErrorDetail {
                code: code.to_string(),
                message: msg.into(),
            },
            meta: ResponseMeta::default(),
        };
        (status, axum::Json(body)).into_response()
    }

    pub fn bad_request(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
    }

    pub fn payload_too_large(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg)
    }

    pub fn internal(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Response {
        Self::build(StatusCode::BAD_GATEWAY, "BAD_GATEWAY", msg)
    }

    /// Map an orchestrator failure onto its HTTP status.
    pub fn from_decision(err: &DecisionError) -> Response {
        match err {
            DecisionError::InvalidInput(_) => Self::bad_request(err.to_string()),
            DecisionError::Collaborator(_) => Self::bad_gateway(err.to_string()),
            DecisionError::Persistence(_) => Self::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CollaboratorError, PersistenceError};

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ok_response_shape() {
        let resp = ApiResponse::ok(serde_json::json!({"hello": "world"}));
        assert_eq!(resp.status(), StatusCode::OK);

        let v = body_json(resp).await;
        assert_eq!(v["data"]["hello"], "world");
        assert_eq!(v["meta"]["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_decision_error_statuses() {
        let invalid = DecisionError::InvalidInput("no audio".to_string());
        assert_eq!(
            ApiErrorResponse::from_decision(&invalid).status(),
            StatusCode::BAD_REQUEST
        );

        let upstream: DecisionError = CollaboratorError::Timeout {
            capability: "detect_intent",
        }
        .into();
        let resp = ApiErrorResponse::from_decision(&upstream);
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let v = body_json(resp).await;
        assert_eq!(v["error"]["code"], "BAD_GATEWAY");
        assert_eq!(v["error"]["message"], "detect_intent timed out");

        let store: DecisionError = PersistenceError::Lock("poisoned".to_string()).into();
        assert_eq!(
            ApiErrorResponse::from_decision(&store).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
