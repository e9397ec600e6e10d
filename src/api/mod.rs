//! REST API module using Axum
//!
//! Thin HTTP glue over the two entry points:
//! - `/api/respond`, `/api/intent`, `/api/embed`, ... drive the message pipeline
//! - `/api/decision_hub` drives the decision orchestrator
//! - `/health` and `/` report liveness without authentication

pub mod envelope;
pub mod handlers;
pub mod middleware;
mod routes;

pub use handlers::ApiState;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and headers on top of the upload limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build a CORS layer that is restrictive by default (same-origin only).
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-api-key"), // X-API-Key
        ]);

    if origins.is_empty() {
        return base;
    }

    let allowed: Vec<_> = origins.iter().filter_map(|o| o.trim().parse().ok()).collect();
    tracing::info!(origins = ?origins, "CORS: allowing configured origins");
    base.allow_origin(allowed)
}

/// Create the complete application router.
pub fn create_app(state: ApiState) -> Router {
    let cors = build_cors_layer(&state.cors_origins);
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .nest("/api", routes::api_routes(state))
        .merge(routes::system_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
