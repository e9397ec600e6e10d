//! Route tables.

use axum::middleware as axum_mw;
use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, ApiState};
use super::middleware::require_api_key;

/// `/api/*` routes, guarded by the API key check.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        // Pipeline
        .route("/respond", post(handlers::respond))
        .route("/decision", post(handlers::decision))
        .route("/external_llm", post(handlers::external_llm))
        .route("/intent", post(handlers::intent))
        // Embeddings
        .route("/embed", post(handlers::embed))
        .route("/embed/similarity", post(handlers::embed_similarity))
        // Voice
        .route("/voice_tts", post(handlers::voice_tts))
        .route("/voice_stt", post(handlers::voice_stt))
        .route("/summarize", post(handlers::summarize))
        // Decision hub
        .route("/decision_hub", post(handlers::decision_hub))
        .route("/decision_hub/memory", get(handlers::decision_memory))
        .layer(axum_mw::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

/// Unauthenticated system routes.
pub fn system_routes() -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::root))
}
