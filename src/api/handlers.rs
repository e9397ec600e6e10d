//! HTTP handlers for the pipeline and decision hub endpoints.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::config::ServerConfig;
use crate::embedding::{similarity_matrix, EmbeddingPair};
use crate::orchestrator::{
    DecisionOrchestrator, DecisionRequest, DEFAULT_DEVICE_CONTEXT, DEFAULT_PLATFORM,
};
use crate::pipeline::{Metadata, Pipeline, PipelineResult, ResponsePayload, RESPOND_SOURCE};

/// Upload MIME types accepted by `/api/voice_stt`.
pub const SUPPORTED_AUDIO_TYPES: &[&str] = &["audio/wav", "audio/mpeg", "audio/mp4", "audio/x-m4a"];

// ============================================================================
// State
// ============================================================================

/// Shared state for every handler.
#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Pipeline,
    pub orchestrator: DecisionOrchestrator,
    /// Required `X-API-Key` value for `/api/*`, if any.
    pub api_key: Option<String>,
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
}

impl ApiState {
    pub fn new(pipeline: Pipeline, orchestrator: DecisionOrchestrator, server: &ServerConfig) -> Self {
        Self {
            pipeline,
            orchestrator,
            api_key: server.api_key.clone(),
            cors_origins: server.cors_origins.clone(),
            max_upload_bytes: server.max_upload_bytes,
        }
    }
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionInput {
    pub input: String,
}

#[derive(Debug, Deserialize)]
pub struct LlmRequest {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct EmbedRequest {
    pub text: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SimilarityRequest {
    #[serde(default)]
    pub texts1: Vec<String>,
    #[serde(default)]
    pub texts2: Vec<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionHubRequest {
    pub input_text: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub device_context: Option<String>,
    #[serde(default)]
    pub voice_input: bool,
    /// Recorded audio, standard base64.
    #[serde(default)]
    pub audio_base64: Option<String>,
}

impl DecisionHubRequest {
    fn into_decision_request(self) -> Result<DecisionRequest, String> {
        let audio = self
            .audio_base64
            .filter(|a| !a.is_empty())
            .map(|a| BASE64.decode(a.as_bytes()))
            .transpose()
            .map_err(|e| format!("audio_base64 is not valid base64: {e}"))?;

        Ok(DecisionRequest {
            input_text: self.input_text,
            platform: self.platform.unwrap_or_else(|| DEFAULT_PLATFORM.to_string()),
            device_context: self
                .device_context
                .unwrap_or_else(|| DEFAULT_DEVICE_CONTEXT.to_string()),
            voice_input: self.voice_input,
            audio,
        })
    }
}

// ============================================================================
// Response bodies
// ============================================================================

#[derive(Debug, Serialize)]
pub struct EmbedResponse {
    pub embeddings: Vec<Vec<f64>>,
    pub obfuscated_embeddings: Vec<Vec<f64>>,
}

#[derive(Debug, Serialize)]
pub struct SimilarityResponse {
    pub similarities: Vec<Vec<f64>>,
}

// ============================================================================
// System
// ============================================================================

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Assistant Core API",
        "status": "running",
    }))
}

// ============================================================================
// Pipeline endpoints
// ============================================================================

fn source_metadata(source: &str) -> Metadata {
    let mut meta = Metadata::new();
    meta.insert("source".to_string(), Value::String(source.to_string()));
    meta
}

/// Metadata that pins the intent to embedding regardless of message length.
fn embed_metadata() -> Metadata {
    let mut meta = source_metadata("embed");
    meta.insert("intent".to_string(), Value::String("embedding".to_string()));
    meta
}

/// POST /api/respond
pub async fn respond(
    State(state): State<ApiState>,
    Json(req): Json<RespondRequest>,
) -> Json<PipelineResult> {
    let meta = source_metadata(RESPOND_SOURCE);
    Json(
        state
            .pipeline
            .process(&req.message, req.session_id.as_deref(), Some(&meta)),
    )
}

/// POST /api/decision
pub async fn decision(
    State(state): State<ApiState>,
    Json(req): Json<DecisionInput>,
) -> Json<PipelineResult> {
    let meta = source_metadata("decision_hub");
    Json(state.pipeline.process(&req.input, None, Some(&meta)))
}

/// POST /api/external_llm
pub async fn external_llm(
    State(state): State<ApiState>,
    Json(req): Json<LlmRequest>,
) -> Json<PipelineResult> {
    let meta = source_metadata("external_llm");
    Json(state.pipeline.process(&req.prompt, None, Some(&meta)))
}

/// POST /api/intent
pub async fn intent(State(state): State<ApiState>, Json(req): Json<TextRequest>) -> Response {
    let meta = source_metadata("intent");
    let result = state.pipeline.process(&req.text, None, Some(&meta));

    let Some(label) = result.intent().map(ToString::to_string) else {
        return ApiErrorResponse::bad_request(result.error_message().unwrap_or_default());
    };

    Json(json!({
        "message": format!("I detected that your intent is '{label}'."),
        "data": result,
        "meta": { "intent": label },
    }))
    .into_response()
}

fn embed_one(pipeline: &Pipeline, text: &str, session_id: Option<&str>) -> Result<EmbeddingPair, Response> {
    let result = pipeline.process(text, session_id, Some(&embed_metadata()));
    match result {
        PipelineResult::Success {
            response: ResponsePayload::Embedding(pair),
            ..
        } => Ok(pair),
        PipelineResult::Success { .. } => Err(ApiErrorResponse::internal(
            "pipeline did not produce an embedding",
        )),
        PipelineResult::Error { message } => Err(ApiErrorResponse::internal(message)),
    }
}

/// POST /api/embed
pub async fn embed(State(state): State<ApiState>, Json(req): Json<EmbedRequest>) -> Response {
    match embed_one(&state.pipeline, &req.text, req.session_id.as_deref()) {
        Ok(pair) => Json(EmbedResponse {
            embeddings: vec![pair.primary],
            obfuscated_embeddings: vec![pair.obfuscated],
        })
        .into_response(),
        Err(resp) => resp,
    }
}

/// POST /api/embed/similarity
///
/// Pairwise cosine similarity of the obfuscated vectors, one row per entry
/// of `texts1`.
pub async fn embed_similarity(
    State(state): State<ApiState>,
    Json(req): Json<SimilarityRequest>,
) -> Response {
    if req.texts1.is_empty() || req.texts2.is_empty() {
        return Json(SimilarityResponse {
            similarities: Vec::new(),
        })
        .into_response();
    }

    let session_id = req.session_id.as_deref();
    let obfuscated = |texts: &[String]| -> Result<Vec<Vec<f64>>, Response> {
        texts
            .iter()
            .map(|t| embed_one(&state.pipeline, t, session_id).map(|p| p.obfuscated))
            .collect()
    };

    let left = match obfuscated(&req.texts1) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let right = match obfuscated(&req.texts2) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    Json(SimilarityResponse {
        similarities: similarity_matrix(&left, &right),
    })
    .into_response()
}

/// POST /api/voice_tts
///
/// Mock synthesis: the audio is the base64 of `"Mock audio for: <reply>"`.
pub async fn voice_tts(State(state): State<ApiState>, Json(req): Json<TextRequest>) -> Response {
    let meta = source_metadata("voice_tts");
    let reply = match state.pipeline.process(&req.text, None, Some(&meta)) {
        PipelineResult::Success {
            response: ResponsePayload::Text(text),
            ..
        } => text,
        PipelineResult::Success { response, .. } => match serde_json::to_string(&response) {
            Ok(text) => text,
            Err(e) => return ApiErrorResponse::internal(e.to_string()),
        },
        PipelineResult::Error { message } => return ApiErrorResponse::internal(message),
    };

    let audio_base64 = BASE64.encode(format!("Mock audio for: {reply}"));
    Json(json!({
        "message": "Text converted to speech successfully",
        "data": { "audio_base64": audio_base64 },
        "meta": {},
    }))
    .into_response()
}

/// POST /api/voice_stt (multipart, `file` part)
///
/// Mock transcription routed through the pipeline.
pub async fn voice_stt(State(state): State<ApiState>, mut multipart: Multipart) -> Response {
    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return multipart_error(&e),
        };
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("audio").to_string();
        let content_type = field.content_type().map(str::to_string);
        match field.bytes().await {
            Ok(bytes) => upload = Some((file_name, content_type, bytes)),
            Err(e) => return multipart_error(&e),
        }
        break;
    }

    let Some((file_name, content_type, bytes)) = upload else {
        return ApiErrorResponse::bad_request("No audio file provided");
    };

    if bytes.len() > state.max_upload_bytes {
        return ApiErrorResponse::payload_too_large(format!(
            "File too large. Max allowed = {} bytes",
            state.max_upload_bytes
        ));
    }
    if !content_type
        .as_deref()
        .is_some_and(|ct| SUPPORTED_AUDIO_TYPES.contains(&ct))
    {
        return ApiErrorResponse::bad_request(format!(
            "Unsupported format. Supported: {}",
            SUPPORTED_AUDIO_TYPES.join(", ")
        ));
    }

    debug!(file = %file_name, bytes = bytes.len(), "Received speech upload");
    let transcript = format!("[Mock STT] Transcribed text from {file_name}");
    let meta = source_metadata("voice_stt");
    Json(state.pipeline.process(&transcript, None, Some(&meta))).into_response()
}

fn multipart_error(err: &axum::extract::multipart::MultipartError) -> Response {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiErrorResponse::payload_too_large(err.body_text())
    } else {
        ApiErrorResponse::bad_request(err.body_text())
    }
}

// ============================================================================
// Summaries
// ============================================================================

/// Word cap for the extractive mock summary.
pub const SUMMARY_MAX_WORDS: usize = 40;

/// Leading sentence of `text`, capped at [`SUMMARY_MAX_WORDS`] words.
fn extractive_summary(text: &str) -> (String, usize, bool) {
    let words: Vec<&str> = text.split_whitespace().collect();
    let sentence_end = words
        .iter()
        .position(|w| w.ends_with(&['.', '!', '?'][..]))
        .map_or(words.len(), |i| i + 1);
    let take = sentence_end.min(SUMMARY_MAX_WORDS);
    let truncated = take < words.len();

    let mut summary = words[..take].join(" ");
    if take == SUMMARY_MAX_WORDS && truncated {
        summary.push_str("...");
    }
    (summary, words.len(), truncated)
}

/// POST /api/summarize
///
/// Deterministic extractive summary, shaped as `{message, data: {summary}, meta}`.
pub async fn summarize(Json(req): Json<TextRequest>) -> Response {
    if req.text.trim().is_empty() {
        return ApiErrorResponse::bad_request("text must not be empty");
    }

    let (summary, word_count, truncated) = extractive_summary(&req.text);
    debug!(word_count, truncated, "Summarized text");
    Json(json!({
        "message": "I've summarized your text for you.",
        "data": {
            "summary": summary,
            "word_count": word_count,
            "truncated": truncated,
        },
        "meta": {},
    }))
    .into_response()
}

// ============================================================================
// Decision hub
// ============================================================================

/// POST /api/decision_hub
pub async fn decision_hub(
    State(state): State<ApiState>,
    Json(req): Json<DecisionHubRequest>,
) -> Response {
    let request = match req.into_decision_request() {
        Ok(r) => r,
        Err(msg) => return ApiErrorResponse::bad_request(msg),
    };

    match state.orchestrator.decide(request).await {
        Ok(record) => ApiResponse::ok(record),
        Err(e) => {
            info!(error = %e, "Decision request failed");
            ApiErrorResponse::from_decision(&e)
        }
    }
}

/// GET /api/decision_hub/memory
pub async fn decision_memory(State(state): State<ApiState>) -> Response {
    match state.orchestrator.memory().await {
        Ok(records) => ApiResponse::ok(records),
        Err(e) => ApiErrorResponse::from_decision(&e),
    }
}
