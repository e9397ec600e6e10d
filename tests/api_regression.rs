//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! every endpoint using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port.

mod common;

use assistant_core::api::create_app;
use assistant_core::config::{BackendConfig, ServerConfig};
use assistant_core::orchestrator::{
    DecisionOrchestrator, DecisionRequest, DecisionSettings, FinalDecision,
};
use assistant_core::storage::{DecisionStore, InMemoryStore};
use assistant_core::HttpBackendClient;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use common::{api_state, BrokenStore, FakeBackend};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "assistant-test-boundary";

fn app_with(backend: FakeBackend, store: Arc<dyn DecisionStore>, server: &ServerConfig) -> Router {
    create_app(api_state(backend, store, server))
}

fn app() -> Router {
    app_with(
        FakeBackend::default(),
        Arc::new(InMemoryStore::new()),
        &ServerConfig::default(),
    )
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn multipart_upload(file_name: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/voice_stt")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

// ============================================================================
// System
// ============================================================================

#[tokio::test]
async fn health_and_root() {
    let (status, body) = send(app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
    assert!(body["version"].is_string());

    let (status, body) = send(app(), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
}

#[tokio::test]
async fn api_key_guards_api_routes_only() {
    let server = ServerConfig {
        api_key: Some("sesame".to_string()),
        ..ServerConfig::default()
    };
    let build = || app_with(FakeBackend::default(), Arc::new(InMemoryStore::new()), &server);
    let body = json!({"message": "hi", "session_id": "s"});

    let (status, json) = send(build(), post_json("/api/respond", &body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["detail"], "Authentication failed");

    let mut wrong = post_json("/api/respond", &body);
    wrong.headers_mut().insert("x-api-key", "nope".parse().unwrap());
    assert_eq!(send(build(), wrong).await.0, StatusCode::UNAUTHORIZED);

    let mut right = post_json("/api/respond", &body);
    right.headers_mut().insert("x-api-key", "sesame".parse().unwrap());
    assert_eq!(send(build(), right).await.0, StatusCode::OK);

    assert_eq!(send(build(), get("/health")).await.0, StatusCode::OK);
}

// ============================================================================
// Pipeline endpoints
// ============================================================================

#[tokio::test]
async fn respond_echoes_message() {
    let (status, body) = send(
        app(),
        post_json("/api/respond", &json!({"message": "hi", "session_id": "s-9"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["intent"], "chat");
    assert_eq!(body["session_id"], "s-9");
    assert_eq!(
        body["response"],
        "I received your message: 'hi'. How can I help you today?"
    );
    assert_eq!(body["meta"]["source"], "respond");
}

#[tokio::test]
async fn decision_and_external_llm_route_through_pipeline() {
    let (status, body) = send(
        app(),
        post_json("/api/decision", &json!({"input": "Create a report for the board meeting"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intent"], "command");
    assert_eq!(body["response"], "Command executed successfully.");
    assert_eq!(body["meta"]["source"], "decision_hub");

    let (_, body) = send(
        app(),
        post_json("/api/external_llm", &json!({"prompt": "   "})),
    )
    .await;
    assert_eq!(body["status"], "error");
    assert_eq!(
        body["message"],
        "Pipeline processing failed: Message cannot be empty after trimming"
    );
}

#[tokio::test]
async fn intent_reports_detected_label() {
    let (status, body) = send(
        app(),
        post_json("/api/intent", &json!({"text": "What time does the store open?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "I detected that your intent is 'question'.");
    assert_eq!(body["meta"]["intent"], "question");
    assert_eq!(body["data"]["status"], "success");

    let (status, body) = send(app(), post_json("/api/intent", &json!({"text": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn embed_returns_both_vectors_for_long_text() {
    let (status, body) = send(
        app(),
        post_json(
            "/api/embed",
            &json!({"text": "a sentence that is clearly longer than five words", "session_id": "e"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["embeddings"][0].as_array().unwrap().len(), 384);
    assert_eq!(body["obfuscated_embeddings"][0].as_array().unwrap().len(), 384);
    assert_ne!(body["embeddings"][0], body["obfuscated_embeddings"][0]);
}

#[tokio::test]
async fn similarity_matrix_shape() {
    let (status, body) = send(
        app(),
        post_json(
            "/api/embed/similarity",
            &json!({"texts1": ["alpha", "beta"], "texts2": ["alpha", "gamma", "delta"], "session_id": "s"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["similarities"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].as_array().unwrap().len(), 3);
    let same = rows[0][0].as_f64().unwrap();
    assert!((same - 1.0).abs() < 1e-9, "identical texts scored {same}");

    let (status, body) = send(
        app(),
        post_json("/api/embed/similarity", &json!({"texts1": [], "texts2": ["x"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["similarities"], json!([]));
}

#[tokio::test]
async fn voice_tts_returns_mock_audio() {
    let (status, body) = send(
        app(),
        post_json("/api/voice_tts", &json!({"text": "Create a reminder for tomorrow morning please"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Text converted to speech successfully");

    let audio = BASE64
        .decode(body["data"]["audio_base64"].as_str().unwrap())
        .unwrap();
    assert_eq!(
        String::from_utf8(audio).unwrap(),
        "Mock audio for: Command executed successfully."
    );
}

#[tokio::test]
async fn voice_stt_transcribes_supported_upload() {
    let (status, body) = send(app(), multipart_upload("memo.wav", "audio/wav", b"RIFF")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["intent"], "conversation");
    assert_eq!(body["meta"]["source"], "voice_stt");
}

#[tokio::test]
async fn voice_stt_rejects_bad_uploads() {
    let (status, body) = send(app(), multipart_upload("notes.txt", "text/plain", b"hello")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Unsupported format"));

    let server = ServerConfig {
        max_upload_bytes: 16,
        ..ServerConfig::default()
    };
    let small = app_with(FakeBackend::default(), Arc::new(InMemoryStore::new()), &server);
    let (status, body) = send(small, multipart_upload("long.wav", "audio/wav", &[0u8; 64])).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");

    let mut other_field = multipart_upload("memo.wav", "audio/wav", b"RIFF");
    let renamed = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{BOUNDARY}--\r\n"
    );
    *other_field.body_mut() = Body::from(renamed);
    let (status, body) = send(app(), other_field).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "No audio file provided");
}

// ============================================================================
// Summaries
// ============================================================================

#[tokio::test]
async fn summarize_returns_leading_sentence() {
    let (status, body) = send(
        app(),
        post_json(
            "/api/summarize",
            &json!({"text": "The release slipped a week. QA found two blockers in the installer."}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "I've summarized your text for you.");
    assert_eq!(body["data"]["summary"], "The release slipped a week.");
    assert_eq!(body["data"]["word_count"], 12);
    assert_eq!(body["data"]["truncated"], true);

    let long = vec!["word"; 60].join(" ");
    let (_, body) = send(app(), post_json("/api/summarize", &json!({"text": long}))).await;
    let summary = body["data"]["summary"].as_str().unwrap();
    assert!(summary.ends_with("..."));
    assert_eq!(summary.trim_end_matches("...").split_whitespace().count(), 40);

    let (status, _) = send(app(), post_json("/api/summarize", &json!({"text": "   "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Decision hub
// ============================================================================

#[tokio::test]
async fn decision_hub_records_and_lists_decisions() {
    let store: Arc<dyn DecisionStore> = Arc::new(InMemoryStore::new());
    let server = ServerConfig::default();

    let (status, body) = send(
        app_with(FakeBackend::default(), store.clone(), &server),
        post_json(
            "/api/decision_hub",
            &json!({"input_text": "task: book flights", "platform": "mobile"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["final_decision"], "task_created");
    assert_eq!(body["data"]["platform"], "mobile");
    assert_eq!(body["data"]["device_context"], "desktop");
    assert_eq!(body["data"]["input_mode"], "text");

    let (status, body) = send(
        app_with(FakeBackend::default(), store, &server),
        get("/api/decision_hub/memory"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["task: book flights"]["intent"],
        "task"
    );
}

#[tokio::test]
async fn decision_hub_voice_input_decodes_audio() {
    let audio = BASE64.encode("summarize: the spoken memo");
    let (status, body) = send(
        app(),
        post_json(
            "/api/decision_hub",
            &json!({"input_text": "", "voice_input": true, "audio_base64": audio}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["input_mode"], "voice");
    assert_eq!(body["data"]["processed_text"], "summarize: the spoken memo");
    assert_eq!(body["data"]["final_decision"], "summary_generated");
    assert!(body["data"]["voice"].is_object());
}

#[tokio::test]
async fn decision_hub_error_statuses() {
    let (status, body) = send(
        app_with(
            FakeBackend::failing("detect_intent"),
            Arc::new(InMemoryStore::new()),
            &ServerConfig::default(),
        ),
        post_json("/api/decision_hub", &json!({"input_text": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["message"], "detect_intent returned status 503");

    let (status, _) = send(
        app(),
        post_json("/api/decision_hub", &json!({"input_text": "hello", "voice_input": true})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        app(),
        post_json(
            "/api/decision_hub",
            &json!({"input_text": "hello", "voice_input": true, "audio_base64": "%%%"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("base64"));
}

#[tokio::test]
async fn decision_hub_store_fault_is_internal_error() {
    let store: Arc<dyn DecisionStore> = Arc::new(BrokenStore);
    let server = ServerConfig::default();

    let (status, body) = send(
        app_with(FakeBackend::default(), store.clone(), &server),
        post_json("/api/decision_hub", &json!({"input_text": "task: book flights"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");

    let (status, _) = send(
        app_with(FakeBackend::default(), store, &server),
        get("/api/decision_hub/memory"),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn decisions_resolve_against_this_service() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let served = create_app(api_state(
        FakeBackend::default(),
        Arc::new(InMemoryStore::new()),
        &ServerConfig::default(),
    ));
    tokio::spawn(async move {
        axum::serve(listener, served).await.unwrap();
    });

    let backend = HttpBackendClient::new(&BackendConfig {
        base_url: format!("http://{addr}"),
        ..BackendConfig::default()
    })
    .unwrap();
    let store = Arc::new(InMemoryStore::new());
    let orch = DecisionOrchestrator::new(
        Arc::new(backend),
        store.clone(),
        DecisionSettings::default(),
    );

    let text = "please summarize the meeting notes for me";
    let record = orch.decide(DecisionRequest::text(text)).await.unwrap();
    assert_eq!(record.intent, "conversation");
    assert_eq!(record.final_decision, FinalDecision::ResponseGenerated);
    assert_eq!(record.response.as_deref(), Some(text));
    assert!(record.task_classification.is_none());
    assert!(store.get(text).await.unwrap().is_some());
}
