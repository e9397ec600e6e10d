//! HTTP implementation of [`BackendClient`].

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::{json, Value};

use super::{BackendClient, IntentDetection, Summary, Transcription};
use crate::config::BackendConfig;
use crate::error::CollaboratorError;

/// Header carrying the caller credential.
pub const API_KEY_HEADER: &str = "X-API-Key";

const AUDIO_FILE_NAME: &str = "audio.wav";

/// HTTP client for the backend collaborators
#[derive(Clone)]
pub struct HttpBackendClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpBackendClient {
    /// Build a client from validated backend settings.
    pub fn new(config: &BackendConfig) -> Result<Self, CollaboratorError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CollaboratorError::from_reqwest("client", e))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        capability: &'static str,
        path: &str,
        body: &B,
    ) -> Result<Value, CollaboratorError> {
        let request = self.http.post(self.url(path)).json(body);
        self.send(capability, request).await
    }

    async fn send(
        &self,
        capability: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, CollaboratorError> {
        let resp = request
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(capability, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CollaboratorError::Status {
                capability,
                status: status.as_u16(),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| CollaboratorError::from_reqwest(capability, e))?;
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| CollaboratorError::Malformed {
                capability,
                reason: e.to_string(),
            })?;

        tracing::debug!(capability, status = status.as_u16(), "Collaborator call succeeded");
        Ok(value)
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn speech_to_text(
        &self,
        audio: Vec<u8>,
        mime_type: &str,
    ) -> Result<Transcription, CollaboratorError> {
        const CAPABILITY: &str = "speech_to_text";

        let part = Part::bytes(audio)
            .file_name(AUDIO_FILE_NAME)
            .mime_str(mime_type)
            .map_err(|e| CollaboratorError::Malformed {
                capability: CAPABILITY,
                reason: format!("invalid mime type '{mime_type}': {e}"),
            })?;
        let form = Form::new().part("file", part);

        let request = self.http.post(self.url("/api/voice_stt")).multipart(form);
        self.send(CAPABILITY, request).await.map(Transcription)
    }

    async fn speech_synthesis(&self, text: &str, voice: &str) -> Result<Value, CollaboratorError> {
        self.post_json(
            "speech_synthesis",
            "/api/voice_tts",
            &json!({ "text": text, "voice": voice }),
        )
        .await
    }

    async fn detect_intent(&self, text: &str) -> Result<IntentDetection, CollaboratorError> {
        self.post_json("detect_intent", "/api/intent", &json!({ "text": text }))
            .await
            .map(IntentDetection)
    }

    async fn classify_task(&self, intent: &IntentDetection) -> Result<Value, CollaboratorError> {
        self.post_json("classify_task", "/api/task", intent.as_value())
            .await
    }

    async fn create_task(&self, description: &str) -> Result<Value, CollaboratorError> {
        self.post_json(
            "create_task",
            "/api/tasks",
            &json!({ "description": description }),
        )
        .await
    }

    async fn summarize(&self, text: &str) -> Result<Summary, CollaboratorError> {
        self.post_json("summarize", "/api/summarize", &json!({ "text": text }))
            .await
            .map(Summary)
    }

    fn client_name(&self) -> &'static str {
        "http"
    }
}
