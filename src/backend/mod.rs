//! Backend Service Client
//!
//! Uniform interface to the named backend capabilities the decision
//! orchestrator composes:
//!
//! | capability        | endpoint            | request                     |
//! |-------------------|---------------------|-----------------------------|
//! | speech_to_text    | `/api/voice_stt`    | multipart `file`            |
//! | speech_synthesis  | `/api/voice_tts`    | `{text, voice}`             |
//! | detect_intent     | `/api/intent`       | `{text}`                    |
//! | classify_task     | `/api/task`         | intent detection result     |
//! | create_task       | `/api/tasks`        | `{description}`             |
//! | summarize         | `/api/summarize`    | `{text}`                    |
//!
//! Every call carries the configured `X-API-Key` credential and a bounded
//! timeout. Non-success responses are [`CollaboratorError`]s.

mod client;

pub use client::{HttpBackendClient, API_KEY_HEADER};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CollaboratorError;

/// Speech-to-text result.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcription(pub Value);

impl Transcription {
    /// Transcribed text, when the collaborator returned one.
    pub fn text(&self) -> Option<&str> {
        self.0.get("text").and_then(Value::as_str)
    }
}

/// Intent detection result: `{intent, ...auxiliary fields}`.
///
/// Also accepts the enveloped shape `{message, data, meta: {intent}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentDetection(pub Value);

impl IntentDetection {
    pub fn label(&self) -> Option<&str> {
        self.0
            .get("intent")
            .or_else(|| self.0.pointer("/meta/intent"))
            .and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// Summarization result: `{summary}` or `{data: {summary}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary(pub Value);

impl Summary {
    pub fn text(&self) -> Option<&str> {
        self.0
            .get("summary")
            .or_else(|| self.0.pointer("/data/summary"))
            .and_then(Value::as_str)
    }
}

/// Named backend capabilities.
#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn speech_to_text(
        &self,
        audio: Vec<u8>,
        mime_type: &str,
    ) -> Result<Transcription, CollaboratorError>;

    /// Returns the synthesized audio payload as sent by the collaborator.
    async fn speech_synthesis(&self, text: &str, voice: &str) -> Result<Value, CollaboratorError>;

    async fn detect_intent(&self, text: &str) -> Result<IntentDetection, CollaboratorError>;

    async fn classify_task(&self, intent: &IntentDetection) -> Result<Value, CollaboratorError>;

    /// Returns the task reference created by the collaborator.
    async fn create_task(&self, description: &str) -> Result<Value, CollaboratorError>;

    async fn summarize(&self, text: &str) -> Result<Summary, CollaboratorError>;

    /// Client name for logging
    fn client_name(&self) -> &'static str;
}
