//! Message Orchestration Pipeline
//!
//! ## Stages
//!
//! ```text
//! STAGE 0: Short-circuit (metadata source = "respond" -> echo, intent "chat")
//! STAGE 1: Validate & normalize (must be text, trimmed, non-empty)
//! STAGE 2: Detect intent (metadata override, else ordered heuristics)
//! STAGE 3: Decide action (embedding->embed, question->llm, command->direct, else fallback)
//! STAGE 4: Execute (hash embeddings, LLM route, or canned reply)
//! STAGE 5: Format (status, session id, intent, response, metadata)
//! ```
//!
//! The pipeline never fails: every error is folded into
//! [`PipelineResult::Error`]. It holds no mutable state, so any number of
//! invocations may run concurrently.

pub mod executor;
pub mod intent;

pub use executor::{LlmRouter, ResponsePayload, UnavailableLlm};
pub use intent::{decide_action, detect_intent, Action, Intent};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::PipelineError;

/// Free-form caller metadata (`source`, `intent`, `user_id`, ...).
pub type Metadata = serde_json::Map<String, Value>;

/// Metadata `source` value that selects the echo short-circuit.
pub const RESPOND_SOURCE: &str = "respond";

/// Outcome of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PipelineResult {
    Success {
        session_id: Option<String>,
        intent: Intent,
        response: ResponsePayload,
        meta: Metadata,
    },
    Error {
        message: String,
    },
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn intent(&self) -> Option<&Intent> {
        match self {
            Self::Success { intent, .. } => Some(intent),
            Self::Error { .. } => None,
        }
    }

    pub fn response(&self) -> Option<&ResponsePayload> {
        match self {
            Self::Success { response, .. } => Some(response),
            Self::Error { .. } => None,
        }
    }

    /// Error message, if the run failed.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            Self::Success { .. } => None,
        }
    }
}

/// Echo reply for respond-style callers.
pub fn chat_response(message: &str) -> String {
    format!("I received your message: '{message}'. How can I help you today?")
}

/// Stateless pipeline with an injectable LLM route.
#[derive(Clone)]
pub struct Pipeline {
    llm: Arc<dyn LlmRouter>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("llm", &self.llm.router_name())
            .finish()
    }
}

impl Pipeline {
    /// Pipeline whose LLM route is always unavailable.
    pub fn new() -> Self {
        Self {
            llm: Arc::new(UnavailableLlm),
        }
    }

    pub fn with_llm(llm: Arc<dyn LlmRouter>) -> Self {
        Self { llm }
    }

    /// Process a text message.
    pub fn process(
        &self,
        message: &str,
        session_id: Option<&str>,
        metadata: Option<&Metadata>,
    ) -> PipelineResult {
        self.process_value(&Value::String(message.to_string()), session_id, metadata)
    }

    /// Process an untyped message. Non-string values are rejected as
    /// invalid input unless the respond short-circuit applies.
    pub fn process_value(
        &self,
        message: &Value,
        session_id: Option<&str>,
        metadata: Option<&Metadata>,
    ) -> PipelineResult {
        match self.run_stages(message, session_id, metadata) {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Pipeline processing failed");
                PipelineResult::Error {
                    message: format!("Pipeline processing failed: {e}"),
                }
            }
        }
    }

    fn run_stages(
        &self,
        message: &Value,
        session_id: Option<&str>,
        metadata: Option<&Metadata>,
    ) -> Result<PipelineResult, PipelineError> {
        if is_respond_source(metadata) {
            let text = match message {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Ok(PipelineResult::Success {
                session_id: session_id.map(str::to_string),
                intent: Intent::Chat,
                response: ResponsePayload::Text(chat_response(&text)),
                meta: metadata.cloned().unwrap_or_default(),
            });
        }

        let normalized = validate_and_normalize(message)?;
        let intent = detect_intent(normalized, metadata);
        let action = decide_action(&intent);
        debug!(intent = %intent, action = ?action, "Pipeline routed message");

        let response = executor::execute(action, &intent, normalized, session_id, self.llm.as_ref());

        Ok(PipelineResult::Success {
            session_id: session_id.map(str::to_string),
            intent,
            response,
            meta: metadata.cloned().unwrap_or_default(),
        })
    }
}

/// Process a message with the default pipeline.
pub fn process(
    message: &str,
    session_id: Option<&str>,
    metadata: Option<&Metadata>,
) -> PipelineResult {
    Pipeline::new().process(message, session_id, metadata)
}

fn is_respond_source(metadata: Option<&Metadata>) -> bool {
    metadata
        .and_then(|m| m.get("source"))
        .and_then(Value::as_str)
        == Some(RESPOND_SOURCE)
}

fn validate_and_normalize(message: &Value) -> Result<&str, PipelineError> {
    let text = message
        .as_str()
        .ok_or_else(|| PipelineError::InvalidInput("Message must be a string".to_string()))?;
    let normalized = text.trim();
    if normalized.is_empty() {
        return Err(PipelineError::InvalidInput(
            "Message cannot be empty after trimming".to_string(),
        ));
    }
    Ok(normalized)
}
