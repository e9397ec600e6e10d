//! Action execution
//!
//! Turns a selected [`Action`] into a response payload: hash embeddings,
//! an LLM completion, or a canned reply.

use serde::{Deserialize, Serialize};

use super::intent::{Action, Intent};
use crate::embedding::EmbeddingPair;
use crate::error::LlmError;

/// Reply used whenever no language model can answer.
pub const LLM_UNAVAILABLE_RESPONSE: &str =
    "I'm sorry, but the LLM service is currently unavailable. This is a fallback response.";

pub const COMMAND_RESPONSE: &str = "Command executed successfully.";
pub const CONVERSATION_RESPONSE: &str =
    "Thank you for your message. How can I assist you further?";
pub const FALLBACK_RESPONSE: &str =
    "I'm not sure how to respond to that. Please try rephrasing your request.";

/// Response payload of a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    Text(String),
    Embedding(EmbeddingPair),
}

impl ResponsePayload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Embedding(_) => None,
        }
    }

    pub fn as_embedding(&self) -> Option<&EmbeddingPair> {
        match self {
            Self::Embedding(pair) => Some(pair),
            Self::Text(_) => None,
        }
    }
}

/// Synchronous route to an external language model.
pub trait LlmRouter: Send + Sync {
    /// Complete `message`. An `Err` degrades to [`LLM_UNAVAILABLE_RESPONSE`].
    fn complete(&self, message: &str, session_id: Option<&str>) -> Result<String, LlmError>;

    /// Router name for logging
    fn router_name(&self) -> &'static str;
}

/// Router used when no model is configured. Always unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableLlm;

impl LlmRouter for UnavailableLlm {
    fn complete(&self, _message: &str, _session_id: Option<&str>) -> Result<String, LlmError> {
        Err(LlmError::NotConfigured)
    }

    fn router_name(&self) -> &'static str {
        "unavailable"
    }
}

/// Canned reply for direct and fallback actions.
pub fn direct_response(intent: &Intent) -> &'static str {
    match intent {
        Intent::Command => COMMAND_RESPONSE,
        Intent::Conversation => CONVERSATION_RESPONSE,
        _ => FALLBACK_RESPONSE,
    }
}

/// Execute `action` for a normalized message.
pub fn execute(
    action: Action,
    intent: &Intent,
    message: &str,
    session_id: Option<&str>,
    llm: &dyn LlmRouter,
) -> ResponsePayload {
    match action {
        Action::Embed => ResponsePayload::Embedding(EmbeddingPair::compute(message)),
        Action::Llm => match llm.complete(message, session_id) {
            Ok(text) => ResponsePayload::Text(text),
            Err(e) => {
                tracing::debug!(
                    router = llm.router_name(),
                    error = %e,
                    "LLM unavailable, using fallback response"
                );
                ResponsePayload::Text(LLM_UNAVAILABLE_RESPONSE.to_string())
            }
        },
        Action::Direct | Action::Fallback => {
            ResponsePayload::Text(direct_response(intent).to_string())
        }
    }
}
