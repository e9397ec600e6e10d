//! Intent detection and action selection
//!
//! Heuristics are evaluated in a fixed order and the first match wins:
//!
//! ```text
//! 1. contains "embed" OR fewer than 5 words  -> embedding
//! 2. contains "?" OR starts with what/how/why/when/where/who -> question
//! 3. starts with do/create/run/execute      -> command
//! 4. otherwise                              -> conversation
//! ```
//!
//! A caller-supplied `intent` in the metadata bypasses the heuristics.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::Metadata;

const QUESTION_PREFIXES: [&str; 6] = ["what", "how", "why", "when", "where", "who"];
const COMMAND_PREFIXES: [&str; 4] = ["do", "create", "run", "execute"];
const EMBEDDING_MIN_WORDS: usize = 5;

/// Classification label attached to every successful pipeline result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Intent {
    Embedding,
    Question,
    Command,
    Conversation,
    /// Echo path used by respond-style callers.
    Chat,
    /// Arbitrary caller-supplied override.
    Custom(String),
}

impl Intent {
    /// Map a label onto a known intent, keeping unknown labels verbatim.
    pub fn from_label(label: &str) -> Self {
        match label {
            "embedding" => Self::Embedding,
            "question" => Self::Question,
            "command" => Self::Command,
            "conversation" => Self::Conversation,
            "chat" => Self::Chat,
            other => Self::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Embedding => "embedding",
            Self::Question => "question",
            Self::Command => "command",
            Self::Conversation => "conversation",
            Self::Chat => "chat",
            Self::Custom(label) => label,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Intent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Intent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// What the pipeline does with a message once its intent is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Llm,
    Embed,
    Direct,
    Fallback,
}

/// Detect the intent of a normalized message.
pub fn detect_intent(message: &str, metadata: Option<&Metadata>) -> Intent {
    // Only a string override counts; anything else falls through to the heuristics
    if let Some(label) = metadata.and_then(|m| m.get("intent")).and_then(Value::as_str) {
        return Intent::from_label(label);
    }

    let lower = message.to_lowercase();
    if lower.contains("embed") || message.split_whitespace().count() < EMBEDDING_MIN_WORDS {
        Intent::Embedding
    } else if message.contains('?') || starts_with_any(&lower, &QUESTION_PREFIXES) {
        Intent::Question
    } else if starts_with_any(&lower, &COMMAND_PREFIXES) {
        Intent::Command
    } else {
        Intent::Conversation
    }
}

fn starts_with_any(text: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| text.starts_with(p))
}

/// Pure mapping from intent to action.
pub fn decide_action(intent: &Intent) -> Action {
    match intent {
        Intent::Embedding => Action::Embed,
        Intent::Question => Action::Llm,
        Intent::Command => Action::Direct,
        _ => Action::Fallback,
    }
}
