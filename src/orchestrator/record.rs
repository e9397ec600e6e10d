//! Decision records produced by the orchestrator and kept in the decision store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Intent label that routes a decision to task creation.
pub const TASK_INTENT: &str = "task";
/// Intent label that routes a decision to summarization.
pub const SUMMARIZE_INTENT: &str = "summarize";
/// Intent used when the intent collaborator does not return one.
pub const DEFAULT_INTENT: &str = "general";

/// How the processed text reached the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    Text,
    Voice,
}

/// Terminal status tag of a decision run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalDecision {
    TaskCreated,
    SummaryGenerated,
    ResponseGenerated,
}

impl FinalDecision {
    /// Terminal status for a detected intent label.
    pub fn for_intent(intent: &str) -> Self {
        match intent {
            TASK_INTENT => Self::TaskCreated,
            SUMMARIZE_INTENT => Self::SummaryGenerated,
            _ => Self::ResponseGenerated,
        }
    }
}

/// Outcome of one decision run.
///
/// Exactly one of `task` (task created) or `response` (summary/response
/// branches) is populated by the orchestrator; `response` may still be `None`
/// when the summarizer returns no summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub intent: String,
    pub processed_text: String,
    pub platform: String,
    pub device_context: String,
    pub input_mode: InputMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_classification: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    pub final_decision: FinalDecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<Value>,
    pub decided_at: DateTime<Utc>,
}
