//! Error taxonomy shared by the pipeline, the backend client, the decision
//! store and the decision orchestrator.
//!
//! - [`PipelineError`]: rejected input. Never escapes [`crate::pipeline::process`].
//! - [`LlmError`]: a language model route could not answer; degrades to a
//!   canned reply.
//! - [`CollaboratorError`]: any backend call failing (timeout, non-success
//!   status, transport fault, malformed body).
//! - [`PersistenceError`]: decision store read/write faults.
//! - [`DecisionError`]: everything the orchestrator can hand back to its caller.

use std::path::PathBuf;

/// Errors raised inside the message pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    InvalidInput(String),
}

/// A language model route could not produce a completion.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("no language model configured")]
    NotConfigured,
    #[error("{router} completion failed: {reason}")]
    Completion { router: &'static str, reason: String },
}

/// A backend collaborator call failed.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{capability} request failed: {source}")]
    Http {
        capability: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{capability} timed out")]
    Timeout { capability: &'static str },
    #[error("{capability} returned status {status}")]
    Status {
        capability: &'static str,
        status: u16,
    },
    #[error("{capability} returned a malformed response: {reason}")]
    Malformed {
        capability: &'static str,
        reason: String,
    },
}

impl CollaboratorError {
    /// Capability name of the collaborator that failed.
    pub fn capability(&self) -> &'static str {
        match self {
            Self::Http { capability, .. }
            | Self::Timeout { capability }
            | Self::Status { capability, .. }
            | Self::Malformed { capability, .. } => capability,
        }
    }

    /// Classify a transport error, separating timeouts from everything else.
    pub(crate) fn from_reqwest(capability: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { capability }
        } else if let Some(status) = err.status() {
            Self::Status {
                capability,
                status: status.as_u16(),
            }
        } else {
            Self::Http {
                capability,
                source: err,
            }
        }
    }
}

/// Decision store errors.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("store I/O error ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sled::Error),
    #[error("store lock poisoned: {0}")]
    Lock(String),
}

/// Errors surfaced by [`crate::orchestrator::DecisionOrchestrator::decide`].
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error("invalid decision request: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
