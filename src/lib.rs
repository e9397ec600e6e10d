//! Assistant Core: message orchestration and decision orchestration
//!
//! ## Architecture
//!
//! - **Pipeline**: stateless message routing (validate, intent, action, execute)
//! - **Embedding**: deterministic hash embeddings and cosine similarity
//! - **Backend**: HTTP client for the speech, intent, task and summary collaborators
//! - **Orchestrator**: composes collaborators into persisted decision records
//! - **Storage**: pluggable decision store (JSON file, sled, in-memory)
//! - **API**: axum surface over both entry points

pub mod api;
pub mod backend;
pub mod config;
pub mod embedding;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod storage;

// Re-export configuration
pub use config::AppConfig;

// Re-export errors
pub use error::{CollaboratorError, DecisionError, LlmError, PersistenceError, PipelineError};

// Re-export pipeline entry points
pub use pipeline::{process, Intent, Pipeline, PipelineResult};

// Re-export embeddings
pub use embedding::{cosine_similarity, EmbeddingPair};

// Re-export orchestrator components
pub use backend::{BackendClient, HttpBackendClient};
pub use orchestrator::{DecisionOrchestrator, DecisionRecord, DecisionRequest, FinalDecision};
pub use storage::{open_store, DecisionStore};
