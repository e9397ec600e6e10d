//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use assistant_core::api::ApiState;
use assistant_core::backend::{BackendClient, IntentDetection, Summary, Transcription};
use assistant_core::config::ServerConfig;
use assistant_core::error::{CollaboratorError, PersistenceError};
use assistant_core::orchestrator::{DecisionOrchestrator, DecisionSettings};
use assistant_core::pipeline::Pipeline;
use assistant_core::orchestrator::DecisionRecord;
use assistant_core::storage::{DecisionMap, DecisionStore};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// In-process stand-in for the backend collaborators.
///
/// Intent is read from a `task:` / `summarize:` prefix on the text so one
/// instance can drive every branch.
#[derive(Debug, Default, Clone)]
pub struct FakeBackend {
    /// Capability that always fails with a 503.
    pub failing: Option<&'static str>,
    /// Delay applied to intent detection, to interleave concurrent runs.
    pub intent_delay: Option<Duration>,
}

impl FakeBackend {
    pub fn failing(capability: &'static str) -> Self {
        Self {
            failing: Some(capability),
            ..Self::default()
        }
    }

    fn check(&self, capability: &'static str) -> Result<(), CollaboratorError> {
        if self.failing == Some(capability) {
            Err(CollaboratorError::Status {
                capability,
                status: 503,
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BackendClient for FakeBackend {
    async fn speech_to_text(
        &self,
        audio: Vec<u8>,
        _mime_type: &str,
    ) -> Result<Transcription, CollaboratorError> {
        self.check("speech_to_text")?;
        Ok(Transcription(json!({
            "text": String::from_utf8_lossy(&audio).into_owned()
        })))
    }

    async fn speech_synthesis(&self, text: &str, voice: &str) -> Result<Value, CollaboratorError> {
        self.check("speech_synthesis")?;
        Ok(json!({ "voice": voice, "chars": text.len() }))
    }

    async fn detect_intent(&self, text: &str) -> Result<IntentDetection, CollaboratorError> {
        if let Some(delay) = self.intent_delay {
            tokio::time::sleep(delay).await;
        }
        self.check("detect_intent")?;
        let intent = if text.starts_with("task:") {
            "task"
        } else if text.starts_with("summarize:") {
            "summarize"
        } else {
            "general"
        };
        Ok(IntentDetection(json!({ "intent": intent })))
    }

    async fn classify_task(&self, intent: &IntentDetection) -> Result<Value, CollaboratorError> {
        self.check("classify_task")?;
        Ok(json!({ "classified": intent.label() }))
    }

    async fn create_task(&self, description: &str) -> Result<Value, CollaboratorError> {
        self.check("create_task")?;
        Ok(json!({ "task_id": format!("T-{}", description.len()) }))
    }

    async fn summarize(&self, text: &str) -> Result<Summary, CollaboratorError> {
        self.check("summarize")?;
        Ok(Summary(json!({ "summary": format!("{} chars", text.chars().count()) })))
    }

    fn client_name(&self) -> &'static str {
        "fake"
    }
}

/// Store whose every operation fails, as if the backing file were unreadable.
#[derive(Debug, Default)]
pub struct BrokenStore;

impl BrokenStore {
    fn fault() -> PersistenceError {
        PersistenceError::Lock("store unavailable".to_string())
    }
}

#[async_trait]
impl DecisionStore for BrokenStore {
    async fn upsert(&self, _key: &str, _record: &DecisionRecord) -> Result<(), PersistenceError> {
        Err(Self::fault())
    }

    async fn get(&self, _key: &str) -> Result<Option<DecisionRecord>, PersistenceError> {
        Err(Self::fault())
    }

    async fn load_all(&self) -> Result<DecisionMap, PersistenceError> {
        Err(Self::fault())
    }

    fn backend_name(&self) -> &'static str {
        "Broken"
    }
}

pub fn orchestrator(
    backend: FakeBackend,
    store: Arc<dyn DecisionStore>,
    settings: DecisionSettings,
) -> DecisionOrchestrator {
    DecisionOrchestrator::new(Arc::new(backend), store, settings)
}

/// API state over a fake backend and the given store.
pub fn api_state(
    backend: FakeBackend,
    store: Arc<dyn DecisionStore>,
    server: &ServerConfig,
) -> ApiState {
    ApiState::new(
        Pipeline::new(),
        orchestrator(backend, store, DecisionSettings::default()),
        server,
    )
}
