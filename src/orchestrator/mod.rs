//! Decision Orchestrator
//!
//! ## Workflow
//!
//! ```text
//! STEP 1: Speech-to-text      (voice input with audio only)
//! STEP 2: Intent detection    (label defaults to "general")
//! STEP 3: Task classification (best-effort, failure recorded as absent)
//! STEP 4: Branch on intent    task -> create_task, else -> summarize
//! STEP 5: Speech synthesis    (voice runs that produced a response)
//! STEP 6: Persist             atomic upsert under the derived key
//! ```
//!
//! Failures in steps 1, 2, 4, 5 and 6 abort the run before anything is
//! persisted. Step 3 only ever absorbs [`CollaboratorError`]s.

mod record;

pub use record::{
    DecisionRecord, FinalDecision, InputMode, DEFAULT_INTENT, SUMMARIZE_INTENT, TASK_INTENT,
};

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::backend::BackendClient;
use crate::config::{AppConfig, BackendConfig};
use crate::error::DecisionError;
use crate::storage::{DecisionMap, DecisionStore, KeyScheme};

/// Default platform tag for decision requests.
pub const DEFAULT_PLATFORM: &str = "web";
/// Default device context for decision requests.
pub const DEFAULT_DEVICE_CONTEXT: &str = "desktop";

/// Input to one decision run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRequest {
    pub input_text: String,
    pub platform: String,
    pub device_context: String,
    pub voice_input: bool,
    pub audio: Option<Vec<u8>>,
}

impl DecisionRequest {
    /// Text request with default platform and device context.
    pub fn text(input_text: impl Into<String>) -> Self {
        Self {
            input_text: input_text.into(),
            platform: DEFAULT_PLATFORM.to_string(),
            device_context: DEFAULT_DEVICE_CONTEXT.to_string(),
            voice_input: false,
            audio: None,
        }
    }

    /// Voice request carrying recorded audio.
    pub fn voice(input_text: impl Into<String>, audio: Vec<u8>) -> Self {
        Self {
            voice_input: true,
            audio: Some(audio),
            ..Self::text(input_text)
        }
    }

    /// Audio bytes, if any were supplied. Empty buffers count as absent.
    fn audio(&self) -> Option<&[u8]> {
        self.audio.as_deref().filter(|a| !a.is_empty())
    }
}

/// Orchestrator settings derived from [`AppConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionSettings {
    pub key_scheme: KeyScheme,
    pub voice: String,
    pub audio_mime_type: String,
    pub require_audio_for_voice: bool,
}

impl Default for DecisionSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl DecisionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let BackendConfig {
            voice,
            audio_mime_type,
            ..
        } = &config.backend;

        Self {
            key_scheme: config.storage.key_scheme,
            voice: voice.clone(),
            audio_mime_type: audio_mime_type.clone(),
            require_audio_for_voice: config.decision.require_audio_for_voice,
        }
    }
}

/// Composes backend collaborators into decision records.
///
/// Cheap to clone; one instance is built per process and shared.
#[derive(Clone)]
pub struct DecisionOrchestrator {
    backend: Arc<dyn BackendClient>,
    store: Arc<dyn DecisionStore>,
    settings: DecisionSettings,
}

impl DecisionOrchestrator {
    pub fn new(
        backend: Arc<dyn BackendClient>,
        store: Arc<dyn DecisionStore>,
        settings: DecisionSettings,
    ) -> Self {
        Self {
            backend,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &DecisionSettings {
        &self.settings
    }

    /// Store key for a processed text under the configured scheme.
    pub fn key_for(&self, processed_text: &str) -> String {
        self.settings.key_scheme.key_for(processed_text)
    }

    /// Every persisted decision.
    pub async fn memory(&self) -> Result<DecisionMap, DecisionError> {
        Ok(self.store.load_all().await?)
    }

    /// Run the decision workflow for one request.
    pub async fn decide(&self, request: DecisionRequest) -> Result<DecisionRecord, DecisionError> {
        // Step 1: voice transcription
        let (processed_text, input_mode) = match (request.voice_input, request.audio()) {
            (true, Some(audio)) => {
                let transcription = self
                    .backend
                    .speech_to_text(audio.to_vec(), &self.settings.audio_mime_type)
                    .await?;
                let text = transcription
                    .text()
                    .map_or_else(|| request.input_text.clone(), str::to_string);
                debug!(chars = text.chars().count(), "Transcribed voice input");
                (text, InputMode::Voice)
            }
            (true, None) if self.settings.require_audio_for_voice => {
                return Err(DecisionError::InvalidInput(
                    "voice_input is set but no audio was supplied".to_string(),
                ));
            }
            (true, None) => {
                warn!("voice_input set without audio, processing as text");
                (request.input_text.clone(), InputMode::Text)
            }
            (false, _) => (request.input_text.clone(), InputMode::Text),
        };

        // Step 2: intent
        let detection = self.backend.detect_intent(&processed_text).await?;
        let intent = detection.label().unwrap_or(DEFAULT_INTENT).to_string();

        // Step 3: best-effort classification
        let task_classification = match self.backend.classify_task(&detection).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    capability = e.capability(),
                    error = %e,
                    "Task classification failed, continuing without it"
                );
                None
            }
        };

        // Step 4: act on intent
        let final_decision = FinalDecision::for_intent(&intent);
        let (task, response) = match final_decision {
            FinalDecision::TaskCreated => {
                (Some(self.backend.create_task(&processed_text).await?), None)
            }
            FinalDecision::SummaryGenerated | FinalDecision::ResponseGenerated => {
                let summary = self.backend.summarize(&processed_text).await?;
                (None, summary.text().map(str::to_string))
            }
        };

        // Step 5: voice output
        let voice = match (input_mode, response.as_deref()) {
            (InputMode::Voice, Some(text)) => Some(
                self.backend
                    .speech_synthesis(text, &self.settings.voice)
                    .await?,
            ),
            _ => None,
        };

        let record = DecisionRecord {
            intent,
            processed_text,
            platform: request.platform,
            device_context: request.device_context,
            input_mode,
            task_classification,
            task,
            response,
            final_decision,
            voice,
            decided_at: Utc::now(),
        };

        // Step 6: persist
        let key = self.key_for(&record.processed_text);
        self.store.upsert(&key, &record).await?;

        info!(
            key = %key,
            intent = %record.intent,
            final_decision = ?record.final_decision,
            input_mode = ?record.input_mode,
            store = self.store.backend_name(),
            "Decision recorded"
        );

        Ok(record)
    }
}
