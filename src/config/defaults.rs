//! Default values for every configuration field.
//!
//! Grouped by section so the TOML defaults and the `Default` impls stay in
//! one place.

// ============================================================================
// Server
// ============================================================================

/// HTTP bind address.
pub const SERVER_ADDR: &str = "0.0.0.0:8000";

/// Largest accepted speech upload (bytes).
pub const MAX_REQUEST_BYTES: usize = 25 * 1024 * 1024;

// ============================================================================
// Backend collaborators
// ============================================================================

/// Base URL of the service hosting the collaborator endpoints.
pub const BACKEND_BASE_URL: &str = "http://127.0.0.1:8000";

/// Credential sent as `X-API-Key` on every collaborator call.
pub const BACKEND_API_KEY: &str = "localtest";

/// Per-call collaborator timeout (seconds).
pub const BACKEND_TIMEOUT_SECS: u64 = 10;

/// Upper bound accepted for `backend.timeout_secs`.
pub const BACKEND_MAX_TIMEOUT_SECS: u64 = 300;

/// Voice requested from the speech synthesis collaborator.
pub const TTS_VOICE: &str = "alloy";

/// MIME type declared for uploaded audio.
pub const AUDIO_MIME_TYPE: &str = "audio/wav";

// ============================================================================
// Decision store
// ============================================================================

/// Decision store location.
pub const STORE_PATH: &str = "./data/memory.json";
