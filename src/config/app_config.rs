//! Application configuration: TOML sections, environment overrides and
//! startup validation.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;
use crate::storage::KeyScheme;

/// Env var naming the config file.
pub const CONFIG_PATH_ENV: &str = "ASSISTANT_CONFIG";
/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "assistant.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub decision: DecisionConfig,
}

impl AppConfig {
    /// Load, override from the environment, and validate.
    ///
    /// `explicit_path` (from the CLI) takes precedence over the search order.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match Self::locate(explicit_path) {
            Some(path) => {
                let config = Self::load_from_file(&path)?;
                info!(path = %path.display(), "Loaded configuration");
                config
            }
            None => {
                info!("No config file found, using built-in defaults");
                Self::default()
            }
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    fn locate(explicit_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit_path {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                return Some(p);
            }
            warn!(path = %path, "{CONFIG_PATH_ENV} points to non-existent file, falling back");
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        local.exists().then_some(local)
    }

    /// Parse a TOML file without applying overrides or validation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse TOML text, warning about keys this version does not know.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        if let Ok(raw) = contents.parse::<toml::Value>() {
            for key in super::unknown_keys(&raw) {
                warn!(key = %key, "Unknown configuration key ignored");
            }
        }
        toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("INTERNAL_API_URL") {
            self.backend.base_url = url;
        }
        if let Some(key) = lookup("API_KEY") {
            self.backend.api_key.clone_from(&key);
            self.server.api_key = Some(key);
        }
        if let Some(addr) = lookup("ASSISTANT_SERVER_ADDR") {
            self.server.addr = addr;
        }
    }

    /// Validate every section, collecting all problems.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.server.addr.parse::<SocketAddr>().is_err() {
            errors.push(format!(
                "server.addr: '{}' is not a valid socket address",
                self.server.addr
            ));
        }
        if self.server.max_upload_bytes == 0 {
            errors.push("server.max_upload_bytes: must be greater than 0".to_string());
        }
        if matches!(self.server.api_key.as_deref(), Some(k) if k.trim().is_empty()) {
            errors.push("server.api_key: must not be empty when set".to_string());
        }

        let url = &self.backend.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!(
                "backend.base_url: '{url}' must start with http:// or https://"
            ));
        }
        if self.backend.api_key.trim().is_empty() {
            errors.push("backend.api_key: must not be empty".to_string());
        }
        if self.backend.timeout_secs == 0
            || self.backend.timeout_secs > defaults::BACKEND_MAX_TIMEOUT_SECS
        {
            errors.push(format!(
                "backend.timeout_secs: {} must be between 1 and {}",
                self.backend.timeout_secs,
                defaults::BACKEND_MAX_TIMEOUT_SECS
            ));
        }

        if self.storage.backend != StorageBackend::Memory
            && self.storage.path.as_os_str().is_empty()
        {
            errors.push("storage.path: required for file-backed stores".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    /// When set, `/api/*` requires a matching `X-API-Key` header.
    pub api_key: Option<String>,
    /// Allowed cross-origin origins. Empty means same-origin only.
    pub cors_origins: Vec<String>,
    /// Largest accepted speech upload (bytes).
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: defaults::SERVER_ADDR.to_string(),
            api_key: None,
            cors_origins: Vec::new(),
            max_upload_bytes: defaults::MAX_REQUEST_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub voice: String,
    pub audio_mime_type: String,
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BACKEND_BASE_URL.to_string(),
            api_key: defaults::BACKEND_API_KEY.to_string(),
            timeout_secs: defaults::BACKEND_TIMEOUT_SECS,
            voice: defaults::TTS_VOICE.to_string(),
            audio_mime_type: defaults::AUDIO_MIME_TYPE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Sled,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: PathBuf,
    pub key_scheme: KeyScheme,
}

impl StorageConfig {
    /// Directory holding the store, guarded by the data directory lock.
    pub fn data_dir(&self) -> Option<&Path> {
        match self.backend {
            StorageBackend::Memory => None,
            StorageBackend::Json | StorageBackend::Sled => Some(
                self.path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or(Path::new(".")),
            ),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: PathBuf::from(defaults::STORE_PATH),
            key_scheme: KeyScheme::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Reject voice requests that arrive without audio instead of
    /// silently treating them as text.
    pub require_audio_for_voice: bool,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            require_audio_for_voice: true,
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}
