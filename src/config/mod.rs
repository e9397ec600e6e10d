//! Service Configuration
//!
//! One explicit [`AppConfig`] is loaded and validated at startup, then handed
//! to the components that need it. Nothing reads the environment mid-call.
//!
//! ## Loading Order
//!
//! 1. `ASSISTANT_CONFIG` environment variable (path to TOML file)
//! 2. `assistant.toml` in the current working directory
//! 3. Built-in defaults
//!
//! Environment overrides (`INTERNAL_API_URL`, `API_KEY`,
//! `ASSISTANT_SERVER_ADDR`) are applied once after the file is read.

mod app_config;
pub mod defaults;
mod validation;

pub use app_config::*;
pub use validation::unknown_keys;
