//! Decision store key derivation
//!
//! - `truncated`: first 50 characters of the processed text. Distinct texts
//!   sharing a prefix collide and the later record replaces the earlier one.
//! - `hashed`: lowercase hex SHA-256 of the full processed text.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of characters kept by the truncated key scheme.
pub const TRUNCATED_KEY_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScheme {
    #[default]
    Truncated,
    Hashed,
}

impl KeyScheme {
    /// Store key for `processed_text`.
    pub fn key_for(self, processed_text: &str) -> String {
        match self {
            Self::Truncated => processed_text.chars().take(TRUNCATED_KEY_CHARS).collect(),
            Self::Hashed => Sha256::digest(processed_text.as_bytes())
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect(),
        }
    }
}
