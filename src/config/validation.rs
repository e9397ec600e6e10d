//! Unknown-key detection for the TOML config.
//!
//! serde ignores fields it does not know, so a typo such as `timout_secs`
//! would silently fall back to the default. Walking the raw TOML first lets
//! the loader warn about it without rejecting the file.

/// Every dotted key path `AppConfig` understands.
const KNOWN_KEYS: &[&str] = &[
    "server",
    "server.addr",
    "server.api_key",
    "server.cors_origins",
    "server.max_upload_bytes",
    "backend",
    "backend.base_url",
    "backend.api_key",
    "backend.timeout_secs",
    "backend.voice",
    "backend.audio_mime_type",
    "storage",
    "storage.backend",
    "storage.path",
    "storage.key_scheme",
    "decision",
    "decision.require_audio_for_voice",
];

/// Dotted paths present in `raw` that are not config keys.
pub fn unknown_keys(raw: &toml::Value) -> Vec<String> {
    let mut unknown = Vec::new();
    walk(raw, "", &mut unknown);
    unknown
}

fn walk(value: &toml::Value, prefix: &str, unknown: &mut Vec<String>) {
    let Some(table) = value.as_table() else {
        return;
    };
    for (key, child) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if KNOWN_KEYS.contains(&path.as_str()) {
            walk(child, &path, unknown);
        } else {
            unknown.push(path);
        }
    }
}
