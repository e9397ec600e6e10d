//! JSON file decision store
//!
//! Persisted layout: a single JSON object mapping key -> decision record,
//! read and rewritten wholesale on every upsert. The load-modify-store cycle
//! runs under an async mutex, and the new mapping is written to a sibling temp
//! file then renamed over the original.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use super::persistence::{DecisionMap, DecisionStore};
use crate::error::PersistenceError;
use crate::orchestrator::DecisionRecord;

pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store, creating the parent directory and an empty mapping
    /// if the file does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        if !path.exists() {
            std::fs::write(&path, b"{}").map_err(|source| PersistenceError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::info!(path = %path.display(), "Created empty decision store");
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<DecisionMap, PersistenceError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            // Removed underneath us: start over from an empty mapping
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(DecisionMap::new()),
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(DecisionMap::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_map(&self, map: &DecisionMap) -> Result<(), PersistenceError> {
        let bytes = serde_json::to_vec(map)?;
        let tmp = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|source| PersistenceError::Io {
                path: tmp.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|source| PersistenceError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

#[async_trait]
impl DecisionStore for JsonFileStore {
    async fn upsert(&self, key: &str, record: &DecisionRecord) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;

        let mut map = self.read_map().await?;
        map.insert(key.to_string(), record.clone());
        self.write_map(&map).await?;

        debug!(key = %key, records = map.len(), "Stored decision");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<DecisionRecord>, PersistenceError> {
        Ok(self.read_map().await?.remove(key))
    }

    async fn load_all(&self) -> Result<DecisionMap, PersistenceError> {
        self.read_map().await
    }

    fn backend_name(&self) -> &'static str {
        "JsonFile"
    }
}
