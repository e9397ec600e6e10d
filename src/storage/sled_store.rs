//! Sled-backed decision store
//!
//! Key: decision key as UTF-8 bytes
//! Value: JSON-serialized `DecisionRecord`
//!
//! `insert` is atomic per key, so no extra locking is needed for upserts.

use async_trait::async_trait;
use sled::Db;
use std::path::Path;
use tracing::debug;

use super::persistence::{DecisionMap, DecisionStore};
use crate::error::PersistenceError;
use crate::orchestrator::DecisionRecord;

#[derive(Clone)]
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Open or create the decision database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_temp() -> Result<Self, PersistenceError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Number of stored decisions
    pub fn count(&self) -> usize {
        self.db.len()
    }
}

#[async_trait]
impl DecisionStore for SledStore {
    async fn upsert(&self, key: &str, record: &DecisionRecord) -> Result<(), PersistenceError> {
        let value = serde_json::to_vec(record)?;
        self.db.insert(key.as_bytes(), value)?;
        self.db.flush()?;

        debug!(key = %key, "Stored decision");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<DecisionRecord>, PersistenceError> {
        match self.db.get(key.as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    async fn load_all(&self) -> Result<DecisionMap, PersistenceError> {
        let mut map = DecisionMap::new();
        for item in self.db.iter() {
            let (key, value) = item?;
            let key = String::from_utf8_lossy(&key).into_owned();
            map.insert(key, serde_json::from_slice(&value)?);
        }
        Ok(map)
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}
