//! DecisionStore trait: pluggable decision persistence
//!
//! Every backend exposes an atomic `upsert`, so concurrent orchestrator runs
//! writing distinct keys never lose each other's records:
//! - `InMemoryStore`: in-process map for tests and minimal deployments
//! - `JsonFileStore`: one JSON mapping rewritten wholesale under a lock
//! - `SledStore`: embedded sled tree, atomic per key

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::PersistenceError;
use crate::orchestrator::DecisionRecord;

/// Snapshot of every stored decision, ordered by key.
pub type DecisionMap = BTreeMap<String, DecisionRecord>;

/// Trait for pluggable decision store backends
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks.
#[async_trait]
pub trait DecisionStore: Send + Sync {
    /// Insert or replace the record stored under `key`.
    async fn upsert(&self, key: &str, record: &DecisionRecord) -> Result<(), PersistenceError>;

    /// Fetch the record stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<DecisionRecord>, PersistenceError>;

    /// Load every stored record.
    async fn load_all(&self) -> Result<DecisionMap, PersistenceError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// In-memory decision store
///
/// Thread-safe via `RwLock`. Not durable, data is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<DecisionMap>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DecisionStore for InMemoryStore {
    async fn upsert(&self, key: &str, record: &DecisionRecord) -> Result<(), PersistenceError> {
        let mut store = self
            .records
            .write()
            .map_err(|e| PersistenceError::Lock(e.to_string()))?;
        store.insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<DecisionRecord>, PersistenceError> {
        let store = self
            .records
            .read()
            .map_err(|e| PersistenceError::Lock(e.to_string()))?;
        Ok(store.get(key).cloned())
    }

    async fn load_all(&self) -> Result<DecisionMap, PersistenceError> {
        let store = self
            .records
            .read()
            .map_err(|e| PersistenceError::Lock(e.to_string()))?;
        Ok(store.clone())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}
