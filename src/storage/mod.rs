//! Decision Store
//!
//! Durable mapping from a decision key to the last decision recorded under
//! it. Backends are selected by `[storage] backend` in the configuration.

pub mod json_file;
pub mod key;
pub mod lockfile;
pub mod persistence;
pub mod sled_store;

pub use json_file::JsonFileStore;
pub use key::{KeyScheme, TRUNCATED_KEY_CHARS};
pub use lockfile::DataDirLock;
pub use persistence::{DecisionMap, DecisionStore, InMemoryStore};
pub use sled_store::SledStore;

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::PersistenceError;

/// Open the configured decision store backend.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn DecisionStore>, PersistenceError> {
    let store: Arc<dyn DecisionStore> = match config.backend {
        StorageBackend::Json => Arc::new(JsonFileStore::open(&config.path)?),
        StorageBackend::Sled => Arc::new(SledStore::open(&config.path)?),
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
    };

    tracing::info!(
        backend = store.backend_name(),
        path = %config.path.display(),
        key_scheme = ?config.key_scheme,
        "Decision store opened"
    );
    Ok(store)
}
