//! Application state for the stub service.

use std::sync::Arc;

use crate::config::StubConfig;
use crate::store::MemoryStore;

/// Shared state handed to every handler.
pub struct AppState {
    store: Arc<MemoryStore>,
    config: Arc<StubConfig>,
}

// Manual Clone so cloning only bumps the Arcs
impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl AppState {
    /// Creates state over an existing store.
    pub fn new(store: Arc<MemoryStore>, config: StubConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Returns the entity store.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Returns a clone of the store Arc.
    pub fn store_arc(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.store)
    }

    /// Returns the service configuration.
    pub fn config(&self) -> &StubConfig {
        &self.config
    }
}
