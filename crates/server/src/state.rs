use std::sync::Arc;

use archiver_core::{ArchiveProcessor, Config, TaskStore, ValidationConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn TaskStore>,
    processor: Arc<ArchiveProcessor>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn TaskStore>, processor: Arc<ArchiveProcessor>) -> Self {
        Self {
            config,
            store,
            processor,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn validation(&self) -> &ValidationConfig {
        &self.config.validation
    }

    pub fn store(&self) -> &dyn TaskStore {
        self.store.as_ref()
    }

    pub fn processor(&self) -> &ArchiveProcessor {
        self.processor.as_ref()
    }
}
