use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::app::ports::StoragePort;
use crate::error::{EnrichError, Result};

/// In-memory storage implementation for development/testing
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.lock().ok()?.get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }
}

#[async_trait]
impl StoragePort for InMemoryStorage {
    async fn write(&self, bytes: Vec<u8>, path: &str) -> Result<()> {
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| EnrichError::Storage("in-memory store poisoned".to_string()))?;
        debug!(path = %path, bytes = bytes.len(), "Stored object in memory");
        objects.insert(path.to_string(), bytes);
        Ok(())
    }
}
