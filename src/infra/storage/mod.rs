// Storage backends for the persisted report

pub mod in_memory;
pub mod local_fs;
pub mod supabase;

use std::sync::Arc;
use tracing::info;

use crate::app::ports::StoragePort;
use crate::config::{DeploymentEnvironment, StorageConfig};
use crate::error::Result;

pub use in_memory::InMemoryStorage;
pub use local_fs::LocalFileStorage;
pub use supabase::SupabaseStorage;

/// Pick the backend for a deployment environment. Stages never choose.
pub fn storage_for_environment(
    environment: DeploymentEnvironment,
    config: &StorageConfig,
) -> Result<Arc<dyn StoragePort>> {
    info!(environment = %environment, "Selecting storage backend");
    let storage: Arc<dyn StoragePort> = match environment {
        DeploymentEnvironment::Development => Arc::new(LocalFileStorage::default()),
        DeploymentEnvironment::Production => Arc::new(SupabaseStorage::from_config(config)?),
    };
    Ok(storage)
}
