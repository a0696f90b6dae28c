use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::app::ports::StoragePort;
use crate::error::Result;

/// Writes reports to the local filesystem. Relative paths resolve against `root`.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl Default for LocalFileStorage {
    fn default() -> Self {
        Self::new(".")
    }
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[async_trait]
impl StoragePort for LocalFileStorage {
    async fn write(&self, bytes: Vec<u8>, path: &str) -> Result<()> {
        let target = self.resolve(path);
        if let Some(dir) = target.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&target, &bytes).await?;
        debug!(path = %target.display(), bytes = bytes.len(), "Wrote file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        storage.write(b"[]".to_vec(), "web/files/s1data.json").await.unwrap();

        let written = std::fs::read(dir.path().join("web/files/s1data.json")).unwrap();
        assert_eq!(written, b"[]");
    }

    #[tokio::test]
    async fn overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        storage.write(b"first".to_vec(), "out.json").await.unwrap();
        storage.write(b"second".to_vec(), "out.json").await.unwrap();

        assert_eq!(std::fs::read(dir.path().join("out.json")).unwrap(), b"second");
    }
}
