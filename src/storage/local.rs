use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{safe_extension, BlobStore};

/// Stores blobs as files in a local directory served under `public_base_url`.
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, file_name: &str, bytes: Vec<u8>) -> anyhow::Result<String> {
        fs::create_dir_all(&self.root).await?;

        let id = uuid::Uuid::now_v7();
        let name = match safe_extension(file_name) {
            Some(ext) => format!("{}.{}", id, ext),
            None => id.to_string(),
        };

        let size = bytes.len();
        fs::write(self.root.join(&name), bytes).await?;
        tracing::info!(blob = %name, size, original = %file_name, "Stored blob");

        Ok(format!("{}/{}", self.public_base_url.trim_end_matches('/'), name))
    }
}
