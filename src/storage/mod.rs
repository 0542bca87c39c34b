mod local;

use async_trait::async_trait;

pub use self::local::LocalBlobStore;

/// Where uploaded photo files end up. Returns the public URL of the stored blob.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, file_name: &str, bytes: Vec<u8>) -> anyhow::Result<String>;
}

/// Extension of an uploaded file name, lowercased, if it is a plain alphanumeric suffix.
pub(crate) fn safe_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 10 {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
