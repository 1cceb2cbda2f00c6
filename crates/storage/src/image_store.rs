use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

/// Where an uploaded image ended up: `key` addresses it inside the store,
/// `url` is what viewers load it from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

/// Blob storage for panorama images. Implementations may be a local
/// directory served over HTTP or a remote object store.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn put(&self, file_name: &str, media_type: &str, bytes: &[u8]) -> Result<StoredObject>;
    /// Removing a key that does not exist is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Writes images as `<uuid>.<ext>` files under `root`.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    public_base: String,
}

impl LocalImageStore {
    pub async fn open(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("failed to create uploads directory '{}'", root.display()))?;
        Ok(Self {
            root,
            public_base: public_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_key(file_name: &str, media_type: &str) -> String {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(str::to_ascii_lowercase)
            .or_else(|| {
                mime_guess::get_mime_extensions_str(media_type)
                    .and_then(|extensions| extensions.first())
                    .map(|ext| ext.to_string())
            });

        match extension {
            Some(extension) => format!("{}.{extension}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, file_name: &str, media_type: &str, bytes: &[u8]) -> Result<StoredObject> {
        let key = Self::object_key(file_name, media_type);
        let path = self.root.join(&key);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write image '{file_name}' to '{}'", path.display()))?;
        debug!(%key, file_name, size_bytes = bytes.len(), "stored image");

        Ok(StoredObject {
            url: format!("{}/{key}", self.public_base),
            key,
        })
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.root.join(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("failed to remove stored image '{key}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_removes_files_under_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalImageStore::open(dir.path().join("uploads"), "/uploads/")
            .await
            .expect("store");

        let object = store
            .put("Lobby.JPG", "image/jpeg", b"pixels")
            .await
            .expect("put");
        assert!(object.key.ends_with(".jpg"));
        assert_eq!(object.url, format!("/uploads/{}", object.key));
        assert_eq!(
            std::fs::read(store.root().join(&object.key)).expect("read"),
            b"pixels"
        );

        store.remove(&object.key).await.expect("remove");
        assert!(!store.root().join(&object.key).exists());
        store.remove(&object.key).await.expect("second remove is a no-op");
    }

    #[test]
    fn falls_back_to_media_type_for_extension() {
        let key = LocalImageStore::object_key("panorama", "image/png");
        assert!(key.ends_with(".png"), "{key}");
    }
}
