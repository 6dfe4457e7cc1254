use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

/// URL prefix under which the upload directory is served.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    /// Absolute URL a browser can fetch `key` from.
    fn public_url(&self, key: &str) -> String;
}

/// Objects written as plain files under `root`, keyed by relative path.
#[derive(Clone)]
pub struct DiskStorage {
    root: PathBuf,
    public_base_url: String,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        let rel = Path::new(key);
        let safe = !key.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        anyhow::ensure!(safe, "invalid object key {:?}", key);
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl StorageClient for DiskStorage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        tracing::debug!(key, content_type, bytes = body.len(), "object stored");
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}{}/{}", self.public_base_url, PUBLIC_PREFIX, key)
    }
}

#[cfg(test)]
pub(crate) fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("globalmart-test-{}", uuid::Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_delete_roundtrip() {
        let root = scratch_dir();
        let storage = DiskStorage::new(&root, "http://localhost:4000/");
        storage
            .put_object("profile-pictures/a.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        let path = root.join("profile-pictures/a.png");
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"png");

        storage.delete_object("profile-pictures/a.png").await.unwrap();
        assert!(!path.exists());
        // deleting twice is fine
        storage.delete_object("profile-pictures/a.png").await.unwrap();
        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn rejects_keys_escaping_root() {
        let storage = DiskStorage::new(scratch_dir(), "http://h");
        for key in ["../etc/passwd", "/abs", "", "a/../../b"] {
            assert!(storage
                .put_object(key, Bytes::from_static(b"x"), "image/png")
                .await
                .is_err());
        }
    }

    #[test]
    fn public_url_joins_base_and_prefix() {
        let storage = DiskStorage::new("uploads", "https://shop.example.com/");
        assert_eq!(
            storage.public_url("profile-pictures/1.jpg"),
            "https://shop.example.com/uploads/profile-pictures/1.jpg"
        );
    }
}
