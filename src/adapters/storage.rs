use crate::domain::ports::SecretStorage;
use crate::utils::error::{AccessError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// One file per entry under a private directory.
#[derive(Debug, Clone)]
pub struct FileSecretStorage {
    base_path: PathBuf,
}

impl FileSecretStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AccessError::storage(format!("invalid entry key '{}'", key)));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl SecretStorage for FileSecretStorage {
    async fn read_entry(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_entry(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key)?;

        let mut dir = tokio::fs::DirBuilder::new();
        dir.recursive(true);
        #[cfg(unix)]
        dir.mode(0o700);
        dir.create(&self.base_path).await?;

        // Created owner-only; never exists with the umask's permissions.
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&path).await?;

        // An entry left behind by an older build may still be wider.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await?;
        }

        file.write_all(value.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn delete_entry(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySecretStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemorySecretStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl SecretStorage for MemorySecretStorage {
    async fn read_entry(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn write_entry(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_entry(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_storage_entry_lifecycle() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSecretStorage::new(temp_dir.path().join("session"));

        assert_eq!(storage.read_entry("auth_token").await.unwrap(), None);

        storage.write_entry("auth_token", "abc123").await.unwrap();
        assert_eq!(
            storage.read_entry("auth_token").await.unwrap().as_deref(),
            Some("abc123")
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(storage.base_path().join("auth_token"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        storage.delete_entry("auth_token").await.unwrap();
        storage.delete_entry("auth_token").await.unwrap();
        assert_eq!(storage.read_entry("auth_token").await.unwrap(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_storage_is_owner_only_from_first_write() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("nested").join("session");
        let storage = FileSecretStorage::new(&base);

        storage.write_entry("auth_token", "first").await.unwrap();

        let file_mode = std::fs::metadata(base.join("auth_token"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(file_mode & 0o777, 0o600);

        let dir_mode = std::fs::metadata(&base).unwrap().permissions().mode();
        assert_eq!(dir_mode & 0o077, 0);

        // Rewriting a pre-existing world-readable entry tightens it too.
        std::fs::write(base.join("user_data"), "stale").unwrap();
        std::fs::set_permissions(base.join("user_data"), std::fs::Permissions::from_mode(0o644))
            .unwrap();
        storage.write_entry("user_data", "{}").await.unwrap();
        let rewritten = std::fs::metadata(base.join("user_data"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(rewritten & 0o777, 0o600);
        assert_eq!(
            storage.read_entry("user_data").await.unwrap().as_deref(),
            Some("{}")
        );
    }

    #[tokio::test]
    async fn test_file_storage_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileSecretStorage::new(temp_dir.path());
        assert!(storage.write_entry("../escape", "x").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemorySecretStorage::new();
        storage.write_entry("user_data", "{}").await.unwrap();
        assert_eq!(storage.len().await, 1);
        storage.delete_entry("user_data").await.unwrap();
        assert!(storage.is_empty().await);
    }
}
