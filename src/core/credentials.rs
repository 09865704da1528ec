use crate::domain::model::Subject;
use crate::domain::ports::SecretStorage;
use crate::utils::error::Result;

pub const TOKEN_KEY: &str = "auth_token";
pub const SUBJECT_KEY: &str = "user_data";

#[derive(Debug, Clone, PartialEq)]
pub struct StoredCredentials {
    pub token: String,
    pub subject: Subject,
}

/// Persists the session token and the serialized subject as two entries,
/// always written and deleted together.
pub struct SecureCredentialStore<S: SecretStorage> {
    storage: S,
}

impl<S: SecretStorage> SecureCredentialStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub async fn save(&self, credentials: &StoredCredentials) -> Result<()> {
        let subject_json = serde_json::to_string(&credentials.subject)?;
        self.storage.write_entry(SUBJECT_KEY, &subject_json).await?;
        if let Err(e) = self.storage.write_entry(TOKEN_KEY, &credentials.token).await {
            // Never leave a subject behind without its token.
            if let Err(rollback) = self.storage.delete_entry(SUBJECT_KEY).await {
                tracing::warn!("🔐 Could not roll back stored subject: {}", rollback);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Returns the stored pair, or `None` when either half is missing or unreadable.
    pub async fn load(&self) -> Result<Option<StoredCredentials>> {
        let token = match self.storage.read_entry(TOKEN_KEY).await? {
            Some(token) if !token.trim().is_empty() => token.trim().to_string(),
            _ => return Ok(None),
        };

        let subject = match self.storage.read_entry(SUBJECT_KEY).await? {
            Some(raw) => match serde_json::from_str::<Subject>(&raw) {
                Ok(subject) => subject,
                Err(e) => {
                    tracing::warn!("🔐 Stored subject is unreadable ({}), clearing credentials", e);
                    self.clear().await?;
                    return Ok(None);
                }
            },
            None => {
                tracing::warn!("🔐 Token stored without subject, clearing credentials");
                self.clear().await?;
                return Ok(None);
            }
        };

        Ok(Some(StoredCredentials { token, subject }))
    }

    pub async fn clear(&self) -> Result<()> {
        let token_result = self.storage.delete_entry(TOKEN_KEY).await;
        let subject_result = self.storage.delete_entry(SUBJECT_KEY).await;
        token_result.and(subject_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemorySecretStorage;
    use crate::utils::error::AccessError;

    fn juan() -> StoredCredentials {
        StoredCredentials {
            token: "demo-token-12345".to_string(),
            subject: Subject {
                id: 1,
                display_name: "juan.perez".to_string(),
                email: "juan.perez@alumno.edu".to_string(),
                roles: vec!["student".to_string()],
            },
        }
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let store = SecureCredentialStore::new(MemorySecretStorage::new());
        assert_eq!(store.load().await.unwrap(), None);

        store.save(&juan()).await.unwrap();
        assert_eq!(store.storage().len().await, 2);
        assert_eq!(store.load().await.unwrap(), Some(juan()));

        store.clear().await.unwrap();
        assert!(store.storage().is_empty().await);
    }

    #[tokio::test]
    async fn test_token_without_subject_is_discarded() {
        let storage = MemorySecretStorage::new();
        storage.write_entry(TOKEN_KEY, "orphan").await.unwrap();

        let store = SecureCredentialStore::new(storage);
        assert_eq!(store.load().await.unwrap(), None);
        assert!(store.storage().is_empty().await);
    }

    #[tokio::test]
    async fn test_corrupt_subject_is_discarded() {
        let storage = MemorySecretStorage::new();
        storage.write_entry(TOKEN_KEY, "abc").await.unwrap();
        storage.write_entry(SUBJECT_KEY, "{not json").await.unwrap();

        let store = SecureCredentialStore::new(storage);
        assert_eq!(store.load().await.unwrap(), None);
        assert!(store.storage().is_empty().await);
    }

    /// Fails every token write, and subject deletes when `fail_delete` is set.
    struct FailingTokenStorage {
        inner: MemorySecretStorage,
        fail_delete: bool,
    }

    #[async_trait::async_trait]
    impl SecretStorage for FailingTokenStorage {
        async fn read_entry(&self, key: &str) -> Result<Option<String>> {
            self.inner.read_entry(key).await
        }

        async fn write_entry(&self, key: &str, value: &str) -> Result<()> {
            if key == TOKEN_KEY {
                return Err(AccessError::storage("token write refused"));
            }
            self.inner.write_entry(key, value).await
        }

        async fn delete_entry(&self, key: &str) -> Result<()> {
            if self.fail_delete {
                return Err(AccessError::storage("delete refused"));
            }
            self.inner.delete_entry(key).await
        }
    }

    #[tokio::test]
    async fn test_failed_token_write_rolls_back_subject() {
        let store = SecureCredentialStore::new(FailingTokenStorage {
            inner: MemorySecretStorage::new(),
            fail_delete: false,
        });

        let err = store.save(&juan()).await.unwrap_err();
        assert!(err.to_string().contains("token write refused"));
        assert!(store.storage().inner.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_rollback_still_reports_token_write_error() {
        let store = SecureCredentialStore::new(FailingTokenStorage {
            inner: MemorySecretStorage::new(),
            fail_delete: true,
        });

        let err = store.save(&juan()).await.unwrap_err();
        assert!(err.to_string().contains("token write refused"));
        assert_eq!(store.storage().inner.len().await, 1);
    }
}
