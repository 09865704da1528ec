use crate::config::OperatingMode;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Key-value secret storage backing the credential store.
#[async_trait]
pub trait SecretStorage: Send + Sync {
    async fn read_entry(&self, key: &str) -> Result<Option<String>>;
    async fn write_entry(&self, key: &str, value: &str) -> Result<()>;
    async fn delete_entry(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl<T: SecretStorage + ?Sized> SecretStorage for Box<T> {
    async fn read_entry(&self, key: &str) -> Result<Option<String>> {
        (**self).read_entry(key).await
    }

    async fn write_entry(&self, key: &str, value: &str) -> Result<()> {
        (**self).write_entry(key, value).await
    }

    async fn delete_entry(&self, key: &str) -> Result<()> {
        (**self).delete_entry(key).await
    }
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn timeout_ms(&self) -> u64;
    fn operating_mode(&self) -> OperatingMode;
    fn allow_offline_fallback(&self) -> bool;
}
