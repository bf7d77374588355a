use async_trait::async_trait;

use crate::error::Result;

/// String key/value storage for serialized application state.
///
/// A missing key reads as `None`; writing replaces any previous value.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;

    /// Sync with remote (e.g. Turso replication). No-op for local-only stores.
    async fn sync(&self) -> Result<()> {
        Ok(())
    }
}
