use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use super::traits::KeyValueStore;
use crate::error::Result;

/// A JSON-encoded value kept under one key of a [`KeyValueStore`].
pub struct PersistedValue<T> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for PersistedValue<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            key: self.key.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PersistedValue<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            _marker: PhantomData,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads the stored value. Absent, unreadable, or corrupt data yields `T::default()`.
    pub async fn load(&self) -> T {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to read persisted state");
                return T::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Discarding corrupt persisted state");
                T::default()
            }
        }
    }

    pub async fn save(&self, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(&self.key, &raw).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryBackend;

    #[tokio::test]
    async fn test_load_missing_key_is_default() {
        let slot: PersistedValue<Vec<String>> = PersistedValue::new(Arc::new(MemoryBackend::new()), "k");
        assert!(slot.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let slot = PersistedValue::new(Arc::new(MemoryBackend::new()), "k");
        slot.save(&vec!["a".to_string(), "b".to_string()]).await.unwrap();

        let loaded: Vec<String> = slot.load().await;
        assert_eq!(loaded, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_corrupt_json_loads_default() {
        let store = Arc::new(MemoryBackend::new());
        store.set("k", "{not json").await.unwrap();

        let slot: PersistedValue<Vec<String>> = PersistedValue::new(store, "k");
        assert!(slot.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_value() {
        let slot = PersistedValue::new(Arc::new(MemoryBackend::new()), "k");
        slot.save(&vec![1u32]).await.unwrap();
        slot.clear().await.unwrap();

        let loaded: Vec<u32> = slot.load().await;
        assert!(loaded.is_empty());
    }
}
