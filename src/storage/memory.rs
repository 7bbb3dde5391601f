//! In-memory key-value store.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::KeyValueStore;
use crate::Result;

/// In-memory store, primarily for testing.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.get("auth_signed_in").await.unwrap().is_none());

        store.set("auth_signed_in", "true").await.unwrap();
        store.set("auth_user", "{}").await.unwrap();
        assert_eq!(store.get("auth_signed_in").await.unwrap().as_deref(), Some("true"));
        assert_eq!(store.len().await, 2);

        // Overwriting keeps one entry per key
        store.set("auth_signed_in", "false").await.unwrap();
        assert_eq!(store.len().await, 2);

        store.remove("auth_signed_in").await.unwrap();
        store.remove("auth_user").await.unwrap();
        assert!(store.is_empty().await);

        // Removing twice is fine
        store.remove("auth_signed_in").await.unwrap();
    }
}
