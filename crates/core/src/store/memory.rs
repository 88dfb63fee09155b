use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use super::{Store, StoreError};

/// Store kept entirely in memory. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a value exists under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Synchronous peek used by tests and tooling.
    pub fn snapshot(&self, key: &str) -> Option<Value> {
        self.inner.read().get(key).cloned()
    }
}

impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.inner.read().get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        debug!(key, "memory store put");
        self.inner.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        debug!(key, "memory store delete");
        self.inner.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_get_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").await.unwrap(), None);

        store.put("a", json!({"n": 1})).await.unwrap();
        store.put("a", json!({"n": 2})).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), Some(json!({"n": 2})));

        let shared = store.clone();
        shared.delete("a").await.unwrap();
        assert!(!store.contains("a"));
        shared.delete("a").await.unwrap();
    }
}
