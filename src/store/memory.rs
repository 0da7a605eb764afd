use crate::store::DocumentCollection;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory collection used by unit tests and as a stand-in store.
pub struct MemoryCollection<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<HashMap<K, V>>>,
}

impl<K, V> MemoryCollection<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, V> Default for MemoryCollection<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, V> DocumentCollection<K, V> for MemoryCollection<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Result<Option<V>> {
        let map = self.inner.lock().await;
        Ok(map.get(key).cloned())
    }

    async fn put(&self, key: &K, value: &V) -> Result<()> {
        let mut map = self.inner.lock().await;
        debug!("Store PUT for key: {:?}", key);
        map.insert(key.clone(), value.clone());
        Ok(())
    }

    async fn remove(&self, key: &K) -> Result<()> {
        let mut map = self.inner.lock().await;
        map.remove(key);
        debug!("Store REMOVE for key: {:?}", key);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(K, V)>> {
        let map = self.inner.lock().await;
        Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    async fn clear(&self) -> Result<()> {
        let mut map = self.inner.lock().await;
        map.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_collection_get_put() {
        let col = MemoryCollection::<String, i32>::new();

        assert!(col.get(&"key1".to_string()).await.unwrap().is_none());

        col.put(&"key1".to_string(), &123).await.unwrap();
        assert_eq!(col.get(&"key1".to_string()).await.unwrap(), Some(123));
    }

    #[tokio::test]
    async fn test_memory_collection_remove() {
        let col = MemoryCollection::<String, i32>::new();

        col.put(&"key1".to_string(), &123).await.unwrap();
        col.remove(&"key1".to_string()).await.unwrap();
        assert!(col.get(&"key1".to_string()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_collection_clear() {
        let col = MemoryCollection::<String, i32>::new();

        col.put(&"key1".to_string(), &1).await.unwrap();
        col.put(&"key2".to_string(), &2).await.unwrap();
        col.clear().await.unwrap();

        assert!(col.entries().await.unwrap().is_empty());
    }
}
