use crate::store::DocumentCollection;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionHandle, PersistMode};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::marker::PhantomData;
use tracing::debug;

/// A fjall-partition-backed collection.
///
/// Keys and documents are JSON-encoded; writes are persisted through the
/// keyspace journal before returning.
pub struct DiskCollection<K, V>
where
    K: Eq + Send + Sync + Serialize + DeserializeOwned + 'static + Debug,
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    keyspace: Keyspace,
    partition: PartitionHandle,
    _marker: PhantomData<(K, V)>,
}

impl<K, V> DiskCollection<K, V>
where
    K: Eq + Send + Sync + Serialize + DeserializeOwned + Debug,
    V: Clone + Send + Sync + Serialize + DeserializeOwned,
{
    pub fn new(keyspace: Keyspace, partition: PartitionHandle) -> Self {
        Self {
            keyspace,
            partition,
            _marker: PhantomData,
        }
    }

    fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to persist write")
    }
}

#[async_trait]
impl<K, V> DocumentCollection<K, V> for DiskCollection<K, V>
where
    K: Eq + Send + Sync + Serialize + DeserializeOwned + 'static + Debug,
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    async fn get(&self, key: &K) -> Result<Option<V>> {
        let Some(raw) = self.partition.get(serde_json::to_vec(key)?)? else {
            debug!("Store MISS for key: {:?}", key);
            return Ok(None);
        };
        debug!("Store HIT for key: {:?}", key);
        let value = serde_json::from_slice(&raw)
            .with_context(|| format!("Corrupt document for key {key:?}"))?;
        Ok(Some(value))
    }

    async fn put(&self, key: &K, value: &V) -> Result<()> {
        self.partition
            .insert(serde_json::to_vec(key)?, serde_json::to_vec(value)?)?;
        self.persist()?;
        debug!("Store PUT for key: {:?}", key);
        Ok(())
    }

    async fn remove(&self, key: &K) -> Result<()> {
        self.partition.remove(serde_json::to_vec(key)?)?;
        self.persist()?;
        debug!("Store REMOVE for key: {:?}", key);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(K, V)>> {
        let mut entries = Vec::new();
        for kv in self.partition.iter() {
            let (raw_key, raw_value) = kv?;
            let key = serde_json::from_slice(&raw_key).context("Corrupt document key")?;
            let value = serde_json::from_slice(&raw_value).context("Corrupt document")?;
            entries.push((key, value));
        }
        Ok(entries)
    }

    async fn clear(&self) -> Result<()> {
        let keys: Vec<_> = self
            .partition
            .iter()
            .map(|kv| kv.map(|(k, _)| k))
            .collect::<Result<_, _>>()?;
        for key in keys {
            self.partition.remove(key)?;
        }
        self.persist()
    }
}
