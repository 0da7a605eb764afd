//! Embedded document store.
//!
//! One fjall keyspace under the data directory, one partition per
//! collection, JSON-encoded keys and documents. Collections are exposed
//! behind [`DocumentCollection`] so repositories and tests can swap the
//! disk store for an in-memory one.

pub mod disk;
pub mod memory;
pub mod repository;

use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::path::Path;

use disk::DiskCollection;

/// A keyed collection of documents.
///
/// Unlike a cache, this is primary storage: every operation reports
/// failures to the caller so a rejected write can be surfaced and retried
/// with in-memory state unchanged.
#[async_trait]
pub trait DocumentCollection<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<V>>;
    async fn put(&self, key: &K, value: &V) -> Result<()>;
    async fn remove(&self, key: &K) -> Result<()>;
    /// All (key, document) pairs, in unspecified order.
    async fn entries(&self) -> Result<Vec<(K, V)>>;
    async fn clear(&self) -> Result<()>;
}

/// Handle to the on-disk keyspace holding every collection.
pub struct Store {
    keyspace: Keyspace,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;
        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        Ok(Self { keyspace })
    }

    pub fn collection<K, V>(&self, name: &str) -> Result<DiskCollection<K, V>>
    where
        K: Eq + Send + Sync + Serialize + DeserializeOwned + Debug + 'static,
        V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
    {
        let partition = self
            .keyspace
            .open_partition(name, PartitionCreateOptions::default())
            .with_context(|| format!("Failed to open collection \"{name}\""))?;
        Ok(DiskCollection::new(self.keyspace.clone(), partition))
    }
}
