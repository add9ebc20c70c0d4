use super::KeyValueCollection;
use anyhow::{Context, Result};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

/// Collection stored in a fjall partition
pub struct DiskCollection {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn open(path: &Path, name: &str) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create store directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open keyspace at {}", path.display()))?;
        let partition = keyspace
            .open_partition(name, PartitionCreateOptions::default())
            .with_context(|| format!("Failed to open partition: {name}"))?;

        Ok(Self {
            keyspace,
            partition,
        })
    }
}

impl KeyValueCollection for DiskCollection {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.partition.get(key)?.map(|slice| slice.to_vec());
        if value.is_some() {
            debug!("Store HIT for key: {key}");
        } else {
            debug!("Store MISS for key: {key}");
        }
        Ok(value)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.partition.insert(key, value)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Store PUT for key: {key}");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.partition.remove(key)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Store REMOVE for key: {key}");
        Ok(())
    }
}
