use super::KeyValueCollection;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// In-memory collection backed by a HashMap
#[derive(Default)]
pub struct MemoryCollection {
    inner: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueCollection for MemoryCollection {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let map = self
            .inner
            .read()
            .map_err(|_| anyhow!("Memory collection lock poisoned"))?;
        let value = map.get(key).cloned();
        if value.is_some() {
            debug!("Store HIT for key: {key}");
        } else {
            debug!("Store MISS for key: {key}");
        }
        Ok(value)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| anyhow!("Memory collection lock poisoned"))?;
        debug!("Store PUT for key: {key}");
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| anyhow!("Memory collection lock poisoned"))?;
        map.remove(key);
        debug!("Store REMOVE for key: {key}");
        Ok(())
    }
}
