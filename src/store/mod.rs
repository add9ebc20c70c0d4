pub mod disk;
pub mod memory;

use anyhow::Result;
use disk::DiskCollection;
use memory::MemoryCollection;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Name of the partition holding all application state.
pub const COLLECTION_NAME: &str = "xfx";

/// A byte-oriented key-value collection.
pub trait KeyValueCollection: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Opens the persistent collection under `data_dir`.
///
/// Falls back to a process-local collection when the keyspace cannot be opened, so
/// preferences still work for the lifetime of the process.
pub fn open_collection(data_dir: &Path) -> Arc<dyn KeyValueCollection> {
    match DiskCollection::open(&data_dir.join("store"), COLLECTION_NAME) {
        Ok(collection) => Arc::new(collection),
        Err(e) => {
            warn!(
                "Could not open store at {}: {e:#}. Preferences will not be saved.",
                data_dir.display()
            );
            Arc::new(MemoryCollection::new())
        }
    }
}
