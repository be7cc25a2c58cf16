use std::sync::Arc;

use serde::Deserialize;

use crate::{
    backends::{FileStore, MemoryStore},
    store::CampaignStore,
};

/// Configuration for the campaign record store
///
/// Selects the backing store at runtime from the configuration file.
///
/// # Examples
///
/// File-backed store in RON config:
/// ```ron
/// (
///     store: File((
///         path: "/var/lib/cadence",
///     )),
/// )
/// ```
///
/// Memory-backed store with a capacity limit:
/// ```ron
/// (
///     store: Memory((
///         capacity: Some(1000),
///     )),
/// )
/// ```
#[derive(Debug, Clone, Deserialize)]
pub enum StoreConfig {
    /// JSON files on disk (production)
    File(FileStore),
    /// Process memory (testing/development)
    Memory(MemoryConfig),
}

/// Configuration for the memory-backed store
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MemoryConfig {
    /// Maximum number of campaigns to store (omit for unlimited)
    #[serde(default)]
    pub capacity: Option<usize>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Memory(MemoryConfig::default())
    }
}

impl StoreConfig {
    /// Get the directory for file-backed stores, if applicable
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::File(store) => Some(store.path()),
            Self::Memory(_) => None,
        }
    }

    /// Convert the configuration into a ready-to-use store
    ///
    /// File-backed stores are initialised (directory created, leftover
    /// temporary files removed) before being returned.
    ///
    /// # Errors
    /// Returns an error if file store initialisation fails
    pub fn into_store(self) -> crate::Result<Arc<dyn CampaignStore>> {
        match self {
            Self::File(store) => {
                store.init()?;
                Ok(Arc::new(store))
            }
            Self::Memory(MemoryConfig {
                capacity: Some(capacity),
            }) => Ok(Arc::new(MemoryStore::with_capacity(capacity))),
            Self::Memory(MemoryConfig { capacity: None }) => Ok(Arc::new(MemoryStore::new())),
        }
    }
}
