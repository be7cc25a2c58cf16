use std::sync::Arc;

use ahash::AHashMap;
use cadence_common::{CampaignId, RateConfig, RateState};
use parking_lot::RwLock;

use crate::{StoreError, store::CampaignStore};

#[derive(Debug, Clone, Default)]
pub(crate) struct Records {
    pub(crate) config: Option<RateConfig>,
    pub(crate) state: Option<RateState>,
}

/// In-memory backing store implementation
///
/// Records live in an `AHashMap` behind an `RwLock`. Clones share the same
/// map, so a test can hand one clone to the governor and inspect another.
/// Nothing survives the process; use [`FileStore`](super::FileStore) when the
/// counters must outlive a restart.
///
/// # Capacity Management
/// The store can be limited to a number of campaigns. Writing the first
/// record for a campaign beyond that limit fails with
/// [`StoreError::CapacityExceeded`]; campaigns already present can always be
/// updated.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    pub(crate) records: Arc<RwLock<AHashMap<CampaignId, Records>>>,
    /// Maximum number of campaigns to store (None = unlimited)
    capacity: Option<usize>,
}

impl MemoryStore {
    /// Create a new empty store with unlimited capacity
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(AHashMap::new())),
            capacity: None,
        }
    }

    /// Create a new store holding at most `capacity` campaigns
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(AHashMap::new())),
            capacity: Some(capacity),
        }
    }

    /// Number of campaigns with at least one record
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the configured capacity (None = unlimited)
    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn update(
        &self,
        id: &CampaignId,
        write: impl FnOnce(&mut Records),
    ) -> crate::Result<()> {
        let mut records = self.records.write();

        if let Some(capacity) = self.capacity
            && !records.contains_key(id)
            && records.len() >= capacity
        {
            return Err(StoreError::CapacityExceeded {
                len: records.len(),
                capacity,
            });
        }

        write(records.entry(id.clone()).or_default());
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CampaignStore for MemoryStore {
    fn load_config(&self, id: &CampaignId) -> crate::Result<Option<RateConfig>> {
        Ok(self.records.read().get(id).and_then(|r| r.config.clone()))
    }

    fn save_config(&self, id: &CampaignId, config: &RateConfig) -> crate::Result<()> {
        self.update(id, |r| r.config = Some(config.clone()))
    }

    fn load_state(&self, id: &CampaignId) -> crate::Result<Option<RateState>> {
        Ok(self.records.read().get(id).and_then(|r| r.state.clone()))
    }

    fn save_state(&self, id: &CampaignId, state: &RateState) -> crate::Result<()> {
        self.update(id, |r| r.state = Some(state.clone()))
    }

    fn list(&self) -> crate::Result<Vec<CampaignId>> {
        let mut ids: Vec<_> = self.records.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
