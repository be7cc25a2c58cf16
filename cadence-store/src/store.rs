use std::fmt::Debug;

use cadence_common::{CampaignId, RateConfig, RateState};

/// Durable storage for per-campaign records.
///
/// Each campaign has at most one [`RateConfig`] and one [`RateState`]. Loads
/// return `Ok(None)` for a record that has never been written; every other
/// failure is an error.
///
/// Implementations do not serialise concurrent read-modify-write sequences
/// themselves. The governor holds a per-campaign lock around each operation.
pub trait CampaignStore: Send + Sync + Debug {
    /// Load a campaign's config record
    ///
    /// # Errors
    /// If the record exists but cannot be read or decoded
    fn load_config(&self, id: &CampaignId) -> crate::Result<Option<RateConfig>>;

    /// Persist a campaign's config record, replacing any previous one
    ///
    /// # Errors
    /// If the record cannot be encoded or written
    fn save_config(&self, id: &CampaignId, config: &RateConfig) -> crate::Result<()>;

    /// Load a campaign's state record
    ///
    /// # Errors
    /// If the record exists but cannot be read or decoded
    fn load_state(&self, id: &CampaignId) -> crate::Result<Option<RateState>>;

    /// Persist a campaign's state record, replacing any previous one
    ///
    /// # Errors
    /// If the record cannot be encoded or written
    fn save_state(&self, id: &CampaignId, state: &RateState) -> crate::Result<()>;

    /// All campaigns with at least one stored record, sorted
    ///
    /// # Errors
    /// If the underlying storage cannot be enumerated
    fn list(&self) -> crate::Result<Vec<CampaignId>>;
}
