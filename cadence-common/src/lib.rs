//! Shared building blocks for the cadence send-rate governor.
//!
//! This crate holds the per-campaign data model ([`RateConfig`],
//! [`RateState`]), the identifier type used to address campaign records, the
//! [`Clock`] seam through which every operation observes "now", and the
//! logging setup shared by the other crates.

pub mod campaign;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod state;

pub use campaign::CampaignId;
#[cfg(feature = "testing")]
pub use clock::ManualClock;
pub use clock::{Clock, SystemClock};
pub use config::{ConfigUpdate, RateConfig, WarmupAdvance};
pub use error::{CampaignIdError, ConfigError};
pub use state::{RateState, next_day_boundary, next_hour_boundary};
pub use tracing;
