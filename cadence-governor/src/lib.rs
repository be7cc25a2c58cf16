//! Send-rate governor for outbound campaigns
//!
//! This crate decides, per campaign, whether the next email may go out now,
//! how many can go out in the current window, and how a requested batch
//! splits across windows. It enforces:
//! - an hourly cap
//! - a daily cap, ramped up day by day while warmup is enabled
//! - a minimum delay between consecutive sends
//!
//! All state lives in a [`CampaignStore`](cadence_store::CampaignStore), so a
//! restarted process resumes the current windows where it left off.

mod admission;
mod batch;
mod error;
mod event;
mod governor;
mod settings;
mod status;
mod window;

pub use admission::{Decision, Denial, DenyReason};
pub use batch::{BatchPlan, DeferredBatch, ReadyBatch};
pub use cadence_common::{CampaignId, ConfigUpdate, RateConfig, RateState, WarmupAdvance};
pub use error::{GovernorError, Result};
pub use event::{EventKind, SendEvent};
pub use governor::{Governor, Reservation};
pub use settings::GovernorSettings;
pub use status::{StatusView, WarmupView, WindowView};
