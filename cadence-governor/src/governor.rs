//! The per-campaign send-rate governor.
//!
//! Every public operation follows the same sequence while holding the
//! campaign's lock:
//!
//! ```text
//! read clock -> load records -> roll windows -> persist rollover -> decide / book -> persist
//! ```
//!
//! Campaigns are independent: each has its own lock, handed out from a
//! [`DashMap`], and operations on different campaigns never contend.

use std::{fmt, sync::Arc};

use cadence_common::{
    CampaignId, Clock, ConfigUpdate, RateConfig, RateState, SystemClock, WarmupAdvance, internal,
};
use cadence_store::{CampaignStore, StoreError};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, RawMutex, lock_api::ArcMutexGuard};

use crate::{
    BatchPlan, Decision, GovernorSettings, SendEvent, StatusView, admission, batch, window,
};

type CampaignGuard = ArcMutexGuard<RawMutex, ()>;

/// A campaign's records, rolled over to the instant they were opened at.
struct Record {
    config: RateConfig,
    state: RateState,
}

/// Admission control for outbound campaigns.
#[derive(Debug)]
pub struct Governor {
    store: Arc<dyn CampaignStore>,
    clock: Arc<dyn Clock>,
    /// Policy for campaigns seen for the first time
    defaults: RateConfig,
    warmup_advance: WarmupAdvance,
    locks: DashMap<CampaignId, Arc<Mutex<()>>>,
}

impl Governor {
    /// A governor over `store` using wall-clock time and default policy.
    #[must_use]
    pub fn new(store: Arc<dyn CampaignStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            defaults: RateConfig::default(),
            warmup_advance: WarmupAdvance::default(),
            locks: DashMap::new(),
        }
    }

    /// Build a governor from loaded settings, initialising its store.
    ///
    /// # Errors
    /// If the configured store cannot be initialised
    pub fn from_settings(settings: GovernorSettings) -> crate::Result<Self> {
        let store = settings.store.into_store()?;

        Ok(Self::new(store)
            .with_defaults(settings.defaults)
            .with_warmup_advance(settings.warmup_advance))
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Policy applied to a campaign the first time it is accessed.
    #[must_use]
    pub fn with_defaults(mut self, defaults: RateConfig) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub fn with_warmup_advance(mut self, advance: WarmupAdvance) -> Self {
        self.warmup_advance = advance;
        self
    }

    /// Whether the next send for `id` may happen now.
    ///
    /// Rolls the campaign's windows over but never moves its send counters.
    ///
    /// # Errors
    /// If the campaign's records cannot be loaded or the rollover cannot be
    /// persisted
    #[tracing::instrument(level = "debug", skip_all, fields(campaign = %id))]
    pub fn can_send(&self, id: &CampaignId) -> crate::Result<Decision> {
        let _guard = self.lock(id);
        let now = self.clock.now();
        let record = self.open(id, now)?;

        Ok(self.decide(id, &record, now))
    }

    /// Book one send that has already happened.
    ///
    /// The send is booked even if it takes a counter past its cap. To check
    /// and book without another caller slipping in between, use
    /// [`Governor::reserve`].
    ///
    /// # Errors
    /// If the campaign's records cannot be loaded or saved
    pub fn record_send(&self, id: &CampaignId) -> crate::Result<()> {
        self.record_event(id, SendEvent::sent())
    }

    /// Book `event` against the campaign's counters.
    ///
    /// # Errors
    /// If the campaign's records cannot be loaded or saved
    #[tracing::instrument(level = "debug", skip_all, fields(campaign = %id, kind = %event.kind, count = event.count))]
    pub fn record_event(&self, id: &CampaignId, event: SendEvent) -> crate::Result<()> {
        let _guard = self.lock(id);
        self.book(id, event)
    }

    /// Split `requested` sends into what can go now and what must wait.
    ///
    /// # Errors
    /// If the campaign's records cannot be loaded or the rollover cannot be
    /// persisted
    #[tracing::instrument(level = "debug", skip_all, fields(campaign = %id, requested = requested))]
    pub fn schedule_batch(&self, id: &CampaignId, requested: u32) -> crate::Result<BatchPlan> {
        let _guard = self.lock(id);
        let now = self.clock.now();
        let record = self.open(id, now)?;
        let decision = self.decide(id, &record, now);

        Ok(batch::plan(&record.config, &record.state, decision, requested))
    }

    /// Apply a partial configuration update and return the new status.
    ///
    /// Counters are not clamped against lowered caps; the new caps apply from
    /// the next decision onwards.
    ///
    /// # Errors
    /// [`GovernorError::Config`](crate::GovernorError::Config) if any field is
    /// out of range, in which case nothing is changed. Otherwise, if the
    /// campaign's records cannot be loaded or saved.
    #[tracing::instrument(level = "debug", skip_all, fields(campaign = %id))]
    pub fn configure(&self, id: &CampaignId, update: &ConfigUpdate) -> crate::Result<StatusView> {
        let _guard = self.lock(id);
        let now = self.clock.now();
        let mut record = self.open(id, now)?;

        record.config.apply(update)?;
        self.store
            .save_config(id, &record.config)
            .inspect_err(|error| storage_failure(id, "save config", error))?;

        tracing::info!(
            campaign = %id,
            per_hour = record.config.per_hour,
            per_day = record.config.per_day,
            min_delay_seconds = record.config.min_delay_seconds,
            warmup_enabled = record.config.warmup_enabled,
            "Campaign reconfigured"
        );

        Ok(self.snapshot(id, record, now))
    }

    /// Current configuration, window usage and admission decision.
    ///
    /// # Errors
    /// If the campaign's records cannot be loaded or the rollover cannot be
    /// persisted
    #[tracing::instrument(level = "debug", skip_all, fields(campaign = %id))]
    pub fn status(&self, id: &CampaignId) -> crate::Result<StatusView> {
        let _guard = self.lock(id);
        let now = self.clock.now();
        let record = self.open(id, now)?;

        Ok(self.snapshot(id, record, now))
    }

    /// Campaigns the store holds records for, sorted.
    ///
    /// # Errors
    /// If the store cannot be enumerated
    pub fn campaigns(&self) -> crate::Result<Vec<CampaignId>> {
        Ok(self.store.list()?)
    }

    /// Check admission for `id` and keep the campaign locked until the
    /// returned [`Reservation`] is committed or dropped.
    ///
    /// Other operations on the same campaign block until then, so a caller
    /// that sends only on an allowed reservation cannot overshoot a cap
    /// however many threads share the campaign.
    ///
    /// # Errors
    /// If the campaign's records cannot be loaded or the rollover cannot be
    /// persisted
    pub fn reserve(&self, id: &CampaignId) -> crate::Result<Reservation<'_>> {
        let guard = self.lock(id);
        let now = self.clock.now();
        let record = self.open(id, now)?;
        let decision = self.decide(id, &record, now);

        Ok(Reservation {
            governor: self,
            campaign: id.clone(),
            decision,
            _guard: guard,
        })
    }

    fn lock(&self, id: &CampaignId) -> CampaignGuard {
        let lock = self
            .locks
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        lock.lock_arc()
    }

    /// Book an event. The caller holds the campaign lock.
    fn book(&self, id: &CampaignId, event: SendEvent) -> crate::Result<()> {
        let now = self.clock.now();
        let mut record = self.open(id, now)?;

        event.apply(&mut record.state, now);
        self.store
            .save_state(id, &record.state)
            .inspect_err(|error| storage_failure(id, "save state", error))?;

        internal!(
            campaign = %id,
            kind = %event.kind,
            count = event.count,
            sent_this_hour = record.state.sent_this_hour,
            sent_today = record.state.sent_today,
            queue_size = record.state.queue_size,
            "Event booked"
        );

        Ok(())
    }

    /// Load a campaign's records (creating them on first access) and roll
    /// them over to `now`, persisting whatever changed.
    ///
    /// State is written before config, so a failure in between leaves warmup
    /// behind rather than ahead of the windows.
    fn open(&self, id: &CampaignId, now: DateTime<Utc>) -> crate::Result<Record> {
        let config = self
            .store
            .load_config(id)
            .inspect_err(|error| storage_failure(id, "load config", error))?;
        let state = self
            .store
            .load_state(id)
            .inspect_err(|error| storage_failure(id, "load state", error))?;

        let config_missing = config.is_none();
        let state_missing = state.is_none();
        if config_missing && state_missing {
            internal!(level = DEBUG, campaign = %id, "Creating campaign records");
        }

        let mut record = Record {
            config: config.unwrap_or_else(|| self.defaults.clone()),
            state: state.unwrap_or_else(|| RateState::fresh(now)),
        };

        let rollover = window::roll(
            &mut record.config,
            &mut record.state,
            now,
            self.warmup_advance,
        );

        if rollover.day {
            tracing::info!(
                campaign = %id,
                warmup_day = record.config.warmup_day,
                warmup_steps = rollover.warmup_steps,
                daily_limit = record.config.effective_daily_limit(),
                resets_at = %record.state.day_reset_at,
                "Daily window rolled over"
            );
        }
        if rollover.hour {
            tracing::info!(
                campaign = %id,
                resets_at = %record.state.hour_reset_at,
                "Hourly window rolled over"
            );
        }

        if state_missing || rollover.state_changed() {
            self.store
                .save_state(id, &record.state)
                .inspect_err(|error| storage_failure(id, "save state", error))?;
        }
        if config_missing || rollover.config_changed() {
            self.store
                .save_config(id, &record.config)
                .inspect_err(|error| storage_failure(id, "save config", error))?;
        }

        Ok(record)
    }

    fn decide(&self, id: &CampaignId, record: &Record, now: DateTime<Utc>) -> Decision {
        let decision = admission::evaluate(&record.config, &record.state, now);

        if let Decision::Deny(denial) = &decision {
            tracing::debug!(
                campaign = %id,
                reason = %denial.reason,
                wait_seconds = denial.wait_seconds(),
                "Send denied"
            );
        }

        decision
    }

    fn snapshot(&self, id: &CampaignId, record: Record, now: DateTime<Utc>) -> StatusView {
        let decision = self.decide(id, &record, now);
        StatusView::new(id.clone(), record.config, &record.state, decision)
    }
}

fn storage_failure(id: &CampaignId, action: &str, error: &StoreError) {
    tracing::warn!(campaign = %id, %error, "Failed to {action}");
}

/// A campaign held locked after an admission check.
///
/// While a reservation is alive no other operation on its campaign can run.
/// Dropping it releases the campaign without booking anything.
#[must_use = "a reservation keeps its campaign locked until committed or dropped"]
pub struct Reservation<'a> {
    governor: &'a Governor,
    campaign: CampaignId,
    decision: Decision,
    _guard: CampaignGuard,
}

impl Reservation<'_> {
    /// The admission decision made when the reservation was taken.
    pub const fn decision(&self) -> &Decision {
        &self.decision
    }

    pub const fn is_allowed(&self) -> bool {
        self.decision.is_allowed()
    }

    /// Book one send and release the campaign.
    ///
    /// Like [`Governor::record_send`], the send is booked whatever the
    /// decision was.
    ///
    /// # Errors
    /// If the campaign's records cannot be loaded or saved
    pub fn commit(self) -> crate::Result<()> {
        self.governor.book(&self.campaign, SendEvent::sent())
    }
}

impl fmt::Debug for Reservation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reservation")
            .field("campaign", &self.campaign)
            .field("decision", &self.decision)
            .finish_non_exhaustive()
    }
}
