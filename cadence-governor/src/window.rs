//! Window rollover.
//!
//! Applied at the start of every governor operation so that decisions never
//! read counters from a window that has already ended.
//!
//! ```text
//! now >= hour_reset_at  ->  sent_this_hour = 0, hour_reset_at = now + 1h
//! now >= day_reset_at   ->  sent_today = 0, day_reset_at = next UTC midnight,
//!                           warmup_day advances (if warmup is enabled)
//! ```
//!
//! Rollover never clamps counters against a lowered cap; it only resets them
//! at the next boundary.

use cadence_common::{
    RateConfig, RateState, WarmupAdvance, next_day_boundary, next_hour_boundary,
};
use chrono::{DateTime, Utc};

/// What a rollover changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Rollover {
    pub(crate) hour: bool,
    pub(crate) day: bool,
    /// Steps `warmup_day` moved forward
    pub(crate) warmup_steps: u32,
}

impl Rollover {
    pub(crate) const fn state_changed(self) -> bool {
        self.hour || self.day
    }

    pub(crate) const fn config_changed(self) -> bool {
        self.warmup_steps > 0
    }
}

/// Bring `state` (and the warmup position in `config`) up to date with `now`.
pub(crate) fn roll(
    config: &mut RateConfig,
    state: &mut RateState,
    now: DateTime<Utc>,
    advance: WarmupAdvance,
) -> Rollover {
    let mut rollover = Rollover::default();

    if now >= state.hour_reset_at {
        state.sent_this_hour = 0;
        state.hour_reset_at = next_hour_boundary(now);
        rollover.hour = true;
    }

    if now >= state.day_reset_at {
        let steps = match advance {
            WarmupAdvance::OncePerRollover => 1,
            WarmupAdvance::PerElapsedDay => days_crossed(state.day_reset_at, now),
        };

        state.sent_today = 0;
        state.day_reset_at = next_day_boundary(now);
        rollover.day = true;

        if config.warmup_enabled {
            config.warmup_day = config.warmup_day.saturating_add(steps);
            rollover.warmup_steps = steps;
        }
    }

    rollover
}

/// Number of UTC midnights in `[reset_at, now]`, given `reset_at <= now`.
fn days_crossed(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let days = (now.date_naive() - reset_at.date_naive()).num_days() + 1;
    u32::try_from(days.max(1)).unwrap_or(u32::MAX)
}
