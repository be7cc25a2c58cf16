//! Admission decisions.
//!
//! Rules are checked in a fixed priority order and the first match wins:
//! the daily cap, then the hourly cap, then the minimum delay since the last
//! send. Evaluation reads counters only; it never moves them.

use std::{fmt, time::Duration};

use cadence_common::{RateConfig, RateState};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// Why a send was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    DailyLimitReached,
    HourlyLimitReached,
    MinDelay,
}

impl DenyReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DailyLimitReached => "daily_limit_reached",
            Self::HourlyLimitReached => "hourly_limit_reached",
            Self::MinDelay => "min_delay",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A refused send and how long to wait before asking again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denial {
    pub reason: DenyReason,
    pub wait: Duration,
    /// The cap that was hit. Absent for [`DenyReason::MinDelay`].
    pub limit: Option<u32>,
    /// Sends counted against `limit`. Absent for [`DenyReason::MinDelay`].
    pub sent: Option<u32>,
}

impl Denial {
    #[must_use]
    pub const fn wait_seconds(&self) -> f64 {
        self.wait.as_secs_f64()
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "DecisionView")]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    #[must_use]
    pub const fn denial(&self) -> Option<&Denial> {
        match self {
            Self::Allow => None,
            Self::Deny(denial) => Some(denial),
        }
    }
}

/// Wire shape: `{allowed, reason?, wait_seconds?, limit?, sent?}`
#[derive(Serialize)]
struct DecisionView {
    allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<DenyReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wait_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sent: Option<u32>,
}

impl From<Decision> for DecisionView {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Allow => Self {
                allowed: true,
                reason: None,
                wait_seconds: None,
                limit: None,
                sent: None,
            },
            Decision::Deny(denial) => Self {
                allowed: false,
                reason: Some(denial.reason),
                wait_seconds: Some(denial.wait_seconds()),
                limit: denial.limit,
                sent: denial.sent,
            },
        }
    }
}

/// Time from `now` until `instant`, zero if `instant` has passed.
pub(crate) fn until(now: DateTime<Utc>, instant: DateTime<Utc>) -> Duration {
    (instant - now).to_std().unwrap_or(Duration::ZERO)
}

/// Decide whether a send may happen at `now`.
///
/// `state` must already be rolled over to `now`.
pub(crate) fn evaluate(config: &RateConfig, state: &RateState, now: DateTime<Utc>) -> Decision {
    let daily_limit = config.effective_daily_limit();
    if state.sent_today >= daily_limit {
        return Decision::Deny(Denial {
            reason: DenyReason::DailyLimitReached,
            wait: until(now, state.day_reset_at),
            limit: Some(daily_limit),
            sent: Some(state.sent_today),
        });
    }

    if state.sent_this_hour >= config.per_hour {
        return Decision::Deny(Denial {
            reason: DenyReason::HourlyLimitReached,
            wait: until(now, state.hour_reset_at),
            limit: Some(config.per_hour),
            sent: Some(state.sent_this_hour),
        });
    }

    if let Some(last_sent_at) = state.last_sent_at {
        let min_delay = TimeDelta::seconds(i64::from(config.min_delay_seconds));
        // A clock that stepped backwards counts as no time elapsed
        let elapsed = (now - last_sent_at).max(TimeDelta::zero());
        if elapsed < min_delay {
            return Decision::Deny(Denial {
                reason: DenyReason::MinDelay,
                wait: (min_delay - elapsed).to_std().unwrap_or(Duration::ZERO),
                limit: None,
                sent: None,
            });
        }
    }

    Decision::Allow
}
