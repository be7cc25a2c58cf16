//! Batch planning.
//!
//! Splits a requested number of sends into what can go out in the current
//! windows and, when the hourly cap is what held the batch back, a single
//! follow-up batch for the next hourly window. The plan looks one window
//! ahead only; callers re-plan after each window rolls over.

use std::time::Duration;

use cadence_common::{RateConfig, RateState};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Decision, Denial, DenyReason};

/// Answer to "how should I send these `n` messages".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "BatchPlanView")]
pub enum BatchPlan {
    /// Nothing can start now.
    Wait(Denial),
    Ready(ReadyBatch),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyBatch {
    /// Sends that fit in the current windows
    pub immediate_batch: u32,
    /// `immediate_batch` sends at the minimum delay cadence
    pub estimated_duration: Duration,
    pub remaining_for_later: u32,
    /// Zero or one follow-up batches
    pub additional_batches: Vec<DeferredBatch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeferredBatch {
    pub emails: u32,
    pub start_at: DateTime<Utc>,
}

impl BatchPlan {
    #[must_use]
    pub const fn can_start(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    #[must_use]
    pub const fn ready(&self) -> Option<&ReadyBatch> {
        match self {
            Self::Wait(_) => None,
            Self::Ready(ready) => Some(ready),
        }
    }
}

/// Plan `requested` sends given an admission `decision` made against the
/// same rolled-over `state`.
pub(crate) fn plan(
    config: &RateConfig,
    state: &RateState,
    decision: Decision,
    requested: u32,
) -> BatchPlan {
    if let Decision::Deny(denial) = decision {
        return BatchPlan::Wait(denial);
    }

    let remaining_hourly = state.hourly_remaining(config.per_hour);
    let remaining_daily = state.daily_remaining(config.effective_daily_limit());
    let immediate = requested.min(remaining_hourly).min(remaining_daily);
    let remaining_for_later = requested - immediate;

    let mut additional_batches = Vec::new();
    if remaining_for_later > 0 && remaining_hourly <= immediate {
        additional_batches.push(DeferredBatch {
            emails: remaining_for_later.min(config.per_hour),
            start_at: state.hour_reset_at,
        });
    }

    BatchPlan::Ready(ReadyBatch {
        immediate_batch: immediate,
        estimated_duration: Duration::from_secs(
            u64::from(immediate) * u64::from(config.min_delay_seconds),
        ),
        remaining_for_later,
        additional_batches,
    })
}

#[derive(Serialize)]
struct BatchPlanView {
    can_start: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    immediate_batch: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimated_duration_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining_for_later: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    additional_batches: Option<Vec<DeferredBatch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wait_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<DenyReason>,
}

impl From<BatchPlan> for BatchPlanView {
    fn from(plan: BatchPlan) -> Self {
        match plan {
            BatchPlan::Wait(denial) => Self {
                can_start: false,
                immediate_batch: None,
                estimated_duration_seconds: None,
                remaining_for_later: None,
                additional_batches: None,
                wait_seconds: Some(denial.wait_seconds()),
                reason: Some(denial.reason),
            },
            BatchPlan::Ready(ready) => Self {
                can_start: true,
                immediate_batch: Some(ready.immediate_batch),
                estimated_duration_seconds: Some(ready.estimated_duration.as_secs()),
                remaining_for_later: Some(ready.remaining_for_later),
                additional_batches: Some(ready.additional_batches),
                wait_seconds: None,
                reason: None,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::admission::evaluate;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 10, 15, 0).unwrap()
    }

    fn config(per_hour: u32, per_day: u32) -> RateConfig {
        RateConfig {
            per_hour,
            per_day,
            min_delay_seconds: 5,
            warmup_enabled: false,
            ..RateConfig::default()
        }
    }

    fn plan_at(config: &RateConfig, state: &RateState, requested: u32) -> BatchPlan {
        plan(config, state, evaluate(config, state, now()), requested)
    }

    #[test]
    fn test_hourly_cap_splits_batch() {
        let config = config(10, 200);
        let mut state = RateState::fresh(now());
        state.sent_this_hour = 8;
        state.sent_today = 8;

        let plan = plan_at(&config, &state, 20);
        let ready = plan.ready().unwrap();

        assert_eq!(ready.immediate_batch, 2);
        assert_eq!(ready.remaining_for_later, 18);
        assert_eq!(ready.estimated_duration, Duration::from_secs(10));
        assert_eq!(
            ready.additional_batches,
            vec![DeferredBatch {
                emails: 10,
                start_at: state.hour_reset_at,
            }]
        );
    }

    #[test]
    fn test_small_request_fits() {
        let config = config(10, 200);
        let state = RateState::fresh(now());

        let plan = plan_at(&config, &state, 4);
        let ready = plan.ready().unwrap();
        assert_eq!(ready.immediate_batch, 4);
        assert_eq!(ready.remaining_for_later, 0);
        assert!(ready.additional_batches.is_empty());
    }

    #[test]
    fn test_exact_fit_has_no_follow_up() {
        let config = config(10, 200);
        let state = RateState::fresh(now());

        let ready = plan_at(&config, &state, 10).ready().cloned().unwrap();
        assert_eq!(ready.immediate_batch, 10);
        assert!(ready.additional_batches.is_empty());
    }

    #[test]
    fn test_daily_cap_binding_has_no_follow_up() {
        let config = config(10, 20);
        let mut state = RateState::fresh(now());
        state.sent_today = 17;

        let ready = plan_at(&config, &state, 8).ready().cloned().unwrap();
        assert_eq!(ready.immediate_batch, 3);
        assert_eq!(ready.remaining_for_later, 5);
        assert!(ready.additional_batches.is_empty());
    }

    #[test]
    fn test_follow_up_is_capped_by_remainder() {
        let config = config(10, 200);
        let mut state = RateState::fresh(now());
        state.sent_this_hour = 7;

        let ready = plan_at(&config, &state, 5).ready().cloned().unwrap();
        assert_eq!(ready.immediate_batch, 3);
        assert_eq!(ready.additional_batches[0].emails, 2);
    }

    #[test]
    fn test_denied_plan_carries_denial() {
        let config = config(10, 200);
        let mut state = RateState::fresh(now());
        state.sent_this_hour = 10;

        let plan = plan_at(&config, &state, 5);
        assert!(!plan.can_start());
        let BatchPlan::Wait(denial) = plan else {
            panic!("expected a wait plan");
        };
        assert_eq!(denial.reason, DenyReason::HourlyLimitReached);
    }

    #[test]
    fn test_plan_json_shape() {
        let config = config(10, 200);
        let mut state = RateState::fresh(now());
        state.sent_this_hour = 8;

        let json = serde_json::to_value(plan_at(&config, &state, 20)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "can_start": true,
                "immediate_batch": 2,
                "estimated_duration_seconds": 10,
                "remaining_for_later": 18,
                "additional_batches": [
                    { "emails": 10, "start_at": "2024-09-02T11:15:00Z" }
                ],
            })
        );

        state.sent_this_hour = 10;
        let json = serde_json::to_value(plan_at(&config, &state, 20)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "can_start": false,
                "wait_seconds": 3600.0,
                "reason": "hourly_limit_reached",
            })
        );
    }
}
