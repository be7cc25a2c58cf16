//! Read-only campaign snapshot.

use cadence_common::{CampaignId, RateConfig, RateState};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::Decision;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub campaign_id: CampaignId,
    pub config: RateConfig,
    pub hourly: WindowView,
    pub daily: WindowView,
    pub queue_size: u32,
    pub warmup: WarmupView,
    pub can_send: Decision,
}

/// Usage of one admission window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowView {
    pub sent: u32,
    pub limit: u32,
    /// `limit - sent`, clamped at zero
    pub remaining: u32,
    pub resets_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarmupView {
    pub enabled: bool,
    /// Whether the schedule, rather than `per_day`, sets today's cap
    pub active: bool,
    pub day: u32,
    pub schedule: Vec<u32>,
    /// The daily cap in force today
    pub current_limit: u32,
}

impl StatusView {
    pub(crate) fn new(
        campaign_id: CampaignId,
        config: RateConfig,
        state: &RateState,
        can_send: Decision,
    ) -> Self {
        let daily_limit = config.effective_daily_limit();

        Self {
            hourly: WindowView {
                sent: state.sent_this_hour,
                limit: config.per_hour,
                remaining: state.hourly_remaining(config.per_hour),
                resets_at: state.hour_reset_at,
            },
            daily: WindowView {
                sent: state.sent_today,
                limit: daily_limit,
                remaining: state.daily_remaining(daily_limit),
                resets_at: state.day_reset_at,
            },
            queue_size: state.queue_size,
            warmup: WarmupView {
                enabled: config.warmup_enabled,
                active: config.in_warmup(),
                day: config.warmup_day,
                schedule: config.warmup_schedule.clone(),
                current_limit: daily_limit,
            },
            campaign_id,
            config,
            can_send,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_remaining_is_clamped_after_cap_lowered() {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 16, 0, 0).unwrap();
        let config = RateConfig {
            per_hour: 5,
            warmup_schedule: vec![10, 25],
            warmup_day: 1,
            ..RateConfig::default()
        };
        let mut state = RateState::fresh(now);
        state.sent_this_hour = 9;
        state.sent_today = 9;
        state.queue_size = 40;

        let view = StatusView::new(
            "spring-launch".parse().unwrap(),
            config,
            &state,
            Decision::Allow,
        );

        assert_eq!(view.hourly.remaining, 0);
        assert_eq!(view.daily.limit, 25);
        assert_eq!(view.daily.remaining, 16);
        assert_eq!(view.warmup.current_limit, 25);
        assert_eq!(view.warmup.day, 1);
        assert!(view.warmup.active);
        assert_eq!(view.queue_size, 40);
    }

    #[test]
    fn test_status_json_shape() {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 16, 0, 0).unwrap();
        let config = RateConfig {
            warmup_enabled: false,
            ..RateConfig::default()
        };
        let state = RateState::fresh(now);
        let view = StatusView::new("q1".parse().unwrap(), config, &state, Decision::Allow);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["campaign_id"], "q1");
        assert_eq!(json["config"]["per_hour"], 50);
        assert_eq!(json["daily"]["limit"], 200);
        assert_eq!(json["daily"]["resets_at"], "2024-02-02T00:00:00Z");
        assert_eq!(json["hourly"]["resets_at"], "2024-02-01T17:00:00Z");
        assert_eq!(json["warmup"]["enabled"], false);
        assert_eq!(json["warmup"]["active"], false);
        assert_eq!(json["can_send"], serde_json::json!({ "allowed": true }));
    }
}
