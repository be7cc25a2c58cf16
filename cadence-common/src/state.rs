//! Durable per-campaign counters.
//!
//! Window ends are stored as absolute instants rather than elapsed counters,
//! so a restarted process resumes the current windows from storage without
//! any clock other than "now".

use chrono::{DateTime, Days, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Mutable send counters for a single campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateState {
    pub sent_this_hour: u32,
    pub sent_today: u32,

    /// Instant at which `sent_this_hour` is next cleared
    pub hour_reset_at: DateTime<Utc>,

    /// Instant at which `sent_today` is next cleared (a UTC midnight)
    pub day_reset_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sent_at: Option<DateTime<Utc>>,

    /// Messages the caller reports as waiting; informational only
    #[serde(default)]
    pub queue_size: u32,
}

impl RateState {
    /// State for a campaign seen for the first time at `now`.
    #[must_use]
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            sent_this_hour: 0,
            sent_today: 0,
            hour_reset_at: next_hour_boundary(now),
            day_reset_at: next_day_boundary(now),
            last_sent_at: None,
            queue_size: 0,
        }
    }

    /// Sends still available in the hourly window, clamped at zero.
    #[must_use]
    pub const fn hourly_remaining(&self, per_hour: u32) -> u32 {
        per_hour.saturating_sub(self.sent_this_hour)
    }

    /// Sends still available in the daily window, clamped at zero.
    #[must_use]
    pub const fn daily_remaining(&self, daily_limit: u32) -> u32 {
        daily_limit.saturating_sub(self.sent_today)
    }
}

/// End of the hourly window that starts at `now`.
#[must_use]
pub fn next_hour_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_add_signed(TimeDelta::hours(1))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// The UTC midnight that starts the calendar day after `now`.
#[must_use]
pub fn next_day_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .checked_add_days(Days::new(1))
        .map_or(DateTime::<Utc>::MAX_UTC, |date| {
            date.and_time(NaiveTime::MIN).and_utc()
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_fresh_state_windows() {
        let now = Utc.with_ymd_and_hms(2024, 5, 17, 22, 15, 30).unwrap();
        let state = RateState::fresh(now);

        assert_eq!(state.sent_this_hour, 0);
        assert_eq!(state.sent_today, 0);
        assert_eq!(
            state.hour_reset_at,
            Utc.with_ymd_and_hms(2024, 5, 17, 23, 15, 30).unwrap()
        );
        assert_eq!(
            state.day_reset_at,
            Utc.with_ymd_and_hms(2024, 5, 18, 0, 0, 0).unwrap()
        );
        assert!(state.last_sent_at.is_none());
    }

    #[test]
    fn test_day_boundary_is_calendar_midnight() {
        // One second before midnight still resets at the coming midnight
        let late = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(
            next_day_boundary(late),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );

        // Exactly midnight moves to the following midnight
        let midnight = Utc.with_ymd_and_hms(2024, 2, 28, 0, 0, 0).unwrap();
        assert_eq!(
            next_day_boundary(midnight),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_boundaries_saturate() {
        assert_eq!(
            next_hour_boundary(DateTime::<Utc>::MAX_UTC),
            DateTime::<Utc>::MAX_UTC
        );
        assert_eq!(
            next_day_boundary(DateTime::<Utc>::MAX_UTC),
            DateTime::<Utc>::MAX_UTC
        );
    }

    #[test]
    fn test_remaining_clamps_at_zero() {
        let mut state = RateState::fresh(Utc::now());
        state.sent_this_hour = 12;
        state.sent_today = 40;

        assert_eq!(state.hourly_remaining(10), 0);
        assert_eq!(state.hourly_remaining(15), 3);
        assert_eq!(state.daily_remaining(25), 0);
        assert_eq!(state.daily_remaining(50), 10);
    }

    #[test]
    fn test_state_json_shape() {
        let now = Utc.with_ymd_and_hms(2024, 5, 17, 10, 0, 0).unwrap();
        let state = RateState::fresh(now);
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["sent_this_hour"], 0);
        assert_eq!(json["hour_reset_at"], "2024-05-17T11:00:00Z");
        assert_eq!(json["day_reset_at"], "2024-05-18T00:00:00Z");
        assert!(json.get("last_sent_at").is_none());

        let back: RateState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
