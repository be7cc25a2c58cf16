//! Per-campaign send policy.
//!
//! A [`RateConfig`] is created with defaults on a campaign's first access and
//! changes only through [`RateConfig::apply`] (operator overrides) or through
//! warmup advancement during day rollover.
//!
//! # Warmup
//!
//! While warmup is enabled, the daily ceiling follows `warmup_schedule`
//! indexed by `warmup_day`; once the schedule is exhausted `per_day` applies.
//!
//! ```text
//! schedule: [10, 25, 50], per_day: 200
//! day 0 -> 10, day 1 -> 25, day 2 -> 50, day 3+ -> 200
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Send policy for a single campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateConfig {
    /// Maximum sends in any hourly window
    #[serde(default = "defaults::per_hour")]
    pub per_hour: u32,

    /// Steady-state maximum sends per calendar day
    #[serde(default = "defaults::per_day")]
    pub per_day: u32,

    /// Minimum wall-clock gap between consecutive sends
    #[serde(default = "defaults::min_delay_seconds")]
    pub min_delay_seconds: u32,

    #[serde(default = "defaults::warmup_enabled")]
    pub warmup_enabled: bool,

    /// Number of day rollovers observed since warmup began
    #[serde(default)]
    pub warmup_day: u32,

    /// Daily caps for each warmup day, in order
    #[serde(default = "defaults::warmup_schedule")]
    pub warmup_schedule: Vec<u32>,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            per_hour: defaults::per_hour(),
            per_day: defaults::per_day(),
            min_delay_seconds: defaults::min_delay_seconds(),
            warmup_enabled: defaults::warmup_enabled(),
            warmup_day: 0,
            warmup_schedule: defaults::warmup_schedule(),
        }
    }
}

impl RateConfig {
    /// The daily ceiling in force right now.
    ///
    /// Always derived from the current fields, never cached.
    #[must_use]
    pub fn effective_daily_limit(&self) -> u32 {
        if !self.warmup_enabled {
            return self.per_day;
        }

        usize::try_from(self.warmup_day)
            .ok()
            .and_then(|day| self.warmup_schedule.get(day))
            .copied()
            .unwrap_or(self.per_day)
    }

    /// Whether the warmup ramp is still driving the daily ceiling.
    #[must_use]
    pub fn in_warmup(&self) -> bool {
        self.warmup_enabled
            && usize::try_from(self.warmup_day).is_ok_and(|day| day < self.warmup_schedule.len())
    }

    /// Apply an operator update.
    ///
    /// Every field is validated before any is written, so a rejected update
    /// leaves the config untouched. Fields left as `None` are unchanged.
    ///
    /// # Errors
    /// Returns [`ConfigError`] for the first negative or oversized value.
    pub fn apply(&mut self, update: &ConfigUpdate) -> Result<(), ConfigError> {
        let per_hour = update.per_hour.map(|v| to_limit("per_hour", v)).transpose()?;
        let per_day = update.per_day.map(|v| to_limit("per_day", v)).transpose()?;
        let min_delay_seconds = update
            .min_delay_seconds
            .map(|v| to_limit("min_delay_seconds", v))
            .transpose()?;
        let warmup_schedule = update
            .warmup_schedule
            .as_ref()
            .map(|schedule| {
                schedule
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| to_limit(&format!("warmup_schedule[{i}]"), v))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        if let Some(per_hour) = per_hour {
            self.per_hour = per_hour;
        }
        if let Some(per_day) = per_day {
            self.per_day = per_day;
        }
        if let Some(min_delay_seconds) = min_delay_seconds {
            self.min_delay_seconds = min_delay_seconds;
        }
        if let Some(warmup_enabled) = update.warmup_enabled {
            self.warmup_enabled = warmup_enabled;
        }
        if let Some(warmup_schedule) = warmup_schedule {
            self.warmup_schedule = warmup_schedule;
        }

        Ok(())
    }
}

fn to_limit(field: &str, value: i64) -> Result<u32, ConfigError> {
    if value < 0 {
        return Err(ConfigError::Negative {
            field: field.to_string(),
            value,
        });
    }

    u32::try_from(value).map_err(|_| ConfigError::OutOfRange {
        field: field.to_string(),
        value,
        max: u32::MAX,
    })
}

/// A partial set of overrides for [`RateConfig`].
///
/// Values are signed because this is where operator input enters; negative
/// values are rejected by [`RateConfig::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_hour: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_day: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_delay_seconds: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup_schedule: Option<Vec<i64>>,
}

impl ConfigUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// How far `warmup_day` moves when a day rollover is observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarmupAdvance {
    /// One step per rollover, however many days passed while idle
    #[default]
    OncePerRollover,
    /// One step per UTC calendar-day boundary crossed since the last rollover
    PerElapsedDay,
}

mod defaults {
    pub const fn per_hour() -> u32 {
        50
    }

    pub const fn per_day() -> u32 {
        200
    }

    pub const fn min_delay_seconds() -> u32 {
        5
    }

    pub const fn warmup_enabled() -> bool {
        true
    }

    pub fn warmup_schedule() -> Vec<u32> {
        vec![10, 25, 50, 100, 150, 200]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ramp(schedule: &[u32]) -> RateConfig {
        RateConfig {
            per_day: 200,
            warmup_enabled: true,
            warmup_schedule: schedule.to_vec(),
            ..RateConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = RateConfig::default();
        assert_eq!(config.per_hour, 50);
        assert_eq!(config.per_day, 200);
        assert_eq!(config.min_delay_seconds, 5);
        assert!(config.warmup_enabled);
        assert_eq!(config.warmup_day, 0);
        assert_eq!(config.warmup_schedule, vec![10, 25, 50, 100, 150, 200]);
        assert_eq!(config.effective_daily_limit(), 10);
    }

    #[test]
    fn test_effective_limit_follows_warmup_schedule() {
        let mut config = ramp(&[10, 25, 50]);
        assert_eq!(config.effective_daily_limit(), 10);

        config.warmup_day = 1;
        assert_eq!(config.effective_daily_limit(), 25);

        config.warmup_day = 2;
        assert_eq!(config.effective_daily_limit(), 50);
        assert!(config.in_warmup());

        config.warmup_day = 3;
        assert_eq!(config.effective_daily_limit(), 200);
        assert!(!config.in_warmup());

        config.warmup_day = 40;
        assert_eq!(config.effective_daily_limit(), 200);
    }

    #[test]
    fn test_effective_limit_without_warmup() {
        let mut config = ramp(&[10, 25, 50]);
        config.warmup_enabled = false;
        assert_eq!(config.effective_daily_limit(), 200);
        assert!(!config.in_warmup());
    }

    #[test]
    fn test_empty_schedule_falls_back_to_per_day() {
        let config = ramp(&[]);
        assert_eq!(config.effective_daily_limit(), 200);
    }

    #[test]
    fn test_apply_partial_update() {
        let mut config = RateConfig::default();
        config
            .apply(&ConfigUpdate {
                per_hour: Some(10),
                warmup_enabled: Some(false),
                ..ConfigUpdate::default()
            })
            .unwrap();

        assert_eq!(config.per_hour, 10);
        assert!(!config.warmup_enabled);
        // Untouched
        assert_eq!(config.per_day, 200);
        assert_eq!(config.min_delay_seconds, 5);
    }

    #[test]
    fn test_apply_rejects_negative_without_partial_write() {
        let mut config = RateConfig::default();
        let err = config
            .apply(&ConfigUpdate {
                per_hour: Some(10),
                per_day: Some(-1),
                ..ConfigUpdate::default()
            })
            .unwrap_err();

        assert_eq!(
            err,
            ConfigError::Negative {
                field: "per_day".to_string(),
                value: -1
            }
        );
        assert_eq!(config, RateConfig::default());
    }

    #[test]
    fn test_apply_rejects_bad_schedule_entry() {
        let mut config = RateConfig::default();
        let err = config
            .apply(&ConfigUpdate {
                warmup_schedule: Some(vec![5, 10, -20]),
                ..ConfigUpdate::default()
            })
            .unwrap_err();

        assert!(err.to_string().contains("warmup_schedule[2]"));

        let err = config
            .apply(&ConfigUpdate {
                min_delay_seconds: Some(i64::from(u32::MAX) + 1),
                ..ConfigUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { .. }));
    }

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        let config: RateConfig = ron::from_str("(per_hour: 5)").unwrap();
        assert_eq!(config.per_hour, 5);
        assert_eq!(config.per_day, 200);
        assert_eq!(config.warmup_schedule, vec![10, 25, 50, 100, 150, 200]);
    }

    #[test]
    fn test_update_is_empty() {
        assert!(ConfigUpdate::default().is_empty());
        assert!(
            !ConfigUpdate {
                warmup_enabled: Some(true),
                ..ConfigUpdate::default()
            }
            .is_empty()
        );
    }
}
