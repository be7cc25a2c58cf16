//! Events that move a campaign's counters.
//!
//! Each [`EventKind`] maps to exactly one set of counters through
//! [`SendEvent::apply`]; there is no name-based field lookup, and text that
//! does not name a known kind is rejected.

use std::{fmt, str::FromStr};

use cadence_common::RateState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::GovernorError;

/// The kinds of event the governor books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Emails left the building: both windows and `last_sent_at`
    Sent,
    /// Emails joined the caller's queue: `queue_size` up
    Queued,
    /// Emails left the caller's queue: `queue_size` down
    Dequeued,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Queued => "queued",
            Self::Dequeued => "dequeued",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = GovernorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(Self::Sent),
            "queued" => Ok(Self::Queued),
            "dequeued" => Ok(Self::Dequeued),
            other => Err(GovernorError::UnknownEvent(other.to_string())),
        }
    }
}

/// A counted occurrence of an [`EventKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEvent {
    pub kind: EventKind,
    pub count: u32,
}

impl SendEvent {
    #[must_use]
    pub const fn new(kind: EventKind, count: u32) -> Self {
        Self { kind, count }
    }

    /// A single successful send.
    #[must_use]
    pub const fn sent() -> Self {
        Self::new(EventKind::Sent, 1)
    }

    /// Parse an event from its textual kind.
    ///
    /// # Errors
    /// Returns [`GovernorError::UnknownEvent`] if `kind` is not a known event.
    pub fn parse(kind: &str, count: u32) -> crate::Result<Self> {
        Ok(Self::new(kind.parse()?, count))
    }

    /// Book the event against `state`.
    ///
    /// Sends are booked unconditionally: the send already happened, so the
    /// counters must reflect it even if that puts them over a cap.
    pub(crate) fn apply(self, state: &mut RateState, now: DateTime<Utc>) {
        match self.kind {
            EventKind::Sent => {
                state.sent_this_hour = state.sent_this_hour.saturating_add(self.count);
                state.sent_today = state.sent_today.saturating_add(self.count);
                state.last_sent_at = Some(now);
            }
            EventKind::Queued => {
                state.queue_size = state.queue_size.saturating_add(self.count);
            }
            EventKind::Dequeued => {
                state.queue_size = state.queue_size.saturating_sub(self.count);
            }
        }
    }
}
