//! Time source for the governor.
//!
//! Every public governor operation reads the clock exactly once and works
//! from that instant, so tests can drive window rollover deterministically
//! by swapping in a [`ManualClock`].

use std::fmt::Debug;

use chrono::{DateTime, Utc};

/// A source of the current instant.
pub trait Clock: Send + Sync + Debug {
    /// The current instant, in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(any(test, feature = "testing"))]
mod manual {
    use std::sync::Arc;

    use chrono::{DateTime, TimeDelta, Utc};
    use parking_lot::Mutex;

    use super::Clock;

    /// A clock that only moves when told to.
    ///
    /// Clones share the same instant, so a test can keep a handle while the
    /// governor owns another.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        now: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        #[must_use]
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                now: Arc::new(Mutex::new(start)),
            }
        }

        /// Move the clock forward (or backward, for a negative delta).
        pub fn advance(&self, delta: TimeDelta) {
            let mut now = self.now.lock();
            *now += delta;
        }

        pub fn set(&self, instant: DateTime<Utc>) {
            *self.now.lock() = instant;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock()
        }
    }
}

#[cfg(any(test, feature = "testing"))]
pub use manual::ManualClock;
