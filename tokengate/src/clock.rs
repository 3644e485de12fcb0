//! Time primitives for claim validation
//!
//! Expiration checks go through the [`Clock`] trait so that tests can pin
//! the current time instead of racing the system clock.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Unix time, in whole seconds since 1970-01-01T00:00:00Z
///
/// This is the representation used by the `exp`, `nbf`, and `iat` claims.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct UnixTime(pub u64);

/// A source of the current time
pub trait Clock {
    /// The current time according to this clock
    fn now(&self) -> UnixTime;
}

/// The system clock as reported by [`std::time::SystemTime`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct System;

impl Clock for System {
    #[inline]
    fn now(&self) -> UnixTime {
        let secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("system clock is set before the Unix epoch")
            .as_secs();
        UnixTime(secs)
    }
}

/// A clock pinned to a chosen instant
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestClock(UnixTime);

impl Clock for TestClock {
    #[inline]
    fn now(&self) -> UnixTime {
        self.0
    }
}

impl TestClock {
    /// Creates a clock pinned at `time`
    #[inline]
    pub const fn new(time: UnixTime) -> Self {
        Self(time)
    }

    /// Moves the clock to `time`
    pub fn set(&mut self, time: UnixTime) {
        self.0 = time;
    }

    /// Advances the clock by `secs` seconds
    pub fn advance(&mut self, secs: u64) {
        (self.0).0 += secs;
    }
}
