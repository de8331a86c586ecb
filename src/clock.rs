//! Injectable sources of "now".
//!
//! The engine never reads the system time itself; callers hand it a [`Clock`].
//! [`OffsetClock`] applies the correction produced by a [`TimeSyncCheck`], so
//! captures can be stamped with a reference time when the device clock drifts.

use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Drift beyond this many seconds marks the device clock as out of sync.
pub const DEFAULT_SYNC_TOLERANCE_SECS: i64 = 30;

pub trait Clock: Send + Sync {
    /// Current local wall-clock time.
    fn now(&self) -> NaiveDateTime;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Shifts another clock by a signed offset.
#[derive(Debug, Clone)]
pub struct OffsetClock<C> {
    inner: C,
    offset: Duration,
}

impl<C: Clock> OffsetClock<C> {
    pub fn new(inner: C, offset: Duration) -> Self {
        Self { inner, offset }
    }

    pub fn offset(&self) -> Duration {
        self.offset
    }
}

impl<C: Clock> Clock for OffsetClock<C> {
    fn now(&self) -> NaiveDateTime {
        let now = self.inner.now();
        now.checked_add_signed(self.offset).unwrap_or(now)
    }
}

/// Outcome of comparing the device clock against a reference time source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSyncReport {
    pub local: NaiveDateTime,
    /// `None` when no reference server answered.
    pub reference: Option<NaiveDateTime>,
    pub is_valid: bool,
}

impl TimeSyncReport {
    /// `reference - local`; positive when the device is behind.
    pub fn drift(&self) -> Option<Duration> {
        self.reference.map(|reference| reference - self.local)
    }

    /// Offset to feed into an [`OffsetClock`]. Zero when no reference is known.
    pub fn correction(&self) -> Duration {
        self.drift().unwrap_or_else(Duration::zero)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSyncCheck {
    tolerance: Duration,
}

impl Default for TimeSyncCheck {
    fn default() -> Self {
        Self {
            tolerance: Duration::seconds(DEFAULT_SYNC_TOLERANCE_SECS),
        }
    }
}

impl TimeSyncCheck {
    pub fn with_tolerance(tolerance: Duration) -> Self {
        Self {
            tolerance: tolerance.abs(),
        }
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    pub fn evaluate(&self, local: NaiveDateTime, reference: Option<NaiveDateTime>) -> TimeSyncReport {
        let is_valid = match reference {
            Some(reference) => (reference - local).abs() <= self.tolerance,
            None => false,
        };
        if !is_valid {
            tracing::warn!(%local, ?reference, "device clock is not in sync with reference time");
        }
        TimeSyncReport {
            local,
            reference,
            is_valid,
        }
    }
}
