//! Temporal context for the classifier.
//!
//! The classifier only ever sees two read-only snapshots: hours since the
//! last feeding and minutes since the last wake. Where those numbers come
//! from is behind the provider traits; the journals in this module are the
//! in-process implementations backed by feeding and sleep logs.

mod clock;
mod feeding;
mod sleep;

pub use clock::{now_timestamp_ms, Clock, ManualClock, SystemClock};
pub use feeding::{BreastSide, FeedingJournal, FeedingKind, FeedingLog, VolumeUnit};
pub use sleep::{SleepJournal, SleepKind, SleepLog, SleepStatus};

use serde::{Deserialize, Serialize};

/// Snapshot of time since the last feeding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedingContext {
    pub hours_since_last_feeding: f64,
}

/// Snapshot of time since the baby last woke
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepContext {
    pub minutes_since_last_wake: f64,
}

/// Supplies time since the last recorded feeding
///
/// `None` means no feeding has been recorded yet, which is not the same as
/// a feeding zero hours ago.
pub trait FeedingContextProvider: Send + Sync {
    fn last_feeding_hours_ago(&self) -> Option<f64>;

    fn feeding_context(&self) -> Option<FeedingContext> {
        self.last_feeding_hours_ago()
            .map(|hours_since_last_feeding| FeedingContext {
                hours_since_last_feeding,
            })
    }
}

/// Supplies time since the last recorded wake
///
/// `None` means no completed sleep has been recorded yet.
pub trait SleepContextProvider: Send + Sync {
    fn last_wake_minutes_ago(&self) -> Option<f64>;

    fn sleep_context(&self) -> Option<SleepContext> {
        self.last_wake_minutes_ago()
            .map(|minutes_since_last_wake| SleepContext {
                minutes_since_last_wake,
            })
    }
}

/// Fixed context values, e.g. from CLI flags or fixture expectations
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticContext {
    pub hours_since_last_feeding: Option<f64>,
    pub minutes_since_last_wake: Option<f64>,
}

impl StaticContext {
    /// No feeding or sleep on record
    pub fn absent() -> Self {
        Self::default()
    }
}

impl FeedingContextProvider for StaticContext {
    fn last_feeding_hours_ago(&self) -> Option<f64> {
        self.hours_since_last_feeding
    }
}

impl SleepContextProvider for StaticContext {
    fn last_wake_minutes_ago(&self) -> Option<f64> {
        self.minutes_since_last_wake
    }
}
