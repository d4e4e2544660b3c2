// Feeding journal - most-recent-first log of bottle and breast feedings.
//
// Backs `FeedingContextProvider` with real records: the classifier gets the
// hours elapsed since the newest entry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use super::{Clock, FeedingContextProvider};

const MS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeUnit {
    Oz,
    Ml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreastSide {
    Left,
    Right,
    Both,
}

/// How the baby was fed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedingKind {
    Bottle {
        amount: Option<f64>,
        unit: Option<VolumeUnit>,
    },
    Breast {
        side: Option<BreastSide>,
        duration_seconds: Option<u32>,
    },
}

/// One recorded feeding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingLog {
    pub id: u64,
    /// Unix epoch milliseconds
    pub timestamp_ms: u64,
    pub kind: FeedingKind,
    #[serde(default)]
    pub note: Option<String>,
}

/// In-memory feeding journal, newest entry first
pub struct FeedingJournal {
    logs: Mutex<Vec<FeedingLog>>,
    clock: Arc<dyn Clock>,
    next_id: AtomicU64,
}

impl FeedingJournal {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_logs(clock, Vec::new())
    }

    /// Restore a journal from previously saved logs (newest first)
    pub fn with_logs(clock: Arc<dyn Clock>, logs: Vec<FeedingLog>) -> Self {
        let next_id = logs.iter().map(|log| log.id).max().unwrap_or(0) + 1;
        Self {
            logs: Mutex::new(logs),
            clock,
            next_id: AtomicU64::new(next_id),
        }
    }

    /// Record a feeding at the current time
    pub fn log_feeding(&self, kind: FeedingKind, note: Option<String>) -> FeedingLog {
        let log = FeedingLog {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            timestamp_ms: self.clock.now_ms(),
            kind,
            note,
        };
        self.lock_logs().insert(0, log.clone());
        log::debug!("[FeedingJournal] Logged feeding {}", log.id);
        log
    }

    pub fn logs(&self) -> Vec<FeedingLog> {
        self.lock_logs().clone()
    }

    pub fn last_feeding(&self) -> Option<FeedingLog> {
        self.lock_logs().first().cloned()
    }

    /// Remove a feeding; returns whether it existed
    pub fn delete(&self, id: u64) -> bool {
        let mut logs = self.lock_logs();
        let before = logs.len();
        logs.retain(|log| log.id != id);
        logs.len() != before
    }

    pub fn clear(&self) {
        self.lock_logs().clear();
    }

    fn lock_logs(&self) -> MutexGuard<'_, Vec<FeedingLog>> {
        self.logs.lock().unwrap_or_else(|poisoned| {
            log::error!("[FeedingJournal] Log lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl FeedingContextProvider for FeedingJournal {
    fn last_feeding_hours_ago(&self) -> Option<f64> {
        let last = self.last_feeding()?;
        let elapsed_ms = self.clock.now_ms() as i64 - last.timestamp_ms as i64;
        Some(elapsed_ms as f64 / MS_PER_HOUR)
    }
}
