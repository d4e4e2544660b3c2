// Sleep journal - naps and night sleeps, newest first.
//
// Ending a sleep starts a wake window; the journal predicts the next nap and
// when a wake-window reminder should fire. Actually delivering reminders is
// left to the caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use super::{Clock, SleepContextProvider};
use crate::config::SleepConfig;

const MS_PER_MINUTE: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepKind {
    Nap,
    NightSleep,
}

/// One sleep period; `end_ms` is unset while the baby is still asleep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepLog {
    pub id: u64,
    pub start_ms: u64,
    #[serde(default)]
    pub end_ms: Option<u64>,
    pub kind: SleepKind,
    /// When the wake-window reminder for this sleep is due, if still pending
    #[serde(default)]
    pub reminder_at_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SleepStatus {
    Asleep(SleepLog),
    Awake,
}

/// In-memory sleep journal, newest entry first
pub struct SleepJournal {
    logs: Mutex<Vec<SleepLog>>,
    clock: Arc<dyn Clock>,
    config: SleepConfig,
    next_id: AtomicU64,
}

impl SleepJournal {
    pub fn new(clock: Arc<dyn Clock>, config: SleepConfig) -> Self {
        Self::with_logs(clock, config, Vec::new())
    }

    /// Restore a journal from previously saved logs (newest first)
    pub fn with_logs(clock: Arc<dyn Clock>, config: SleepConfig, logs: Vec<SleepLog>) -> Self {
        let next_id = logs.iter().map(|log| log.id).max().unwrap_or(0) + 1;
        Self {
            logs: Mutex::new(logs),
            clock,
            config,
            next_id: AtomicU64::new(next_id),
        }
    }

    /// Start a sleep of `kind` now, cancelling the pending reminder of the
    /// previous sleep
    pub fn log_sleep_start(&self, kind: SleepKind) -> SleepLog {
        let log = SleepLog {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            start_ms: self.clock.now_ms(),
            end_ms: None,
            kind,
            reminder_at_ms: None,
        };

        let mut logs = self.lock_logs();
        if let Some(previous) = logs.first_mut() {
            if previous.reminder_at_ms.take().is_some() {
                log::debug!("[SleepJournal] Cancelled reminder for sleep {}", previous.id);
            }
        }
        logs.insert(0, log.clone());
        log
    }

    /// End a sleep now and schedule its wake-window reminder
    ///
    /// Returns the updated log, or `None` if `id` is unknown. No reminder is
    /// set when the notice lead is at least as long as the wake window.
    pub fn log_sleep_end(&self, id: u64) -> Option<SleepLog> {
        let now = self.clock.now_ms();
        let lead_minutes = self
            .config
            .wake_window_minutes
            .checked_sub(self.config.notify_before_minutes)
            .filter(|minutes| *minutes > 0);

        let mut logs = self.lock_logs();
        let log = logs.iter_mut().find(|log| log.id == id)?;
        log.end_ms = Some(now);
        log.reminder_at_ms = lead_minutes.map(|minutes| now + minutes * MS_PER_MINUTE);
        Some(log.clone())
    }

    pub fn logs(&self) -> Vec<SleepLog> {
        self.lock_logs().clone()
    }

    /// End time of the most recent completed sleep
    pub fn last_wake_time(&self) -> Option<u64> {
        self.lock_logs().iter().find_map(|log| log.end_ms)
    }

    /// Predicted start of the next nap after waking at `last_wake_ms`
    pub fn next_nap(&self, last_wake_ms: u64) -> u64 {
        last_wake_ms + self.config.wake_window_minutes * MS_PER_MINUTE
    }

    pub fn current_status(&self) -> SleepStatus {
        match self.lock_logs().first() {
            Some(latest) if latest.end_ms.is_none() => SleepStatus::Asleep(latest.clone()),
            _ => SleepStatus::Awake,
        }
    }

    pub fn clear(&self) {
        self.lock_logs().clear();
    }

    fn lock_logs(&self) -> MutexGuard<'_, Vec<SleepLog>> {
        self.logs.lock().unwrap_or_else(|poisoned| {
            log::error!("[SleepJournal] Log lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl SleepContextProvider for SleepJournal {
    fn last_wake_minutes_ago(&self) -> Option<f64> {
        let last_wake = self.last_wake_time()?;
        let elapsed_ms = self.clock.now_ms() as i64 - last_wake as i64;
        Some(elapsed_ms as f64 / MS_PER_MINUTE as f64)
    }
}
