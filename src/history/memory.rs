// In-memory history sink with a fixed capacity.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use super::{HistoryEntry, HistorySink};
use crate::error::HistoryError;

/// Bounded in-memory history; the oldest entry is dropped when full
pub struct InMemoryHistory {
    entries: Mutex<VecDeque<HistoryEntry>>,
    capacity: usize,
}

impl InMemoryHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.lock_entries().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_entries(&self) -> Result<MutexGuard<'_, VecDeque<HistoryEntry>>, HistoryError> {
        self.entries.lock().map_err(|_| HistoryError::LockPoisoned {
            component: "in_memory_history".to_string(),
        })
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new(crate::config::HistoryConfig::default().capacity)
    }
}

impl HistorySink for InMemoryHistory {
    fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        if self.capacity == 0 {
            return Ok(());
        }

        let mut entries = self.lock_entries()?;
        entries.push_front(entry);
        entries.truncate(self.capacity);
        Ok(())
    }

    fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        Ok(self.lock_entries()?.iter().cloned().collect())
    }

    fn clear(&self) -> Result<(), HistoryError> {
        self.lock_entries()?.clear();
        Ok(())
    }
}
