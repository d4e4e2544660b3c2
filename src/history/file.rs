// JSON file history sink.
//
// The whole history is one JSON array, rewritten on every append. Good
// enough for a few hundred entries; durability beyond a plain write is not
// attempted.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{HistoryEntry, HistorySink};
use crate::error::HistoryError;

/// History persisted as a JSON array, newest first
pub struct JsonFileHistory {
    path: PathBuf,
    capacity: usize,
    write_lock: Mutex<()>,
}

impl JsonFileHistory {
    pub fn new<P: Into<PathBuf>>(path: P, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Vec::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_entries(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>, HistoryError> {
        self.write_lock.lock().map_err(|_| HistoryError::LockPoisoned {
            component: "json_file_history".to_string(),
        })
    }
}

impl HistorySink for JsonFileHistory {
    fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        let _guard = self.guard()?;
        let mut entries = self.read_entries()?;
        entries.insert(0, entry);
        entries.truncate(self.capacity);
        self.write_entries(&entries)
    }

    fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let _guard = self.guard()?;
        self.read_entries()
    }

    fn clear(&self) -> Result<(), HistoryError> {
        let _guard = self.guard()?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classifier::CascadeRule;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "lullaby_history_{}_{}.json",
            name,
            std::process::id()
        ))
    }

    fn entry(rule: CascadeRule, timestamp_ms: u64) -> HistoryEntry {
        HistoryEntry {
            result: rule.result(),
            timestamp_ms,
        }
    }

    #[test]
    fn missing_file_is_empty_history() {
        let history = JsonFileHistory::new(temp_path("missing"), 10);
        history.clear().unwrap();
        assert!(history.list().unwrap().is_empty());
    }

    #[test]
    fn appends_persist_newest_first() {
        let path = temp_path("persist");
        let history = JsonFileHistory::new(&path, 2);
        history.clear().unwrap();

        history.append(entry(CascadeRule::HighPitch, 1)).unwrap();
        history.append(entry(CascadeRule::RecentFeeding, 2)).unwrap();
        history.append(entry(CascadeRule::WakeWindow, 3)).unwrap();

        let reopened = JsonFileHistory::new(&path, 2);
        let listed = reopened.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].result, CascadeRule::WakeWindow.result());
        assert_eq!(listed[1].timestamp_ms, 2);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"label\": \"Sleepy\""));
        assert!(raw.contains("\"timestamp_ms\": 3"));

        reopened.clear().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_reports_serialization_error() {
        let path = temp_path("corrupt");
        fs::write(&path, "{not json").unwrap();
        let history = JsonFileHistory::new(&path, 10);

        let err = history.append(entry(CascadeRule::Fallback, 1)).unwrap_err();
        assert!(matches!(err, HistoryError::Serialization { .. }));
        history.clear().unwrap();
    }
}
