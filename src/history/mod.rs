//! Classification history.
//!
//! Every result the analyzer produces is appended to a `HistorySink`, newest
//! first. Appends go through `HistoryRecorder`, a one-way channel to a
//! worker thread, so a slow or failing sink can never delay or fail
//! classification.

mod file;
mod memory;
mod recorder;

pub use file::JsonFileHistory;
pub use memory::InMemoryHistory;
pub use recorder::{spawn_history_worker, HistoryRecorder, HistoryWorker};

use serde::{Deserialize, Serialize};

use crate::analysis::ClassificationResult;
use crate::error::HistoryError;

/// One stored classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub result: ClassificationResult,
    /// Unix epoch milliseconds at which the result was recorded
    pub timestamp_ms: u64,
}

/// Append-only store of past classifications
///
/// `list` returns entries most recent first.
pub trait HistorySink: Send + Sync {
    fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError>;

    fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError>;

    fn clear(&self) -> Result<(), HistoryError>;
}
