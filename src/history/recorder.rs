// HistoryRecorder - fire-and-forget history appends
//
// Appends are sent over an unbounded tokio channel to a dedicated worker
// thread that owns the sink. `record` never blocks and never fails; sink
// errors are logged on the worker and dropped.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::{mpsc, oneshot};

use super::{HistoryEntry, HistorySink};
use crate::analysis::ClassificationResult;
use crate::context::Clock;
use crate::error::{log_history_error, HistoryError};

enum HistoryCommand {
    Append(HistoryEntry),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// Cloneable handle used by analyzers to enqueue history appends
#[derive(Clone)]
pub struct HistoryRecorder {
    tx: mpsc::UnboundedSender<HistoryCommand>,
    clock: Arc<dyn Clock>,
}

impl HistoryRecorder {
    /// Enqueue `result`, stamped with the current time
    pub fn record(&self, result: &ClassificationResult) {
        let entry = HistoryEntry {
            result: result.clone(),
            timestamp_ms: self.clock.now_ms(),
        };

        if self.tx.send(HistoryCommand::Append(entry)).is_err() {
            log::warn!(
                "[HistoryRecorder] Worker stopped; dropping {} result",
                result.label
            );
        }
    }

    /// Block until every previously enqueued append has reached the sink
    ///
    /// Must not be called from inside an async runtime.
    pub fn flush(&self) -> Result<(), HistoryError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(HistoryCommand::Flush(ack_tx))
            .map_err(|_| HistoryError::ChannelClosed)?;
        ack_rx.blocking_recv().map_err(|_| HistoryError::ChannelClosed)
    }
}

/// Owns the worker thread; stops it on `shutdown` or drop
///
/// Appends already queued are written before the thread exits.
pub struct HistoryWorker {
    tx: mpsc::UnboundedSender<HistoryCommand>,
    handle: Option<JoinHandle<()>>,
}

impl HistoryWorker {
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.tx.send(HistoryCommand::Shutdown);
            if handle.join().is_err() {
                log::error!("[HistoryWorker] Worker thread panicked");
            }
        }
    }
}

impl Drop for HistoryWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start the history worker thread for `sink`
///
/// # Returns
/// The recorder to hand to analyzers and the worker that owns the thread
pub fn spawn_history_worker(
    sink: Arc<dyn HistorySink>,
    clock: Arc<dyn Clock>,
) -> Result<(HistoryRecorder, HistoryWorker), HistoryError> {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = thread::Builder::new()
        .name("history-writer".to_string())
        .spawn(move || run_worker(rx, sink))?;

    let recorder = HistoryRecorder {
        tx: tx.clone(),
        clock,
    };
    let worker = HistoryWorker {
        tx,
        handle: Some(handle),
    };
    Ok((recorder, worker))
}

fn run_worker(mut rx: mpsc::UnboundedReceiver<HistoryCommand>, sink: Arc<dyn HistorySink>) {
    log::debug!("[HistoryWorker] Started");
    while let Some(command) = rx.blocking_recv() {
        match command {
            HistoryCommand::Append(entry) => {
                if let Err(err) = sink.append(entry) {
                    log_history_error(&err, "HistoryWorker::append");
                }
            }
            HistoryCommand::Flush(ack) => {
                let _ = ack.send(());
            }
            HistoryCommand::Shutdown => break,
        }
    }
    log::debug!("[HistoryWorker] Stopped");
}
