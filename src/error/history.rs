// History sink error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// History error code constants
///
/// Error code range: 4001-4004
pub struct HistoryErrorCodes {}

impl HistoryErrorCodes {
    /// Reading or writing the backing store failed
    pub const IO: i32 = 4001;

    /// Stored history could not be (de)serialized
    pub const SERIALIZATION: i32 = 4002;

    /// Mutex/RwLock was poisoned
    pub const LOCK_POISONED: i32 = 4003;

    /// The history worker is gone
    pub const CHANNEL_CLOSED: i32 = 4004;
}

/// Log a history error with structured context
///
/// History writes are best-effort; callers log and move on.
pub fn log_history_error(err: &HistoryError, context: &str) {
    error!(
        "History error in {}: code={}, component=HistorySink, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// History sink errors
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryError {
    /// Backing store I/O failed
    Io { details: String },

    /// JSON encode/decode failed
    Serialization { details: String },

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },

    /// History worker channel is closed
    ChannelClosed,
}

impl ErrorCode for HistoryError {
    fn code(&self) -> i32 {
        match self {
            HistoryError::Io { .. } => HistoryErrorCodes::IO,
            HistoryError::Serialization { .. } => HistoryErrorCodes::SERIALIZATION,
            HistoryError::LockPoisoned { .. } => HistoryErrorCodes::LOCK_POISONED,
            HistoryError::ChannelClosed => HistoryErrorCodes::CHANNEL_CLOSED,
        }
    }

    fn message(&self) -> String {
        match self {
            HistoryError::Io { details } => format!("History I/O failed: {}", details),
            HistoryError::Serialization { details } => {
                format!("History serialization failed: {}", details)
            }
            HistoryError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
            HistoryError::ChannelClosed => "History worker is not running".to_string(),
        }
    }
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HistoryError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for HistoryError {}

impl From<std::io::Error> for HistoryError {
    fn from(err: std::io::Error) -> Self {
        HistoryError::Io {
            details: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for HistoryError {
    fn from(err: serde_json::Error) -> Self {
        HistoryError::Serialization {
            details: err.to_string(),
        }
    }
}
