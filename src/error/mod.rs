// Error types for the cry analysis core
//
// Feature extraction and history persistence each get their own error enum
// with stable numeric codes. None of them escape `CryAnalyzer::analyze`; they
// are logged and absorbed at the boundary where they occur.

mod extraction;
mod history;

pub use extraction::{log_extraction_error, ExtractionError, ExtractionErrorCodes};
pub use history::{log_history_error, HistoryError, HistoryErrorCodes};

/// Error codes for structured error reporting
///
/// Gives every error type a numeric code and a human-readable message so
/// logs and CLI output stay consistent.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
