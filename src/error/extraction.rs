// Feature extraction error types and constants

use crate::error::ErrorCode;
use log::warn;
use std::fmt;

/// Extraction error code constants
///
/// Error code range: 3001-3003
pub struct ExtractionErrorCodes {}

impl ExtractionErrorCodes {
    /// Clip holds more samples than the configured maximum
    pub const CLIP_TOO_LONG: i32 = 3001;

    /// A computed feature was NaN or infinite
    pub const NON_FINITE_FEATURE: i32 = 3002;

    /// The audio bytes could not be obtained at all
    pub const SOURCE_UNAVAILABLE: i32 = 3003;
}

/// Log an extraction error with structured context
///
/// Extraction faults are absorbed (degraded features or the context-only
/// path), so they are logged at warn rather than error.
pub fn log_extraction_error(err: &ExtractionError, context: &str) {
    warn!(
        "Extraction error in {}: code={}, component=FeatureExtractor, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Feature extraction errors
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Decoded clip is longer than `max_clip_seconds` allows
    ClipTooLong { samples: usize, max_samples: usize },

    /// A feature computation produced NaN or infinity
    NonFiniteFeature { feature: &'static str },

    /// Reading the recording failed before any decoding happened
    SourceUnavailable { details: String },
}

impl ErrorCode for ExtractionError {
    fn code(&self) -> i32 {
        match self {
            ExtractionError::ClipTooLong { .. } => ExtractionErrorCodes::CLIP_TOO_LONG,
            ExtractionError::NonFiniteFeature { .. } => ExtractionErrorCodes::NON_FINITE_FEATURE,
            ExtractionError::SourceUnavailable { .. } => ExtractionErrorCodes::SOURCE_UNAVAILABLE,
        }
    }

    fn message(&self) -> String {
        match self {
            ExtractionError::ClipTooLong {
                samples,
                max_samples,
            } => {
                format!(
                    "Clip too long: {} samples exceeds limit of {}",
                    samples, max_samples
                )
            }
            ExtractionError::NonFiniteFeature { feature } => {
                format!("Feature '{}' is not a finite number", feature)
            }
            ExtractionError::SourceUnavailable { details } => {
                format!("Audio source unavailable: {}", details)
            }
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExtractionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ExtractionError {}

impl From<std::io::Error> for ExtractionError {
    fn from(err: std::io::Error) -> Self {
        ExtractionError::SourceUnavailable {
            details: err.to_string(),
        }
    }
}
