//! Telemetry event types describing what the analyzer did with each clip.

use serde::{Deserialize, Serialize};

use crate::analysis::classifier::{CascadeRule, CryLabel};

/// Which fallback the analyzer took
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPath {
    /// Extractor substituted the ambiguous feature vector
    DegradedFeatures,
    /// No features at all; acoustic cascade skipped
    ContextOnly,
}

/// Metric events covering classification outcomes, fallbacks and latency
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    Classification {
        label: CryLabel,
        confidence: f64,
        /// `None` for the context-only path
        rule: Option<CascadeRule>,
    },
    FeatureFallback {
        path: FallbackPath,
        reason: String,
    },
    Latency {
        avg_ms: f32,
        max_ms: f32,
        sample_count: usize,
    },
}
