// Types module - Data structures for audio features
//
// This module defines the feature vector handed from the extractor to the
// classifier, plus the provenance tag that records which extraction path
// produced it.

use serde::{Deserialize, Serialize};

/// Features extracted from one recorded clip
///
/// Produced once per clip and never mutated. The classifier only ever sees
/// this struct, never the raw audio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    /// Gain-adjusted RMS energy (0.0 to 1.0)
    pub volume: f64,

    /// Zero-crossing frequency estimate in Hz
    ///
    /// Crude pitch proxy: assumes a fixed sample rate and counts sign flips.
    pub pitch: f64,

    /// Clip length in seconds at the assumed sample rate
    pub duration: f64,

    /// Loudness was steady across the clip
    ///
    /// Low variance between chunk energies reads as a rhythmic demand cry;
    /// high variance reads as bursty whimpering.
    pub is_rhythmic: bool,
}

impl AudioFeatures {
    /// Features of a clip that decoded to no samples
    pub const SILENT: AudioFeatures = AudioFeatures {
        volume: 0.0,
        pitch: 0.0,
        duration: 0.0,
        is_rhythmic: false,
    };

    /// Ambiguous-input features returned when extraction faults
    pub const DEGRADED: AudioFeatures = AudioFeatures {
        volume: 0.5,
        pitch: 400.0,
        duration: 0.0,
        is_rhythmic: false,
    };
}

/// Which extraction path produced a feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureOrigin {
    /// Computed from decoded samples
    Measured,
    /// Buffer held no complete sample
    Silent,
    /// Extraction faulted; fixed ambiguous values substituted
    Degraded,
}

/// Feature vector plus its provenance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureReport {
    pub features: AudioFeatures,
    pub origin: FeatureOrigin,
}

impl FeatureReport {
    pub fn measured(features: AudioFeatures) -> Self {
        Self {
            features,
            origin: FeatureOrigin::Measured,
        }
    }

    pub fn silent() -> Self {
        Self {
            features: AudioFeatures::SILENT,
            origin: FeatureOrigin::Silent,
        }
    }

    pub fn degraded() -> Self {
        Self {
            features: AudioFeatures::DEGRADED,
            origin: FeatureOrigin::Degraded,
        }
    }
}
