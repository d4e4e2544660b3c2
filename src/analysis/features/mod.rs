// FeatureExtractor - acoustic feature extraction for cry classification
//
// Turns the raw bytes of a finished recording into a fixed-size feature
// vector. Extraction is a pure function of the bytes and the extraction
// settings; reading the recording is the caller's job.
//
// Module organization:
// - types: Data structures (AudioFeatures, FeatureReport)
// - decode: 16-bit PCM decoding behind a fixed-size header
// - temporal: Time-domain features (volume, zero-crossing pitch, rhythm)
// - mod.rs: Coordinator (FeatureExtractor, FeatureSource)
//
// Failure policy: faults never reach the classifier. `try_extract` reports
// them, `report`/`extract` substitute `AudioFeatures::DEGRADED`.

mod decode;
mod temporal;
mod types;

pub use decode::{decode_pcm16, sample_count, PCM16_SCALE};
pub use types::{AudioFeatures, FeatureOrigin, FeatureReport};

use crate::config::ExtractionConfig;
use crate::error::{log_extraction_error, ExtractionError};
use temporal::TemporalFeatures;

/// Anything that can turn recording bytes into features
///
/// `CryAnalyzer` consumes features through this trait. An `Err` means no
/// usable features exist at all and sends the analyzer down its
/// context-only path.
pub trait FeatureSource: Send + Sync {
    fn features(&self, audio: &[u8]) -> Result<FeatureReport, ExtractionError>;
}

/// FeatureExtractor coordinates decoding and temporal feature computation
pub struct FeatureExtractor {
    config: ExtractionConfig,
    temporal_features: TemporalFeatures,
}

impl FeatureExtractor {
    /// Create a new FeatureExtractor with the given extraction settings
    pub fn new(config: ExtractionConfig) -> Self {
        let temporal_features = TemporalFeatures::new(&config);
        Self {
            config,
            temporal_features,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract features, reporting faults instead of absorbing them
    ///
    /// # Returns
    /// * `Ok` with origin `Measured`, or `Silent` for a buffer without a
    ///   complete sample
    /// * `Err(ClipTooLong)` when a `max_clip_seconds` cap is set and exceeded
    /// * `Err(NonFiniteFeature)` when a computation produced NaN/inf
    pub fn try_extract(&self, audio: &[u8]) -> Result<FeatureReport, ExtractionError> {
        let count = sample_count(audio, self.config.header_bytes);
        if let Some(max_samples) = self.config.max_samples() {
            if count > max_samples {
                return Err(ExtractionError::ClipTooLong {
                    samples: count,
                    max_samples,
                });
            }
        }

        let samples = decode_pcm16(audio, self.config.header_bytes);
        if samples.is_empty() {
            return Ok(FeatureReport::silent());
        }

        let features = AudioFeatures {
            volume: finite("volume", self.temporal_features.compute_volume(&samples))?,
            pitch: finite("pitch", self.temporal_features.estimate_pitch(&samples))?,
            duration: finite("duration", self.temporal_features.duration(samples.len()))?,
            is_rhythmic: self.temporal_features.is_rhythmic(&samples),
        };

        log::debug!(
            "[FeatureExtractor] {} samples: volume={:.3} pitch={:.1}Hz rhythmic={}",
            samples.len(),
            features.volume,
            features.pitch,
            features.is_rhythmic
        );

        Ok(FeatureReport::measured(features))
    }

    /// Extract features with provenance, degrading on any fault
    pub fn report(&self, audio: &[u8]) -> FeatureReport {
        match self.try_extract(audio) {
            Ok(report) => report,
            Err(err) => {
                log_extraction_error(&err, "FeatureExtractor::report");
                FeatureReport::degraded()
            }
        }
    }

    /// Extract features, degrading on any fault
    pub fn extract(&self, audio: &[u8]) -> AudioFeatures {
        self.report(audio).features
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl FeatureSource for FeatureExtractor {
    fn features(&self, audio: &[u8]) -> Result<FeatureReport, ExtractionError> {
        Ok(self.report(audio))
    }
}

/// Extract features from recording bytes with default settings
pub fn extract_features(audio: &[u8]) -> AudioFeatures {
    FeatureExtractor::default().extract(audio)
}

fn finite(feature: &'static str, value: f64) -> Result<f64, ExtractionError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ExtractionError::NonFiniteFeature { feature })
    }
}
