// Temporal module - Time-domain feature extraction
//
// Everything the classifier needs is computed directly from the normalized
// sample stream: RMS loudness, a zero-crossing pitch estimate, and a chunked
// energy variance used as the rhythm signal.

use crate::config::ExtractionConfig;

/// Temporal feature computation functions
pub struct TemporalFeatures {
    sample_rate: u32,
    volume_gain: f64,
    rhythm_chunks: usize,
    rhythm_variance_threshold: f64,
}

impl TemporalFeatures {
    /// Create a new temporal features processor from extraction settings
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            volume_gain: config.volume_gain,
            rhythm_chunks: config.rhythm_chunks,
            rhythm_variance_threshold: config.rhythm_variance_threshold,
        }
    }

    /// Gain-adjusted RMS volume
    ///
    /// Formula: min(1.0, sqrt(Σx² / N) × gain)
    pub fn compute_volume(&self, samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }

        let sum_squares: f64 = samples.iter().map(|s| s * s).sum();
        let rms = (sum_squares / samples.len() as f64).sqrt();
        (rms * self.volume_gain).min(1.0)
    }

    /// Count sign transitions between adjacent samples
    ///
    /// A transition is strictly positive to non-positive, or strictly
    /// negative to non-negative. Runs of exact zeros never count twice.
    pub fn count_zero_crossings(&self, samples: &[f64]) -> usize {
        samples
            .windows(2)
            .filter(|pair| {
                let (prev, cur) = (pair[0], pair[1]);
                (prev > 0.0 && cur <= 0.0) || (prev < 0.0 && cur >= 0.0)
            })
            .count()
    }

    /// Zero-crossing frequency estimate in Hz
    ///
    /// Formula: crossings × sample_rate / (2N)
    pub fn estimate_pitch(&self, samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }

        let crossings = self.count_zero_crossings(samples);
        (crossings as f64 * self.sample_rate as f64) / (2.0 * samples.len() as f64)
    }

    /// Variance of per-chunk mean absolute amplitude
    ///
    /// The stream is split into `rhythm_chunks` contiguous chunks of
    /// floor(N / chunks) samples; remainder samples are dropped. Returns
    /// `None` when a chunk would be empty.
    pub fn chunk_energy_variance(&self, samples: &[f64]) -> Option<f64> {
        if self.rhythm_chunks == 0 {
            return None;
        }
        let chunk_size = samples.len() / self.rhythm_chunks;
        if chunk_size == 0 {
            return None;
        }

        let chunk_means: Vec<f64> = samples
            .chunks_exact(chunk_size)
            .take(self.rhythm_chunks)
            .map(|chunk| chunk.iter().map(|s| s.abs()).sum::<f64>() / chunk_size as f64)
            .collect();

        let count = chunk_means.len() as f64;
        let mean = chunk_means.iter().sum::<f64>() / count;
        let variance = chunk_means
            .iter()
            .map(|m| (m - mean).powi(2))
            .sum::<f64>()
            / count;
        Some(variance)
    }

    /// Steady loudness check
    ///
    /// Clips too short to fill every chunk are never rhythmic.
    pub fn is_rhythmic(&self, samples: &[f64]) -> bool {
        self.chunk_energy_variance(samples)
            .map(|variance| variance < self.rhythm_variance_threshold)
            .unwrap_or(false)
    }

    /// Clip duration in seconds at the assumed sample rate
    pub fn duration(&self, sample_count: usize) -> f64 {
        sample_count as f64 / self.sample_rate as f64
    }
}
