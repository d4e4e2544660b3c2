//! Configuration management for the cry analysis core
//!
//! Runtime configuration is loaded from a JSON file so thresholds and
//! history settings can be inspected or adjusted without recompiling.
//! Every default reproduces the shipped behavior exactly; changing any of
//! the extraction or classifier values changes classification output.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub extraction: ExtractionConfig,
    pub classifier: CascadeThresholds,
    pub history: HistoryConfig,
    pub sleep: SleepConfig,
}

/// Waveform decoding and feature computation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Bytes skipped before the first sample
    pub header_bytes: usize,
    /// Assumed sample rate in Hz (never detected from the header)
    pub sample_rate: u32,
    /// Multiplier applied to RMS before clamping to 1.0
    pub volume_gain: f64,
    /// Number of equal chunks used for the rhythm check
    pub rhythm_chunks: usize,
    /// Chunk-mean variance below which a clip counts as rhythmic
    pub rhythm_variance_threshold: f64,
    /// Longest clip accepted before extraction degrades; `None` accepts any length
    pub max_clip_seconds: Option<u32>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            header_bytes: 44,
            sample_rate: 44_100,
            volume_gain: 5.0,
            rhythm_chunks: 10,
            rhythm_variance_threshold: 0.05,
            max_clip_seconds: None,
        }
    }
}

impl ExtractionConfig {
    /// Maximum number of decoded samples accepted, if capped
    pub fn max_samples(&self) -> Option<usize> {
        self.max_clip_seconds
            .map(|seconds| seconds as usize * self.sample_rate as usize)
    }
}

/// Numeric thresholds for the classification cascade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeThresholds {
    /// Pitch above which a cry reads as distress (Hz)
    pub high_pitch_hz: f64,
    /// Volume above which a rhythmic cry reads as a demand cry
    pub loud_volume: f64,
    /// Volume below which an irregular cry reads as whimpering
    pub soft_volume: f64,
    /// Hours since feeding beyond which hunger is assumed
    pub overdue_feeding_hours: f64,
    /// Hours since feeding below which gas is assumed
    pub recent_feeding_hours: f64,
    /// Inclusive lower bound of the wake window (minutes)
    pub wake_window_start_minutes: f64,
    /// Exclusive upper bound of the wake window (minutes)
    pub wake_window_end_minutes: f64,
}

impl Default for CascadeThresholds {
    fn default() -> Self {
        Self {
            high_pitch_hz: 600.0,
            loud_volume: 0.6,
            soft_volume: 0.4,
            overdue_feeding_hours: 2.5,
            recent_feeding_hours: 0.5,
            wake_window_start_minutes: 60.0,
            wake_window_end_minutes: 120.0,
        }
    }
}

/// Analysis history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of entries retained by a sink
    pub capacity: usize,
    /// JSON file used by the CLI when no `--history` path is given
    pub path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: 500,
            path: None,
        }
    }
}

/// Sleep journal settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepConfig {
    /// Typical wake window length used for next-nap prediction (minutes)
    pub wake_window_minutes: u64,
    /// How long before the end of the wake window to remind (minutes)
    pub notify_before_minutes: u64,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            wake_window_minutes: 90,
            notify_before_minutes: 15,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// Loaded configuration, or defaults if the file is missing or invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the conventional location
    pub fn load() -> Self {
        Self::load_from_file("config/lullaby.json")
    }
}
