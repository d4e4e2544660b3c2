//! Fixture utilities for the deterministic CLI harness.
//!
//! This module discovers recorded cry fixtures, loads their raw bytes,
//! parses optional expectation JSON, and runs them through `CryAnalyzer`
//! with the temporal context each expectation file specifies.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::{ClassificationResult, CryAnalyzer, CryLabel, FeatureReport};
use crate::config::AppConfig;
use crate::context::StaticContext;

/// Default location for fixture WAV/JSON assets.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

/// Metadata describing an available fixture.
#[derive(Clone, Debug)]
pub struct FixtureMetadata {
    pub name: String,
    pub wav_path: PathBuf,
    pub expect_path: Option<PathBuf>,
}

/// WAV header fields as reported by `hound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WavFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// Whether the analyzer's fixed decoding assumptions hold for this file
    pub fn matches_decoder(&self, sample_rate: u32) -> bool {
        self.sample_rate == sample_rate && self.channels == 1 && self.bits_per_sample == 16
    }
}

/// Loaded fixture data with the raw recording bytes.
pub struct FixtureData {
    pub metadata: FixtureMetadata,
    /// Entire file, header included, exactly as the analyzer receives it
    pub bytes: Vec<u8>,
    /// `None` when `hound` could not parse the header
    pub format: Option<WavFormat>,
    pub expectations: Option<FixtureExpectations>,
}

impl FixtureData {
    /// Temporal context requested by the expectation file, if any
    pub fn context(&self) -> StaticContext {
        self.expectations
            .as_ref()
            .map(FixtureExpectations::context)
            .unwrap_or_else(StaticContext::absent)
    }
}

/// JSON expectation schema for fixture verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureExpectations {
    pub fixture: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub hours_since_feeding: Option<f64>,
    #[serde(default)]
    pub minutes_since_wake: Option<f64>,
    pub label: CryLabel,
    pub confidence: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_tolerance() -> f64 {
    0.01
}

impl FixtureExpectations {
    pub fn context(&self) -> StaticContext {
        StaticContext {
            hours_since_last_feeding: self.hours_since_feeding,
            minutes_since_last_wake: self.minutes_since_wake,
        }
    }

    pub fn verify(&self, actual: &ClassificationResult) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();

        if actual.label != self.label {
            failures.push(ExpectationFailure {
                field: "label",
                expected: serde_json::json!(self.label),
                actual: serde_json::json!(actual.label),
            });
        }

        let delta = (actual.confidence - self.confidence).abs();
        if delta.is_nan() || delta > self.tolerance {
            failures.push(ExpectationFailure {
                field: "confidence",
                expected: serde_json::json!({
                    "value": self.confidence,
                    "tolerance": self.tolerance,
                }),
                actual: serde_json::json!({
                    "value": actual.confidence,
                    "delta": delta,
                }),
            });
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff {
                fixture: self.fixture.clone(),
                failures,
            })
        }
    }
}

/// Outcome of comparing an actual result with expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub fixture: String,
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "fixture": self.fixture,
            "failures": self.failures.iter().map(|failure| {
                serde_json::json!({
                    "field": failure.field,
                    "expected": failure.expected,
                    "actual": failure.actual,
                })
            }).collect::<Vec<_>>()
        })
    }
}

/// Detailed diff entry for a single mismatched field.
#[derive(Debug)]
pub struct ExpectationFailure {
    pub field: &'static str,
    pub expected: serde_json::Value,
    pub actual: serde_json::Value,
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all fixtures by their metadata.
    pub fn discover(&self) -> Result<Vec<FixtureMetadata>> {
        let mut fixtures = Vec::new();
        if !self.root.exists() {
            return Ok(fixtures);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) == Some("wav") {
                    fixtures.push(self.metadata_for_path(&path)?);
                }
            }
        }

        fixtures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fixtures)
    }

    /// Load fixture bytes + expectations for provided name or path.
    pub fn load(&self, fixture: &str, override_expect: Option<PathBuf>) -> Result<FixtureData> {
        let wav_path = self.resolve_fixture_path(fixture)?;
        let metadata = self.metadata_for_path(&wav_path)?;
        let bytes =
            fs::read(&wav_path).with_context(|| format!("reading {}", wav_path.display()))?;
        let format = probe_wav(&wav_path);

        let expectation_path = override_expect.or(metadata.expect_path.clone());
        let expectations = match expectation_path {
            Some(path) => {
                let json = fs::read_to_string(&path)
                    .with_context(|| format!("reading expectation {}", path.display()))?;
                Some(
                    serde_json::from_str(&json)
                        .with_context(|| format!("parsing {}", path.display()))?,
                )
            }
            None => None,
        };

        Ok(FixtureData {
            metadata,
            bytes,
            format,
            expectations,
        })
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self.root.join(format!("{fixture}.wav"));
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(anyhow!(
                "Fixture '{fixture}' not found in {}",
                self.root.display()
            ))
        }
    }

    fn metadata_for_path(&self, wav_path: &Path) -> Result<FixtureMetadata> {
        let name = wav_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("Invalid fixture name for {}", wav_path.display()))?
            .to_string();
        let expect_path = wav_path.with_extension("expect.json");
        Ok(FixtureMetadata {
            name,
            wav_path: wav_path.to_path_buf(),
            expect_path: expect_path.exists().then_some(expect_path),
        })
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

/// Result of running one fixture.
#[derive(Debug, Clone, Serialize)]
pub struct FixtureOutcome {
    /// Features the cascade classified; `None` on the context-only path
    pub report: Option<FeatureReport>,
    pub result: ClassificationResult,
}

/// Executes fixtures through `CryAnalyzer` with fixture-specified context.
pub struct FixtureProcessor {
    config: AppConfig,
}

impl FixtureProcessor {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, data: &FixtureData) -> FixtureOutcome {
        if let Some(format) = data.format {
            if !format.matches_decoder(self.config.extraction.sample_rate) {
                log::warn!(
                    "[Fixtures] {} is {} Hz / {} ch / {} bit; decoding as {} Hz mono 16-bit anyway",
                    data.metadata.name,
                    format.sample_rate,
                    format.channels,
                    format.bits_per_sample,
                    self.config.extraction.sample_rate
                );
            }
        }

        let context = Arc::new(data.context());
        let analyzer = CryAnalyzer::new(&self.config)
            .with_feeding_context(context.clone())
            .with_sleep_context(context);
        let (report, result) = analyzer.analyze_with_report(&data.bytes);

        FixtureOutcome { report, result }
    }
}

impl Default for FixtureProcessor {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

fn probe_wav(path: &Path) -> Option<WavFormat> {
    match hound::WavReader::open(path) {
        Ok(reader) => {
            let spec = reader.spec();
            Some(WavFormat {
                sample_rate: spec.sample_rate,
                channels: spec.channels,
                bits_per_sample: spec.bits_per_sample,
            })
        }
        Err(err) => {
            log::warn!(
                "[Fixtures] Could not parse WAV header of {}: {}",
                path.display(),
                err
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expectations(label: CryLabel, confidence: f64) -> FixtureExpectations {
        FixtureExpectations {
            fixture: "test".to_string(),
            notes: None,
            hours_since_feeding: None,
            minutes_since_wake: None,
            label,
            confidence,
            tolerance: 0.01,
        }
    }

    #[test]
    fn expectation_parses_with_defaults() {
        let parsed: FixtureExpectations =
            serde_json::from_str(r#"{"fixture":"x","label":"Gas","confidence":0.82}"#).unwrap();
        assert_eq!(parsed.tolerance, 0.01);
        assert_eq!(parsed.label, CryLabel::Gas);
        assert_eq!(parsed.context(), StaticContext::absent());
    }

    #[test]
    fn verify_accepts_within_tolerance() {
        let actual = crate::analysis::CascadeRule::RecentFeeding.result();
        assert!(expectations(CryLabel::Gas, 0.815).verify(&actual).is_ok());
    }

    #[test]
    fn verify_reports_each_mismatched_field() {
        let actual = crate::analysis::CascadeRule::Fallback.result();
        let diff = expectations(CryLabel::Hunger, 0.88)
            .verify(&actual)
            .unwrap_err();
        let fields: Vec<&str> = diff.failures.iter().map(|f| f.field).collect();
        assert_eq!(fields, vec!["label", "confidence"]);

        let json = diff.to_json();
        assert_eq!(json["fixture"], "test");
        assert_eq!(json["failures"][0]["expected"], "Hunger");
        assert_eq!(json["failures"][0]["actual"], "Diaper");
    }

    #[test]
    fn missing_root_discovers_nothing() {
        let catalog = FixtureCatalog::new("no/such/fixture/dir");
        assert!(catalog.discover().unwrap().is_empty());
        assert!(catalog.load("anything", None).is_err());
    }

    #[test]
    fn run_reports_the_features_it_classified() {
        let catalog = FixtureCatalog::default();
        let data = catalog.load("high_pitch_scream", None).unwrap();
        let outcome = FixtureProcessor::default().run(&data);

        let report = outcome.report.expect("extractor always yields a report");
        assert_eq!(report.origin, crate::analysis::FeatureOrigin::Measured);
        assert!(report.features.pitch > 600.0);
        assert_eq!(
            outcome.result,
            crate::analysis::classify(&report.features, None, None)
        );
    }

    #[test]
    fn wav_format_checks_decoder_assumptions() {
        let good = WavFormat {
            sample_rate: 44_100,
            channels: 1,
            bits_per_sample: 16,
        };
        assert!(good.matches_decoder(44_100));
        assert!(!WavFormat { channels: 2, ..good }.matches_decoder(44_100));
        assert!(!good.matches_decoder(48_000));
    }
}
