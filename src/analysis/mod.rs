// Analysis module - cry analysis pipeline
//
// Wires the stateless pieces into the single entry point callers use.
//
// Pipeline: FeatureSource -> Classifier -> create_result
// - FeatureSource: recording bytes to AudioFeatures (FeatureExtractor by default)
// - Classifier: ordered rule cascade over features plus temporal context
// - create_result: the one place results leave the analyzer; records history
//   and publishes telemetry
//
// `analyze` never fails. Extraction faults arrive as the degraded vector,
// a source that cannot produce features at all routes to the context-only
// result, and history/telemetry are side channels only.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

pub mod classifier;
pub mod features;

pub use classifier::{classify, CascadeRule, Classifier, CryLabel};
pub use features::{
    extract_features, AudioFeatures, FeatureExtractor, FeatureOrigin, FeatureReport,
    FeatureSource,
};

use crate::config::AppConfig;
use crate::context::{FeedingContext, FeedingContextProvider, SleepContext, SleepContextProvider};
use crate::error::{log_extraction_error, ExtractionError};
use crate::history::HistoryRecorder;
use crate::telemetry::{FallbackPath, TelemetryHub};

const CONTEXT_ONLY_CONFIDENCE: f64 = 0.70;
const CONTEXT_ONLY_DESCRIPTION: &str =
    "Could not process audio clearly. General discomfort suspected.";

/// Outcome of one cry analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Inferred reason for crying
    pub label: CryLabel,
    /// Fixed per-rule confidence in [0, 1]
    pub confidence: f64,
    /// Human-readable rationale
    pub description: String,
    /// True when the acoustic analysis path produced the result
    pub is_real_ai: bool,
}

impl ClassificationResult {
    /// Result used when no features could be obtained
    pub fn context_only() -> Self {
        Self {
            label: CryLabel::Discomfort,
            confidence: CONTEXT_ONLY_CONFIDENCE,
            description: CONTEXT_ONLY_DESCRIPTION.to_string(),
            is_real_ai: false,
        }
    }
}

/// CryAnalyzer composes feature extraction, classification and the
/// history/telemetry side channels
///
/// All collaborators are injected; an analyzer with none of the optional
/// ones attached classifies with absent context and records nothing.
pub struct CryAnalyzer {
    source: Box<dyn FeatureSource>,
    classifier: Classifier,
    feeding: Option<Arc<dyn FeedingContextProvider>>,
    sleep: Option<Arc<dyn SleepContextProvider>>,
    history: Option<HistoryRecorder>,
    telemetry: Option<Arc<TelemetryHub>>,
}

impl CryAnalyzer {
    /// Create an analyzer using the extraction and cascade settings in `config`
    pub fn new(config: &AppConfig) -> Self {
        Self {
            source: Box::new(FeatureExtractor::new(config.extraction.clone())),
            classifier: Classifier::new(config.classifier.clone()),
            feeding: None,
            sleep: None,
            history: None,
            telemetry: None,
        }
    }

    pub fn with_feature_source(mut self, source: Box<dyn FeatureSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_feeding_context(mut self, provider: Arc<dyn FeedingContextProvider>) -> Self {
        self.feeding = Some(provider);
        self
    }

    pub fn with_sleep_context(mut self, provider: Arc<dyn SleepContextProvider>) -> Self {
        self.sleep = Some(provider);
        self
    }

    pub fn with_history(mut self, recorder: HistoryRecorder) -> Self {
        self.history = Some(recorder);
        self
    }

    pub fn with_telemetry(mut self, hub: Arc<TelemetryHub>) -> Self {
        self.telemetry = Some(hub);
        self
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Analyze a finished recording
    ///
    /// # Arguments
    /// * `audio` - Entire recording, 44-byte header followed by 16-bit LE mono PCM
    ///
    /// # Returns
    /// Exactly one result; this never fails
    pub fn analyze(&self, audio: &[u8]) -> ClassificationResult {
        self.analyze_with_report(audio).1
    }

    /// Analyze a recording and hand back the features the cascade saw
    ///
    /// The report is `None` when the source produced no features and the
    /// context-only result was returned.
    pub fn analyze_with_report(
        &self,
        audio: &[u8],
    ) -> (Option<FeatureReport>, ClassificationResult) {
        let started = Instant::now();

        let outcome = match self.source.features(audio) {
            Ok(report) => {
                if report.origin == FeatureOrigin::Degraded {
                    if let Some(hub) = &self.telemetry {
                        hub.record_fallback(
                            FallbackPath::DegradedFeatures,
                            "extraction fault; neutral features substituted",
                        );
                    }
                }
                tracing::debug!(
                    origin = ?report.origin,
                    volume = report.features.volume,
                    pitch = report.features.pitch,
                    duration = report.features.duration,
                    is_rhythmic = report.features.is_rhythmic,
                    "features extracted"
                );
                let (feeding, sleep) = self.current_context();
                let result = self.classify(&report.features, feeding, sleep);
                (Some(report), result)
            }
            Err(err) => (None, self.context_only(&err)),
        };

        if let Some(hub) = &self.telemetry {
            hub.record_latency(started.elapsed().as_secs_f32() * 1000.0);
        }
        outcome
    }

    /// Read `path` and analyze its contents
    ///
    /// A read failure takes the context-only path.
    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> ClassificationResult {
        match std::fs::read(path.as_ref()) {
            Ok(bytes) => self.analyze(&bytes),
            Err(err) => {
                let err = ExtractionError::SourceUnavailable {
                    details: format!("{}: {}", path.as_ref().display(), err),
                };
                self.context_only(&err)
            }
        }
    }

    /// Run the cascade on an already extracted feature vector
    ///
    /// Same result as `Classifier::classify`, plus the history/telemetry
    /// side effects.
    pub fn classify(
        &self,
        features: &AudioFeatures,
        feeding: Option<FeedingContext>,
        sleep: Option<SleepContext>,
    ) -> ClassificationResult {
        let rule = self.classifier.evaluate(features, feeding, sleep);
        self.create_result(rule.result(), Some(rule))
    }

    fn current_context(&self) -> (Option<FeedingContext>, Option<SleepContext>) {
        let feeding = self
            .feeding
            .as_ref()
            .and_then(|provider| provider.feeding_context());
        let sleep = self
            .sleep
            .as_ref()
            .and_then(|provider| provider.sleep_context());
        (feeding, sleep)
    }

    fn context_only(&self, err: &ExtractionError) -> ClassificationResult {
        log_extraction_error(err, "CryAnalyzer::analyze");
        if let Some(hub) = &self.telemetry {
            hub.record_fallback(FallbackPath::ContextOnly, err.to_string());
        }
        self.create_result(ClassificationResult::context_only(), None)
    }

    fn create_result(
        &self,
        result: ClassificationResult,
        rule: Option<CascadeRule>,
    ) -> ClassificationResult {
        tracing::info!(
            label = %result.label,
            confidence = result.confidence,
            rule = ?rule,
            is_real_ai = result.is_real_ai,
            "cry classified"
        );

        if let Some(recorder) = &self.history {
            recorder.record(&result);
        }
        if let Some(hub) = &self.telemetry {
            hub.record_classification(&result, rule);
        }
        result
    }
}

impl Default for CryAnalyzer {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}
