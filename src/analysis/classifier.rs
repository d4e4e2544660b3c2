// Classifier - ordered rule cascade for cry classification
//
// The cascade blends acoustic evidence with feeding/sleep context. Rules are
// tagged variants walked in `CascadeRule::ORDER`; the first rule whose
// condition holds decides the result and nothing after it is evaluated.
//
// Layer 1 (acoustic): HighPitch, LoudRhythmic, SoftIrregular
// Layer 2 (context):  OverdueFeeding, RecentFeeding, WakeWindow
// Layer 3 (default):  Fallback, which always matches
//
// Acoustic rules precede context rules so that a strong physical signal is
// never overridden by elapsed-time heuristics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::features::AudioFeatures;
use crate::analysis::ClassificationResult;
use crate::config::CascadeThresholds;
use crate::context::{FeedingContext, SleepContext};

/// CryLabel is the closed set of inferences the engine can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CryLabel {
    Hunger,
    Sleepy,
    Diaper,
    Gas,
    Discomfort,
}

impl CryLabel {
    pub const ALL: [CryLabel; 5] = [
        CryLabel::Hunger,
        CryLabel::Sleepy,
        CryLabel::Diaper,
        CryLabel::Gas,
        CryLabel::Discomfort,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CryLabel::Hunger => "Hunger",
            CryLabel::Sleepy => "Sleepy",
            CryLabel::Diaper => "Diaper",
            CryLabel::Gas => "Gas",
            CryLabel::Discomfort => "Discomfort",
        }
    }
}

impl fmt::Display for CryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the classification cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeRule {
    /// pitch > 600 Hz
    HighPitch,
    /// volume > 0.6 and rhythmic
    LoudRhythmic,
    /// volume < 0.4 and not rhythmic
    SoftIrregular,
    /// more than 2.5 h since feeding
    OverdueFeeding,
    /// less than 0.5 h since feeding
    RecentFeeding,
    /// 60 <= minutes awake < 120
    WakeWindow,
    /// nothing else matched
    Fallback,
}

impl CascadeRule {
    /// Evaluation order. Precedence is defined here and nowhere else.
    pub const ORDER: [CascadeRule; 7] = [
        CascadeRule::HighPitch,
        CascadeRule::LoudRhythmic,
        CascadeRule::SoftIrregular,
        CascadeRule::OverdueFeeding,
        CascadeRule::RecentFeeding,
        CascadeRule::WakeWindow,
        CascadeRule::Fallback,
    ];

    /// Whether this rule's condition holds
    ///
    /// Absent context never matches a context rule.
    pub fn matches(
        self,
        features: &AudioFeatures,
        feeding: Option<FeedingContext>,
        sleep: Option<SleepContext>,
        thresholds: &CascadeThresholds,
    ) -> bool {
        match self {
            CascadeRule::HighPitch => features.pitch > thresholds.high_pitch_hz,
            CascadeRule::LoudRhythmic => {
                features.volume > thresholds.loud_volume && features.is_rhythmic
            }
            CascadeRule::SoftIrregular => {
                features.volume < thresholds.soft_volume && !features.is_rhythmic
            }
            CascadeRule::OverdueFeeding => feeding
                .map(|ctx| ctx.hours_since_last_feeding > thresholds.overdue_feeding_hours)
                .unwrap_or(false),
            CascadeRule::RecentFeeding => feeding
                .map(|ctx| ctx.hours_since_last_feeding < thresholds.recent_feeding_hours)
                .unwrap_or(false),
            CascadeRule::WakeWindow => sleep
                .map(|ctx| {
                    ctx.minutes_since_last_wake >= thresholds.wake_window_start_minutes
                        && ctx.minutes_since_last_wake < thresholds.wake_window_end_minutes
                })
                .unwrap_or(false),
            CascadeRule::Fallback => true,
        }
    }

    pub fn label(self) -> CryLabel {
        match self {
            CascadeRule::HighPitch => CryLabel::Discomfort,
            CascadeRule::LoudRhythmic => CryLabel::Hunger,
            CascadeRule::SoftIrregular => CryLabel::Sleepy,
            CascadeRule::OverdueFeeding => CryLabel::Hunger,
            CascadeRule::RecentFeeding => CryLabel::Gas,
            CascadeRule::WakeWindow => CryLabel::Sleepy,
            CascadeRule::Fallback => CryLabel::Diaper,
        }
    }

    pub fn confidence(self) -> f64 {
        match self {
            CascadeRule::HighPitch => 0.90,
            CascadeRule::LoudRhythmic => 0.85,
            CascadeRule::SoftIrregular => 0.80,
            CascadeRule::OverdueFeeding => 0.88,
            CascadeRule::RecentFeeding => 0.82,
            CascadeRule::WakeWindow => 0.85,
            CascadeRule::Fallback => 0.75,
        }
    }

    pub fn rationale(self) -> &'static str {
        match self {
            CascadeRule::HighPitch => {
                "High-pitched cry detected. Check for physical discomfort, temperature, or tight clothing."
            }
            CascadeRule::LoudRhythmic => "Rhythmic, loud demand cry detected. Likely hungry.",
            CascadeRule::SoftIrregular => "Soft, whimpering sounds detected. Baby seems tired.",
            CascadeRule::OverdueFeeding => {
                "It has been over 2.5 hours since last feed. Strong likelihood of hunger."
            }
            CascadeRule::RecentFeeding => {
                "Fed recently. Sharp or grunt-like sounds may indicate trapped gas."
            }
            CascadeRule::WakeWindow => {
                "Approaching end of wake window. Fussiness likely due to tiredness."
            }
            CascadeRule::Fallback => {
                "No specific distress pattern. Check diaper or try changing position."
            }
        }
    }

    /// Package this rule's verdict
    pub fn result(self) -> ClassificationResult {
        ClassificationResult {
            label: self.label(),
            confidence: self.confidence(),
            description: self.rationale().to_string(),
            is_real_ai: true,
        }
    }
}

/// Classifier walks the cascade with a fixed set of thresholds
///
/// Holds no mutable state; `classify` is a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    thresholds: CascadeThresholds,
}

impl Classifier {
    pub fn new(thresholds: CascadeThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &CascadeThresholds {
        &self.thresholds
    }

    /// First rule in `CascadeRule::ORDER` whose condition holds
    pub fn evaluate(
        &self,
        features: &AudioFeatures,
        feeding: Option<FeedingContext>,
        sleep: Option<SleepContext>,
    ) -> CascadeRule {
        CascadeRule::ORDER
            .into_iter()
            .find(|rule| rule.matches(features, feeding, sleep, &self.thresholds))
            .unwrap_or(CascadeRule::Fallback)
    }

    /// Classify a feature vector in its temporal context
    ///
    /// Total: every input, including NaN features and absent context,
    /// produces exactly one result.
    pub fn classify(
        &self,
        features: &AudioFeatures,
        feeding: Option<FeedingContext>,
        sleep: Option<SleepContext>,
    ) -> ClassificationResult {
        self.evaluate(features, feeding, sleep).result()
    }
}

/// Classify with the default thresholds
pub fn classify(
    features: &AudioFeatures,
    feeding: Option<FeedingContext>,
    sleep: Option<SleepContext>,
) -> ClassificationResult {
    Classifier::default().classify(features, feeding, sleep)
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
