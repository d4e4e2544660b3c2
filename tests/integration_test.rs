//! Integration tests for the analyzer and its collaborators
//!
//! These tests validate the full analysis lifecycle through the public API:
//! - Journals feeding temporal context into the cascade
//! - File-backed history receiving every result
//! - Telemetry stream delivering classification events
//! - Fallback paths for unreadable and degraded input

use std::sync::Arc;
use std::time::Duration;

use lullaby_core::analysis::{CascadeRule, CryAnalyzer, CryLabel, FeatureOrigin};
use lullaby_core::config::{AppConfig, ExtractionConfig};
use lullaby_core::context::{
    BreastSide, FeedingJournal, FeedingKind, ManualClock, SleepJournal, SleepKind, SleepStatus,
};
use lullaby_core::history::{spawn_history_worker, HistorySink, JsonFileHistory};
use lullaby_core::telemetry::{MetricEvent, TelemetryHub};

fn init_test_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build test runtime")
}

/// 44-byte header followed by a 0.5 s square wave at ~294 Hz
fn recording(amplitude: i16) -> Vec<u8> {
    let mut bytes = vec![0u8; 44];
    for i in 0..22_050usize {
        let sample = if (i / 75) % 2 == 0 { amplitude } else { -amplitude };
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

fn temp_history(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "lullaby_integration_{}_{}.json",
        name,
        std::process::id()
    ))
}

#[test]
fn test_journals_drive_classification_over_a_day() {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let feeding = Arc::new(FeedingJournal::new(clock.clone()));
    let sleep = Arc::new(SleepJournal::new(clock.clone(), AppConfig::default().sleep));
    let analyzer = CryAnalyzer::new(&AppConfig::default())
        .with_feeding_context(feeding.clone())
        .with_sleep_context(sleep.clone());

    // Mid-volume rhythmic clip: acoustics alone are ambiguous
    let clip = recording(3277);
    assert_eq!(analyzer.analyze(&clip).label, CryLabel::Diaper);

    feeding.log_feeding(
        FeedingKind::Breast {
            side: Some(BreastSide::Left),
            duration_seconds: Some(600),
        },
        Some("morning".to_string()),
    );
    clock.advance(Duration::from_secs(15 * 60));
    assert_eq!(analyzer.analyze(&clip).label, CryLabel::Gas);

    let nap = sleep.log_sleep_start(SleepKind::Nap);
    assert!(matches!(sleep.current_status(), SleepStatus::Asleep(_)));
    clock.advance(Duration::from_secs(40 * 60));
    sleep.log_sleep_end(nap.id);
    assert_eq!(sleep.current_status(), SleepStatus::Awake);

    // 55 min since feeding, 0 min awake: nothing in context applies
    assert_eq!(analyzer.analyze(&clip).label, CryLabel::Diaper);

    clock.advance(Duration::from_secs(70 * 60));
    assert_eq!(analyzer.analyze(&clip), CascadeRule::WakeWindow.result());

    clock.advance(Duration::from_secs(2 * 3600));
    assert_eq!(analyzer.analyze(&clip), CascadeRule::OverdueFeeding.result());

    // Loud steady clip wins over any context
    assert_eq!(
        analyzer.analyze(&recording(9830)),
        CascadeRule::LoudRhythmic.result()
    );
}

#[test]
fn test_file_history_receives_every_result() {
    let path = temp_history("lifecycle");
    let sink = Arc::new(JsonFileHistory::new(&path, 10));
    sink.clear().unwrap();

    let clock = Arc::new(ManualClock::new(1_000));
    let (recorder, worker) = spawn_history_worker(sink.clone(), clock.clone()).unwrap();
    let analyzer = CryAnalyzer::new(&AppConfig::default()).with_history(recorder.clone());

    let first = analyzer.analyze(&recording(9830));
    clock.advance(Duration::from_secs(1));
    let second = analyzer.analyze_file("does/not/exist.wav");
    recorder.flush().unwrap();
    worker.shutdown();

    let entries = sink.list().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].result, second);
    assert_eq!(entries[0].timestamp_ms, 2_000);
    assert!(!entries[0].result.is_real_ai);
    assert_eq!(entries[1].result, first);
    assert_eq!(entries[1].result.label, CryLabel::Hunger);

    sink.clear().unwrap();
}

#[test]
fn test_telemetry_stream_delivers_classifications() {
    let runtime = init_test_runtime();
    let hub = Arc::new(TelemetryHub::default());
    let mut rx = hub.subscribe();
    let analyzer = CryAnalyzer::new(&AppConfig::default()).with_telemetry(hub.clone());

    analyzer.analyze(&[0u8; 44]);

    let event = runtime
        .block_on(async { tokio::time::timeout(Duration::from_secs(1), rx.recv()).await })
        .expect("timed out waiting for telemetry")
        .expect("telemetry channel closed");
    assert_eq!(
        event,
        MetricEvent::Classification {
            label: CryLabel::Sleepy,
            confidence: 0.80,
            rule: Some(CascadeRule::SoftIrregular),
        }
    );
}

#[test]
fn test_oversized_clip_degrades_and_reports_fallback() {
    let config = AppConfig {
        extraction: ExtractionConfig {
            max_clip_seconds: Some(0),
            ..ExtractionConfig::default()
        },
        ..AppConfig::default()
    };
    let hub = Arc::new(TelemetryHub::default());
    let analyzer = CryAnalyzer::new(&config).with_telemetry(hub.clone());

    let result = analyzer.analyze(&recording(9830));
    assert_eq!(result, CascadeRule::Fallback.result());
    assert!(result.is_real_ai);

    let report = lullaby_core::analysis::FeatureExtractor::new(config.extraction.clone())
        .report(&recording(9830));
    assert_eq!(report.origin, FeatureOrigin::Degraded);

    assert!(hub
        .snapshot()
        .recent
        .iter()
        .any(|event| matches!(event, MetricEvent::FeatureFallback { .. })));
}
