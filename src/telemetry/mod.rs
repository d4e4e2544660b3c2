//! Analysis telemetry collector and helpers.
//!
//! The collector multiplexes classification, fallback and latency events
//! into a bounded history plus a broadcast stream. A hub is injected into
//! `CryAnalyzer` explicitly; publishing never affects analysis results.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::broadcast;

use crate::analysis::classifier::CascadeRule;
use crate::analysis::ClassificationResult;

pub mod events;

pub use events::{FallbackPath, MetricEvent};

/// Snapshot of collector state for CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<MetricEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of metrics.
pub struct TelemetryCollector {
    tx: broadcast::Sender<MetricEvent>,
    history: Mutex<VecDeque<MetricEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: MetricEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        if self.history_capacity > 0 {
            let mut history = self.lock_history();
            if history.len() == self.history_capacity {
                history.pop_front();
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
            history.push_back(event.clone());
        }

        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let history = self.lock_history();
        TelemetrySnapshot {
            recent: history.iter().cloned().collect(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }

    fn lock_history(&self) -> MutexGuard<'_, VecDeque<MetricEvent>> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

/// Top-level hub wrapping the collector plus a rolling `analyze` latency window.
pub struct TelemetryHub {
    collector: TelemetryCollector,
    latency_ms: Mutex<VecDeque<f32>>,
    latency_window: usize,
}

impl TelemetryHub {
    pub fn new(channel_capacity: usize, history_capacity: usize, latency_window: usize) -> Self {
        Self {
            collector: TelemetryCollector::new(channel_capacity, history_capacity),
            latency_ms: Mutex::new(VecDeque::with_capacity(latency_window)),
            latency_window: latency_window.max(1),
        }
    }

    pub fn collector(&self) -> &TelemetryCollector {
        &self.collector
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.collector.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.collector.subscribe()
    }

    pub fn record_classification(&self, result: &ClassificationResult, rule: Option<CascadeRule>) {
        self.collector.publish(MetricEvent::Classification {
            label: result.label,
            confidence: result.confidence,
            rule,
        });
    }

    pub fn record_fallback(&self, path: FallbackPath, reason: impl Into<String>) {
        self.collector.publish(MetricEvent::FeatureFallback {
            path,
            reason: reason.into(),
        });
    }

    /// Record how long one `analyze` call took and publish the window's gauges
    pub fn record_latency(&self, elapsed_ms: f32) {
        let event = {
            let mut window = self
                .latency_ms
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if window.len() == self.latency_window {
                window.pop_front();
            }
            window.push_back(elapsed_ms);

            let sample_count = window.len();
            MetricEvent::Latency {
                avg_ms: window.iter().sum::<f32>() / sample_count as f32,
                max_ms: window.iter().copied().fold(0.0, f32::max),
                sample_count,
            }
        };
        self.collector.publish(event);
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(256, 64, 32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classifier::CryLabel;

    fn sample_result(label: CryLabel, confidence: f64) -> ClassificationResult {
        ClassificationResult {
            label,
            confidence,
            description: "test".to_string(),
            is_real_ai: true,
        }
    }

    #[test]
    fn collector_preserves_order_within_history() {
        let collector = TelemetryCollector::new(8, 3);
        collector.publish(MetricEvent::Latency {
            avg_ms: 1.0,
            max_ms: 2.0,
            sample_count: 1,
        });
        collector.publish(MetricEvent::FeatureFallback {
            path: FallbackPath::ContextOnly,
            reason: "test".to_string(),
        });

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 2);
        assert!(matches!(snapshot.recent[0], MetricEvent::Latency { .. }));
        assert!(matches!(
            snapshot.recent[1],
            MetricEvent::FeatureFallback {
                path: FallbackPath::ContextOnly,
                ..
            }
        ));
    }

    #[test]
    fn collector_drops_history_when_full() {
        let collector = TelemetryCollector::new(8, 2);
        for sample_count in 1..=3 {
            collector.publish(MetricEvent::Latency {
                avg_ms: sample_count as f32,
                max_ms: sample_count as f32,
                sample_count,
            });
        }

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 2);
        assert_eq!(snapshot.total_events, 3);
        assert_eq!(snapshot.dropped_events, 1);
        assert!(matches!(
            snapshot.recent[0],
            MetricEvent::Latency {
                sample_count: 2,
                ..
            }
        ));
    }

    #[test]
    fn hub_tracks_rolling_latency() {
        let hub = TelemetryHub::new(8, 8, 2);
        hub.record_latency(10.0);
        hub.record_latency(20.0);
        hub.record_latency(40.0);

        let snapshot = hub.snapshot();
        let last = snapshot.recent.last().cloned();
        assert_eq!(
            last,
            Some(MetricEvent::Latency {
                avg_ms: 30.0,
                max_ms: 40.0,
                sample_count: 2
            })
        );
    }

    #[test]
    fn latency_max_follows_the_window() {
        let hub = TelemetryHub::new(8, 8, 2);
        hub.record_latency(50.0);
        hub.record_latency(10.0);
        hub.record_latency(20.0);

        // The 50 ms call has left the window
        assert_eq!(
            hub.snapshot().recent.last().cloned(),
            Some(MetricEvent::Latency {
                avg_ms: 15.0,
                max_ms: 20.0,
                sample_count: 2
            })
        );
    }

    #[test]
    fn zero_latency_window_keeps_latest_call() {
        let hub = TelemetryHub::new(8, 8, 0);
        hub.record_latency(5.0);
        hub.record_latency(7.0);

        assert_eq!(
            hub.snapshot().recent.last().cloned(),
            Some(MetricEvent::Latency {
                avg_ms: 7.0,
                max_ms: 7.0,
                sample_count: 1
            })
        );
    }

    #[tokio::test]
    async fn subscribers_receive_classifications() {
        let hub = TelemetryHub::default();
        let mut rx = hub.subscribe();

        hub.record_classification(
            &sample_result(CryLabel::Gas, 0.82),
            Some(CascadeRule::RecentFeeding),
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            MetricEvent::Classification {
                label: CryLabel::Gas,
                confidence: 0.82,
                rule: Some(CascadeRule::RecentFeeding),
            }
        );
    }
}
