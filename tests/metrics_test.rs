//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::time::Duration;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use muninn::{
    AcquisitionStrategy, FixedStrategy, Muninn, MuninnError, Orchestrator, Result, telemetry,
};

struct FailingStrategy;

#[async_trait]
impl AcquisitionStrategy<u32> for FailingStrategy {
    fn source(&self) -> &str {
        "failing"
    }

    async fn attempt(&self, _identifier: &str) -> Result<u32> {
        Err(MuninnError::Strategy {
            strategy: "failing".to_string(),
            message: "no record".to_string(),
        })
    }
}

fn succeeding_engine() -> Orchestrator<u32> {
    Muninn::builder::<u32>()
        .strategy(FixedStrategy::new(7))
        .build()
        .unwrap()
}

fn failing_engine() -> Orchestrator<u32> {
    Muninn::builder::<u32>()
        .base_delay(Duration::from_millis(1))
        .strategy(FailingStrategy)
        .build()
        .unwrap()
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Check if any histogram entries exist for a given metric name.
fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn successful_acquire_records_request_and_attempt_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let engine = succeeding_engine();
                engine.acquire("jdoe").await
            })
        })
    });
    assert!(result.is_ok());

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::REQUESTS_TOTAL), 1);
    assert_eq!(
        counter_total(&snapshot, telemetry::STRATEGY_ATTEMPTS_TOTAL),
        1
    );
    assert!(
        has_histogram(&snapshot, telemetry::REQUEST_DURATION_SECONDS),
        "expected a duration histogram entry"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn cache_hit_records_hit_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let engine = succeeding_engine();
                engine.acquire("jdoe").await.unwrap();
                engine.acquire("jdoe").await.unwrap();
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 1);
    // The first acquire missed before running its strategy.
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::REQUESTS_TOTAL), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn exhaustion_records_error_request_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let engine = failing_engine();
                engine.acquire("jdoe").await
            })
        })
    });
    assert!(result.is_err());

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(counter_total(&snapshot, telemetry::REQUESTS_TOTAL), 1);
    assert_eq!(
        counter_total(&snapshot, telemetry::STRATEGY_ATTEMPTS_TOTAL),
        1
    );
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let engine = succeeding_engine();
    engine.acquire("jdoe").await.unwrap();
}
