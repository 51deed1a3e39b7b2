//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use forkcast::admission::AdmissionController;
use forkcast::cache::{CacheNamespace, ResponseCache};
use forkcast::providers::{CompletionProvider, RetryConfig, RetryingCompletionProvider};
use forkcast::store::MemoryStore;
use forkcast::telemetry;
use forkcast::types::CompletionRequest;
use forkcast::{ForkcastError, Result};

// ============================================================================
// Mock providers
// ============================================================================

/// Fails with a transport error `failures` times, then answers.
struct FlakyProvider {
    failures: u32,
    calls: AtomicU32,
}

#[async_trait]
impl CompletionProvider for FlakyProvider {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            Err(ForkcastError::Http("connection reset".into()))
        } else {
            Ok("{}".into())
        }
    }
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

// ============================================================================
// Helpers
// ============================================================================

/// Sum counter values for `name` whose labels include `label`.
fn counter_with(snapshot: &SnapshotVec, name: &str, label: (&str, &str)) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .filter(|(key, _, _, _)| {
            key.key()
                .labels()
                .any(|l| l.key() == label.0 && l.value() == label.1)
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

fn request() -> CompletionRequest {
    CompletionRequest::new("gpt-4o-mini", "system", "user")
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn cache_hits_and_misses_are_counted_per_namespace() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let cache = ResponseCache::new(Arc::new(MemoryStore::default()));
                let key = CacheNamespace::Weather.key([Some("21.03"), Some("105.85"), Some("vi")]);
                for _ in 0..3 {
                    let _: Result<u32> = cache.get_or_fetch(&key, None, || async { Ok(7) }).await;
                }
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();
    let label = ("namespace", CacheNamespace::Weather.name());
    assert_eq!(counter_with(&snapshot, telemetry::CACHE_MISSES_TOTAL, label), 1);
    assert_eq!(counter_with(&snapshot, telemetry::CACHE_HITS_TOTAL, label), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn transient_failures_count_retries() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let flaky = Arc::new(FlakyProvider {
                    failures: 2,
                    calls: AtomicU32::new(0),
                });
                let provider = RetryingCompletionProvider::new(
                    flaky,
                    RetryConfig::new().initial_delay(Duration::from_millis(1)),
                );
                provider.complete(&request()).await
            })
        })
    });
    assert!(result.is_ok());

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter_with(&snapshot, telemetry::RETRIES_TOTAL, ("provider", "flaky")),
        2
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn queued_admission_records_wait_time() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let (first, second) = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let admission = AdmissionController::new([("openai", 1)]);
                let hold = admission.submit("openai", || async {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(1)
                });
                let queued = admission.submit("openai", || async { Ok(2) });
                tokio::join!(hold, queued)
            })
        })
    });
    assert_eq!((first.unwrap(), second.unwrap()), (1, 2));

    let snapshot = snapshotter.snapshot().into_vec();
    assert!(has_histogram(&snapshot, telemetry::ADMISSION_WAIT_SECONDS));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn uncontended_admission_records_no_wait() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let admission = AdmissionController::new([("openai", 1)]);
                admission.submit("openai", || async { Ok(()) }).await
            })
        })
    })
    .unwrap();

    let snapshot = snapshotter.snapshot().into_vec();
    assert!(!has_histogram(&snapshot, telemetry::ADMISSION_WAIT_SECONDS));
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let cache = ResponseCache::new(Arc::new(MemoryStore::default()));
    let value: u32 = cache
        .get_or_fetch("w:noop", None, || async { Ok(1) })
        .await
        .unwrap();
    assert_eq!(value, 1);
}
