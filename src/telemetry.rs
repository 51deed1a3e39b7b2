//! Telemetry metric name constants.
//!
//! Centralised metric names for forkcast operations. The daemon (or any
//! embedding application) installs its own `metrics` recorder; without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `forkcast_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `namespace`: cache namespace (e.g. "weather", "food-details")
//! - `provider`: upstream provider (e.g. "open-meteo", "openai")
//! - `config`: model configuration name used for admission
//! - `status`: outcome: "ok" or "error"

/// Total cache hits.
///
/// Labels: `namespace`.
pub const CACHE_HITS_TOTAL: &str = "forkcast_cache_hits_total";

/// Total cache misses.
///
/// Labels: `namespace`.
pub const CACHE_MISSES_TOTAL: &str = "forkcast_cache_misses_total";

/// Total absorbed cache-layer failures (store unreachable, bad payload).
///
/// Labels: `operation` ("get" | "set" | "delete" | "invalidate").
pub const CACHE_ERRORS_TOTAL: &str = "forkcast_cache_errors_total";

/// Total outbound provider requests.
///
/// Labels: `provider`, `status` ("ok" | "error").
pub const PROVIDER_REQUESTS_TOTAL: &str = "forkcast_provider_requests_total";

/// Outbound provider request duration in seconds.
///
/// Labels: `provider`.
pub const PROVIDER_REQUEST_DURATION_SECONDS: &str = "forkcast_provider_request_duration_seconds";

/// Total client-level retry attempts (not counting the initial request).
///
/// Labels: `provider`.
pub const RETRIES_TOTAL: &str = "forkcast_retries_total";

/// Time spent queued in the admission controller before a slot opened.
///
/// Labels: `config`.
pub const ADMISSION_WAIT_SECONDS: &str = "forkcast_admission_wait_seconds";

/// Tasks currently waiting for an admission slot.
///
/// Labels: `config`.
pub const ADMISSION_QUEUED: &str = "forkcast_admission_queued";

/// Total store (re)connection attempts.
///
/// Labels: `status` ("ok" | "error" | "timeout").
pub const STORE_CONNECTS_TOTAL: &str = "forkcast_store_connects_total";
