//! Per-configuration admission control for outbound LLM calls.
//!
//! Each model configuration name gets its own lane: a tokio [`Semaphore`]
//! sized to the configuration's `max_concurrent_requests`. Tokio semaphores
//! are fair, so once a task is queued on a saturated lane it is admitted in
//! strict arrival order. A slot is released when the task finishes, whether
//! it succeeded, failed or was cancelled.
//!
//! Lanes are created lazily on first use and live for the life of the
//! controller. Failed tasks are never re-submitted here; a 429 from the
//! upstream surfaces to the caller as [`ForkcastError::RateLimited`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::telemetry;
use crate::types::ModelConfig;
use crate::{ForkcastError, Result};

/// Queue-depth gauge bookkeeping that survives cancellation.
struct QueuedGuard {
    config: String,
}

impl QueuedGuard {
    fn enter(config: &str) -> Self {
        metrics::gauge!(telemetry::ADMISSION_QUEUED, "config" => config.to_string()).increment(1.0);
        Self {
            config: config.to_string(),
        }
    }
}

impl Drop for QueuedGuard {
    fn drop(&mut self) {
        metrics::gauge!(telemetry::ADMISSION_QUEUED, "config" => self.config.clone())
            .decrement(1.0);
    }
}

/// Registry of FIFO concurrency lanes keyed by configuration name.
pub struct AdmissionController {
    limits: HashMap<String, usize>,
    lanes: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl std::fmt::Debug for AdmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionController")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl AdmissionController {
    /// Create a controller from `(config name, max concurrent)` pairs.
    ///
    /// A limit of zero is raised to one.
    pub fn new<I, S>(limits: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        Self {
            limits: limits
                .into_iter()
                .map(|(name, max)| (name.into(), max.max(1)))
                .collect(),
            lanes: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_model_configs(configs: &HashMap<String, ModelConfig>) -> Self {
        Self::new(
            configs
                .iter()
                .map(|(name, config)| (name.clone(), config.max_concurrent_requests)),
        )
    }

    /// Configured limit for `config`, if known.
    pub fn limit(&self, config: &str) -> Option<usize> {
        self.limits.get(config).copied()
    }

    /// Tasks currently holding a slot on `config`'s lane.
    pub fn in_flight(&self, config: &str) -> usize {
        let lanes = self.lanes.lock().unwrap_or_else(PoisonError::into_inner);
        match (lanes.get(config), self.limit(config)) {
            (Some(lane), Some(limit)) => limit - lane.available_permits(),
            _ => 0,
        }
    }

    /// Run `task` once a slot on `config`'s lane is free.
    ///
    /// Runs immediately when the lane has capacity, otherwise waits behind
    /// every task queued before it.
    pub async fn submit<T, F, Fut>(&self, config: &str, task: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let lane = self.lane(config)?;

        let _permit = match Arc::clone(&lane).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                debug!(config, "admission lane saturated, queueing");
                let queued = QueuedGuard::enter(config);
                let start = Instant::now();
                let permit = lane.acquire_owned().await.map_err(|_| {
                    ForkcastError::Configuration(format!("admission lane closed: {config}"))
                })?;
                drop(queued);
                metrics::histogram!(telemetry::ADMISSION_WAIT_SECONDS, "config" => config.to_string())
                    .record(start.elapsed().as_secs_f64());
                permit
            }
        };

        task().await
    }

    fn lane(&self, config: &str) -> Result<Arc<Semaphore>> {
        let limit = self
            .limit(config)
            .ok_or_else(|| ForkcastError::UnknownModelConfig(config.to_string()))?;
        let mut lanes = self.lanes.lock().unwrap_or_else(PoisonError::into_inner);
        let lane = lanes
            .entry(config.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(limit)));
        Ok(Arc::clone(lane))
    }
}
