//! Lazily connected, shared store connection.
//!
//! [`Connector`] owns at most one live connection and moves through four
//! states:
//!
//! ```text
//!            acquire()                 dial ok
//! Disconnected ────────► Connecting ─────────────► Ready
//!      ▲                  │      ▲                   │
//!      │    dial error /  │      │ acquire() after   │
//!      │    ready timeout ▼      │ the cool-down     │
//!      │                 Failed ─┘                   │
//!      │                                             │
//!      └─────────── invalidate() / release() ────────┘
//! ```
//!
//! The first caller to find the connector disconnected becomes the leader
//! and dials. Everyone arriving while the dial is in flight subscribes to a
//! `watch` channel and is woken exactly once with the shared outcome, so a
//! burst of concurrent requests produces a single connection attempt.
//!
//! A dial that does not complete within the ready timeout fails open: the
//! caller receives [`StoreError::Timeout`] instead of hanging. After any
//! failed dial, `acquire()` returns the same error immediately until the
//! retry cool-down has elapsed, so an unreachable store costs one dial per
//! cool-down rather than one per command.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::{StoreError, StoreResult};
use crate::telemetry;

/// Default deadline for a connection to become ready.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(15);

/// Default wait after a failed dial before the next one is attempted.
pub const DEFAULT_RETRY_COOLDOWN: Duration = Duration::from_secs(5);

/// Establishes and tears down backend connections.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    /// Cheap-to-clone handle shared by every caller.
    type Connection: Clone + Send + Sync + 'static;

    /// Open a connection and wait until it is ready for commands.
    async fn dial(&self) -> StoreResult<Self::Connection>;

    /// Close a connection gracefully. Errors are logged by the connector and
    /// the handle is dropped regardless.
    async fn close(&self, connection: Self::Connection) -> StoreResult<()>;

    /// Connection target for logs, with credentials redacted.
    fn describe(&self) -> String;
}

type Outcome<C> = StoreResult<C>;
type OutcomeRx<C> = watch::Receiver<Option<Outcome<C>>>;
type OutcomeTx<C> = watch::Sender<Option<Outcome<C>>>;

enum State<C> {
    Disconnected,
    Connecting(OutcomeRx<C>),
    Ready(C),
    Failed { until: Instant, error: StoreError },
}

/// What a caller does once the state lock is released.
enum Step<C> {
    Lead(OutcomeTx<C>),
    Wait(OutcomeRx<C>),
}

/// Single shared connection with connect-on-demand.
pub struct Connector<D: Dialer> {
    dialer: D,
    ready_timeout: Duration,
    retry_cooldown: Duration,
    state: Mutex<State<D::Connection>>,
}

impl<D: Dialer> Connector<D> {
    /// Create a disconnected connector with the default 15s ready timeout.
    pub fn new(dialer: D) -> Self {
        Self::with_ready_timeout(dialer, DEFAULT_READY_TIMEOUT)
    }

    pub fn with_ready_timeout(dialer: D, ready_timeout: Duration) -> Self {
        Self {
            dialer,
            ready_timeout,
            retry_cooldown: DEFAULT_RETRY_COOLDOWN,
            state: Mutex::new(State::Disconnected),
        }
    }

    /// Set how long a failed dial is remembered before redialing.
    pub fn retry_cooldown(mut self, cooldown: Duration) -> Self {
        self.retry_cooldown = cooldown;
        self
    }

    pub fn dialer(&self) -> &D {
        &self.dialer
    }

    /// Whether a ready connection is currently held.
    pub fn is_ready(&self) -> bool {
        matches!(*self.lock_state(), State::Ready(_))
    }

    /// Return the shared connection, connecting first if needed.
    pub async fn acquire(&self) -> StoreResult<D::Connection> {
        loop {
            // The guard must not live across an await point.
            let step = {
                let mut state = self.lock_state();
                match &*state {
                    State::Ready(conn) => return Ok(conn.clone()),
                    State::Connecting(rx) => Step::Wait(rx.clone()),
                    State::Failed { until, error } if Instant::now() < *until => {
                        debug!(error = %error, "store unavailable, skipping connection attempt");
                        return Err(error.clone());
                    }
                    State::Failed { .. } | State::Disconnected => {
                        let (tx, rx) = watch::channel(None);
                        *state = State::Connecting(rx);
                        Step::Lead(tx)
                    }
                }
            };

            let mut rx = match step {
                Step::Lead(tx) => return self.connect(tx).await,
                Step::Wait(rx) => rx,
            };

            debug!("waiting for in-flight store connection attempt");
            let waited = rx
                .wait_for(Option::is_some)
                .await
                .map(|outcome| (*outcome).clone());
            match waited {
                Ok(Some(outcome)) => return outcome,
                Ok(None) => continue,
                // Leader was cancelled before publishing an outcome.
                Err(_) => self.reset_abandoned(&rx),
            }
        }
    }

    /// Drop the held connection so the next `acquire()` reconnects.
    ///
    /// Called by backends when a command reports a terminal connection
    /// failure.
    pub fn invalidate(&self) {
        let mut state = self.lock_state();
        if matches!(*state, State::Ready(_)) {
            warn!("store connection closed, will reconnect on next use");
            *state = State::Disconnected;
        }
    }

    /// Close the connection gracefully and reset to disconnected.
    ///
    /// A failed graceful close falls back to dropping the handle; the
    /// connector always ends up disconnected.
    pub async fn release(&self) {
        let previous = std::mem::replace(&mut *self.lock_state(), State::Disconnected);
        if let State::Ready(conn) = previous {
            match self.dialer.close(conn).await {
                Ok(()) => info!("store connection closed"),
                Err(e) => warn!(error = %e, "error closing store connection, disconnected forcefully"),
            }
        }
    }

    async fn connect(&self, tx: OutcomeTx<D::Connection>) -> StoreResult<D::Connection> {
        let attempt = tx.subscribe();
        info!(target_addr = %self.dialer.describe(), "connecting to store");

        let outcome = match tokio::time::timeout(self.ready_timeout, self.dialer.dial()).await {
            Ok(Ok(conn)) => {
                metrics::counter!(telemetry::STORE_CONNECTS_TOTAL, "status" => "ok").increment(1);
                info!("store is ready to accept commands");
                Ok(conn)
            }
            Ok(Err(e)) => {
                metrics::counter!(telemetry::STORE_CONNECTS_TOTAL, "status" => "error").increment(1);
                error!(error = %e, "store connection error");
                Err(e)
            }
            Err(_) => {
                metrics::counter!(telemetry::STORE_CONNECTS_TOTAL, "status" => "timeout").increment(1);
                error!(
                    timeout_secs = self.ready_timeout.as_secs(),
                    "store connection timeout"
                );
                Err(StoreError::Timeout(self.ready_timeout))
            }
        };

        {
            let mut state = self.lock_state();
            // release() may have reset the state while we were dialing.
            let still_ours = matches!(&*state, State::Connecting(current) if current.same_channel(&attempt));
            if still_ours {
                *state = match &outcome {
                    Ok(conn) => State::Ready(conn.clone()),
                    Err(e) => State::Failed {
                        until: Instant::now() + self.retry_cooldown,
                        error: e.clone(),
                    },
                };
            }
        }
        tx.send_replace(Some(outcome.clone()));
        outcome
    }

    fn reset_abandoned(&self, rx: &OutcomeRx<D::Connection>) {
        let mut state = self.lock_state();
        let abandoned = matches!(&*state, State::Connecting(current) if current.same_channel(rx));
        if abandoned {
            *state = State::Disconnected;
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, State<D::Connection>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
