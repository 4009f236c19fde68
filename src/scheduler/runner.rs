//! Scheduler loop driving periodic dispatch cycles
//!
//! One timer drives strictly sequential cycles: a new cycle never starts
//! before the previous one returns, so the same broadcast cannot race
//! against itself. The loop catches every cycle error at its boundary and
//! keeps ticking; a single malformed item or a downstream outage must never
//! halt all future dispatch.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::engine::DispatchEngine;
use super::error::{SchedulerError, SchedulerResult};

/// Default tick period between dispatch cycles
pub const DEFAULT_TICK_SECS: u64 = 60;

struct RunnerState {
    handle: Option<JoinHandle<()>>,
    shutdown: Option<watch::Sender<bool>>,
}

/// Periodic runner for the dispatch engine
///
/// State machine: Stopped → Running → Stopped. [`start`] and [`stop`] are
/// both idempotent; [`stop`] waits for an in-flight cycle to finish before
/// returning, so no dispatch occurs after shutdown completes.
///
/// [`start`]: SchedulerRunner::start
/// [`stop`]: SchedulerRunner::stop
pub struct SchedulerRunner {
    engine: Arc<DispatchEngine>,
    tick: Duration,
    state: Mutex<RunnerState>,
}

impl SchedulerRunner {
    /// Create a runner with an explicit tick period
    pub fn new(engine: Arc<DispatchEngine>, tick_secs: u64) -> SchedulerResult<Self> {
        if tick_secs == 0 {
            return Err(SchedulerError::InvalidTickPeriod { seconds: tick_secs });
        }

        Ok(Self {
            engine,
            tick: Duration::from_secs(tick_secs),
            state: Mutex::new(RunnerState {
                handle: None,
                shutdown: None,
            }),
        })
    }

    /// Create a runner with the default 60-second tick
    pub fn with_defaults(engine: Arc<DispatchEngine>) -> Self {
        Self {
            engine,
            tick: Duration::from_secs(DEFAULT_TICK_SECS),
            state: Mutex::new(RunnerState {
                handle: None,
                shutdown: None,
            }),
        }
    }

    #[cfg(test)]
    fn with_tick(engine: Arc<DispatchEngine>, tick: Duration) -> Self {
        Self {
            engine,
            tick,
            state: Mutex::new(RunnerState {
                handle: None,
                shutdown: None,
            }),
        }
    }

    /// Start the loop. No-op when already running.
    ///
    /// The first cycle runs immediately, then once per tick.
    pub async fn start(&self) {
        let mut state = self.state.lock().await;
        if state.handle.is_some() {
            debug!("Scheduler already running, start ignored");
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let engine = self.engine.clone();
        let tick = self.tick;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let now = Utc::now().timestamp();
                        // Cycle errors stop here; the next tick still fires.
                        if let Err(e) = engine.run_cycle(now).await {
                            error!(error = %e, "Dispatch cycle failed");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        debug!("Scheduler loop received shutdown");
                        break;
                    }
                }
            }
        });

        state.handle = Some(handle);
        state.shutdown = Some(shutdown_tx);
        info!(tick_secs = self.tick.as_secs(), "Scheduler started");
    }

    /// Stop the loop. No-op when already stopped.
    ///
    /// Waits for an in-flight cycle to complete before returning.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        let (Some(handle), Some(shutdown)) = (state.handle.take(), state.shutdown.take()) else {
            debug!("Scheduler already stopped, stop ignored");
            return;
        };

        let _ = shutdown.send(true);
        if let Err(e) = handle.await {
            error!(error = %e, "Scheduler task ended abnormally");
        }
        info!("Scheduler stopped");
    }

    /// Check whether the loop is running
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.handle.is_some()
    }
}
