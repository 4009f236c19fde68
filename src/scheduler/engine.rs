//! Dispatch engine: one scan cycle over the candidate set
//!
//! The engine fetches every active broadcast joined to an enabled
//! destination, evaluates the time window for each, delivers the eligible
//! ones, and records bookkeeping. Failures are isolated per item: one bad
//! broadcast never aborts the rest of the cycle.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::{SchedulerError, SchedulerResult};
use super::window;
use crate::sender::{DeliveryOutcome, Sender};
use crate::storage::SharedBroadcastStore;

/// Counters for one dispatch cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Candidates returned by the store
    pub examined: usize,
    /// Broadcasts successfully delivered
    pub delivered: usize,
    /// Candidates outside their lifetime or not yet due
    pub skipped_window: usize,
    /// Candidates skipped because their destination was disabled earlier in
    /// this same cycle
    pub skipped_disabled: usize,
    /// Deliveries that failed transiently (retried next cycle)
    pub transient_failures: usize,
    /// Destinations disabled by permanent failures
    pub destinations_disabled: usize,
    /// Store bookkeeping writes that failed
    pub store_errors: usize,
}

impl CycleStats {
    /// True when nothing noteworthy happened this cycle
    pub fn is_idle(&self) -> bool {
        self.delivered == 0
            && self.transient_failures == 0
            && self.destinations_disabled == 0
            && self.store_errors == 0
    }
}

/// Orchestrates one dispatch cycle over store and sender
pub struct DispatchEngine {
    store: SharedBroadcastStore,
    sender: Arc<dyn Sender>,
}

impl DispatchEngine {
    /// Create a new engine over the given collaborators
    pub fn new(store: SharedBroadcastStore, sender: Arc<dyn Sender>) -> Self {
        Self { store, sender }
    }

    /// Run one dispatch cycle at the given wall-clock time (epoch seconds).
    ///
    /// Returns `Err` only when the candidate set itself cannot be fetched;
    /// per-item delivery and bookkeeping failures are counted in
    /// [`CycleStats`] and logged, never propagated.
    pub async fn run_cycle(&self, now: i64) -> SchedulerResult<CycleStats> {
        let candidates =
            self.store
                .dispatch_candidates()
                .map_err(|e| SchedulerError::CandidateQueryFailed {
                    reason: e.to_string(),
                })?;

        let mut stats = CycleStats {
            examined: candidates.len(),
            ..Default::default()
        };

        // Destinations disabled by a permanent failure earlier in this
        // cycle; their remaining items are skipped without delivery.
        let mut disabled_now: HashSet<i64> = HashSet::new();

        for (broadcast, destination) in candidates {
            if disabled_now.contains(&destination.id) {
                stats.skipped_disabled += 1;
                continue;
            }

            if !window::within_lifetime(now, broadcast.created_at, broadcast.duration_minutes)
                || !window::is_due(now, broadcast.last_sent_at, broadcast.interval_minutes)
            {
                stats.skipped_window += 1;
                continue;
            }

            debug!(
                broadcast_id = broadcast.id,
                destination_id = destination.id,
                "Dispatching broadcast"
            );

            match self.sender.deliver(&broadcast, &destination).await {
                DeliveryOutcome::Delivered => {
                    info!(
                        broadcast_id = broadcast.id,
                        destination_id = destination.id,
                        "Broadcast delivered"
                    );
                    if let Err(e) = self.store.record_sent(broadcast.id, now) {
                        warn!(
                            broadcast_id = broadcast.id,
                            error = %e,
                            "Failed to record delivery time"
                        );
                        stats.store_errors += 1;
                    }
                    stats.delivered += 1;
                }
                DeliveryOutcome::Transient { reason } => {
                    warn!(
                        broadcast_id = broadcast.id,
                        destination_id = destination.id,
                        reason = %reason,
                        "Delivery failed transiently, will retry next cycle"
                    );
                    stats.transient_failures += 1;
                }
                DeliveryOutcome::Permanent { reason } => {
                    warn!(
                        broadcast_id = broadcast.id,
                        destination_id = destination.id,
                        reason = %reason,
                        "Delivery failed permanently, disabling destination"
                    );
                    if let Err(e) = self.store.disable_destination(destination.id) {
                        warn!(
                            destination_id = destination.id,
                            error = %e,
                            "Failed to disable destination"
                        );
                        stats.store_errors += 1;
                    }
                    disabled_now.insert(destination.id);
                    stats.destinations_disabled += 1;
                }
            }
        }

        if !stats.is_idle() {
            info!(
                examined = stats.examined,
                delivered = stats.delivered,
                transient = stats.transient_failures,
                disabled = stats.destinations_disabled,
                "Dispatch cycle finished"
            );
        }

        Ok(stats)
    }
}
