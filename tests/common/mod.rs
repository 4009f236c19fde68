//! Common test utilities

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use herald::models::{Broadcast, Destination};
use herald::sender::{DeliveryOutcome, Sender};

/// A sender that returns a scripted outcome per broadcast id and records
/// every delivery attempt in order
pub struct ScriptedSender {
    script: Mutex<HashMap<i64, DeliveryOutcome>>,
    attempts: Mutex<Vec<i64>>,
}

#[allow(dead_code)]
impl ScriptedSender {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Set the outcome returned for a broadcast id; unscripted ids deliver
    pub fn script(&self, broadcast_id: i64, outcome: DeliveryOutcome) {
        self.script.lock().unwrap().insert(broadcast_id, outcome);
    }

    /// Broadcast ids attempted so far, in delivery order
    pub fn attempts(&self) -> Vec<i64> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }
}

#[async_trait]
impl Sender for ScriptedSender {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn deliver(&self, broadcast: &Broadcast, _destination: &Destination) -> DeliveryOutcome {
        self.attempts.lock().unwrap().push(broadcast.id);
        self.script
            .lock()
            .unwrap()
            .get(&broadcast.id)
            .cloned()
            .unwrap_or(DeliveryOutcome::Delivered)
    }
}
