//! Delivery channels for broadcasts
//!
//! The dispatch engine hands each eligible broadcast to a [`Sender`], which
//! reports a classified [`DeliveryOutcome`]: delivered, transient failure
//! (retried on a later cycle, no state change), or permanent failure (the
//! destination gets disabled). Timeouts are the sender's responsibility and
//! classify as transient.

pub mod webhook;

use async_trait::async_trait;
use std::fmt;

use crate::models::{Broadcast, Destination};

pub use webhook::{WebhookConfig, WebhookSender};

/// Errors constructing or configuring a sender
#[derive(Debug, thiserror::Error)]
pub enum SenderError {
    /// Invalid sender configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP client construction failed
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Classified result of one delivery attempt
///
/// Every failure is classified; the engine never sees an unclassified
/// delivery error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The broadcast reached its destination
    Delivered,

    /// Delivery failed but is worth retrying on a later cycle
    /// (rate limiting, timeout, upstream outage)
    Transient { reason: String },

    /// The destination is no longer reachable (removed, revoked access);
    /// it must be disabled
    Permanent { reason: String },
}

impl DeliveryOutcome {
    /// Transient failure with a reason
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient {
            reason: reason.into(),
        }
    }

    /// Permanent failure with a reason
    pub fn permanent(reason: impl Into<String>) -> Self {
        Self::Permanent {
            reason: reason.into(),
        }
    }

    /// True when the broadcast was delivered
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered => write!(f, "delivered"),
            Self::Transient { reason } => write!(f, "transient failure: {reason}"),
            Self::Permanent { reason } => write!(f, "permanent failure: {reason}"),
        }
    }
}

/// Trait for broadcast delivery channels
///
/// Implement this trait to deliver broadcasts over a new transport.
#[async_trait]
pub trait Sender: Send + Sync {
    /// Get the sender name (for logging)
    fn name(&self) -> &str;

    /// Deliver one broadcast to one destination and classify the outcome.
    ///
    /// Must not retry internally within a cycle; the scheduler retries
    /// transient failures on the next tick.
    async fn deliver(&self, broadcast: &Broadcast, destination: &Destination) -> DeliveryOutcome;
}
