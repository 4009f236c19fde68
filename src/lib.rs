//! herald - Scheduled broadcast dispatcher
//!
//! A recurring-message dispatch service: broadcasts are stored with an
//! interval and a lifetime, and a background scheduler delivers each one to
//! its destination whenever it comes due, until the lifetime runs out.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Core data structures and types
//! - [`storage`] - Broadcast and destination persistence (SQLite)
//! - [`sender`] - Delivery transport with failure classification
//! - [`scheduler`] - Dispatch engine and the periodic runner loop
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use herald::config::Config;
//! use herald::scheduler::{DispatchEngine, SchedulerRunner};
//! use herald::sender::WebhookSender;
//! use herald::storage::create_sqlite_store;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = create_sqlite_store(&config.database.sqlite_path)?;
//!     let sender = Arc::new(WebhookSender::from_endpoint(&config.sender.endpoint)?);
//!     let engine = Arc::new(DispatchEngine::new(store, sender));
//!     let runner = SchedulerRunner::new(engine, config.scheduler.tick_secs)?;
//!     runner.start().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod sender;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{Broadcast, Destination, NewBroadcast, Payload};
    pub use crate::scheduler::{CycleStats, DispatchEngine, SchedulerRunner};
    pub use crate::sender::{DeliveryOutcome, Sender, WebhookSender};
    pub use crate::storage::{BroadcastStore, SharedBroadcastStore};
}

// Direct re-exports for convenience
pub use models::{Broadcast, Destination, NewBroadcast, Payload};
