//! Scheduled broadcast dispatch
//!
//! This module turns stored broadcasts into deliveries on a timer.
//!
//! # Overview
//!
//! Three layers cooperate:
//!
//! - [`window`] holds the pure time arithmetic deciding whether a broadcast
//!   is inside its lifetime and due for another send
//! - [`DispatchEngine`] runs a single cycle: query candidates, evaluate the
//!   window, deliver, and record the outcome per item
//! - [`SchedulerRunner`] drives cycles on a fixed tick and owns the
//!   start/stop lifecycle
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   tick    ┌──────────────────┐
//! │  SchedulerRunner │──────────▶│  DispatchEngine  │
//! └──────────────────┘           └────────┬─────────┘
//!                                         │ per candidate
//!                          ┌──────────────┼──────────────┐
//!                          ▼              ▼              ▼
//!                    window check      Sender      BroadcastStore
//! ```
//!
//! Every failure is contained at the narrowest scope that still makes
//! progress: a failed delivery affects one item, a failed cycle affects one
//! tick, and the loop itself only stops on an explicit shutdown.

pub mod engine;
pub mod error;
pub mod runner;
pub mod window;

pub use engine::{CycleStats, DispatchEngine};
pub use error::{SchedulerError, SchedulerResult};
pub use runner::{SchedulerRunner, DEFAULT_TICK_SECS};
pub use window::{is_due, within_lifetime};
