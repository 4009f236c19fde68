//! Broadcast and destination persistence
//!
//! The dispatch core consumes the [`BroadcastStore`] trait; this module
//! ships the SQLite implementation used in production and an in-memory mock
//! for tests.

pub mod repository;

pub use repository::{
    create_mock_store, create_sqlite_store, BroadcastStore, MockBroadcastStore,
    SharedBroadcastStore, SqliteBroadcastStore,
};
