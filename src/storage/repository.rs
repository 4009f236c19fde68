//! Repository pattern for broadcast persistence
//!
//! This module provides the trait-based store abstraction the dispatch core
//! consumes, decoupling scheduling logic from the storage backend:
//! - Easy testing with the in-memory mock implementation
//! - Swappable backends behind [`BroadcastStore`]
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               Dispatch Engine               │
//! └─────────────────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌─────────────────────────────────────────────┐
//! │            BroadcastStore trait             │
//! └─────────────────────────────────────────────┘
//!           │                       │
//!           ▼                       ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │     SQLite      │     │      Mock       │
//! │ Implementation  │     │ Implementation  │
//! └─────────────────┘     └─────────────────┘
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{Error, Result};
use crate::models::{Broadcast, Destination, MediaKind, NewBroadcast, Payload};

// ============================================================================
// Store Trait
// ============================================================================

/// Persistent store for broadcasts and destinations
///
/// The dispatch core only calls [`dispatch_candidates`], [`record_sent`] and
/// [`disable_destination`]; the remaining operations serve the management
/// surface. Each mutating operation is individually atomic; there are no
/// transactions spanning multiple broadcasts.
///
/// [`dispatch_candidates`]: BroadcastStore::dispatch_candidates
/// [`record_sent`]: BroadcastStore::record_sent
/// [`disable_destination`]: BroadcastStore::disable_destination
pub trait BroadcastStore: Send + Sync {
    /// Insert a new broadcast and return its assigned id.
    ///
    /// The owning destination is created implicitly (enabled, no operators)
    /// if it has not been contacted before.
    fn add_broadcast(&self, new: &NewBroadcast, created_at: i64) -> Result<i64>;

    /// Update an existing broadcast in place (management edit path).
    /// Returns false when no matching row exists.
    fn update_broadcast(&self, broadcast: &Broadcast) -> Result<bool>;

    /// Get a broadcast by id
    fn get_broadcast(&self, id: i64) -> Result<Option<Broadcast>>;

    /// List broadcasts for a destination
    fn list_broadcasts(&self, destination_id: i64, active_only: bool) -> Result<Vec<Broadcast>>;

    /// Delete a broadcast. Returns false when no matching row exists.
    fn delete_broadcast(&self, id: i64, destination_id: i64) -> Result<bool>;

    /// All active broadcasts joined to their enabled destinations.
    ///
    /// This is the candidate set for one dispatch cycle; time-window
    /// eligibility is evaluated by the engine, not here.
    fn dispatch_candidates(&self) -> Result<Vec<(Broadcast, Destination)>>;

    /// Record a successful delivery.
    ///
    /// `last_sent_at` is guarded to be monotonically non-decreasing: a stale
    /// timestamp never moves it backwards.
    fn record_sent(&self, broadcast_id: i64, sent_at: i64) -> Result<()>;

    /// Disable a destination after a permanent delivery failure. Its
    /// broadcasts are kept intact for potential reactivation.
    fn disable_destination(&self, destination_id: i64) -> Result<()>;

    /// Insert or update a destination
    fn save_destination(&self, destination: &Destination) -> Result<()>;

    /// Get a destination by id
    fn get_destination(&self, destination_id: i64) -> Result<Option<Destination>>;

    /// Delete a destination (cascades to its broadcasts)
    fn delete_destination(&self, destination_id: i64) -> Result<()>;
}

/// Thread-safe shared store handle
pub type SharedBroadcastStore = Arc<dyn BroadcastStore>;

// ============================================================================
// SQLite Implementation
// ============================================================================

/// SQLite implementation of [`BroadcastStore`]
///
/// Uses `Mutex` to ensure thread-safety for the SQLite connection.
pub struct SqliteBroadcastStore {
    conn: Mutex<Connection>,
}

impl SqliteBroadcastStore {
    /// Open (or create) the store at the given path
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite broadcast store initialized");
        Ok(store)
    }

    /// Create in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS destinations (
                id INTEGER PRIMARY KEY,
                is_enabled INTEGER NOT NULL DEFAULT 1,
                operator_ids TEXT NOT NULL DEFAULT '[]'
            );

            CREATE TABLE IF NOT EXISTS broadcasts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                destination_id INTEGER NOT NULL,
                text TEXT NOT NULL,
                media_kind TEXT,
                media_ref TEXT,
                thread_id INTEGER,
                button_text TEXT,
                button_url TEXT,
                interval_minutes INTEGER NOT NULL DEFAULT 60,
                duration_minutes INTEGER NOT NULL DEFAULT 1440,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL,
                last_sent_at INTEGER,
                FOREIGN KEY (destination_id) REFERENCES destinations (id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_broadcasts_destination
                ON broadcasts(destination_id);

            CREATE INDEX IF NOT EXISTS idx_broadcasts_active
                ON broadcasts(is_active);
            "#,
        )?;

        Ok(())
    }

    fn row_to_broadcast(row: &Row<'_>) -> rusqlite::Result<Broadcast> {
        let media_kind: Option<String> = row.get("media_kind")?;
        let button_text: Option<String> = row.get("button_text")?;
        let button_url: Option<String> = row.get("button_url")?;

        let button = match (button_text, button_url) {
            (Some(text), Some(url)) => Some(crate::models::InlineButton { text, url }),
            _ => None,
        };

        Ok(Broadcast {
            id: row.get("id")?,
            destination_id: row.get("destination_id")?,
            payload: Payload {
                text: row.get("text")?,
                media_kind: media_kind.as_deref().and_then(MediaKind::from_str_opt),
                media_ref: row.get("media_ref")?,
                thread_id: row.get("thread_id")?,
                button,
            },
            interval_minutes: row.get("interval_minutes")?,
            duration_minutes: row.get("duration_minutes")?,
            is_active: row.get("is_active")?,
            created_at: row.get("created_at")?,
            last_sent_at: row.get("last_sent_at")?,
        })
    }

    fn row_to_destination(row: &Row<'_>) -> rusqlite::Result<(i64, bool, String)> {
        Ok((
            row.get("id")?,
            row.get("is_enabled")?,
            row.get("operator_ids")?,
        ))
    }

    fn parse_operators(raw: &str) -> Vec<i64> {
        serde_json::from_str(raw).unwrap_or_default()
    }
}

impl BroadcastStore for SqliteBroadcastStore {
    fn add_broadcast(&self, new: &NewBroadcast, created_at: i64) -> Result<i64> {
        new.validate()?;

        let conn = self.conn.lock().unwrap();

        // First contact creates the destination implicitly.
        conn.execute(
            "INSERT OR IGNORE INTO destinations (id) VALUES (?1)",
            params![new.destination_id],
        )?;

        let (button_text, button_url) = match &new.payload.button {
            Some(b) => (Some(b.text.as_str()), Some(b.url.as_str())),
            None => (None, None),
        };

        conn.execute(
            r#"
            INSERT INTO broadcasts (
                destination_id, text, media_kind, media_ref, thread_id,
                button_text, button_url, interval_minutes, duration_minutes,
                is_active, created_at, last_sent_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, NULL)
            "#,
            params![
                new.destination_id,
                new.payload.text,
                new.payload.media_kind.map(|k| k.as_str()),
                new.payload.media_ref,
                new.payload.thread_id,
                button_text,
                button_url,
                new.interval_minutes,
                new.duration_minutes,
                created_at,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn update_broadcast(&self, broadcast: &Broadcast) -> Result<bool> {
        broadcast.validate()?;

        let conn = self.conn.lock().unwrap();

        let (button_text, button_url) = match &broadcast.payload.button {
            Some(b) => (Some(b.text.as_str()), Some(b.url.as_str())),
            None => (None, None),
        };

        let updated = conn.execute(
            r#"
            UPDATE broadcasts SET
                text = ?1, media_kind = ?2, media_ref = ?3, thread_id = ?4,
                button_text = ?5, button_url = ?6, interval_minutes = ?7,
                duration_minutes = ?8, is_active = ?9, last_sent_at = ?10
            WHERE id = ?11 AND destination_id = ?12
            "#,
            params![
                broadcast.payload.text,
                broadcast.payload.media_kind.map(|k| k.as_str()),
                broadcast.payload.media_ref,
                broadcast.payload.thread_id,
                button_text,
                button_url,
                broadcast.interval_minutes,
                broadcast.duration_minutes,
                broadcast.is_active,
                broadcast.last_sent_at,
                broadcast.id,
                broadcast.destination_id,
            ],
        )?;

        Ok(updated > 0)
    }

    fn get_broadcast(&self, id: i64) -> Result<Option<Broadcast>> {
        let conn = self.conn.lock().unwrap();
        let broadcast = conn
            .query_row(
                "SELECT * FROM broadcasts WHERE id = ?1",
                params![id],
                Self::row_to_broadcast,
            )
            .optional()?;

        Ok(broadcast)
    }

    fn list_broadcasts(&self, destination_id: i64, active_only: bool) -> Result<Vec<Broadcast>> {
        let conn = self.conn.lock().unwrap();

        let query = if active_only {
            "SELECT * FROM broadcasts WHERE destination_id = ?1 AND is_active = 1 ORDER BY id"
        } else {
            "SELECT * FROM broadcasts WHERE destination_id = ?1 ORDER BY id"
        };

        let mut stmt = conn.prepare(query)?;
        let broadcasts = stmt
            .query_map(params![destination_id], Self::row_to_broadcast)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(broadcasts)
    }

    fn delete_broadcast(&self, id: i64, destination_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM broadcasts WHERE id = ?1 AND destination_id = ?2",
            params![id, destination_id],
        )?;

        Ok(deleted > 0)
    }

    fn dispatch_candidates(&self) -> Result<Vec<(Broadcast, Destination)>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            r#"
            SELECT b.*, d.id AS dest_id, d.is_enabled, d.operator_ids
            FROM broadcasts b
            JOIN destinations d ON b.destination_id = d.id
            WHERE b.is_active = 1 AND d.is_enabled = 1
            ORDER BY b.id
            "#,
        )?;

        let candidates = stmt
            .query_map([], |row| {
                let broadcast = Self::row_to_broadcast(row)?;
                let operator_raw: String = row.get("operator_ids")?;
                let destination = Destination {
                    id: row.get("dest_id")?,
                    is_enabled: row.get("is_enabled")?,
                    operator_ids: Self::parse_operators(&operator_raw),
                };
                Ok((broadcast, destination))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(candidates)
    }

    fn record_sent(&self, broadcast_id: i64, sent_at: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            UPDATE broadcasts SET last_sent_at = ?2
            WHERE id = ?1 AND (last_sent_at IS NULL OR last_sent_at <= ?2)
            "#,
            params![broadcast_id, sent_at],
        )?;

        Ok(())
    }

    fn disable_destination(&self, destination_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE destinations SET is_enabled = 0 WHERE id = ?1",
            params![destination_id],
        )?;

        Ok(())
    }

    fn save_destination(&self, destination: &Destination) -> Result<()> {
        let operator_json = serde_json::to_string(&destination.operator_ids)?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO destinations (id, is_enabled, operator_ids)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (id) DO UPDATE SET
                is_enabled = excluded.is_enabled,
                operator_ids = excluded.operator_ids
            "#,
            params![destination.id, destination.is_enabled, operator_json],
        )?;

        Ok(())
    }

    fn get_destination(&self, destination_id: i64) -> Result<Option<Destination>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT id, is_enabled, operator_ids FROM destinations WHERE id = ?1",
                params![destination_id],
                Self::row_to_destination,
            )
            .optional()?;

        Ok(row.map(|(id, is_enabled, raw)| Destination {
            id,
            is_enabled,
            operator_ids: Self::parse_operators(&raw),
        }))
    }

    fn delete_destination(&self, destination_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM destinations WHERE id = ?1",
            params![destination_id],
        )?;

        Ok(())
    }
}

// ============================================================================
// Mock Implementation (for testing)
// ============================================================================

/// In-memory mock implementation of [`BroadcastStore`]
///
/// Useful for testing the dispatch engine without database dependencies.
#[derive(Default)]
pub struct MockBroadcastStore {
    broadcasts: RwLock<HashMap<i64, Broadcast>>,
    destinations: RwLock<HashMap<i64, Destination>>,
}

impl MockBroadcastStore {
    /// Create a new empty mock store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored broadcasts
    pub fn len(&self) -> usize {
        self.broadcasts.read().unwrap().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.broadcasts.read().unwrap().is_empty()
    }

    /// Seed a broadcast with an explicit id (test setup helper); creates the
    /// destination implicitly like the SQLite path does.
    pub fn insert_broadcast(&self, broadcast: Broadcast) {
        self.destinations
            .write()
            .unwrap()
            .entry(broadcast.destination_id)
            .or_insert_with(|| Destination::new(broadcast.destination_id));
        self.broadcasts
            .write()
            .unwrap()
            .insert(broadcast.id, broadcast);
    }

    fn next_id(broadcasts: &HashMap<i64, Broadcast>) -> i64 {
        broadcasts.keys().max().copied().unwrap_or(0) + 1
    }
}

impl BroadcastStore for MockBroadcastStore {
    fn add_broadcast(&self, new: &NewBroadcast, created_at: i64) -> Result<i64> {
        new.validate()?;

        self.destinations
            .write()
            .unwrap()
            .entry(new.destination_id)
            .or_insert_with(|| Destination::new(new.destination_id));

        let mut broadcasts = self.broadcasts.write().unwrap();
        let id = Self::next_id(&broadcasts);
        broadcasts.insert(
            id,
            Broadcast {
                id,
                destination_id: new.destination_id,
                payload: new.payload.clone(),
                interval_minutes: new.interval_minutes,
                duration_minutes: new.duration_minutes,
                is_active: true,
                created_at,
                last_sent_at: None,
            },
        );

        Ok(id)
    }

    fn update_broadcast(&self, broadcast: &Broadcast) -> Result<bool> {
        broadcast.validate()?;

        let mut broadcasts = self.broadcasts.write().unwrap();
        match broadcasts.get_mut(&broadcast.id) {
            Some(existing) if existing.destination_id == broadcast.destination_id => {
                // created_at stays immutable, matching the SQL update.
                let created_at = existing.created_at;
                *existing = broadcast.clone();
                existing.created_at = created_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn get_broadcast(&self, id: i64) -> Result<Option<Broadcast>> {
        Ok(self.broadcasts.read().unwrap().get(&id).cloned())
    }

    fn list_broadcasts(&self, destination_id: i64, active_only: bool) -> Result<Vec<Broadcast>> {
        let broadcasts = self.broadcasts.read().unwrap();
        let mut result: Vec<Broadcast> = broadcasts
            .values()
            .filter(|b| b.destination_id == destination_id)
            .filter(|b| !active_only || b.is_active)
            .cloned()
            .collect();
        result.sort_by_key(|b| b.id);

        Ok(result)
    }

    fn delete_broadcast(&self, id: i64, destination_id: i64) -> Result<bool> {
        let mut broadcasts = self.broadcasts.write().unwrap();
        match broadcasts.get(&id) {
            Some(b) if b.destination_id == destination_id => {
                broadcasts.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn dispatch_candidates(&self) -> Result<Vec<(Broadcast, Destination)>> {
        let broadcasts = self.broadcasts.read().unwrap();
        let destinations = self.destinations.read().unwrap();

        let mut candidates: Vec<(Broadcast, Destination)> = broadcasts
            .values()
            .filter(|b| b.is_active)
            .filter_map(|b| {
                destinations
                    .get(&b.destination_id)
                    .filter(|d| d.is_enabled)
                    .map(|d| (b.clone(), d.clone()))
            })
            .collect();
        candidates.sort_by_key(|(b, _)| b.id);

        Ok(candidates)
    }

    fn record_sent(&self, broadcast_id: i64, sent_at: i64) -> Result<()> {
        let mut broadcasts = self.broadcasts.write().unwrap();
        if let Some(b) = broadcasts.get_mut(&broadcast_id) {
            // Monotonic guard, same as the SQL implementation.
            if b.last_sent_at.map_or(true, |last| last <= sent_at) {
                b.last_sent_at = Some(sent_at);
            }
        }

        Ok(())
    }

    fn disable_destination(&self, destination_id: i64) -> Result<()> {
        if let Some(d) = self.destinations.write().unwrap().get_mut(&destination_id) {
            d.is_enabled = false;
        }

        Ok(())
    }

    fn save_destination(&self, destination: &Destination) -> Result<()> {
        self.destinations
            .write()
            .unwrap()
            .insert(destination.id, destination.clone());

        Ok(())
    }

    fn get_destination(&self, destination_id: i64) -> Result<Option<Destination>> {
        Ok(self
            .destinations
            .read()
            .unwrap()
            .get(&destination_id)
            .cloned())
    }

    fn delete_destination(&self, destination_id: i64) -> Result<()> {
        self.destinations.write().unwrap().remove(&destination_id);
        self.broadcasts
            .write()
            .unwrap()
            .retain(|_, b| b.destination_id != destination_id);

        Ok(())
    }
}

/// Create a shared SQLite store
pub fn create_sqlite_store(path: impl AsRef<Path>) -> Result<SharedBroadcastStore> {
    let store = SqliteBroadcastStore::new(path)?;
    Ok(Arc::new(store))
}

/// Create a shared mock store
pub fn create_mock_store() -> SharedBroadcastStore {
    Arc::new(MockBroadcastStore::new())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Payload;

    // Helper to run the contract tests over both implementations
    fn create_test_stores() -> Vec<Box<dyn BroadcastStore>> {
        vec![
            Box::new(SqliteBroadcastStore::in_memory().unwrap()),
            Box::new(MockBroadcastStore::new()),
        ]
    }

    fn sample_broadcast(destination_id: i64) -> NewBroadcast {
        NewBroadcast {
            destination_id,
            payload: Payload::text("spring sale")
                .with_button("More", "https://example.com/sale")
                .with_thread(42),
            interval_minutes: 60,
            duration_minutes: 1440,
        }
    }

    #[test]
    fn test_add_and_get_roundtrip() {
        for store in create_test_stores() {
            let id = store.add_broadcast(&sample_broadcast(-100), 1000).unwrap();

            let loaded = store.get_broadcast(id).unwrap().unwrap();
            assert_eq!(loaded.destination_id, -100);
            assert_eq!(loaded.payload.text, "spring sale");
            assert_eq!(loaded.payload.thread_id, Some(42));
            assert_eq!(loaded.payload.button.as_ref().unwrap().text, "More");
            assert_eq!(loaded.interval_minutes, 60);
            assert_eq!(loaded.created_at, 1000);
            assert!(loaded.is_active);
            assert!(loaded.last_sent_at.is_none());

            assert!(store.get_broadcast(id + 999).unwrap().is_none());
        }
    }

    #[test]
    fn test_add_creates_destination_implicitly() {
        for store in create_test_stores() {
            assert!(store.get_destination(-5).unwrap().is_none());

            store.add_broadcast(&sample_broadcast(-5), 0).unwrap();

            let dest = store.get_destination(-5).unwrap().unwrap();
            assert!(dest.is_enabled);
            assert!(dest.operator_ids.is_empty());
        }
    }

    #[test]
    fn test_add_rejects_invalid_parameters() {
        for store in create_test_stores() {
            let bad = NewBroadcast {
                interval_minutes: 2,
                ..sample_broadcast(-1)
            };
            assert!(matches!(
                store.add_broadcast(&bad, 0),
                Err(Error::Validation(_))
            ));
        }
    }

    #[test]
    fn test_update_broadcast() {
        for store in create_test_stores() {
            let id = store.add_broadcast(&sample_broadcast(-100), 1000).unwrap();

            let mut broadcast = store.get_broadcast(id).unwrap().unwrap();
            broadcast.payload.text = "updated".to_string();
            broadcast.is_active = false;

            assert!(store.update_broadcast(&broadcast).unwrap());

            let loaded = store.get_broadcast(id).unwrap().unwrap();
            assert_eq!(loaded.payload.text, "updated");
            assert!(!loaded.is_active);
            assert_eq!(loaded.created_at, 1000);

            // Wrong destination does not match
            broadcast.destination_id = -999;
            assert!(!store.update_broadcast(&broadcast).unwrap());
        }
    }

    #[test]
    fn test_list_broadcasts_active_only() {
        for store in create_test_stores() {
            let a = store.add_broadcast(&sample_broadcast(-100), 0).unwrap();
            let b = store.add_broadcast(&sample_broadcast(-100), 0).unwrap();
            store.add_broadcast(&sample_broadcast(-200), 0).unwrap();

            let mut second = store.get_broadcast(b).unwrap().unwrap();
            second.is_active = false;
            store.update_broadcast(&second).unwrap();

            let all = store.list_broadcasts(-100, false).unwrap();
            assert_eq!(all.len(), 2);

            let active = store.list_broadcasts(-100, true).unwrap();
            assert_eq!(active.len(), 1);
            assert_eq!(active[0].id, a);
        }
    }

    #[test]
    fn test_delete_broadcast() {
        for store in create_test_stores() {
            let id = store.add_broadcast(&sample_broadcast(-100), 0).unwrap();

            assert!(!store.delete_broadcast(id, -999).unwrap());
            assert!(store.delete_broadcast(id, -100).unwrap());
            assert!(store.get_broadcast(id).unwrap().is_none());
        }
    }

    #[test]
    fn test_dispatch_candidates_join() {
        for store in create_test_stores() {
            let active = store.add_broadcast(&sample_broadcast(-100), 0).unwrap();
            let inactive = store.add_broadcast(&sample_broadcast(-100), 0).unwrap();
            store.add_broadcast(&sample_broadcast(-200), 0).unwrap();

            let mut b = store.get_broadcast(inactive).unwrap().unwrap();
            b.is_active = false;
            store.update_broadcast(&b).unwrap();

            store.disable_destination(-200).unwrap();

            let candidates = store.dispatch_candidates().unwrap();
            assert_eq!(candidates.len(), 1);
            assert_eq!(candidates[0].0.id, active);
            assert_eq!(candidates[0].1.id, -100);
            assert!(candidates[0].1.is_enabled);
        }
    }

    #[test]
    fn test_record_sent_monotonic_guard() {
        for store in create_test_stores() {
            let id = store.add_broadcast(&sample_broadcast(-100), 0).unwrap();

            store.record_sent(id, 5000).unwrap();
            assert_eq!(
                store.get_broadcast(id).unwrap().unwrap().last_sent_at,
                Some(5000)
            );

            // A stale timestamp never moves last_sent_at backwards.
            store.record_sent(id, 4000).unwrap();
            assert_eq!(
                store.get_broadcast(id).unwrap().unwrap().last_sent_at,
                Some(5000)
            );

            store.record_sent(id, 6000).unwrap();
            assert_eq!(
                store.get_broadcast(id).unwrap().unwrap().last_sent_at,
                Some(6000)
            );
        }
    }

    #[test]
    fn test_disable_destination_keeps_broadcasts() {
        for store in create_test_stores() {
            let id = store.add_broadcast(&sample_broadcast(-100), 0).unwrap();

            store.disable_destination(-100).unwrap();

            assert!(!store.get_destination(-100).unwrap().unwrap().is_enabled);
            // Broadcast record left intact for potential reactivation.
            let broadcast = store.get_broadcast(id).unwrap().unwrap();
            assert!(broadcast.is_active);
            assert!(store.dispatch_candidates().unwrap().is_empty());
        }
    }

    #[test]
    fn test_save_and_get_destination() {
        for store in create_test_stores() {
            let dest = Destination::new(-300).with_operators(vec![10, 20]);
            store.save_destination(&dest).unwrap();

            let loaded = store.get_destination(-300).unwrap().unwrap();
            assert_eq!(loaded.operator_ids, vec![10, 20]);

            // Upsert flips the enabled flag in place
            let disabled = Destination {
                is_enabled: false,
                ..dest
            };
            store.save_destination(&disabled).unwrap();
            assert!(!store.get_destination(-300).unwrap().unwrap().is_enabled);

            store.delete_destination(-300).unwrap();
            assert!(store.get_destination(-300).unwrap().is_none());
        }
    }

    #[test]
    fn test_mock_store_utilities() {
        let mock = MockBroadcastStore::new();
        assert!(mock.is_empty());

        mock.add_broadcast(&sample_broadcast(-1), 0).unwrap();
        assert_eq!(mock.len(), 1);
    }

    #[test]
    fn test_sqlite_store_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herald.db");

        let store = SqliteBroadcastStore::new(&path).unwrap();
        let id = store.add_broadcast(&sample_broadcast(-100), 100).unwrap();
        drop(store);

        // Reopen and verify persistence
        let store = SqliteBroadcastStore::new(&path).unwrap();
        assert!(store.get_broadcast(id).unwrap().is_some());
    }

    #[test]
    fn test_shared_store_creation() {
        let store = create_mock_store();
        store.add_broadcast(&sample_broadcast(-1), 0).unwrap();
        assert_eq!(store.dispatch_candidates().unwrap().len(), 1);
    }
}
