//! SQLite-backed checkpoint store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::trace;

use super::{CheckpointError, CheckpointStore};

/// Checkpoint documents in a single key/value table.
pub struct SqliteCheckpointStore {
    conn: Mutex<Connection>,
}

impl SqliteCheckpointStore {
    pub fn new(path: &Path) -> Result<Self, CheckpointError> {
        let conn = Connection::open(path).map_err(|e| CheckpointError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, CheckpointError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CheckpointError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CheckpointError> {
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| CheckpointError::Database(e.to_string()))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                key TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| CheckpointError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CheckpointError> {
        self.conn
            .lock()
            .map_err(|_| CheckpointError::Database("connection lock poisoned".to_string()))
    }
}

impl CheckpointStore for SqliteCheckpointStore {
    fn load_document(&self, key: &str) -> Result<Option<String>, CheckpointError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT body FROM checkpoints WHERE key = ?",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| CheckpointError::Database(e.to_string()))
    }

    fn save_document(&self, key: &str, body: &str) -> Result<(), CheckpointError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO checkpoints (key, body, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
            params![key, body, Utc::now().to_rfc3339()],
        )
        .map_err(|e| CheckpointError::Database(e.to_string()))?;

        trace!(key, bytes = body.len(), "Checkpoint saved");
        Ok(())
    }
}
