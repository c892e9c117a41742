//! SQLite-backed library index with image files on disk.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::naming::with_counter;
use super::{Asset, AssetFilter, AssetSource, LibraryError, LibraryIndex, LibraryStats, NewAsset};
use crate::metrics;

const COLUMNS: &str = "id, source, topic, category, image_type, style, provider, external_id, \
     prompt, title, source_url, tags, path, filename, content_hash, size_bytes, created_at";

const DEFAULT_LIST_LIMIT: u32 = 100;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed library index.
pub struct SqliteLibrary {
    conn: Mutex<Connection>,
    root: PathBuf,
}

impl SqliteLibrary {
    /// Open the index database, creating tables if needed. Files go under `root`.
    pub fn new(db_path: &Path, root: &Path) -> Result<Self, LibraryError> {
        let conn = Connection::open(db_path).map_err(|e| LibraryError::Database(e.to_string()))?;
        Self::with_connection(conn, root)
    }

    /// In-memory index (useful for testing). Files still go under `root`.
    pub fn in_memory(root: &Path) -> Result<Self, LibraryError> {
        let conn =
            Connection::open_in_memory().map_err(|e| LibraryError::Database(e.to_string()))?;
        Self::with_connection(conn, root)
    }

    fn with_connection(conn: Connection, root: &Path) -> Result<Self, LibraryError> {
        // The checkpoint store may hold the same database file open.
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| LibraryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        std::fs::create_dir_all(root)?;
        Ok(Self {
            conn: Mutex::new(conn),
            root: root.to_path_buf(),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), LibraryError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS assets (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                topic TEXT NOT NULL,
                category TEXT NOT NULL,
                image_type TEXT NOT NULL,
                style TEXT,
                provider TEXT,
                external_id TEXT,
                prompt TEXT,
                title TEXT,
                source_url TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                path TEXT NOT NULL UNIQUE,
                filename TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_assets_topic ON assets(topic);
            CREATE INDEX IF NOT EXISTS idx_assets_category ON assets(category);
            CREATE INDEX IF NOT EXISTS idx_assets_external_id ON assets(external_id);
            "#,
        )
        .map_err(|e| LibraryError::Database(e.to_string()))?;

        Ok(())
    }

    /// Library root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of an asset's file.
    pub fn file_path(&self, asset: &Asset) -> PathBuf {
        self.root.join(&asset.path)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, LibraryError> {
        self.conn
            .lock()
            .map_err(|_| LibraryError::Database("connection lock poisoned".to_string()))
    }

    fn path_taken(conn: &Connection, rel: &str) -> Result<bool, LibraryError> {
        conn.query_row("SELECT 1 FROM assets WHERE path = ?", params![rel], |_| Ok(()))
            .optional()
            .map(|r| r.is_some())
            .map_err(|e| LibraryError::Database(e.to_string()))
    }

    /// Claim a unique file under `dir` by creating it exclusively, appending
    /// `-1`, `-2`, ... to the stem on collision.
    fn claim_file(
        &self,
        conn: &Connection,
        dir: &Path,
        filename: &str,
    ) -> Result<(String, String, std::fs::File), LibraryError> {
        let mut n = 0u32;
        loop {
            let candidate = if n == 0 {
                filename.to_string()
            } else {
                with_counter(filename, n)
            };
            let rel = relative_string(&dir.join(&candidate));
            n += 1;

            if Self::path_taken(conn, &rel)? {
                continue;
            }
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.root.join(&rel))
            {
                Ok(file) => return Ok((candidate, rel, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn row_to_asset(row: &rusqlite::Row) -> rusqlite::Result<Asset> {
        let source: String = row.get(1)?;
        let source = source.parse::<AssetSource>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let tags: String = row.get(11)?;
        let size_bytes: i64 = row.get(15)?;
        let created_at: String = row.get(16)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Asset {
            id: row.get(0)?,
            source,
            topic: row.get(2)?,
            category: row.get(3)?,
            image_type: row.get(4)?,
            style: row.get(5)?,
            provider: row.get(6)?,
            external_id: row.get(7)?,
            prompt: row.get(8)?,
            title: row.get(9)?,
            source_url: row.get(10)?,
            tags: serde_json::from_str(&tags).unwrap_or_default(),
            path: row.get(12)?,
            filename: row.get(13)?,
            content_hash: row.get(14)?,
            size_bytes: size_bytes as u64,
            created_at,
        })
    }

    fn get_with(conn: &Connection, id: &str) -> Result<Asset, LibraryError> {
        conn.query_row(
            &format!("SELECT {} FROM assets WHERE id = ?", COLUMNS),
            params![id],
            Self::row_to_asset,
        )
        .optional()
        .map_err(|e| LibraryError::Database(e.to_string()))?
        .ok_or_else(|| LibraryError::NotFound(id.to_string()))
    }
}

/// Reject absolute paths and parent traversal.
fn ensure_relative(path: &Path) -> Result<(), LibraryError> {
    if path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        Ok(())
    } else {
        Err(LibraryError::InvalidPath(path.display().to_string()))
    }
}

fn relative_string(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

impl LibraryIndex for SqliteLibrary {
    fn add(&self, asset: NewAsset) -> Result<Asset, LibraryError> {
        ensure_relative(&asset.relative_dir)?;
        if asset.filename.is_empty()
            || asset.filename.starts_with('.')
            || asset.filename.contains(['/', '\\'])
        {
            return Err(LibraryError::InvalidPath(asset.filename));
        }

        let conn = self.lock()?;
        std::fs::create_dir_all(self.root.join(&asset.relative_dir))?;
        let (filename, rel, mut file) =
            self.claim_file(&conn, &asset.relative_dir, &asset.filename)?;

        let written = file.write_all(&asset.bytes).and_then(|_| file.sync_all());
        if let Err(e) = written {
            let _ = std::fs::remove_file(self.root.join(&rel));
            return Err(e.into());
        }

        let stored = Asset {
            id: uuid::Uuid::new_v4().to_string(),
            source: asset.source,
            topic: asset.topic,
            category: asset.category,
            image_type: asset.image_type,
            style: asset.style,
            provider: asset.provider,
            external_id: asset.external_id,
            prompt: asset.prompt,
            title: asset.title,
            source_url: asset.source_url,
            tags: asset.tags,
            path: rel,
            filename,
            content_hash: content_hash(&asset.bytes),
            size_bytes: asset.bytes.len() as u64,
            created_at: Utc::now(),
        };

        let tags = serde_json::to_string(&stored.tags)
            .map_err(|e| LibraryError::Database(e.to_string()))?;
        let inserted = conn.execute(
            &format!(
                "INSERT INTO assets ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                COLUMNS
            ),
            params![
                stored.id,
                stored.source.as_str(),
                stored.topic,
                stored.category,
                stored.image_type,
                stored.style,
                stored.provider,
                stored.external_id,
                stored.prompt,
                stored.title,
                stored.source_url,
                tags,
                stored.path,
                stored.filename,
                stored.content_hash,
                stored.size_bytes as i64,
                stored.created_at.to_rfc3339(),
            ],
        );
        if let Err(e) = inserted {
            let _ = std::fs::remove_file(self.root.join(&stored.path));
            return Err(LibraryError::Database(e.to_string()));
        }

        metrics::LIBRARY_OPERATIONS
            .with_label_values(&["add", stored.source.as_str()])
            .inc();
        debug!(id = %stored.id, path = %stored.path, topic = %stored.topic, "Asset added");

        Ok(stored)
    }

    fn get(&self, id: &str) -> Result<Asset, LibraryError> {
        let conn = self.lock()?;
        Self::get_with(&conn, id)
    }

    fn remove(&self, id: &str) -> Result<Asset, LibraryError> {
        let conn = self.lock()?;
        let asset = Self::get_with(&conn, id)?;

        conn.execute("DELETE FROM assets WHERE id = ?", params![id])
            .map_err(|e| LibraryError::Database(e.to_string()))?;

        match std::fs::remove_file(self.root.join(&asset.path)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(id, path = %asset.path, "Asset file already missing");
            }
            Err(e) => return Err(e.into()),
        }

        metrics::LIBRARY_OPERATIONS
            .with_label_values(&["remove", asset.source.as_str()])
            .inc();
        debug!(id, path = %asset.path, "Asset removed");

        Ok(asset)
    }

    fn list(&self, filter: &AssetFilter) -> Result<Vec<Asset>, LibraryError> {
        let conn = self.lock()?;

        let mut clauses = Vec::new();
        let mut values: Vec<String> = Vec::new();
        if let Some(topic) = &filter.topic {
            clauses.push("topic = ?");
            values.push(topic.clone());
        }
        if let Some(category) = &filter.category {
            clauses.push("category = ?");
            values.push(category.clone());
        }
        if let Some(source) = filter.source {
            clauses.push("source = ?");
            values.push(source.as_str().to_string());
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM assets {} ORDER BY created_at DESC, rowid DESC LIMIT {} OFFSET {}",
            COLUMNS,
            where_clause,
            filter.limit.unwrap_or(DEFAULT_LIST_LIMIT),
            filter.offset.unwrap_or(0)
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| LibraryError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), Self::row_to_asset)
            .map_err(|e| LibraryError::Database(e.to_string()))?;

        let mut assets = Vec::new();
        for row in rows {
            assets.push(row.map_err(|e| LibraryError::Database(e.to_string()))?);
        }
        Ok(assets)
    }

    fn count_by_topic(&self) -> Result<HashMap<String, u64>, LibraryError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT topic, COUNT(*) FROM assets GROUP BY topic")
            .map_err(|e| LibraryError::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .map_err(|e| LibraryError::Database(e.to_string()))?;

        let mut counts = HashMap::new();
        for row in rows {
            let (topic, count) = row.map_err(|e| LibraryError::Database(e.to_string()))?;
            counts.insert(topic, count as u64);
        }
        Ok(counts)
    }

    fn count_for_topic(&self, topic: &str) -> Result<u64, LibraryError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM assets WHERE topic = ?",
                params![topic],
                |row| row.get(0),
            )
            .map_err(|e| LibraryError::Database(e.to_string()))?;
        Ok(count as u64)
    }

    fn stats(&self) -> Result<LibraryStats, LibraryError> {
        let conn = self.lock()?;

        let (total, total_size_bytes, topics): (i64, i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(size_bytes), 0), COUNT(DISTINCT topic) FROM assets",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(|e| LibraryError::Database(e.to_string()))?;

        let grouped = |column: &str| -> Result<_, LibraryError> {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {0}, COUNT(*) FROM assets GROUP BY {0}",
                    column
                ))
                .map_err(|e| LibraryError::Database(e.to_string()))?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
                .map_err(|e| LibraryError::Database(e.to_string()))?;
            let mut map = std::collections::BTreeMap::new();
            for row in rows {
                let (key, count) = row.map_err(|e| LibraryError::Database(e.to_string()))?;
                map.insert(key, count as u64);
            }
            Ok(map)
        };

        Ok(LibraryStats {
            total: total as u64,
            total_size_bytes: total_size_bytes as u64,
            topics: topics as u64,
            by_category: grouped("category")?,
            by_source: grouped("source")?,
        })
    }
}
