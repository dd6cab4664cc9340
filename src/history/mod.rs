//! SQLite-backed request history.
//!
//! Every finished analysis, success or failure, is appended to the
//! `query_history` table with its full response. Each request works through
//! its own [`HistorySession`], which owns a connection for the lifetime of
//! the request and releases it when dropped.
//!
//! History is best-effort: callers log failures and carry on.
//!
//! # Schema
//!
//! ```text
//! query_history(id INTEGER PK, query TEXT, success INTEGER, response TEXT (JSON), created_at INTEGER)
//! ```

use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection};
use serde::Serialize;
use serde_json::Value;

/// Errors that can occur during history operations.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("history task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type HistoryResult<T> = Result<T, HistoryError>;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS query_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        query TEXT NOT NULL,
        success INTEGER NOT NULL,
        response TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_query_history_created ON query_history(created_at);
";

/// One recorded request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub query: String,
    pub success: bool,
    pub response: Value,
    /// Unix seconds.
    pub created_at: i64,
}

/// Location of the history database. Cheap to clone and share.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Open or create the history database at `path`.
    pub fn open(path: impl Into<PathBuf>) -> HistoryResult<Self> {
        let store = Self { path: path.into() };
        if let Some(parent) = store.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        // Create the schema up front so a bad path fails at startup
        store.session()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a session on the calling thread.
    pub fn session(&self) -> HistoryResult<HistorySession> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.execute_batch(SCHEMA)?;
        Ok(HistorySession {
            conn,
            opened: Instant::now(),
        })
    }

    /// Open a session on the blocking pool.
    pub async fn open_session(&self) -> HistoryResult<HistorySession> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.session()).await?
    }

    /// The latest `limit` entries, newest first.
    pub async fn recent(&self, limit: usize) -> HistoryResult<Vec<HistoryEntry>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.session()?.recent(limit)).await?
    }
}

/// A per-request connection to the history database.
pub struct HistorySession {
    conn: Connection,
    opened: Instant,
}

impl HistorySession {
    /// Append an entry and return its id.
    pub fn record(&self, query: &str, success: bool, response: &Value) -> HistoryResult<i64> {
        let json = serde_json::to_string(response)?;
        self.conn.execute(
            "INSERT INTO query_history (query, success, response, created_at) VALUES (?, ?, ?, ?)",
            params![query, success, json, unix_seconds()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Append an entry on the blocking pool, releasing the session afterwards.
    pub async fn finish(self, query: String, success: bool, response: Value) -> HistoryResult<i64> {
        tokio::task::spawn_blocking(move || self.record(&query, success, &response)).await?
    }

    /// The latest `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> HistoryResult<Vec<HistoryEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(
            "SELECT id, query, success, response, created_at FROM query_history
             ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt
            .query_map(params![limit], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, query, success, response, created_at)| {
                Ok(HistoryEntry {
                    id,
                    query,
                    success,
                    response: serde_json::from_str(&response)?,
                    created_at,
                })
            })
            .collect()
    }

    pub fn count(&self) -> HistoryResult<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM query_history", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl Drop for HistorySession {
    fn drop(&mut self) {
        tracing::trace!(
            held_ms = self.opened.elapsed().as_millis() as u64,
            "history session released"
        );
    }
}

fn unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
