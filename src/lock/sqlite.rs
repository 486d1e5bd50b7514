//! SQLite lease table shared by every instance.
//!
//! Each lease is one row keyed by lock key. Acquiring is a single conditional
//! upsert that only overwrites a row whose lease has expired, so two instances
//! racing for the same key cannot both see a changed row. Releasing deletes the
//! row only when the owner token still matches.

use super::{LockService, LockToken};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Lock service backed by a SQLite database file
///
/// Runs synchronous rusqlite calls on `spawn_blocking` so the async runtime
/// is never blocked on the database.
#[derive(Clone)]
pub struct SqliteLockService {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLockService {
    /// Open (or create) the lease database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Lock(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::Lock(format!("failed to open {}: {e}", path.display())))?;

        // WAL lets readers proceed while another instance holds the write lock
        let _mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(|e| Error::Lock(format!("failed to set journal mode: {e}")))?;

        Self::init(conn)
    }

    /// Create a lease table in memory (single process only)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Lock(format!("failed to open in-memory database: {e}")))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_millis(5000))
            .map_err(|e| Error::Lock(format!("failed to set busy timeout: {e}")))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS lock_leases (
                lock_key TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                expires_at_ms INTEGER NOT NULL
            )",
        )
        .map_err(|e| Error::Lock(format!("failed to create lease table: {e}")))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| Error::Lock("connection mutex poisoned".to_string()))?;
            op(&conn).map_err(|e| Error::Lock(e.to_string()))
        })
        .await
        .map_err(|e| Error::Internal(format!("lock task failed: {e}")))?
    }
}

fn try_claim(conn: &Connection, token: &LockToken, now_ms: i64) -> rusqlite::Result<bool> {
    conn.execute(
        "INSERT INTO lock_leases (lock_key, owner, expires_at_ms) VALUES (?1, ?2, ?3)
         ON CONFLICT(lock_key) DO UPDATE
            SET owner = excluded.owner, expires_at_ms = excluded.expires_at_ms
            WHERE lock_leases.expires_at_ms <= ?4",
        params![
            token.key,
            token.owner,
            token.expires_at.timestamp_millis(),
            now_ms
        ],
    )?;
    Ok(conn.changes() > 0)
}

fn delete_owned(conn: &Connection, token: &LockToken, now_ms: i64) -> rusqlite::Result<bool> {
    let expired_at: Option<i64> = conn
        .query_row(
            "SELECT expires_at_ms FROM lock_leases WHERE lock_key = ?1 AND owner = ?2",
            params![token.key, token.owner],
            |row| row.get(0),
        )
        .optional()?;
    conn.execute(
        "DELETE FROM lock_leases WHERE lock_key = ?1 AND owner = ?2",
        params![token.key, token.owner],
    )?;
    Ok(conn.changes() > 0 && expired_at.is_some_and(|at| at > now_ms))
}

fn extend_owned(conn: &Connection, token: &LockToken, now_ms: i64) -> rusqlite::Result<bool> {
    conn.execute(
        "UPDATE lock_leases SET expires_at_ms = ?3
         WHERE lock_key = ?1 AND owner = ?2 AND expires_at_ms > ?4",
        params![
            token.key,
            token.owner,
            token.expires_at.timestamp_millis(),
            now_ms
        ],
    )?;
    Ok(conn.changes() > 0)
}

#[async_trait]
impl LockService for SqliteLockService {
    async fn try_acquire(&self, key: &str, lease: Duration) -> Result<Option<LockToken>> {
        let token = LockToken::issue(key, lease);
        let candidate = token.clone();
        let claimed = self
            .with_conn(move |conn| try_claim(conn, &candidate, Utc::now().timestamp_millis()))
            .await?;
        debug!(key, claimed, "lease claim attempt");
        Ok(claimed.then_some(token))
    }

    async fn release(&self, token: &LockToken) -> Result<bool> {
        let token = token.clone();
        self.with_conn(move |conn| delete_owned(conn, &token, Utc::now().timestamp_millis()))
            .await
    }

    async fn renew(&self, token: &LockToken, lease: Duration) -> Result<Option<LockToken>> {
        let renewed = token.extended(lease);
        let candidate = renewed.clone();
        let extended = self
            .with_conn(move |conn| extend_owned(conn, &candidate, Utc::now().timestamp_millis()))
            .await?;
        debug!(key = %token.key, extended, "lease renew attempt");
        Ok(extended.then_some(renewed))
    }
}
