//! Pull-request store in a SQLite database shared by every instance.
//!
//! Records are upserted in place. The conflict clause ORs the stored `merged`
//! flag into the incoming one inside the database, so a sync running in
//! another instance can never clear it.

use super::PullRequestStore;
use crate::error::{Error, Result};
use crate::types::{PrId, PrState, PullRequest, Repository};
use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

const UPSERT: &str = "INSERT INTO pull_requests
        (owner, name, number, title, body, author, head_sha, state, merged)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ON CONFLICT(owner, name, number) DO UPDATE SET
        title = excluded.title,
        body = excluded.body,
        author = excluded.author,
        head_sha = excluded.head_sha,
        state = excluded.state,
        merged = pull_requests.merged OR excluded.merged";

const SELECT: &str = "SELECT owner, name, number, title, body, author, head_sha, state, merged
    FROM pull_requests";

/// Pull-request store backed by a SQLite database file
///
/// Like the lease table, rusqlite calls run on `spawn_blocking`.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the store database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Store(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::Store(format!("failed to open {}: {e}", path.display())))?;

        let _mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(|e| Error::Store(format!("failed to set journal mode: {e}")))?;

        Self::init(conn)
    }

    /// Create a store in memory (single process only)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Store(format!("failed to open in-memory database: {e}")))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_millis(5000))
            .map_err(|e| Error::Store(format!("failed to set busy timeout: {e}")))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS pull_requests (
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                number INTEGER NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                author TEXT NOT NULL,
                head_sha TEXT NOT NULL,
                state TEXT NOT NULL,
                merged INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (owner, name, number)
            )",
        )
        .map_err(|e| Error::Store(format!("failed to create pull_requests table: {e}")))?;

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
                .map_err(|_| Error::Store("connection mutex poisoned".to_string()))?;
            op(&conn).map_err(|e| Error::Store(e.to_string()))
        })
        .await
        .map_err(|e| Error::Internal(format!("store task failed: {e}")))?
    }
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<PullRequest> {
    let state: String = row.get(7)?;
    let state: PrState = state.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(7, Type::Text, e.to_string().into())
    })?;
    Ok(PullRequest {
        repository: Repository::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?),
        number: row.get(2)?,
        title: row.get(3)?,
        body: row.get(4)?,
        author: row.get(5)?,
        head_sha: row.get(6)?,
        state,
        merged: row.get(8)?,
    })
}

/// Upsert every record in one write transaction
fn upsert_all(conn: &Connection, prs: &[PullRequest]) -> rusqlite::Result<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    {
        let mut stmt = tx.prepare_cached(UPSERT)?;
        for pr in prs {
            stmt.execute(params![
                pr.repository.owner,
                pr.repository.name,
                pr.number,
                pr.title,
                pr.body,
                pr.author,
                pr.head_sha,
                pr.state.as_str(),
                pr.merged,
            ])?;
        }
    }
    tx.commit()
}

#[async_trait]
impl PullRequestStore for SqliteStore {
    async fn get_pull_requests(&self, repo: &Repository) -> Result<Vec<PullRequest>> {
        let repo = repo.clone();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "{SELECT} WHERE owner = ?1 AND name = ?2 ORDER BY number"
            ))?;
            let prs = stmt
                .query_map(params![repo.owner, repo.name], from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(prs)
        })
        .await
    }

    async fn get_pull_request(&self, id: &PrId) -> Result<Option<PullRequest>> {
        let id = id.clone();
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("{SELECT} WHERE owner = ?1 AND name = ?2 AND number = ?3"),
                params![id.repository.owner, id.repository.name, id.number],
                from_row,
            )
            .optional()
        })
        .await
    }

    async fn put_pull_request(&self, pr: &PullRequest) -> Result<()> {
        self.put_pull_requests(std::slice::from_ref(pr)).await
    }

    async fn put_pull_requests(&self, prs: &[PullRequest]) -> Result<()> {
        if prs.is_empty() {
            return Ok(());
        }
        let prs = prs.to_vec();
        let count = prs.len();
        self.with_conn(move |conn| upsert_all(conn, &prs)).await?;
        debug!(count, "stored pull requests");
        Ok(())
    }

    async fn mark_merged(&self, id: &PrId) -> Result<()> {
        let key = id.clone();
        let changed = self
            .with_conn(move |conn| {
                conn.execute(
                    "UPDATE pull_requests SET merged = 1
                     WHERE owner = ?1 AND name = ?2 AND number = ?3",
                    params![key.repository.owner, key.repository.name, key.number],
                )
            })
            .await?;
        if changed == 0 {
            return Err(Error::Store(format!("no stored pull request {id}")));
        }
        Ok(())
    }
}
