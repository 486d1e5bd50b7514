//! Persistent pull-request store
//!
//! Records are keyed by (repository, number). The `merged` flag is
//! monotonic: writing a record whose stored copy is already merged keeps it
//! merged, so a stale sync can never resurrect a merged pull request.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::{Error, Result};
use crate::types::{PrId, PullRequest, Repository};
use async_trait::async_trait;

/// Read/write access to synchronized pull requests
#[async_trait]
pub trait PullRequestStore: Send + Sync {
    /// All stored pull requests of a repository, ordered by number
    async fn get_pull_requests(&self, repo: &Repository) -> Result<Vec<PullRequest>>;

    /// One stored pull request
    async fn get_pull_request(&self, id: &PrId) -> Result<Option<PullRequest>>;

    /// Insert or overwrite a record (upsert), keeping `merged` monotonic
    async fn put_pull_request(&self, pr: &PullRequest) -> Result<()>;

    /// Upsert a batch of records, such as one repository's sync
    async fn put_pull_requests(&self, prs: &[PullRequest]) -> Result<()> {
        for pr in prs {
            self.put_pull_request(pr).await?;
        }
        Ok(())
    }

    /// Flag a stored pull request as merged
    async fn mark_merged(&self, id: &PrId) -> Result<()> {
        let mut pr = self
            .get_pull_request(id)
            .await?
            .ok_or_else(|| Error::Store(format!("no stored pull request {id}")))?;
        pr.merged = true;
        self.put_pull_request(&pr).await
    }
}

/// Merge an incoming record over the stored one
pub(crate) fn upsert_merged(existing: Option<&PullRequest>, incoming: &PullRequest) -> PullRequest {
    let mut record = incoming.clone();
    record.merged |= existing.is_some_and(|pr| pr.merged);
    record
}
