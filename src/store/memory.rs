//! In-memory pull-request store.

use super::{PullRequestStore, upsert_merged};
use crate::error::{Error, Result};
use crate::types::{PrId, PullRequest, Repository};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Store keeping records in a process-local ordered map
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<PrId, PullRequest>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records
    pub fn with_pull_requests(prs: impl IntoIterator<Item = PullRequest>) -> Self {
        let records = prs.into_iter().map(|pr| (pr.id(), pr)).collect();
        Self {
            records: Mutex::new(records),
        }
    }

    fn records(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<PrId, PullRequest>>> {
        self.records
            .lock()
            .map_err(|_| Error::Store("store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl PullRequestStore for MemoryStore {
    async fn get_pull_requests(&self, repo: &Repository) -> Result<Vec<PullRequest>> {
        Ok(self
            .records()?
            .values()
            .filter(|pr| &pr.repository == repo)
            .cloned()
            .collect())
    }

    async fn get_pull_request(&self, id: &PrId) -> Result<Option<PullRequest>> {
        Ok(self.records()?.get(id).cloned())
    }

    async fn put_pull_request(&self, pr: &PullRequest) -> Result<()> {
        let mut records = self.records()?;
        let record = upsert_merged(records.get(&pr.id()), pr);
        records.insert(record.id(), record);
        Ok(())
    }
}
