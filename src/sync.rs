//! Synchronize pull requests from the platform into the store

use crate::error::Error;
use crate::platform::PlatformService;
use crate::progress::ProgressCallback;
use crate::store::PullRequestStore;
use crate::types::Repository;
use tracing::{error, info};

/// Outcome of a sync run
#[derive(Debug, Default)]
pub struct SyncSummary {
    /// Repositories synced, with the number of pull requests written
    pub synced: Vec<(Repository, usize)>,
    /// Repositories that failed
    pub failures: Vec<(Repository, Error)>,
}

impl SyncSummary {
    /// Total pull requests written
    pub fn total(&self) -> usize {
        self.synced.iter().map(|(_, n)| n).sum()
    }

    /// Check if every repository synced
    pub const fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Copy every pull request (any state) of each repository into the store
///
/// A failing repository is recorded and the others continue.
pub async fn sync_repositories(
    platform: &dyn PlatformService,
    store: &dyn PullRequestStore,
    repositories: &[Repository],
    progress: &dyn ProgressCallback,
) -> SyncSummary {
    let mut summary = SyncSummary::default();

    for repo in repositories {
        progress.on_message(&format!("Syncing {repo}")).await;
        match sync_repository(platform, store, repo).await {
            Ok(count) => {
                info!(%repo, count, "synced repository");
                summary.synced.push((repo.clone(), count));
            }
            Err(e) => {
                error!(%repo, error = %e, "sync failed");
                summary.failures.push((repo.clone(), e));
            }
        }
    }

    summary
}

async fn sync_repository(
    platform: &dyn PlatformService,
    store: &dyn PullRequestStore,
    repo: &Repository,
) -> crate::error::Result<usize> {
    let prs = platform.list_pull_requests(repo).await?;
    store.put_pull_requests(&prs).await?;
    Ok(prs.len())
}
