//! Platform services for the code-hosting API
//!
//! Everything the review and merge engines need from the remote side goes
//! through `PlatformService`, so tests can substitute a recording mock.

mod github;

pub use github::GitHubService;

use crate::error::Result;
use crate::types::{CombinedStatus, MergeMethod, MergeResult, PrComment, PullRequest, Repository};
use async_trait::async_trait;

/// Platform service trait for PR operations
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// List every pull request of a repository, in any state
    async fn list_pull_requests(&self, repo: &Repository) -> Result<Vec<PullRequest>>;

    /// List comments on a PR
    async fn list_pr_comments(&self, repo: &Repository, pr_number: u64) -> Result<Vec<PrComment>>;

    /// Combined build status of a commit
    async fn get_combined_status(&self, repo: &Repository, sha: &str) -> Result<CombinedStatus>;

    /// Create a comment on a PR
    async fn create_pr_comment(&self, repo: &Repository, pr_number: u64, body: &str)
    -> Result<()>;

    /// Merge a PR with the given commit message
    async fn merge_pr(
        &self,
        repo: &Repository,
        pr_number: u64,
        commit_message: &str,
        method: MergeMethod,
    ) -> Result<MergeResult>;
}
