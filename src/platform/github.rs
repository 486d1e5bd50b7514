//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    CombinedStatus, MergeMethod, MergeResult, PrComment, PrState, PullRequest, Repository,
};
use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// Public GitHub API base
const GITHUB_API: &str = "https://api.github.com";

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    /// Token for raw HTTP requests (combined status)
    token: String,
    /// HTTP client for raw requests (combined status)
    http_client: Client,
    /// API base URL for raw requests, without trailing slash
    api_base: String,
}

impl GitHubService {
    /// Create a new GitHub service
    ///
    /// `host` selects a GitHub Enterprise instance (`https://{host}/api/v3`).
    pub fn new(token: &str, host: Option<&str>) -> Result<Self> {
        let api_base = host.map_or_else(
            || GITHUB_API.to_string(),
            |h| format!("https://{h}/api/v3"),
        );
        Self::with_api_base(token, &api_base)
    }

    /// Create a service talking to an explicit API base URL
    pub fn with_api_base(token: &str, api_base: &str) -> Result<Self> {
        let api_base = api_base.trim_end_matches('/').to_string();
        let mut builder = Octocrab::builder().personal_token(token.to_string());
        if api_base != GITHUB_API {
            builder = builder
                .base_uri(&api_base)
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
        }

        let client = builder
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("monty")
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token: token.to_string(),
            http_client,
            api_base,
        })
    }
}

/// Helper to convert octocrab PR to our `PullRequest` type
fn pr_from_octocrab(repo: &Repository, pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        title: pr.title.clone().unwrap_or_default(),
        body: pr.body.clone().unwrap_or_default(),
        author: pr
            .user
            .as_ref()
            .map(|u| u.login.clone())
            .unwrap_or_default(),
        head_sha: pr.head.sha.clone(),
        state: pr_state(pr),
        merged: pr.merged_at.is_some(),
        repository: repo.clone(),
    }
}

/// Closed if either the state or a close timestamp says so
fn pr_state(pr: &octocrab::models::pulls::PullRequest) -> PrState {
    let closed = pr.closed_at.is_some()
        || matches!(pr.state, Some(octocrab::models::IssueState::Closed));
    if closed { PrState::Closed } else { PrState::Open }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn list_pull_requests(&self, repo: &Repository) -> Result<Vec<PullRequest>> {
        debug!(%repo, "listing pull requests");
        let first_page = self
            .client
            .pulls(&repo.owner, &repo.name)
            .list()
            .state(octocrab::params::State::All)
            .per_page(100)
            .send()
            .await?;

        let prs = self.client.all_pages(first_page).await?;
        let result: Vec<PullRequest> = prs.iter().map(|pr| pr_from_octocrab(repo, pr)).collect();
        debug!(%repo, count = result.len(), "listed pull requests");
        Ok(result)
    }

    async fn list_pr_comments(&self, repo: &Repository, pr_number: u64) -> Result<Vec<PrComment>> {
        debug!(%repo, pr_number, "listing PR comments");
        let first_page = self
            .client
            .issues(&repo.owner, &repo.name)
            .list_comments(pr_number)
            .per_page(100)
            .send()
            .await?;

        let comments = self.client.all_pages(first_page).await?;
        let result: Vec<PrComment> = comments
            .into_iter()
            .map(|c| PrComment {
                id: c.id.0,
                author: c.user.login,
                body: c.body.unwrap_or_default(),
            })
            .collect();
        debug!(%repo, pr_number, count = result.len(), "listed PR comments");
        Ok(result)
    }

    /// Combined status via the commit status API
    ///
    /// GitHub reports `pending` with a zero count when no CI is configured,
    /// so callers get `total_count` to tell the two apart.
    async fn get_combined_status(&self, repo: &Repository, sha: &str) -> Result<CombinedStatus> {
        #[derive(Deserialize)]
        struct CombinedStatusResponse {
            state: String,
            total_count: u32,
        }

        let url = format!(
            "{}/repos/{}/{}/commits/{}/status",
            self.api_base, repo.owner, repo.name, sha
        );

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to fetch commit status: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::GitHubApi(format!(
                "commit status for {repo}@{sha} returned {}",
                response.status()
            )));
        }

        let status: CombinedStatusResponse = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse commit status: {e}")))?;

        debug!(%repo, sha, state = %status.state, count = status.total_count, "commit status");
        Ok(CombinedStatus {
            state: status.state,
            total_count: status.total_count,
        })
    }

    async fn create_pr_comment(
        &self,
        repo: &Repository,
        pr_number: u64,
        body: &str,
    ) -> Result<()> {
        debug!(%repo, pr_number, "creating PR comment");
        self.client
            .issues(&repo.owner, &repo.name)
            .create_comment(pr_number, body)
            .await?;
        debug!(%repo, pr_number, "created PR comment");
        Ok(())
    }

    async fn merge_pr(
        &self,
        repo: &Repository,
        pr_number: u64,
        commit_message: &str,
        method: MergeMethod,
    ) -> Result<MergeResult> {
        debug!(%repo, pr_number, %method, "merging PR");

        let octocrab_method = match method {
            MergeMethod::Squash => octocrab::params::pulls::MergeMethod::Squash,
            MergeMethod::Merge => octocrab::params::pulls::MergeMethod::Merge,
            MergeMethod::Rebase => octocrab::params::pulls::MergeMethod::Rebase,
        };

        let result = self
            .client
            .pulls(&repo.owner, &repo.name)
            .merge(pr_number)
            .method(octocrab_method)
            .message(commit_message)
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Merge failed: {e}")))?;

        let merge_result = MergeResult {
            merged: result.merged,
            sha: result.sha,
            message: result.message,
        };

        debug!(
            %repo,
            pr_number,
            merged = merge_result.merged,
            sha = ?merge_result.sha,
            "merge complete"
        );
        Ok(merge_result)
    }
}
