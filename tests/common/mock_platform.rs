//! Mock platform service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use monty::error::{Error, Result};
use monty::platform::PlatformService;
use monty::types::{
    CombinedStatus, MergeMethod, MergeResult, PrComment, PullRequest, Repository,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Call record for `create_pr_comment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCommentCall {
    pub pr_number: u64,
    pub body: String,
}

/// Call record for `merge_pr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePrCall {
    pub pr_number: u64,
    pub commit_message: String,
    pub method: MergeMethod,
}

/// Simple mock platform service for testing
///
/// Hand-written rather than generated so call order across methods can be
/// checked through one shared event log.
///
/// Features:
/// - Configurable responses per PR number
/// - Call tracking for verification
/// - Error injection for failure path testing
/// - Optional latency to widen race windows
pub struct MockPlatformService {
    pull_requests: Mutex<HashMap<Repository, Vec<PullRequest>>>,
    comments: Mutex<HashMap<u64, Vec<PrComment>>>,
    statuses: Mutex<HashMap<String, CombinedStatus>>,
    merge_responses: Mutex<HashMap<u64, MergeResult>>,
    latency: Mutex<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    // Call tracking
    events: Mutex<Vec<String>>,
    list_comments_calls: Mutex<Vec<u64>>,
    status_calls: Mutex<Vec<String>>,
    create_comment_calls: Mutex<Vec<CreateCommentCall>>,
    merge_pr_calls: Mutex<Vec<MergePrCall>>,
    // Error injection
    error_on_list_prs: Mutex<HashMap<Repository, String>>,
    error_on_list_comments: Mutex<Option<String>>,
    error_on_status: Mutex<Option<String>>,
    error_on_comment: Mutex<Option<String>>,
    error_on_merge_pr: Mutex<Option<String>>,
}

impl Default for MockPlatformService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatformService {
    /// Create an empty mock; unknown commits report a single `success` status
    pub fn new() -> Self {
        Self {
            pull_requests: Mutex::new(HashMap::new()),
            comments: Mutex::new(HashMap::new()),
            statuses: Mutex::new(HashMap::new()),
            merge_responses: Mutex::new(HashMap::new()),
            latency: Mutex::new(Duration::ZERO),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            events: Mutex::new(Vec::new()),
            list_comments_calls: Mutex::new(Vec::new()),
            status_calls: Mutex::new(Vec::new()),
            create_comment_calls: Mutex::new(Vec::new()),
            merge_pr_calls: Mutex::new(Vec::new()),
            error_on_list_prs: Mutex::new(HashMap::new()),
            error_on_list_comments: Mutex::new(None),
            error_on_status: Mutex::new(None),
            error_on_comment: Mutex::new(None),
            error_on_merge_pr: Mutex::new(None),
        }
    }

    // === Error injection methods ===

    /// Make `list_pull_requests` fail for one repository
    pub fn fail_list_prs(&self, repo: &Repository, msg: &str) {
        self.error_on_list_prs
            .lock()
            .unwrap()
            .insert(repo.clone(), msg.to_string());
    }

    /// Make `list_pr_comments` return an error
    pub fn fail_list_comments(&self, msg: &str) {
        *self.error_on_list_comments.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `get_combined_status` return an error
    pub fn fail_status(&self, msg: &str) {
        *self.error_on_status.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_pr_comment` return an error
    pub fn fail_comment(&self, msg: &str) {
        *self.error_on_comment.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `merge_pr` return an error
    pub fn fail_merge_pr(&self, msg: &str) {
        *self.error_on_merge_pr.lock().unwrap() = Some(msg.to_string());
    }

    // === Response setup ===

    /// Set the pull requests `list_pull_requests` returns for a repository
    pub fn set_pull_requests(&self, repo: &Repository, prs: Vec<PullRequest>) {
        self.pull_requests.lock().unwrap().insert(repo.clone(), prs);
    }

    /// Set the response for `list_pr_comments` for a specific PR
    pub fn set_comments(&self, pr_number: u64, comments: Vec<PrComment>) {
        self.comments.lock().unwrap().insert(pr_number, comments);
    }

    /// Set the combined status of a commit
    pub fn set_status(&self, sha: &str, state: &str, total_count: u32) {
        self.statuses.lock().unwrap().insert(
            sha.to_string(),
            CombinedStatus {
                state: state.to_string(),
                total_count,
            },
        );
    }

    /// Set the response for `merge_pr` for a specific PR
    pub fn set_merge_response(&self, pr_number: u64, result: MergeResult) {
        self.merge_responses
            .lock()
            .unwrap()
            .insert(pr_number, result);
    }

    /// Delay every fetch call by `latency`
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    // === Call verification methods ===

    /// Every call, in order, as `method:number`
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Total number of calls of any kind
    pub fn call_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Highest number of `list_pr_comments` calls that were in progress at once
    pub fn max_concurrent_fetches(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Get all `list_pr_comments` calls
    pub fn get_list_comments_calls(&self) -> Vec<u64> {
        self.list_comments_calls.lock().unwrap().clone()
    }

    /// Get all `get_combined_status` calls
    pub fn get_status_calls(&self) -> Vec<String> {
        self.status_calls.lock().unwrap().clone()
    }

    /// Get all `create_pr_comment` calls
    pub fn get_create_comment_calls(&self) -> Vec<CreateCommentCall> {
        self.create_comment_calls.lock().unwrap().clone()
    }

    /// Get all `merge_pr` calls
    pub fn get_merge_pr_calls(&self) -> Vec<MergePrCall> {
        self.merge_pr_calls.lock().unwrap().clone()
    }

    /// Assert that `merge_pr` was called for a specific PR
    pub fn assert_merge_called(&self, pr_number: u64) {
        let calls = self.get_merge_pr_calls();
        assert!(
            calls.iter().any(|c| c.pr_number == pr_number),
            "Expected merge_pr({pr_number}) but got: {calls:?}"
        );
    }

    /// Assert that `merge_pr` was NOT called for a specific PR
    pub fn assert_merge_not_called(&self, pr_number: u64) {
        let calls = self.get_merge_pr_calls();
        assert!(
            !calls.iter().any(|c| c.pr_number == pr_number),
            "Expected merge_pr({pr_number}) NOT to be called but it was: {calls:?}"
        );
    }

    /// Assert that `merge_pr` was called with a specific method
    pub fn assert_merge_called_with_method(&self, pr_number: u64, method: MergeMethod) {
        let calls = self.get_merge_pr_calls();
        assert!(
            calls.iter().any(|c| c.pr_number == pr_number && c.method == method),
            "Expected merge_pr({pr_number}, {method:?}) but got: {calls:?}"
        );
    }

    /// Get count of `merge_pr` calls
    pub fn merge_call_count(&self) -> usize {
        self.merge_pr_calls.lock().unwrap().len()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    async fn wait(&self) {
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn list_pull_requests(&self, repo: &Repository) -> Result<Vec<PullRequest>> {
        self.record(format!("list_prs:{repo}"));

        if let Some(msg) = self.error_on_list_prs.lock().unwrap().get(repo) {
            return Err(Error::Platform(msg.clone()));
        }

        let prs = self.pull_requests.lock().unwrap();
        Ok(prs.get(repo).cloned().unwrap_or_default())
    }

    async fn list_pr_comments(&self, _repo: &Repository, pr_number: u64) -> Result<Vec<PrComment>> {
        self.record(format!("list_comments:{pr_number}"));
        self.list_comments_calls.lock().unwrap().push(pr_number);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.wait().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        // Check for injected error
        if let Some(msg) = self.error_on_list_comments.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        let responses = self.comments.lock().unwrap();
        Ok(responses.get(&pr_number).cloned().unwrap_or_default())
    }

    async fn get_combined_status(&self, _repo: &Repository, sha: &str) -> Result<CombinedStatus> {
        self.record(format!("status:{sha}"));
        self.status_calls.lock().unwrap().push(sha.to_string());
        self.wait().await;

        if let Some(msg) = self.error_on_status.lock().unwrap().as_ref() {
            return Err(Error::GitHubApi(msg.clone()));
        }

        let statuses = self.statuses.lock().unwrap();
        Ok(statuses.get(sha).cloned().unwrap_or_else(|| CombinedStatus {
            state: "success".to_string(),
            total_count: 1,
        }))
    }

    async fn create_pr_comment(&self, _repo: &Repository, pr_number: u64, body: &str) -> Result<()> {
        self.record(format!("comment:{pr_number}"));
        self.create_comment_calls
            .lock()
            .unwrap()
            .push(CreateCommentCall {
                pr_number,
                body: body.to_string(),
            });

        if let Some(msg) = self.error_on_comment.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        // Posted comments show up in later listings, like on GitHub
        let mut comments = self.comments.lock().unwrap();
        let thread = comments.entry(pr_number).or_default();
        let id = 1000 + thread.len() as u64;
        thread.push(PrComment {
            id,
            author: "monty".to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    async fn merge_pr(
        &self,
        _repo: &Repository,
        pr_number: u64,
        commit_message: &str,
        method: MergeMethod,
    ) -> Result<MergeResult> {
        self.record(format!("merge:{pr_number}"));
        self.merge_pr_calls.lock().unwrap().push(MergePrCall {
            pr_number,
            commit_message: commit_message.to_string(),
            method,
        });

        if let Some(msg) = self.error_on_merge_pr.lock().unwrap().as_ref() {
            return Err(Error::Platform(msg.clone()));
        }

        let responses = self.merge_responses.lock().unwrap();
        Ok(responses.get(&pr_number).cloned().unwrap_or_else(|| MergeResult {
            merged: true,
            sha: Some(format!("merged_sha_{pr_number}")),
            message: None,
        }))
    }
}
