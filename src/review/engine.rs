//! Review engine - lock, fetch, check, compose, unlock
//!
//! One evaluation per call and no persisted intermediate state. The lease
//! for the pull request is released on every path after it was acquired.

use crate::error::{Error, Result};
use crate::lock::{LockService, LockToken, RetryPolicy, DEFAULT_LEASE};
use crate::platform::PlatformService;
use crate::review::checks::ReviewCheck;
use crate::review::condition::Condition;
use crate::review::snapshot::{Review, ReviewInput};
use crate::store::PullRequestStore;
use crate::types::{PrId, PullRequest, Repository};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Name of the root condition
pub const ROOT_CONDITION: &str = "Overall";

/// Settings for the review engine
#[derive(Debug, Clone)]
pub struct ReviewOptions {
    /// Repositories evaluated by `evaluate_all`
    pub repositories: Vec<Repository>,
    /// Lease length for each evaluation
    pub lease: Duration,
    /// How persistently to wait for a contended pull request
    pub retry: RetryPolicy,
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self {
            repositories: Vec::new(),
            lease: DEFAULT_LEASE,
            retry: RetryPolicy::default(),
        }
    }
}

/// A pull request whose evaluation failed
#[derive(Debug)]
pub struct ReviewFailure {
    /// The pull request
    pub pr: PrId,
    /// Why it failed
    pub error: Error,
}

/// Outcome of evaluating every stored pull request
#[derive(Debug, Default)]
pub struct ReviewBatch {
    /// Completed reviews, in repository then store order
    pub reviews: Vec<Review>,
    /// Pull requests that could not be evaluated this cycle
    pub failures: Vec<ReviewFailure>,
    /// Repositories whose stored pull requests could not be read
    pub repository_failures: Vec<(Repository, Error)>,
}

impl ReviewBatch {
    /// Check if every pull request was evaluated
    pub const fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.repository_failures.is_empty()
    }

    /// Reviews whose root condition passed
    pub fn passed(&self) -> impl Iterator<Item = &Review> {
        self.reviews.iter().filter(|r| r.passed())
    }
}

/// Evaluates pull requests under the distributed lock
pub struct ReviewEngine {
    platform: Arc<dyn PlatformService>,
    store: Arc<dyn PullRequestStore>,
    lock: Arc<dyn LockService>,
    checks: Vec<Box<dyn ReviewCheck>>,
    options: ReviewOptions,
}

impl ReviewEngine {
    /// Create an engine running `checks` in the given order
    pub fn new(
        platform: Arc<dyn PlatformService>,
        store: Arc<dyn PullRequestStore>,
        lock: Arc<dyn LockService>,
        checks: Vec<Box<dyn ReviewCheck>>,
        options: ReviewOptions,
    ) -> Self {
        Self {
            platform,
            store,
            lock,
            checks,
            options,
        }
    }

    /// Evaluate a single pull request
    ///
    /// Fails with `LockUnavailable` if another worker holds the pull request,
    /// or with the remote error if comments or status could not be fetched.
    pub async fn evaluate_pull_request(&self, pr: &PullRequest) -> Result<Review> {
        let id = pr.id();
        let token = self
            .lock
            .acquire(&id.lock_key(), self.options.lease, self.options.retry)
            .await?;

        info!(pr = %id, "reviewing");
        let outcome = self.evaluate_locked(pr).await;
        release_lease(self.lock.as_ref(), &token).await;

        match &outcome {
            Ok(review) => debug!(pr = %id, passed = review.passed(), "review complete"),
            Err(e) => warn!(pr = %id, error = %e, "review aborted"),
        }
        outcome
    }

    async fn evaluate_locked(&self, pr: &PullRequest) -> Result<Review> {
        let comments = self
            .platform
            .list_pr_comments(&pr.repository, pr.number)
            .await?;
        let status = self
            .platform
            .get_combined_status(&pr.repository, &pr.head_sha)
            .await?;

        let input = ReviewInput {
            pull_request: pr.clone(),
            comments,
            status,
        };

        let mut root = Condition::passing(ROOT_CONDITION, "");
        for check in &self.checks {
            let condition = check.check(&input);
            debug!(check = check.name(), passed = condition.passed(), "check ran");
            root.add(condition);
        }
        root.set_message(if root.passed() {
            "All conditions met"
        } else {
            "Not all conditions are met"
        });

        Ok(Review::new(input, root))
    }

    /// Evaluate every open, unmerged stored pull request of the configured repositories
    ///
    /// Failures are collected per item; one pull request never aborts the batch.
    pub async fn evaluate_all(&self) -> ReviewBatch {
        info!(repositories = self.options.repositories.len(), "reviewing all PRs");
        let mut batch = ReviewBatch::default();

        for repo in &self.options.repositories {
            let prs = match self.store.get_pull_requests(repo).await {
                Ok(prs) => prs,
                Err(e) => {
                    error!(%repo, error = %e, "failed to read stored pull requests");
                    batch.repository_failures.push((repo.clone(), e));
                    continue;
                }
            };

            for pr in prs.iter().filter(|pr| pr.is_reviewable()) {
                match self.evaluate_pull_request(pr).await {
                    Ok(review) => batch.reviews.push(review),
                    Err(error) => batch.failures.push(ReviewFailure { pr: pr.id(), error }),
                }
            }
        }

        batch
    }
}

/// Release a lease, logging instead of failing
///
/// The caller's outcome is already decided at this point; a lease that can't
/// be released will lapse on its own.
pub(crate) async fn release_lease(lock: &dyn LockService, token: &LockToken) {
    match lock.release(token).await {
        Ok(true) => debug!(key = %token.key, "released lock"),
        Ok(false) => warn!(key = %token.key, "lease had already lapsed before release"),
        Err(e) => warn!(key = %token.key, error = %e, "failed to release lock"),
    }
}
