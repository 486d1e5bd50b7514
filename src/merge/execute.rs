//! Merge execution - effectful operations
//!
//! Takes a `MergePlan` (created by the pure planning functions) and performs
//! the comment and merge calls via the platform API, under the same lease the
//! review engine uses.

use crate::error::{Error, Result};
use crate::lock::{DEFAULT_LEASE, LockService, LockToken, RetryPolicy};
use crate::merge::plan::{CLOSED_REASON, MergePlan, MergeStep, create_merge_plan};
use crate::merge::render::{FEEDBACK_HEADER, render_commit_message, render_feedback};
use crate::platform::PlatformService;
use crate::progress::ProgressCallback;
use crate::review::{PassedReview, Review, release_lease};
use crate::store::PullRequestStore;
use crate::types::{MergeMethod, MergeOrder, PrId, PrState};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Settings for the merge executor
#[derive(Debug, Clone, Copy)]
pub struct MergeOptions {
    /// Order of the comment and merge calls
    pub order: MergeOrder,
    /// Merge method passed to the platform
    pub method: MergeMethod,
    /// Lease length for the merge critical section
    pub lease: Duration,
    /// How persistently to wait for a contended pull request
    pub retry: RetryPolicy,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            order: MergeOrder::default(),
            method: MergeMethod::default(),
            lease: DEFAULT_LEASE,
            retry: RetryPolicy::default(),
        }
    }
}

/// Steps of merging one pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStage {
    /// Taking the pull request's lease
    Lock,
    /// Re-reading the stored record
    Verify,
    /// Posting the feedback comment
    Comment,
    /// Calling the merge API
    Merge,
    /// Flagging the stored record as merged
    Record,
}

impl fmt::Display for MergeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lock => "lock",
            Self::Verify => "verify",
            Self::Comment => "comment",
            Self::Merge => "merge",
            Self::Record => "record",
        };
        f.write_str(name)
    }
}

/// Successful outcome of merging one pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Merged by this call
    Merged {
        /// Merge commit, when the platform reports one
        sha: Option<String>,
    },
    /// Already merged; nothing was sent to the platform
    AlreadyMerged,
    /// Closed without merging since the review; nothing was sent
    Closed,
}

/// A merge that stopped partway
#[derive(Debug)]
pub struct MergeFailure {
    /// The pull request
    pub pr: PrId,
    /// Stage that failed
    pub stage: MergeStage,
    /// Stages that finished before the failure
    pub completed: Vec<MergeStage>,
    /// Why it failed
    pub error: Error,
}

impl MergeFailure {
    /// Whether a remote side effect (comment or merge) already happened
    pub fn is_partial(&self) -> bool {
        self.completed
            .iter()
            .any(|s| matches!(s, MergeStage::Comment | MergeStage::Merge))
    }
}

impl fmt::Display for MergeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed at {}: {}", self.pr, self.stage, self.error)?;
        if self.is_partial() {
            let done: Vec<String> = self.completed.iter().map(ToString::to_string).collect();
            write!(f, " (after {})", done.join(", "))?;
        }
        Ok(())
    }
}

/// Result of executing a merge plan
#[derive(Debug, Default)]
pub struct MergeReport {
    /// Pull requests merged in this run, with their merge commit
    pub merged: Vec<(PrId, Option<String>)>,
    /// Pull requests found already merged
    pub already_merged: Vec<PrId>,
    /// Pull requests left alone because their review failed
    pub skipped: Vec<(PrId, Vec<String>)>,
    /// Pull requests whose merge failed
    pub failures: Vec<MergeFailure>,
}

impl MergeReport {
    /// Check if every planned merge succeeded
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Check if at least one merge happened
    #[must_use]
    pub const fn has_merges(&self) -> bool {
        !self.merged.is_empty()
    }
}

/// Merges passed reviews exactly once
pub struct MergeExecutor {
    platform: Arc<dyn PlatformService>,
    store: Arc<dyn PullRequestStore>,
    lock: Arc<dyn LockService>,
    options: MergeOptions,
}

impl MergeExecutor {
    /// Create an executor
    pub fn new(
        platform: Arc<dyn PlatformService>,
        store: Arc<dyn PullRequestStore>,
        lock: Arc<dyn LockService>,
        options: MergeOptions,
    ) -> Self {
        Self {
            platform,
            store,
            lock,
            options,
        }
    }

    /// Comment on and merge one passed review
    pub async fn merge(&self, review: &PassedReview) -> std::result::Result<MergeOutcome, MergeFailure> {
        let pr = review.id();
        let mut completed = Vec::new();

        let mut token = self
            .lock
            .acquire(&pr.lock_key(), self.options.lease, self.options.retry)
            .await
            .map_err(|error| MergeFailure {
                pr: pr.clone(),
                stage: MergeStage::Lock,
                completed: Vec::new(),
                error,
            })?;
        completed.push(MergeStage::Lock);

        let outcome = self.merge_locked(review, &mut token, &mut completed).await;
        release_lease(self.lock.as_ref(), &token).await;

        outcome.map_err(|(stage, error)| {
            error!(pr = %pr, %stage, error = %error, "merge failed");
            MergeFailure {
                pr,
                stage,
                completed,
                error,
            }
        })
    }

    async fn merge_locked(
        &self,
        review: &PassedReview,
        token: &mut LockToken,
        completed: &mut Vec<MergeStage>,
    ) -> std::result::Result<MergeOutcome, (MergeStage, Error)> {
        let pr = review.pull_request();
        let id = pr.id();

        let stored = self
            .store
            .get_pull_request(&id)
            .await
            .map_err(|e| (MergeStage::Verify, e))?;
        if stored.as_ref().is_some_and(|p| p.merged) {
            info!(pr = %id, "already merged, skipping");
            return Ok(MergeOutcome::AlreadyMerged);
        }
        if stored.as_ref().is_some_and(|p| p.state == PrState::Closed) {
            info!(pr = %id, "closed without merging, skipping");
            return Ok(MergeOutcome::Closed);
        }
        completed.push(MergeStage::Verify);

        let sides = match self.options.order {
            MergeOrder::CommentThenMerge => [MergeStage::Comment, MergeStage::Merge],
            MergeOrder::MergeThenComment => [MergeStage::Merge, MergeStage::Comment],
        };

        let mut sha = None;
        for stage in sides {
            self.renew_lease(token).await.map_err(|e| (stage, e))?;
            match stage {
                MergeStage::Comment => self
                    .post_feedback(review)
                    .await
                    .map_err(|e| (stage, e))?,
                _ => sha = self.merge_pr(review).await.map_err(|e| (stage, e))?,
            }
            completed.push(stage);
        }

        let mut record = stored.unwrap_or_else(|| pr.clone());
        record.merged = true;
        self.store
            .put_pull_request(&record)
            .await
            .map_err(|e| (MergeStage::Record, e))?;
        completed.push(MergeStage::Record);

        info!(pr = %id, sha = ?sha, "merged");
        Ok(MergeOutcome::Merged { sha })
    }

    /// Extend the lease before a remote write, failing if it was lost
    async fn renew_lease(&self, token: &mut LockToken) -> Result<()> {
        match self.lock.renew(token, self.options.lease).await? {
            Some(renewed) => {
                *token = renewed;
                Ok(())
            }
            None => Err(Error::LeaseLost {
                key: token.key.clone(),
            }),
        }
    }

    /// Post the feedback comment unless an earlier attempt already did
    async fn post_feedback(&self, review: &PassedReview) -> Result<()> {
        let pr = review.pull_request();
        if review
            .comments()
            .iter()
            .any(|c| c.body.starts_with(FEEDBACK_HEADER))
        {
            debug!(pr = %pr.id(), "feedback already posted");
            return Ok(());
        }
        debug!(pr = %pr.id(), "posting feedback");
        self.platform
            .create_pr_comment(&pr.repository, pr.number, &render_feedback(review.condition()))
            .await
    }

    async fn merge_pr(&self, review: &PassedReview) -> Result<Option<String>> {
        let pr = review.pull_request();
        let message = render_commit_message(review.condition());
        let result = self
            .platform
            .merge_pr(&pr.repository, pr.number, &message, self.options.method)
            .await?;

        if !result.merged {
            return Err(Error::MergeRejected {
                pr: pr.id().to_string(),
                message: result
                    .message
                    .unwrap_or_else(|| "merge not performed".to_string()),
            });
        }
        Ok(result.sha)
    }

    /// Plan and execute merges for a batch of reviews
    ///
    /// Only passed reviews reach the merge API.
    pub async fn merge_all(
        &self,
        reviews: Vec<Review>,
        progress: &dyn ProgressCallback,
    ) -> MergeReport {
        let plan = create_merge_plan(reviews);
        execute_merge(&plan, self, progress).await
    }
}

/// Execute the merge plan (EFFECTFUL)
///
/// Every step runs; a failed merge is recorded and the next one proceeds.
pub async fn execute_merge(
    plan: &MergePlan,
    executor: &MergeExecutor,
    progress: &dyn ProgressCallback,
) -> MergeReport {
    let mut report = MergeReport::default();

    for step in &plan.steps {
        match step {
            MergeStep::Merge(review) => {
                let pr = review.id();
                progress
                    .on_message(&format!("🔀 Merging {pr}: {}", review.pull_request().title))
                    .await;

                match executor.merge(review).await {
                    Ok(MergeOutcome::Merged { sha }) => {
                        let sha_display = sha.as_deref().unwrap_or("(no sha)");
                        progress.on_message(&format!("✅ Merged: {sha_display}")).await;
                        report.merged.push((pr, sha));
                    }
                    Ok(MergeOutcome::AlreadyMerged) => {
                        progress.on_message(&format!("✔ {pr} already merged")).await;
                        report.already_merged.push(pr);
                    }
                    Ok(MergeOutcome::Closed) => {
                        progress
                            .on_message(&format!("⏭️  Skipping {pr}: {CLOSED_REASON}"))
                            .await;
                        report.skipped.push((pr, vec![CLOSED_REASON.to_string()]));
                    }
                    Err(failure) => {
                        if failure.is_partial() {
                            warn!(pr = %failure.pr, "merge left partial side effects");
                        }
                        progress.on_message(&format!("❌ {failure}")).await;
                        report.failures.push(failure);
                    }
                }
            }
            MergeStep::AlreadyMerged(pr) => {
                report.already_merged.push(pr.clone());
            }
            MergeStep::Skip { pr, reasons } => {
                progress
                    .on_message(&format!("⏭️  Skipping {pr}: {}", reasons.join(", ")))
                    .await;
                report.skipped.push((pr.clone(), reasons.clone()));
            }
        }
    }

    report
}
