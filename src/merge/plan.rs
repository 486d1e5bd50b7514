//! Merge planning - pure functions for creating merge plans
//!
//! No I/O happens here. A plan is built from finished reviews and says, per
//! pull request, whether the executor should merge it or leave it alone.

use crate::review::{PassedReview, Review};
use crate::types::{PrId, PrState};

/// Skip reason for a pull request closed without merging
pub const CLOSED_REASON: &str = "closed without merging";

/// A single step in the merge plan
#[derive(Debug, Clone)]
pub enum MergeStep {
    /// Post feedback and merge this pull request
    Merge(PassedReview),
    /// The pull request was already merged upstream; only record it
    AlreadyMerged(PrId),
    /// Leave this pull request alone
    Skip {
        /// The pull request
        pr: PrId,
        /// Failing checks, as `name: message`
        reasons: Vec<String>,
    },
}

impl MergeStep {
    /// Identity of the pull request this step is about
    pub fn pr(&self) -> PrId {
        match self {
            Self::Merge(review) => review.id(),
            Self::AlreadyMerged(pr) | Self::Skip { pr, .. } => pr.clone(),
        }
    }
}

impl std::fmt::Display for MergeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merge(review) => {
                write!(f, "merge {}: {}", review.id(), review.pull_request().title)
            }
            Self::AlreadyMerged(pr) => write!(f, "record {pr} (already merged)"),
            Self::Skip { pr, reasons } => {
                write!(f, "skip {pr}")?;
                if !reasons.is_empty() {
                    write!(f, ": {}", reasons.join(", "))?;
                }
                Ok(())
            }
        }
    }
}

/// Merge plan - the functional core output
///
/// Created by `create_merge_plan()` (pure) and executed by
/// `execute_merge()` (effectful).
#[derive(Debug, Clone, Default)]
pub struct MergePlan {
    /// Steps in review order
    pub steps: Vec<MergeStep>,
}

impl MergePlan {
    /// Check if the plan has any merge steps
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.merge_count() == 0
    }

    /// Count mergeable PRs
    #[must_use]
    pub fn merge_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, MergeStep::Merge(_)))
            .count()
    }

    /// Reviews that will be merged
    pub fn merges(&self) -> impl Iterator<Item = &PassedReview> {
        self.steps.iter().filter_map(|s| match s {
            MergeStep::Merge(review) => Some(review),
            _ => None,
        })
    }
}

/// Create a merge plan (PURE - no I/O, easily testable)
///
/// Passed reviews become merges unless the snapshot already shows the pull
/// request merged or closed. Failed reviews are skipped with their failing
/// leaves as reasons. Order is preserved.
#[must_use]
pub fn create_merge_plan(reviews: Vec<Review>) -> MergePlan {
    let steps = reviews
        .into_iter()
        .map(|review| {
            if review.pull_request().merged {
                return MergeStep::AlreadyMerged(review.id());
            }
            if review.pull_request().state == PrState::Closed {
                return MergeStep::Skip {
                    pr: review.id(),
                    reasons: vec![CLOSED_REASON.to_string()],
                };
            }
            match PassedReview::try_from(review) {
                Ok(passed) => MergeStep::Merge(passed),
                Err(failed) => MergeStep::Skip {
                    pr: failed.id(),
                    reasons: skip_reasons(&failed),
                },
            }
        })
        .collect();

    MergePlan { steps }
}

fn skip_reasons(review: &Review) -> Vec<String> {
    review
        .condition()
        .failing_leaves()
        .into_iter()
        .map(|c| format!("{}: {}", c.name(), c.message()))
        .collect()
}
