//! Review snapshots and results

use crate::review::condition::Condition;
use crate::types::{CombinedStatus, PrComment, PrId, PullRequest};
use serde::Serialize;

/// Everything a leaf check may look at for one evaluation
#[derive(Debug, Clone, Serialize)]
pub struct ReviewInput {
    /// The pull request under evaluation
    pub pull_request: PullRequest,
    /// Comments fetched for this evaluation
    pub comments: Vec<PrComment>,
    /// Combined build status of the head commit
    pub status: CombinedStatus,
}

/// The complete evaluation result for one pull request at one point in time
///
/// Built once by the review engine; there are no mutating accessors.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    #[serde(flatten)]
    input: ReviewInput,
    condition: Condition,
}

impl Review {
    /// Assemble a review from its snapshot and root condition
    pub const fn new(input: ReviewInput, condition: Condition) -> Self {
        Self { input, condition }
    }

    /// The pull request under evaluation
    pub const fn pull_request(&self) -> &PullRequest {
        &self.input.pull_request
    }

    /// Identity of the reviewed pull request
    pub fn id(&self) -> PrId {
        self.input.pull_request.id()
    }

    /// Comments seen during evaluation
    pub fn comments(&self) -> &[PrComment] {
        &self.input.comments
    }

    /// Build status seen during evaluation
    pub const fn status(&self) -> &CombinedStatus {
        &self.input.status
    }

    /// Root condition
    pub const fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Overall verdict, exactly the root condition's `passed`
    pub const fn passed(&self) -> bool {
        self.condition.passed()
    }
}

/// A review whose root condition passed
///
/// The only way to obtain one is `PassedReview::try_from(review)`, so the
/// merge executor cannot be handed a failed review.
#[derive(Debug, Clone)]
pub struct PassedReview(Review);

impl PassedReview {
    /// The underlying review
    pub const fn review(&self) -> &Review {
        &self.0
    }

    /// Unwrap into the underlying review
    pub fn into_inner(self) -> Review {
        self.0
    }
}

impl TryFrom<Review> for PassedReview {
    type Error = Review;

    fn try_from(review: Review) -> std::result::Result<Self, Self::Error> {
        if review.passed() {
            Ok(Self(review))
        } else {
            Err(review)
        }
    }
}

impl std::ops::Deref for PassedReview {
    type Target = Review;

    fn deref(&self) -> &Review {
        &self.0
    }
}
