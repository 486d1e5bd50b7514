//! Merge engine for passed reviews
//!
//! Three-phase pattern:
//! 1. Review - produce `Review`s (see `review`)
//! 2. Plan - create `MergePlan` (pure, testable)
//! 3. Execute - comment and merge under the pull request's lease (effectful)

mod execute;
mod plan;
mod render;

pub use execute::{
    MergeExecutor, MergeFailure, MergeOptions, MergeOutcome, MergeReport, MergeStage,
    execute_merge,
};
pub use plan::{CLOSED_REASON, MergePlan, MergeStep, create_merge_plan};
pub use render::{
    COMMIT_HEADER, FEEDBACK_HEADER, render_commit_message, render_conditions, render_feedback,
};
