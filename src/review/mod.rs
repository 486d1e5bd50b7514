//! Review evaluation
//!
//! Leaf checks (pure) produce conditions from a fetched snapshot; the engine
//! (effectful) fetches the snapshot under the pull request's lease and
//! composes the results into one root condition.

mod checks;
mod condition;
mod engine;
mod snapshot;

pub use checks::{
    BuildStatusCheck, Command, CommandCheck, CommandKind, DEFAULT_LGTM_THRESHOLD, Feedback,
    LgtmCheck, ReviewCheck, default_checks, extract_commands,
};
pub use condition::Condition;
pub(crate) use engine::release_lease;
pub use engine::{ROOT_CONDITION, ReviewBatch, ReviewEngine, ReviewFailure, ReviewOptions};
pub use snapshot::{PassedReview, Review, ReviewInput};
