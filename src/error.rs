//! Error types for monty

use thiserror::Error;

/// Errors produced while syncing, reviewing and merging pull requests
#[derive(Error, Debug)]
pub enum Error {
    /// The lease for a pull request could not be obtained within the retry budget
    #[error("lock unavailable for {key}")]
    LockUnavailable {
        /// Lock key that was contended
        key: String,
    },

    /// A held lease lapsed or was taken over before the work finished
    #[error("lease lost for {key}")]
    LeaseLost {
        /// Lock key whose lease was lost
        key: String,
    },

    /// Lock backend failure (database, poisoned mutex, ...)
    #[error("lock backend error: {0}")]
    Lock(String),

    /// GitHub API error with context
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Error surfaced by octocrab
    #[error("GitHub API error: {0}")]
    Octocrab(#[from] octocrab::Error),

    /// Generic platform error (used by alternate platform implementations)
    #[error("platform error: {0}")]
    Platform(String),

    /// The platform answered a merge request without merging
    #[error("merge of {pr} was rejected: {message}")]
    MergeRejected {
        /// Pull request identity (`owner/name#number`)
        pr: String,
        /// Message returned by the platform
        message: String,
    },

    /// Pull request store failure
    #[error("store error: {0}")]
    Store(String),

    /// Invalid or unreadable configuration
    #[error("config error: {0}")]
    Config(String),

    /// No usable credentials
    #[error("authentication error: {0}")]
    Auth(String),

    /// Unexpected internal failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error came from the remote code-hosting API
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::GitHubApi(_) | Self::Octocrab(_) | Self::Platform(_) | Self::MergeRejected { .. }
        )
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
