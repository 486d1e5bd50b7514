//! Core types for monty

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// A repository on the code-hosting platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Repository {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl Repository {
    /// Create a repository identifier
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Remote URL forms: `https://host/owner/name(.git)` and `git@host:owner/name(.git)`
static REMOTE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://[^/]+/|git@[^:]+:)([^/\s]+)/([^/\s]+?)(?:\.git)?/?$")
        .expect("remote URL regex is valid")
});

impl FromStr for Repository {
    type Err = Error;

    /// Parse an `owner/name` slug or a remote URL
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(caps) = REMOTE_URL.captures(s) {
            return Ok(Self::new(&caps[1], &caps[2]));
        }
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(Error::Config(format!(
                "invalid repository '{s}', expected owner/name"
            ))),
        }
    }
}

/// Identity of a pull request: repository plus number
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrId {
    /// Owning repository
    pub repository: Repository,
    /// PR number, unique within the repository
    pub number: u64,
}

impl PrId {
    /// Key used for the distributed lock
    pub fn lock_key(&self) -> String {
        format!("pr:{self}")
    }
}

impl fmt::Display for PrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repository, self.number)
    }
}

/// A synchronized pull request record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// PR title
    pub title: String,
    /// PR body/description
    #[serde(default)]
    pub body: String,
    /// Author login
    pub author: String,
    /// Head commit SHA
    pub head_sha: String,
    /// Open or closed on the platform
    #[serde(default)]
    pub state: PrState,
    /// Whether the PR has been merged. Only ever goes from false to true.
    #[serde(default)]
    pub merged: bool,
    /// Repository the PR belongs to
    pub repository: Repository,
}

impl PullRequest {
    /// Identity of this pull request
    pub fn id(&self) -> PrId {
        PrId {
            repository: self.repository.clone(),
            number: self.number,
        }
    }

    /// Whether the PR is still a candidate for review and merge
    pub fn is_reviewable(&self) -> bool {
        self.state == PrState::Open && !self.merged
    }
}

/// Platform state of a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    /// Open for review
    #[default]
    Open,
    /// Closed, merged or not
    Closed,
}

impl PrState {
    /// Name stored in the database
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(Error::Store(format!("unknown pull request state '{other}'"))),
        }
    }
}

/// A comment on a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrComment {
    /// Comment ID
    pub id: u64,
    /// Author login
    pub author: String,
    /// Comment body text
    pub body: String,
}

/// Combined build status of a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedStatus {
    /// Raw combined state (`success`, `pending`, `failure`, ...)
    pub state: String,
    /// Number of individual statuses reported for the commit
    pub total_count: u32,
}

impl CombinedStatus {
    /// Combined state value meaning every status passed
    pub const SUCCESS: &'static str = "success";

    /// Whether the combined state is the success value
    pub fn is_success(&self) -> bool {
        self.state == Self::SUCCESS
    }

    /// Whether no CI reported anything for the commit
    pub const fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

/// Result of a merge operation
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// Whether the merge was successful
    pub merged: bool,
    /// The SHA of the merge commit (if successful)
    pub sha: Option<String>,
    /// Message from the merge operation (especially on failure)
    pub message: Option<String>,
}

/// Merge strategy/method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    /// Squash all commits into one
    Squash,
    /// Create a merge commit
    #[default]
    Merge,
    /// Rebase commits onto base branch
    Rebase,
}

impl fmt::Display for MergeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Squash => write!(f, "squash"),
            Self::Merge => write!(f, "merge"),
            Self::Rebase => write!(f, "rebase"),
        }
    }
}

/// Order of the two side effects performed for a passed review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeOrder {
    /// Post the feedback comment, then merge
    #[default]
    CommentThenMerge,
    /// Merge, then post the feedback comment
    MergeThenComment,
}

/// What the build-status check does when a commit has no statuses at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingStatusPolicy {
    /// No build status fails the check
    #[default]
    Fail,
    /// No build status passes the check
    Pass,
}
