//! Shared test helpers

#![allow(dead_code)]

mod mock_platform;

pub use mock_platform::{CreateCommentCall, MergePrCall, MockPlatformService};

use monty::types::{PrComment, PrState, PullRequest, Repository};

/// Repository used throughout the tests
pub fn test_repo() -> Repository {
    Repository::new("codius", "monty")
}

/// An open pull request in `test_repo()` with head sha `sha{number}`
pub fn make_pr(number: u64, title: &str) -> PullRequest {
    PullRequest {
        number,
        title: title.to_string(),
        body: String::new(),
        author: "author".to_string(),
        head_sha: format!("sha{number}"),
        state: PrState::Open,
        merged: false,
        repository: test_repo(),
    }
}

/// A pull request with the given body
pub fn make_pr_with_body(number: u64, body: &str) -> PullRequest {
    PullRequest {
        body: body.to_string(),
        ..make_pr(number, &format!("PR {number}"))
    }
}

/// A pull request closed without being merged
pub fn make_closed_pr(number: u64, title: &str) -> PullRequest {
    PullRequest {
        state: PrState::Closed,
        ..make_pr(number, title)
    }
}

/// A comment
pub fn make_comment(id: u64, author: &str, body: &str) -> PrComment {
    PrComment {
        id,
        author: author.to_string(),
        body: body.to_string(),
    }
}

/// Two approving comments from different people
pub fn two_lgtms() -> Vec<PrComment> {
    vec![
        make_comment(1, "alice", "LGTM"),
        make_comment(2, "bob", "looks good :+1:"),
    ]
}
