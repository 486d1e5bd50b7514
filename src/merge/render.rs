//! Text rendering of a condition tree
//!
//! The same rendering is used for the feedback comment posted on the pull
//! request and for the merge commit message; only the header differs.

use crate::review::Condition;
use std::fmt::Write;

/// Header of the feedback comment
pub const FEEDBACK_HEADER: &str = "I've reviewed this pull request:\n\n";

/// Header of the merge commit message
pub const COMMIT_HEADER: &str = "Automatic merge after review:\n\n";

const PASSED_MARK: &str = "✔";
const FAILED_MARK: &str = "✘";

/// Render every descendant of `condition`, one line each
///
/// Direct children are indented by one space; each further level adds two.
/// The root itself is not rendered.
#[must_use]
pub fn render_conditions(condition: &Condition) -> String {
    let mut out = String::new();
    condition.walk(&mut |depth, node| {
        let mark = if node.passed() { PASSED_MARK } else { FAILED_MARK };
        let indent = " ".repeat(1 + depth * 2);
        // Writing to a String cannot fail
        let _ = writeln!(out, "{indent}{mark} {}: {}", node.name(), node.message());
    });
    out
}

/// Body of the comment posted before (or after) merging
#[must_use]
pub fn render_feedback(condition: &Condition) -> String {
    format!("{FEEDBACK_HEADER}{}", render_conditions(condition))
}

/// Commit message for the merge
#[must_use]
pub fn render_commit_message(condition: &Condition) -> String {
    format!("{COMMIT_HEADER}{}", render_conditions(condition))
}
