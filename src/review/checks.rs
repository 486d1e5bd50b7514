//! Leaf checks - pure functions from a review snapshot to a `Condition`
//!
//! No I/O happens here. The review engine runs an ordered list of
//! `ReviewCheck`s against the snapshot it fetched.

use crate::merge::FEEDBACK_HEADER;
use crate::review::condition::Condition;
use crate::review::snapshot::ReviewInput;
use crate::types::{MissingStatusPolicy, PrComment};

/// Markers that make a comment line count as an approval
const APPROVAL_MARKERS: [&str; 2] = ["LGTM", ":+1:"];

/// Default number of approving lines required
pub const DEFAULT_LGTM_THRESHOLD: usize = 2;

/// Evaluates a review snapshot and returns a named condition
pub trait ReviewCheck: Send + Sync {
    /// Name of the condition this check produces
    fn name(&self) -> &str;

    /// Run the check
    fn check(&self, input: &ReviewInput) -> Condition;
}

/// The standard checks in evaluation order: LGTM, commands, build status
pub fn default_checks(
    lgtm_threshold: usize,
    missing_status: MissingStatusPolicy,
) -> Vec<Box<dyn ReviewCheck>> {
    vec![
        Box::new(LgtmCheck::new(lgtm_threshold)),
        Box::new(CommandCheck),
        Box::new(BuildStatusCheck::new(missing_status)),
    ]
}

// =============================================================================
// LGTM
// =============================================================================

/// Approvals gathered from comments, for rendering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feedback {
    /// Number of approving lines (repeat approvals count again)
    pub count: usize,
    /// Approving authors, first appearance first, without repeats
    pub people: Vec<String>,
}

impl Feedback {
    /// Count approving lines across all comments
    ///
    /// Feedback comments posted by the bot itself are not approvals.
    pub fn collect(comments: &[PrComment]) -> Self {
        let mut feedback = Self::default();
        for comment in comments.iter().filter(|c| !c.body.starts_with(FEEDBACK_HEADER)) {
            for line in comment.body.lines() {
                if is_approval(line) {
                    feedback.count += 1;
                    if !feedback.people.contains(&comment.author) {
                        feedback.people.push(comment.author.clone());
                    }
                }
            }
        }
        feedback
    }
}

fn is_approval(line: &str) -> bool {
    APPROVAL_MARKERS.iter().any(|marker| line.contains(marker))
}

/// Requires a minimum number of approving comment lines
#[derive(Debug, Clone, Copy)]
pub struct LgtmCheck {
    threshold: usize,
}

impl LgtmCheck {
    /// Create a check requiring `threshold` approving lines
    pub const fn new(threshold: usize) -> Self {
        Self { threshold }
    }
}

impl Default for LgtmCheck {
    fn default() -> Self {
        Self::new(DEFAULT_LGTM_THRESHOLD)
    }
}

impl ReviewCheck for LgtmCheck {
    fn name(&self) -> &str {
        "LGTM"
    }

    fn check(&self, input: &ReviewInput) -> Condition {
        let feedback = Feedback::collect(&input.comments);
        let mut message = format!("{} of {} required LGTMs", feedback.count, self.threshold);
        if !feedback.people.is_empty() {
            message.push_str(&format!(" (from {})", feedback.people.join(", ")));
        }
        Condition::new(self.name(), feedback.count >= self.threshold, message)
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Kind of inline command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `+r...`
    Grant,
    /// `-r...`
    Revoke,
}

/// An inline command found in the PR body or a comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Grant or revoke
    pub kind: CommandKind,
    /// Text after the `+r`/`-r` prefix
    pub argument: String,
    /// The full command line
    pub line: String,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end();
        let (kind, argument) = if let Some(rest) = line.strip_prefix("+r") {
            (CommandKind::Grant, rest)
        } else if let Some(rest) = line.strip_prefix("-r") {
            (CommandKind::Revoke, rest)
        } else {
            return None;
        };
        Some(Self {
            kind,
            argument: argument.trim().to_string(),
            line: line.to_string(),
        })
    }

    fn into_condition(self) -> Condition {
        match self.kind {
            CommandKind::Grant => {
                Condition::passing(self.line, format!("granted {}", self.argument))
            }
            CommandKind::Revoke => {
                Condition::failing(self.line, format!("revoked {}", self.argument))
            }
        }
    }
}

/// Extract `+r`/`-r` command lines from text, in order
///
/// Lines that don't start with either prefix are ignored.
pub fn extract_commands(text: &str) -> Vec<Command> {
    text.lines().filter_map(Command::parse).collect()
}

/// One child condition per inline command; revokes block the merge
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandCheck;

impl ReviewCheck for CommandCheck {
    fn name(&self) -> &str {
        "Commands"
    }

    fn check(&self, input: &ReviewInput) -> Condition {
        let commands: Vec<Command> = std::iter::once(input.pull_request.body.as_str())
            .chain(input.comments.iter().map(|c| c.body.as_str()))
            .flat_map(extract_commands)
            .collect();

        let message = match commands.len() {
            0 => "No commands".to_string(),
            1 => "1 command".to_string(),
            n => format!("{n} commands"),
        };

        let mut condition = Condition::passing(self.name(), message);
        for command in commands {
            condition.add(command.into_condition());
        }
        condition
    }
}

// =============================================================================
// Build status
// =============================================================================

/// Requires the head commit's combined status to be `success`
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildStatusCheck {
    missing: MissingStatusPolicy,
}

impl BuildStatusCheck {
    /// Create a check with the given policy for commits without statuses
    pub const fn new(missing: MissingStatusPolicy) -> Self {
        Self { missing }
    }
}

impl ReviewCheck for BuildStatusCheck {
    fn name(&self) -> &str {
        "Build status"
    }

    fn check(&self, input: &ReviewInput) -> Condition {
        let status = &input.status;
        if status.is_empty() {
            let passed = self.missing == MissingStatusPolicy::Pass;
            return Condition::new(self.name(), passed, "no build status reported");
        }
        Condition::new(self.name(), status.is_success(), status.state.clone())
    }
}
