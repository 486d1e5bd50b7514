//! Recursive pass/fail condition tree
//!
//! A `Condition` aggregates leaf judgments into one verdict. Its `passed`
//! value is always the AND of its own judgment and every child's `passed`,
//! which is why the fields are private and children can only be appended.

use serde::Serialize;

/// A named pass/fail judgment with ordered subconditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    name: String,
    passed: bool,
    message: String,
    subconditions: Vec<Condition>,
}

impl Condition {
    /// Create a leaf condition with its own judgment
    pub fn new(name: impl Into<String>, passed: bool, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            message: message.into(),
            subconditions: Vec::new(),
        }
    }

    /// Create a passing condition
    pub fn passing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, true, message)
    }

    /// Create a failing condition
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, false, message)
    }

    /// Append a child, failing this node permanently if the child failed
    pub fn add(&mut self, child: Self) {
        self.passed &= child.passed;
        self.subconditions.push(child);
    }

    /// Replace the human-readable message
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    /// Condition name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this node and all of its descendants passed
    pub const fn passed(&self) -> bool {
        self.passed
    }

    /// Human-readable explanation
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Children in insertion order
    pub fn subconditions(&self) -> &[Self] {
        &self.subconditions
    }

    /// Visit every descendant depth-first, pre-order, with its depth below `self`
    ///
    /// The root itself is not visited; its direct children have depth 0.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(usize, &'a Self)) {
        fn go<'a>(node: &'a Condition, depth: usize, visit: &mut impl FnMut(usize, &'a Condition)) {
            for child in &node.subconditions {
                visit(depth, child);
                go(child, depth + 1, visit);
            }
        }
        go(self, 0, visit);
    }

    /// Failed nodes whose children all passed, i.e. the root causes of failure
    pub fn failing_leaves(&self) -> Vec<&Self> {
        let mut out = Vec::new();
        if self.is_root_cause() {
            out.push(self);
        }
        self.walk(&mut |_, node| {
            if node.is_root_cause() {
                out.push(node);
            }
        });
        out
    }

    fn is_root_cause(&self) -> bool {
        !self.passed && self.subconditions.iter().all(|c| c.passed)
    }
}
