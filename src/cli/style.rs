//! Terminal styling helpers
//!
//! Output goes through `anstream`, which strips the escapes when stdout is
//! not a terminal.

use indicatif::ProgressStyle;
use owo_colors::OwoColorize;
use std::fmt::Display;

/// Check mark
pub const CHECK: &str = "✓";
/// Cross mark
pub const CROSS: &str = "✗";
/// Arrow used for list items
pub const ARROW: &str = "→";

/// Semantic colors for CLI output
pub trait Stylize {
    /// Headings and important values
    fn emphasis(&self) -> String;
    /// Secondary information
    fn muted(&self) -> String;
    /// Identifiers and counts
    fn accent(&self) -> String;
    /// Completed actions
    fn success(&self) -> String;
    /// Problems that did not stop the command
    fn warn(&self) -> String;
    /// Failures
    fn error(&self) -> String;
}

impl<T: Display + ?Sized> Stylize for T {
    fn emphasis(&self) -> String {
        self.to_string().bold().to_string()
    }

    fn muted(&self) -> String {
        self.to_string().dimmed().to_string()
    }

    fn accent(&self) -> String {
        self.to_string().cyan().to_string()
    }

    fn success(&self) -> String {
        self.to_string().green().to_string()
    }

    fn warn(&self) -> String {
        self.to_string().yellow().to_string()
    }

    fn error(&self) -> String {
        self.to_string().red().to_string()
    }
}

/// Styled check mark
pub fn check() -> String {
    CHECK.success()
}

/// Styled cross mark
pub fn cross() -> String {
    CROSS.error()
}

/// Styled list arrow
pub fn arrow() -> String {
    ARROW.muted()
}

/// Spinner used for network-bound steps
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
