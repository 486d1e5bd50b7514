//! CLI commands

mod context;
mod merge;
mod review;
mod run;
pub mod style;
mod sync;

pub use context::CommandContext;
pub use merge::{MergeCommandOptions, run_merge};
pub use review::run_review;
pub use run::run_loop;
pub use sync::run_sync;

use anstream::println;
use async_trait::async_trait;
use monty::progress::ProgressCallback;

/// Prints progress messages, indented under the command's heading
pub struct CliProgress {
    indent: &'static str,
}

impl CliProgress {
    /// Progress with a small indent
    pub const fn compact() -> Self {
        Self { indent: "  " }
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_message(&self, message: &str) {
        println!("{}{message}", self.indent);
    }
}
