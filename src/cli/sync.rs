//! Sync command - copy pull requests from GitHub into the store

use crate::cli::context::CommandContext;
use crate::cli::style::{CHECK, Stylize, check, cross, spinner_style};
use anstream::println;
use async_trait::async_trait;
use indicatif::ProgressBar;
use monty::error::{Error, Result};
use monty::progress::ProgressCallback;
use monty::sync::{SyncSummary, sync_repositories};
use std::time::Duration;

/// Shows the latest progress message on a spinner
struct SpinnerProgress(ProgressBar);

#[async_trait]
impl ProgressCallback for SpinnerProgress {
    async fn on_message(&self, message: &str) {
        self.0.set_message(format!("{message}..."));
    }
}

/// Sync every configured repository, with a spinner
pub async fn sync_with_spinner(ctx: &CommandContext) -> SyncSummary {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.enable_steady_tick(Duration::from_millis(80));
    let progress = SpinnerProgress(spinner);

    let summary = sync_repositories(
        ctx.platform.as_ref(),
        ctx.store.as_ref(),
        &ctx.repositories,
        &progress,
    )
    .await;

    progress.0.finish_and_clear();
    summary
}

/// Run the sync command
pub async fn run_sync(ctx: &CommandContext) -> Result<()> {
    let summary = sync_with_spinner(ctx).await;
    print_sync_summary(&summary);

    if summary.synced.is_empty() && !summary.failures.is_empty() {
        return Err(Error::Platform("every repository failed to sync".to_string()));
    }
    Ok(())
}

/// Print per-repository sync results
pub fn print_sync_summary(summary: &SyncSummary) {
    for (repo, count) in &summary.synced {
        println!("{} {} ({} PRs)", check(), repo.emphasis(), count.accent());
    }
    for (repo, error) in &summary.failures {
        println!("{} {}: {}", cross(), repo.emphasis(), error.warn());
    }
    if summary.is_success() {
        println!(
            "{} {} PRs",
            format!("{CHECK} Sync complete:").success(),
            summary.total().accent()
        );
    }
}
