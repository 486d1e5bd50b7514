//! Run command - sync, review and merge on an interval

use crate::cli::CliProgress;
use crate::cli::context::CommandContext;
use crate::cli::merge::print_merge_summary;
use crate::cli::style::Stylize;
use crate::cli::sync::{print_sync_summary, sync_with_spinner};
use anstream::println;
use monty::error::Result;
use std::time::Duration;
use tracing::{info, warn};

/// Loop until Ctrl-C, which is honored between cycles
pub async fn run_loop(ctx: &CommandContext, interval: Duration) -> Result<()> {
    let engine = ctx.review_engine();
    let executor = ctx.merge_executor();
    let progress = CliProgress::compact();
    let mut cycle: u64 = 0;

    loop {
        cycle += 1;
        info!(cycle, "starting cycle");

        let summary = sync_with_spinner(ctx).await;
        if !summary.is_success() {
            print_sync_summary(&summary);
        }

        let batch = engine.evaluate_all().await;
        let report = executor.merge_all(batch.reviews, &progress).await;
        if report.has_merges() || !report.is_success() {
            print_merge_summary(&report);
        }
        info!(
            cycle,
            merged = report.merged.len(),
            skipped = report.skipped.len(),
            review_failures = batch.failures.len(),
            merge_failures = report.failures.len(),
            "cycle complete"
        );

        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => {
                    println!("{}", "Stopping.".muted());
                    return Ok(());
                }
                Err(e) => {
                    warn!(error = %e, "failed to listen for Ctrl-C");
                    tokio::time::sleep(interval).await;
                }
            },
        }
    }
}
