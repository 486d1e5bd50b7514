//! Merge command - evaluate, plan and merge passed pull requests

use crate::cli::CliProgress;
use crate::cli::context::CommandContext;
use crate::cli::review::print_batch;
use crate::cli::style::{Stylize, arrow, check};
use anstream::println;
use dialoguer::Confirm;
use monty::error::{Error, Result};
use monty::merge::{MergePlan, MergeReport, MergeStep, create_merge_plan, execute_merge};

/// Options for the merge command
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeCommandOptions {
    /// Dry run - show what would be merged without making changes
    pub dry_run: bool,
    /// Preview plan and prompt for confirmation before executing
    pub confirm: bool,
}

/// Run the merge command
pub async fn run_merge(ctx: &CommandContext, options: MergeCommandOptions) -> Result<()> {
    // Review
    println!(
        "{}",
        format!("Reviewing {} repository(s)...", ctx.repositories.len()).muted()
    );
    let batch = ctx.review_engine().evaluate_all().await;
    if !batch.is_complete() {
        print_batch(&batch);
    }

    // Plan
    let plan = create_merge_plan(batch.reviews);

    if options.dry_run {
        report_merge_plan(&plan);
        println!("{}", "Run without --dry-run to execute.".muted());
        return Ok(());
    }

    if plan.is_empty() {
        println!("{}", "No PRs are ready to merge.".muted());
        print_blocking_summary(&plan);
        return Ok(());
    }

    if options.confirm {
        report_merge_plan(&plan);
        if !Confirm::new()
            .with_prompt("Proceed with merge?")
            .default(true)
            .interact()
            .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))?
        {
            println!("{}", "Aborted".muted());
            return Ok(());
        }
        println!();
    }

    // Execute
    println!(
        "{} {}",
        "Merging".emphasis(),
        format!("{} PR(s)...", plan.merge_count()).accent()
    );
    let progress = CliProgress::compact();
    let report = execute_merge(&plan, &ctx.merge_executor(), &progress).await;
    print_merge_summary(&report);

    Ok(())
}

/// Print merge summary
pub fn print_merge_summary(report: &MergeReport) {
    println!();
    if report.is_success() {
        println!("{} Merge complete!", check());
    } else {
        println!("{} Merge partially complete", "⚠️".warn());
    }

    if !report.merged.is_empty() {
        let merged: Vec<String> = report.merged.iter().map(|(pr, _)| pr.to_string()).collect();
        println!("   Merged: {}", merged.join(", ").accent());
    }
    if !report.already_merged.is_empty() {
        let done: Vec<String> = report.already_merged.iter().map(ToString::to_string).collect();
        println!("   Already merged: {}", done.join(", ").muted());
    }
    for failure in &report.failures {
        println!("   {} {}", "Failed:".warn(), failure.pr.warn());
        println!("          {}", failure.error.muted());
        if failure.is_partial() {
            println!(
                "          {}",
                "comment or merge already happened; check the pull request".warn()
            );
        }
    }
}

/// Report what would be merged
fn report_merge_plan(plan: &MergePlan) {
    println!("{}:", "Merge plan".emphasis());
    println!();

    if plan.steps.is_empty() {
        println!("  {}", "No PRs to process".muted());
        println!();
        return;
    }

    for step in &plan.steps {
        match step {
            MergeStep::Merge(review) => {
                println!(
                    "  {} {}: {}",
                    "✓ Would merge".success(),
                    review.id(),
                    review.pull_request().title
                );
            }
            MergeStep::AlreadyMerged(pr) => {
                println!("  {} {}", "✓ Already merged".muted(), pr);
            }
            MergeStep::Skip { pr, reasons } => {
                println!("  {} {}", "✗ Would skip".warn(), pr);
                for reason in reasons {
                    println!("    {} {}", arrow(), reason.muted());
                }
            }
        }
    }

    println!();
}

/// Print summary of blocking reasons
fn print_blocking_summary(plan: &MergePlan) {
    for step in &plan.steps {
        if let MergeStep::Skip { pr, reasons } = step {
            println!("  {}:", pr.accent());
            for reason in reasons {
                println!("    - {}", reason.muted());
            }
        }
    }
}
