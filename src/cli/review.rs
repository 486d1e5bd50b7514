//! Review command - evaluate stored pull requests and print the verdicts

use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check, cross};
use anstream::println;
use monty::error::{Error, Result};
use monty::merge::render_conditions;
use monty::review::{Review, ReviewBatch};

/// Run the review command
pub async fn run_review(ctx: &CommandContext, json: bool) -> Result<()> {
    let batch = ctx.review_engine().evaluate_all().await;

    if json {
        let text = serde_json::to_string_pretty(&batch.reviews)
            .map_err(|e| Error::Internal(format!("failed to serialize reviews: {e}")))?;
        println!("{text}");
    } else {
        print_batch(&batch);
    }

    Ok(())
}

/// Print every review and every failure
pub fn print_batch(batch: &ReviewBatch) {
    if batch.reviews.is_empty() && batch.is_complete() {
        println!("{}", "No open pull requests to review.".muted());
        return;
    }

    for review in &batch.reviews {
        print_review(review);
    }

    for failure in &batch.failures {
        println!("{} {}: {}", cross(), failure.pr.emphasis(), failure.error.warn());
    }
    for (repo, error) in &batch.repository_failures {
        println!("{} {}: {}", cross(), repo.emphasis(), error.warn());
    }
}

fn print_review(review: &Review) {
    let mark = if review.passed() { check() } else { cross() };
    println!(
        "{mark} {} {}",
        review.id().emphasis(),
        review.pull_request().title.muted()
    );
    for line in render_conditions(review.condition()).lines() {
        let line = if line.contains('✘') { line.warn() } else { line.to_string() };
        println!("  {line}");
    }
}
