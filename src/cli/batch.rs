//! CLI handler for the `fix`, `correct` and `scrub` commands.
//!
//! This module handles terminal presentation.
//! The work itself is delegated to the `batch` module.

use anyhow::{bail, Result};
use std::sync::Arc;

use super::args::BatchCliArgs;
use crate::app::AppContext;
use crate::batch::{BatchProcessor, BatchReport, ChangeEntry, PersistMode};
use crate::normalizer::{PipelineMode, SegmentPipeline};

const SEPARATOR_WIDTH: usize = 60;

pub async fn handle_batch_command(
    context: &AppContext,
    mode: PipelineMode,
    args: BatchCliArgs,
    verbose: bool,
) -> Result<()> {
    let dir = context.data_dir(args.directory);
    if !dir.is_dir() {
        bail!("Directory {:?} does not exist", dir);
    }

    let persist = PersistMode::from_flags(args.apply, args.dry_run);
    let workers = args.workers.unwrap_or(context.config.batch.workers);
    let processor = Arc::new(BatchProcessor::new(
        SegmentPipeline::new(&context.rules, mode),
        persist,
    ));

    let report = processor.process_directory(&dir, workers).await?;

    println!(
        "Processed {} file(s) (out of {} JSON files in {})",
        report.files_processed,
        report.files_seen,
        dir.display()
    );

    if verbose {
        for change in &report.changes {
            print_change(mode, change);
        }
    }

    print_summary(mode, persist, &report);
    Ok(())
}

fn print_summary(mode: PipelineMode, persist: PersistMode, report: &BatchReport) {
    println!("\n{}", "=".repeat(SEPARATOR_WIDTH));
    match mode {
        PipelineMode::ScrubOnly => println!(
            "Total hallucinated transcriptions found: {}",
            report.changes.len()
        ),
        PipelineMode::Full | PipelineMode::CorrectOnly => {
            println!("Total changes: {}", report.changes.len())
        }
    }
    println!("Files modified: {}", report.files_modified);

    if !report.failures.is_empty() {
        println!("\nFailed files ({}):", report.failures.len());
        for failure in &report.failures {
            println!("  {} [{:?}]: {}", failure.file.display(), failure.kind, failure.message);
        }
    }

    if persist.is_dry_run() {
        println!("\nThis was a DRY RUN. No files were modified.");
        println!("Run with --apply to actually make the changes.");
    } else {
        println!("\n{} changes applied to files.", report.changes.len());
    }

    let sample_size = match mode {
        PipelineMode::ScrubOnly => 20,
        PipelineMode::Full | PipelineMode::CorrectOnly => 10,
    };
    if !report.changes.is_empty() {
        println!("\nSample changes (showing up to {}):", sample_size);
        for change in report.changes.iter().take(sample_size) {
            print_change(mode, change);
        }
    }
}

fn print_change(mode: PipelineMode, change: &ChangeEntry) {
    if mode == PipelineMode::ScrubOnly {
        println!(
            "  {}: {:?} -> (cleared)",
            change.file_name(),
            truncate(&change.original, 60)
        );
        return;
    }

    println!("\n  {} (segment {}):", change.file_name(), change.segment);
    println!("    - {}", change.original);
    if change.updated.is_empty() {
        println!("    + (cleared)");
    } else {
        println!("    + {}", change.updated);
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 60), "short");
        assert_eq!(truncate("ééééé", 3), "ééé...");
    }
}
