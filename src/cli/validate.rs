//! CLI handler for the `validate` command.

use anyhow::Result;
use std::path::PathBuf;

use crate::validator::{self, ValidationSummary};

const SEPARATOR_WIDTH: usize = 60;

/// Returns whether every file was valid; the caller turns that into an exit code.
pub fn handle_validate_command(dir: PathBuf) -> Result<bool> {
    let summary = validator::validate_directory(&dir)?;
    print_summary(&summary);
    Ok(summary.is_clean())
}

fn print_summary(summary: &ValidationSummary) {
    let rule = "=".repeat(SEPARATOR_WIDTH);

    println!("\n{rule}");
    println!("Validation Results:");
    println!("{rule}");
    println!("Total files: {}", summary.total);
    println!("Valid files: {}", summary.valid);
    println!("Invalid files: {}", summary.errors.len());
    println!("{rule}");

    if summary.is_clean() {
        println!("\n✓ All JSON files are valid!");
        return;
    }

    println!("\nErrors found:");
    println!("{rule}");
    for error in &summary.errors {
        println!("\n{}:", error.file_name());
        println!("  {}", error.message);
    }
    println!("\n{rule}");
}
