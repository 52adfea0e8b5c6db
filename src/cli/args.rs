use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "transcript-fixer")]
#[command(about = "Clean up Whisper transcript JSON files", long_about = None)]
pub struct Cli {
    /// Debug logging and a full change listing
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Rule table to use instead of the built-in one
    #[arg(long, global = true)]
    pub rules: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Correct transcription errors and clear hallucinations in scream/groan files
    Fix(BatchCliArgs),
    /// Only correct misheard phrases and names
    Correct(BatchCliArgs),
    /// Only clear hallucinated text in scream/groan files
    Scrub(BatchCliArgs),
    /// Check that every JSON file matches a known record structure
    Validate(ValidateCliArgs),
    /// Inspect the active rule table
    Rules(RulesCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct BatchCliArgs {
    /// Directory containing JSON files (default: data)
    pub directory: Option<PathBuf>,
    /// Actually write the changes to the files
    #[arg(long)]
    pub apply: bool,
    /// Show changes without modifying files (the default)
    #[arg(long, conflicts_with = "apply")]
    pub dry_run: bool,
    /// Number of files processed concurrently
    #[arg(short, long)]
    pub workers: Option<usize>,
}

#[derive(ClapArgs, Debug)]
pub struct ValidateCliArgs {
    /// Directory containing JSON files (default: data)
    pub directory: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct RulesCliArgs {
    /// Report rule outputs that the corrector would rewrite again
    #[arg(long)]
    pub audit: bool,
}
