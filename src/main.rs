use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use transcript_fixer::{
    app::AppContext,
    cli::{handle_batch_command, handle_rules_command, handle_validate_command, Cli, CliCommand},
    normalizer::PipelineMode,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let CliCommand::Version = cli.command {
        println!("transcript-fixer {}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }

    let context = AppContext::bootstrap(cli.config.as_deref(), cli.rules.as_deref())?;

    let success = match cli.command {
        CliCommand::Fix(args) => {
            handle_batch_command(&context, PipelineMode::Full, args, cli.verbose).await?;
            true
        }
        CliCommand::Correct(args) => {
            handle_batch_command(&context, PipelineMode::CorrectOnly, args, cli.verbose).await?;
            true
        }
        CliCommand::Scrub(args) => {
            handle_batch_command(&context, PipelineMode::ScrubOnly, args, cli.verbose).await?;
            true
        }
        CliCommand::Validate(args) => handle_validate_command(context.data_dir(args.directory))?,
        CliCommand::Rules(args) => handle_rules_command(&context.rules, args)?,
        CliCommand::Version => true,
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
