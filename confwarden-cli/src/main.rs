//! confwarden CLI entry point

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;

use cli::{Cli, Commands};
use error::CliError;
use output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let loaded = commands::load_config(cli.config.as_deref()).await;
    let general = match loaded {
        Ok(ref config) => config.general.clone(),
        Err(_) => Default::default(),
    };
    logging::init_tracing(&general, cli.log_level.as_deref())?;
    confwarden_core::metrics::describe_all();

    tracing::debug!(command = ?cli.command, "confwarden starting");
    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Config(args) => {
            commands::config::execute(args, cli.config.as_deref(), &writer).await
        }
        Commands::Audit(args) => commands::audit::execute(args, &loaded?, &writer).await,
        Commands::Classify(args) => commands::classify::execute(args, &loaded?, &writer).await,
        Commands::Rules(args) => commands::rules::execute(args, &loaded?, &writer).await,
    }
}
