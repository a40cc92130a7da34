pub mod commands;

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use salesdesk_core::config::{AppConfig, LogFormat};

use crate::commands::{route::RouteArgs, score::ScoreArgs, submit::SubmitArgs, CommandResult};

#[derive(Debug, Parser)]
#[command(
    name = "salesdesk",
    about = "SalesDesk lead prioritization and pricing/RFP decision CLI",
    long_about = "Rank leads by urgency, route enquiry batches into saveable and RFP-bound \
                  products, and build decision submissions. Every command prints one JSON \
                  document on stdout; logs go to stderr.",
    after_help = "Examples:\n  salesdesk score --leads leads.json\n  salesdesk route --batch \
                  batch.json --catalog catalog.json\n  salesdesk submit --batch batch.json \
                  --action both\n  salesdesk config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to salesdesk.toml (defaults to ./salesdesk.toml)")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Score and rank leads, with per-tier counts")]
    Score(ScoreArgs),
    #[command(about = "Partition a decision batch into saveable and RFP-required products")]
    Route(RouteArgs),
    #[command(about = "Validate a batch and build a decision submission envelope")]
    Submit(SubmitArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Score(_) => "score",
            Self::Route(_) => "route",
            Self::Submit(_) => "submit",
            Self::Config => "config",
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let result = execute(cli);

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn execute(cli: Cli) -> CommandResult {
    let config = match commands::load_config(cli.config.clone()) {
        Ok(config) => config,
        Err(error) => return CommandResult::config_failure(cli.command.name(), &error),
    };
    init_logging(&config);

    match cli.command {
        Command::Score(args) => commands::score::run(&config, &args),
        Command::Route(args) => commands::route::run(&config, &args),
        Command::Submit(args) => commands::submit::run(&config, &args),
        Command::Config => commands::config::run(cli.config.as_deref()),
    }
}

fn init_logging(config: &AppConfig) {
    if let Err(error) = install_logging(config) {
        eprintln!("salesdesk: logging disabled: {error}");
    }
}

fn install_logging(config: &AppConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    use tracing::Level;
    use LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    }
}
