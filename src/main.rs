//! PPM Sentinel CLI entry point.

use clap::Parser;

use ppm_sentinel::cli::commands::{config, parse, simulate};
use ppm_sentinel::cli::{handle_error, load_config, Cli, Commands};
use ppm_sentinel::domain::models::LogConfig;
use ppm_sentinel::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // A broken config file must not prevent `config validate` from reporting it.
    let log_config = load_config(cli.config.as_deref())
        .map(|c| c.logging)
        .unwrap_or_default();
    let _logger = match LoggerImpl::init(&log_config) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("Failed to initialize logging: {err:#}");
            None
        }
    };

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Config(args) => config::execute(&args, config_path, cli.json),
        Commands::Parse(args) => parse::execute(args, cli.json).await,
        Commands::Simulate(args) => simulate::execute(args, config_path, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(&err, cli.json);
    }
}
