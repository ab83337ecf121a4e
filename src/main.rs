use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, debug};

use dataverse_cli::{Config, DataverseError};

mod cli;
mod ui;

use cli::commands::{auth_command, connector_command, entity_command, flow_command, solution_command};
use cli::output::print_error;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG may come from .env
    let dotenv = dotenvy::dotenv();

    logger_builder(cli.debug).init();

    if let Ok(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&format!("{:#}", e));
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    let config = Config::from_env();

    match command {
        Commands::Auth(args) => auth_command(args, &config).await,
        Commands::Entity(args) => entity_command(args, &config).await,
        Commands::Flow(args) => flow_command(args, &config).await,
        Commands::Solution(args) => solution_command(args, &config).await,
        Commands::Connector(args) => connector_command(args, &config).await,
    }
}

/// Logger reading `RUST_LOG` at call time; `--debug` raises this crate to debug
fn logger_builder(debug: bool) -> env_logger::Builder {
    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        logger
            .filter_module("dataverse_cli", LevelFilter::Debug)
            .filter_module("dataverse", LevelFilter::Debug);
    }
    logger
}

fn exit_code(error: &anyhow::Error) -> u8 {
    error
        .downcast_ref::<DataverseError>()
        .map(DataverseError::exit_code)
        .unwrap_or(1)
}
