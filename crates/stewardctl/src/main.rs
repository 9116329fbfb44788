//! Node Steward Control - maintain Ethereum node clients from the terminal

use clap::Parser;
use std::process;
use steward_common::config::{config_path, StewardConfig};
use stewardctl::cli::{Cli, Commands};
use stewardctl::errors::EXIT_GENERAL_ERROR;
use stewardctl::{commands, logging};
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let config_file = cli.config.clone().unwrap_or_else(config_path);
    let config = match StewardConfig::load(&config_file) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(EXIT_GENERAL_ERROR);
        }
    };

    let log_path = logging::init(&config.log.level, cli.verbose);
    info!("stewardctl v{} starting", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Commands::Status { json } => commands::status(&config, json),
        Commands::Maintain { yes } => commands::maintain(&config, yes, log_path.clone()),
        Commands::Select {
            execution,
            consensus,
        } => commands::select(&config, execution, consensus),
        Commands::Sync => commands::sync(&config, log_path.clone()),
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            // Reaches stderr and the log file
            error!("{:#}", e);
            if let Some(path) = &log_path {
                eprintln!("See {} for details.", path.display());
            }
            EXIT_GENERAL_ERROR
        }
    };
    process::exit(code);
}
