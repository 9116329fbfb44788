//! CLI - Command-line argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use steward_common::clients::{ConsensusClient, ExecutionClient};

/// Node Steward CLI
#[derive(Parser, Debug)]
#[command(name = "stewardctl")]
#[command(about = "Keep Ethereum execution and consensus clients maintained", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Config file (defaults to /etc/node-steward/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr as well as the log file
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Probe both clients and show the maintenance dashboard
    Status {
        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// Perform pending maintenance until both clients are up to date
    Maintain {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Record which clients this node runs
    Select {
        #[arg(long)]
        execution: Option<ExecutionClient>,

        #[arg(long)]
        consensus: Option<ConsensusClient>,
    },

    /// Check that the beacon node is syncing
    Sync,
}
