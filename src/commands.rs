//! CLI command definitions
//!
//! Defines the clap commands for the suite runner.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a suite; exits 0 when every step succeeds
    Run {
        /// Path to the YAML suite file (default: bundled 1sol suite)
        suite: Option<PathBuf>,

        #[command(flatten)]
        ledger: LedgerArgs,

        /// Stream collaborator output and enable debug logging
        #[arg(long, short)]
        verbose: bool,
    },

    /// Print the steps of a suite in execution order
    List {
        /// Path to the YAML suite file (default: bundled 1sol suite)
        suite: Option<PathBuf>,
    },

    /// Check that the ledger RPC endpoint is reachable and healthy
    Check {
        #[command(flatten)]
        ledger: LedgerArgs,
    },
}

/// Options that select the ledger endpoint
#[derive(Args, Debug, Default)]
pub struct LedgerArgs {
    /// RPC endpoint, overrides the suite file and the config file
    #[arg(long)]
    pub rpc_url: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,
}
