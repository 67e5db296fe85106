//! onesol-suite - ordered integration runner for the 1sol swap aggregator
//!
//! Runs pool preparation, protocol initialization and swap steps in order
//! against a live cluster. Exits 0 when every step succeeds, 1 otherwise.

use clap::Parser;
use commands::Commands;
use onesol_suite::{cli, commands, common::logging};

#[derive(Parser)]
#[command(name = "onesol-suite", about = "Ordered integration runner for the 1sol swap protocol")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Run { verbose: true, .. });
    logging::init_cli(verbose);

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
