//! CLI command handling
//!
//! Loads configuration and suites, runs them, and formats output.

use std::path::Path;

use colored::Colorize;

use crate::actions::{ActionContext, StepBuilder};
use crate::commands::{Commands, LedgerArgs};
use crate::common::config::{Config, LedgerConfig};
use crate::common::{Error, Result};
use crate::ledger::LedgerClient;
use crate::suite::{self, ConsoleReporter, LoadedSuite};

/// Dispatch a CLI command
///
/// A failed suite comes back as [`Error::StepFailed`].
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            suite,
            ledger,
            verbose,
        } => run_suite(suite.as_deref(), &ledger, verbose).await,

        Commands::List { suite } => {
            let suite = load_suite(suite.as_deref())?;
            println!("{}", suite.definition.name.bold());
            if let Some(desc) = &suite.definition.description {
                println!("  {}", desc.trim().dimmed());
            }
            for (i, step) in suite.definition.steps.iter().enumerate() {
                println!(
                    "{:>3}. {} {}",
                    i + 1,
                    step.name,
                    format!("({})", step.action.summary()).dimmed()
                );
            }
            Ok(())
        }

        Commands::Check { ledger } => {
            let config = load_config(ledger.config.as_deref())?;
            let settings = ledger_config(&config, ledger.rpc_url.clone(), None);
            let client = LedgerClient::new(&settings)?;

            let slot = check_ledger(&client).await?;
            println!(
                "{} {} is healthy (slot {}, {})",
                "✓".green(),
                client.url(),
                slot,
                client.commitment().as_str()
            );
            Ok(())
        }
    }
}

async fn run_suite(path: Option<&Path>, args: &LedgerArgs, verbose: bool) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let loaded = load_suite(path)?;
    let ledger = ledger_config(
        &config,
        args.rpc_url.clone(),
        loaded.definition.rpc_url.clone(),
    );

    tracing::info!(
        suite = %loaded.definition.name,
        rpc_url = %ledger.rpc_url,
        steps = loaded.definition.steps.len(),
        "Running suite"
    );
    if verbose {
        if let Some(desc) = &loaded.definition.description {
            println!("{}", desc.trim().dimmed());
        }
    }

    let ctx = ActionContext {
        base_dir: loaded.base_dir.clone(),
        ledger,
        timeouts: config.timeouts.clone(),
        verbose,
    };
    let steps = StepBuilder::new(ctx).build_all(&loaded)?;

    let outcome = suite::run(steps, &mut ConsoleReporter).await?;
    outcome.into_result().map(|_| ())
}

/// Require a healthy node and return its current slot
async fn check_ledger(client: &LedgerClient) -> Result<u64> {
    let health = client.get_health().await?;
    if health != "ok" {
        return Err(Error::Unhealthy(health));
    }
    client.get_slot().await
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn load_suite(path: Option<&Path>) -> Result<LoadedSuite> {
    match path {
        Some(path) => LoadedSuite::load(path),
        None => LoadedSuite::bundled(),
    }
}

/// CLI flag wins over the suite file, which wins over the config file
fn ledger_config(
    config: &Config,
    cli_url: Option<String>,
    suite_url: Option<String>,
) -> LedgerConfig {
    let mut ledger = config.ledger.clone();
    if let Some(url) = cli_url.or(suite_url) {
        ledger.rpc_url = url;
    }
    ledger
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::test_support::{client_for, serve};

    #[tokio::test]
    async fn test_check_ledger_reports_slot() {
        let url = serve(vec![
            r#"{"jsonrpc":"2.0","result":"ok","id":1}"#.to_string(),
            r#"{"jsonrpc":"2.0","result":4242,"id":1}"#.to_string(),
        ])
        .await;
        assert_eq!(check_ledger(&client_for(url)).await.unwrap(), 4242);
    }

    #[tokio::test]
    async fn test_check_ledger_rejects_unhealthy_node() {
        let url = serve(vec![r#"{"jsonrpc":"2.0","result":"behind","id":1}"#.to_string()]).await;
        let err = check_ledger(&client_for(url)).await.unwrap_err();
        assert_eq!(err.to_string(), "Ledger is unhealthy: behind");
    }

    #[test]
    fn test_rpc_url_precedence() {
        let config = Config::default();
        assert_eq!(
            ledger_config(&config, None, None).rpc_url,
            "http://127.0.0.1:8899"
        );
        assert_eq!(
            ledger_config(&config, None, Some("http://suite:8899".to_string())).rpc_url,
            "http://suite:8899"
        );
        assert_eq!(
            ledger_config(
                &config,
                Some("http://cli:8899".to_string()),
                Some("http://suite:8899".to_string())
            )
            .rpc_url,
            "http://cli:8899"
        );
    }
}
