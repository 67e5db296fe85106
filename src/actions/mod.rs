//! Step actions
//!
//! Turns suite definitions into runnable steps. Collaborators are reached
//! through shell commands; ledger checks go through [`LedgerClient`].

mod ledger;
mod shell;

pub use ledger::{AccountTarget, AwaitAccountOperation, HealthOperation, RpcOperation};
pub use shell::ShellOperation;

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use crate::common::config::{LedgerConfig, Timeouts};
use crate::common::paths::resolve_relative;
use crate::common::{Error, Result};
use crate::ledger::LedgerClient;
use crate::suite::{LoadedSuite, Step, StepAction, StepDefinition};

/// Environment variable carrying the RPC endpoint to collaborator scripts
pub const RPC_URL_ENV: &str = "ONESOL_RPC_URL";
/// Environment variable carrying the commitment level to collaborator scripts
pub const COMMITMENT_ENV: &str = "ONESOL_COMMITMENT";

/// Settings shared by every step of one suite
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub base_dir: PathBuf,
    pub ledger: LedgerConfig,
    pub timeouts: Timeouts,
    pub verbose: bool,
}

/// Builds steps for one suite, sharing a single ledger client
pub struct StepBuilder {
    ctx: ActionContext,
    client: Option<LedgerClient>,
}

impl StepBuilder {
    pub fn new(ctx: ActionContext) -> Self {
        Self { ctx, client: None }
    }

    fn client(&mut self) -> Result<LedgerClient> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        let client = LedgerClient::new(&self.ctx.ledger)?;
        self.client = Some(client.clone());
        Ok(client)
    }

    /// Build every step of `suite`, preserving order
    pub fn build_all(&mut self, suite: &LoadedSuite) -> Result<Vec<Step>> {
        suite
            .definition
            .steps
            .iter()
            .map(|def| self.build(def))
            .collect()
    }

    pub fn build(&mut self, def: &StepDefinition) -> Result<Step> {
        let step = match &def.action {
            StepAction::Shell {
                command,
                timeout_secs,
            } => {
                let timeout = timeout_secs.unwrap_or(self.ctx.timeouts.shell_step_secs);
                let op = ShellOperation::new(
                    command.clone(),
                    self.ctx.base_dir.clone(),
                    Duration::from_secs(timeout),
                )
                .env(RPC_URL_ENV, self.ctx.ledger.rpc_url.clone())
                .env(COMMITMENT_ENV, self.ctx.ledger.commitment.as_str())
                .verbose(self.ctx.verbose);
                Step::new(def.name.clone(), op)
            }
            StepAction::LedgerHealth => {
                Step::new(def.name.clone(), HealthOperation::new(self.client()?))
            }
            StepAction::AwaitAccount {
                pubkey,
                pubkey_file,
                owner,
                timeout_secs,
            } => {
                let target = match (pubkey, pubkey_file) {
                    (Some(key), None) => AccountTarget::Pubkey(key.clone()),
                    (None, Some(file)) => {
                        AccountTarget::File(resolve_relative(&self.ctx.base_dir, file))
                    }
                    _ => {
                        return Err(Error::Config(format!(
                            "Step '{}' needs exactly one of 'pubkey' or 'pubkey_file'",
                            def.name
                        )))
                    }
                };
                let deadline = timeout_secs.unwrap_or(self.ctx.timeouts.await_account_secs);
                let op = AwaitAccountOperation::new(
                    self.client()?,
                    target,
                    Duration::from_secs(deadline),
                    Duration::from_millis(self.ctx.timeouts.poll_interval_ms),
                )
                .owner(owner.clone());
                Step::new(def.name.clone(), op)
            }
            StepAction::Rpc {
                method,
                params,
                expect_result,
            } => {
                let params = params.clone().unwrap_or_else(|| Value::Array(Vec::new()));
                let op = RpcOperation::new(self.client()?, method.clone(), params)
                    .expect_result(expect_result.clone());
                Step::new(def.name.clone(), op)
            }
        };
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ActionContext {
        ActionContext {
            base_dir: PathBuf::from("/work/suites"),
            ledger: LedgerConfig::default(),
            timeouts: Timeouts::default(),
            verbose: false,
        }
    }

    #[test]
    fn test_build_preserves_order_and_names() {
        let suite = LoadedSuite::bundled().unwrap();
        let steps = StepBuilder::new(ctx()).build_all(&suite).unwrap();
        let names: Vec<&str> = steps.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["prepareTokenSwap", "createOneSolProtocol", "swap"]);
        assert_eq!(
            steps[2].operation().describe(),
            "shell: npm run --silent swap"
        );
    }

    #[test]
    fn test_await_account_requires_one_target() {
        let yaml = r#"
name: bad
steps:
  - name: pool
    action: await_account
    pubkey: Pool111
    pubkey_file: pool.pubkey
"#;
        let suite = LoadedSuite::parse(yaml, "bad.yaml", PathBuf::from(".")).unwrap();
        let err = StepBuilder::new(ctx()).build_all(&suite).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_pubkey_file_resolves_against_suite_dir() {
        let yaml = r#"
name: ok
steps:
  - name: pool
    action: await_account
    pubkey_file: out/pool.pubkey
"#;
        let suite = LoadedSuite::parse(yaml, "ok.yaml", PathBuf::from("/work/suites")).unwrap();
        let steps = StepBuilder::new(ctx()).build_all(&suite).unwrap();
        assert_eq!(
            steps[0].operation().describe(),
            "await account from /work/suites/out/pool.pubkey"
        );
    }
}
