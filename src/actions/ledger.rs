//! Ledger check steps
//!
//! These steps submit nothing. They assert that the state an earlier step was
//! supposed to commit is visible before the next collaborator relies on it.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::common::{Error, Result};
use crate::ledger::LedgerClient;
use crate::suite::StepOperation;

/// Fails unless the node reports itself healthy
#[derive(Debug, Clone)]
pub struct HealthOperation {
    client: LedgerClient,
}

impl HealthOperation {
    pub fn new(client: LedgerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StepOperation for HealthOperation {
    async fn execute(&self) -> Result<()> {
        let health = self.client.get_health().await?;
        if health != "ok" {
            return Err(Error::Unhealthy(health));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("ledger health at {}", self.client.url())
    }
}

/// Where an awaited account address comes from
#[derive(Debug, Clone)]
pub enum AccountTarget {
    Pubkey(String),
    /// File holding the address, written by an earlier step
    File(PathBuf),
}

impl AccountTarget {
    fn resolve(&self) -> Result<String> {
        match self {
            AccountTarget::Pubkey(key) => Ok(key.clone()),
            AccountTarget::File(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
                let key = content.trim();
                if key.is_empty() {
                    return Err(Error::Config(format!(
                        "Pubkey file '{}' is empty",
                        path.display()
                    )));
                }
                Ok(key.to_string())
            }
        }
    }
}

/// Waits for an account to exist at the configured commitment
///
/// Precondition: the address is known (literal, or its file already written).
/// Postcondition: the account exists and, when `owner` is set, belongs to
/// that program.
#[derive(Debug, Clone)]
pub struct AwaitAccountOperation {
    client: LedgerClient,
    target: AccountTarget,
    owner: Option<String>,
    deadline: Duration,
    poll_interval: Duration,
}

impl AwaitAccountOperation {
    pub fn new(
        client: LedgerClient,
        target: AccountTarget,
        deadline: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            target,
            owner: None,
            deadline,
            poll_interval,
        }
    }

    pub fn owner(mut self, owner: Option<String>) -> Self {
        self.owner = owner;
        self
    }
}

#[async_trait]
impl StepOperation for AwaitAccountOperation {
    async fn execute(&self) -> Result<()> {
        let pubkey = self.target.resolve()?;
        let account = self
            .client
            .wait_for_account(&pubkey, self.deadline, self.poll_interval)
            .await?;

        if let Some(expected) = &self.owner {
            if &account.owner != expected {
                return Err(Error::AccountOwner {
                    pubkey,
                    expected: expected.clone(),
                    actual: account.owner,
                });
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.target {
            AccountTarget::Pubkey(key) => format!("await account {}", key),
            AccountTarget::File(path) => format!("await account from {}", path.display()),
        }
    }
}

/// Calls an arbitrary RPC method; succeeds on any non-error response
#[derive(Debug, Clone)]
pub struct RpcOperation {
    client: LedgerClient,
    method: String,
    params: Value,
    expect_result: Option<Value>,
}

impl RpcOperation {
    pub fn new(client: LedgerClient, method: impl Into<String>, params: Value) -> Self {
        Self {
            client,
            method: method.into(),
            params,
            expect_result: None,
        }
    }

    pub fn expect_result(mut self, expected: Option<Value>) -> Self {
        self.expect_result = expected;
        self
    }
}

#[async_trait]
impl StepOperation for RpcOperation {
    async fn execute(&self) -> Result<()> {
        let result: Value = self.client.call(&self.method, self.params.clone()).await?;
        if let Some(expected) = &self.expect_result {
            if &result != expected {
                return Err(Error::UnexpectedResult {
                    method: self.method.clone(),
                    expected: expected.to_string(),
                    actual: result.to_string(),
                });
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("rpc: {}", self.method)
    }
}
