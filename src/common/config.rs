//! Configuration file handling

use serde::Deserialize;
use std::path::Path;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Ledger connection settings
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// Commitment level used for ledger reads
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

/// Ledger connection settings
#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint of the cluster under test
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Commitment for account reads
    #[serde(default)]
    pub commitment: Commitment,

    /// Timeout for a single RPC request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            commitment: Commitment::default(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8899".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// Timeout settings for step actions
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Default timeout for a shell step
    #[serde(default = "default_shell_step")]
    pub shell_step_secs: u64,

    /// Default deadline for an await_account step
    #[serde(default = "default_await_account")]
    pub await_account_secs: u64,

    /// Delay between account polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            shell_step_secs: default_shell_step(),
            await_account_secs: default_await_account(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

fn default_shell_step() -> u64 {
    300
}
fn default_await_account() -> u64 {
    120
}
fn default_poll_interval() -> u64 {
    500
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| super::Error::file_read(path, e))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.ledger.rpc_url, "http://127.0.0.1:8899");
        assert_eq!(config.ledger.commitment, Commitment::Confirmed);
        assert_eq!(config.timeouts.shell_step_secs, 300);
        assert_eq!(config.timeouts.poll_interval_ms, 500);
    }

    #[test]
    fn test_partial_override() {
        let config = Config::parse(
            r#"
[ledger]
rpc_url = "https://api.devnet.solana.com"
commitment = "finalized"

[timeouts]
await_account_secs = 10
"#,
        )
        .unwrap();
        assert_eq!(config.ledger.rpc_url, "https://api.devnet.solana.com");
        assert_eq!(config.ledger.commitment.as_str(), "finalized");
        assert_eq!(config.ledger.request_timeout_secs, 30);
        assert_eq!(config.timeouts.await_account_secs, 10);
        assert_eq!(config.timeouts.shell_step_secs, 300);
    }

    #[test]
    fn test_invalid_commitment_rejected() {
        let err = Config::parse("[ledger]\ncommitment = \"max\"\n").unwrap_err();
        assert!(matches!(err, crate::Error::ConfigParse(_)));
    }
}
