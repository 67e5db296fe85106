//! Suite definition files
//!
//! Defines the data structures for deserializing YAML suites.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// Suite shipped with the binary, used when no file is given
const BUNDLED_SUITE: &str = include_str!("../../suites/onesol.yaml");

/// A complete suite loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct SuiteDefinition {
    /// Name of the suite
    pub name: String,
    /// Optional description of what the suite verifies
    pub description: Option<String>,
    /// RPC endpoint override for this suite
    pub rpc_url: Option<String>,
    /// Steps in dependency order
    pub steps: Vec<StepDefinition>,
}

/// A named step and the action it performs
#[derive(Deserialize, Debug)]
pub struct StepDefinition {
    pub name: String,
    #[serde(flatten)]
    pub action: StepAction,
}

/// What a step does
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepAction {
    /// Run an external collaborator command
    Shell {
        command: String,
        /// Overrides `timeouts.shell_step_secs`
        timeout_secs: Option<u64>,
    },
    /// Require the ledger node to report healthy
    LedgerHealth,
    /// Wait for an account created by an earlier step
    AwaitAccount {
        pubkey: Option<String>,
        /// File containing the pubkey, relative to the suite file
        pubkey_file: Option<PathBuf>,
        /// Expected owning program
        owner: Option<String>,
        /// Overrides `timeouts.await_account_secs`
        timeout_secs: Option<u64>,
    },
    /// Call a JSON-RPC method
    Rpc {
        method: String,
        #[serde(default)]
        params: Option<Value>,
        expect_result: Option<Value>,
    },
}

impl StepAction {
    /// Short label used by `list`
    pub fn summary(&self) -> String {
        match self {
            StepAction::Shell { command, .. } => format!("shell: {}", command),
            StepAction::LedgerHealth => "ledger_health".to_string(),
            StepAction::AwaitAccount {
                pubkey, pubkey_file, ..
            } => match (pubkey, pubkey_file) {
                (Some(key), _) => format!("await_account: {}", key),
                (None, Some(file)) => format!("await_account: <{}>", file.display()),
                (None, None) => "await_account".to_string(),
            },
            StepAction::Rpc { method, .. } => format!("rpc: {}", method),
        }
    }
}

/// A validated suite and the directory its relative paths resolve against
#[derive(Debug)]
pub struct LoadedSuite {
    pub definition: SuiteDefinition,
    pub base_dir: PathBuf,
}

impl LoadedSuite {
    /// Load and validate a suite file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        Self::parse(&content, &path.display().to_string(), base_dir)
    }

    /// The bundled 1sol suite, resolved against the current directory
    pub fn bundled() -> Result<Self> {
        Self::parse(BUNDLED_SUITE, "<bundled>", PathBuf::from("."))
    }

    pub fn parse(content: &str, origin: &str, base_dir: PathBuf) -> Result<Self> {
        let definition: SuiteDefinition =
            serde_yaml::from_str(content).map_err(|e| Error::SuiteParse {
                path: origin.to_string(),
                error: e.to_string(),
            })?;
        definition.validate()?;
        Ok(Self {
            definition,
            base_dir,
        })
    }
}

impl SuiteDefinition {
    fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            return Err(Error::EmptySuite);
        }
        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.name.as_str()) {
                return Err(Error::DuplicateStep(step.name.clone()));
            }
        }
        Ok(())
    }
}
