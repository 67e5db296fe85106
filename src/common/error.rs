//! Error types for the suite runner
//!
//! Step operations surface every failure through this one enum; the runner
//! never inspects the variant, it only carries the error to the process
//! boundary.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the suite runner
#[derive(Error, Debug)]
pub enum Error {
    // === Suite Errors ===
    #[error("Suite has no steps. Add at least one entry under 'steps'")]
    EmptySuite,

    #[error("Duplicate step name '{0}' in suite")]
    DuplicateStep(String),

    #[error("Step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<Error>,
    },

    // === Collaborator Errors ===
    #[error("Command '{command}' exited with code {code:?}{}", format_stderr(.stderr))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Command '{command}' timed out after {secs} seconds")]
    CommandTimeout { command: String, secs: u64 },

    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// Failure reported by a custom [`crate::StepOperation`]
    #[error("{0}")]
    Collaborator(String),

    // === Ledger Errors ===
    #[error("Ledger transport error: {0}")]
    Transport(String),

    #[error("Ledger RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Ledger is unhealthy: {0}")]
    Unhealthy(String),

    #[error("Account {pubkey} did not appear within {waited:?}")]
    AccountTimeout {
        pubkey: String,
        waited: std::time::Duration,
    },

    #[error("Account {pubkey} is owned by {actual}, expected {expected}")]
    AccountOwner {
        pubkey: String,
        expected: String,
        actual: String,
    },

    #[error("Unexpected RPC result for '{method}': expected {expected}, got {actual}")]
    UnexpectedResult {
        method: String,
        expected: String,
        actual: String,
    },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Invalid suite file '{path}': {error}")]
    SuiteParse { path: String, error: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

impl Error {
    /// Wrap a step's error with the name of the step that raised it
    pub fn step_failed(step: &str, source: Error) -> Self {
        Self::StepFailed {
            step: step.to_string(),
            source: Box::new(source),
        }
    }

    /// Create a file read error for a path
    pub fn file_read(path: &std::path::Path, error: io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
