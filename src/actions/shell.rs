//! Shell collaborator steps
//!
//! The pool preparation, protocol initialization and swap scripts live
//! outside this crate. A shell step runs one of them and succeeds when it
//! exits with status 0.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command as TokioCommand;

use crate::common::{Error, Result};
use crate::suite::StepOperation;

/// Lines of stderr kept in a failure message
const STDERR_TAIL_LINES: usize = 20;

/// Runs `sh -c <command>` in a fixed directory
#[derive(Debug, Clone)]
pub struct ShellOperation {
    command: String,
    workdir: PathBuf,
    env: Vec<(String, String)>,
    timeout: Duration,
    verbose: bool,
}

impl ShellOperation {
    pub fn new(command: impl Into<String>, workdir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            workdir: workdir.into(),
            env: Vec::new(),
            timeout,
            verbose: false,
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Stream the child's output instead of capturing it
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

#[async_trait]
impl StepOperation for ShellOperation {
    async fn execute(&self) -> Result<()> {
        if self.verbose {
            println!("  $ {}", self.command);
        }

        let mut command = TokioCommand::new("sh");
        command
            .arg("-c")
            .arg(&self.command)
            .current_dir(&self.workdir)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(if self.verbose {
                Stdio::inherit()
            } else {
                Stdio::null()
            })
            .stderr(if self.verbose {
                Stdio::inherit()
            } else {
                Stdio::piped()
            })
            .kill_on_drop(true);
        // Own group, so a timeout can reach the script's children too
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|e| Error::Spawn {
            command: self.command.clone(),
            source: e,
        })?;
        let pid = child.id();

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                kill_process_group(pid);
                return Err(Error::CommandTimeout {
                    command: self.command.clone(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if output.status.success() {
            return Ok(());
        }

        Err(Error::CommandFailed {
            command: self.command.clone(),
            code: output.status.code(),
            stderr: stderr_tail(&output.stderr),
        })
    }

    fn describe(&self) -> String {
        format!("shell: {}", self.command)
    }
}

/// SIGKILL every process left in the group led by `pid`
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else { return };
    // The group id equals the leader's pid because of process_group(0)
    let result = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if result != 0 {
        tracing::debug!(
            pid,
            error = %std::io::Error::last_os_error(),
            "Process group already gone"
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn op(command: &str) -> ShellOperation {
        ShellOperation::new(command, std::env::temp_dir(), Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_zero_exit_succeeds() {
        op("true").execute().await.unwrap();
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_code_and_stderr() {
        let err = op("echo 'account already initialized' >&2; exit 3")
            .execute()
            .await
            .unwrap_err();
        match err {
            Error::CommandFailed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "account already initialized");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_env_and_workdir_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        ShellOperation::new(
            "test \"$ONESOL_RPC_URL\" = http://localhost:8899 && touch marker",
            dir.path(),
            Duration::from_secs(10),
        )
        .env("ONESOL_RPC_URL", "http://localhost:8899")
        .execute()
        .await
        .unwrap();
        assert!(dir.path().join("marker").exists());
    }

    #[tokio::test]
    async fn test_timeout() {
        let err = ShellOperation::new("sleep 5", std::env::temp_dir(), Duration::from_millis(100))
            .execute()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CommandTimeout { .. }));
    }

    #[tokio::test]
    async fn test_timeout_kills_nested_children() {
        let dir = tempfile::tempdir().unwrap();
        let err = ShellOperation::new(
            "sh -c 'sleep 1; touch marker'; true",
            dir.path(),
            Duration::from_millis(200),
        )
        .execute()
        .await
        .unwrap_err();
        assert!(matches!(err, Error::CommandTimeout { .. }));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(
            !dir.path().join("marker").exists(),
            "child of a timed-out step kept running"
        );
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported_as_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ShellOperation::new("true", dir.path().join("missing"), Duration::from_secs(10))
            .execute()
            .await
            .unwrap_err();
        match err {
            Error::Spawn { command, .. } => assert_eq!(command, "true"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_stderr_tail_keeps_last_lines() {
        let input: String = (0..30).map(|i| format!("line {}\n", i)).collect();
        let tail = stderr_tail(input.as_bytes());
        assert!(tail.starts_with("line 10"));
        assert!(tail.ends_with("line 29"));
    }
}
