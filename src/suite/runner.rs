//! Sequential suite runner
//!
//! Awaits each step to settlement before starting the next one and stops
//! at the first failure. The runner returns a structured [`Outcome`]; mapping
//! it to a process exit status is left to the binary.

use std::fmt;
use std::time::Instant;

use colored::Colorize;

use crate::common::{Error, Result};

use super::step::Step;

/// Prefix of the line announcing a step
pub const START_PREFIX: &str = "Run test:";

/// Line printed once every step has succeeded
pub const SUCCESS_NOTICE: &str = "Success";

/// Lifecycle state of a suite run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    /// Awaiting the step at this index
    Running(usize),
    /// The step at this index failed
    Failed(usize),
    Succeeded,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Failed(_) | RunState::Succeeded)
    }
}

/// Final result of a suite run
#[derive(Debug)]
pub enum Outcome {
    Success {
        steps_run: usize,
    },
    Failure {
        /// Zero-based position of the failing step
        index: usize,
        step: String,
        error: Error,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Process exit status for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Success { .. } => 0,
            Outcome::Failure { .. } => 1,
        }
    }

    /// Number of steps that were started
    pub fn steps_run(&self) -> usize {
        match self {
            Outcome::Success { steps_run } => *steps_run,
            Outcome::Failure { index, .. } => index + 1,
        }
    }

    /// Convert into a `Result`, wrapping a failure with its step name
    pub fn into_result(self) -> Result<usize> {
        match self {
            Outcome::Success { steps_run } => Ok(steps_run),
            Outcome::Failure { step, error, .. } => Err(Error::step_failed(&step, error)),
        }
    }
}

/// A console notice emitted by the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice<'a> {
    Started { index: usize, name: &'a str },
    Succeeded,
}

impl fmt::Display for Notice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Started { name, .. } => write!(f, "{} {}", START_PREFIX, name),
            Notice::Succeeded => f.write_str(SUCCESS_NOTICE),
        }
    }
}

/// Sink for runner notices
pub trait Reporter {
    fn notice(&mut self, notice: Notice<'_>);
}

/// Prints notices to stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn notice(&mut self, notice: Notice<'_>) {
        match notice {
            Notice::Started { name, .. } => {
                println!("{} {}", START_PREFIX.cyan(), name.bold())
            }
            Notice::Succeeded => println!("{}", SUCCESS_NOTICE.green().bold()),
        }
    }
}

/// One execution context over an ordered, non-empty list of steps
///
/// A run is not resumable: calling [`SuiteRun::run`] again after a terminal
/// state starts over from the first step.
#[derive(Debug)]
pub struct SuiteRun {
    steps: Vec<Step>,
    state: RunState,
}

impl SuiteRun {
    pub fn new(steps: Vec<Step>) -> Result<Self> {
        if steps.is_empty() {
            return Err(Error::EmptySuite);
        }
        Ok(Self {
            steps,
            state: RunState::Idle,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Execute every step in order, stopping at the first failure
    pub async fn run(&mut self, reporter: &mut dyn Reporter) -> Outcome {
        let total = self.steps.len();
        self.state = RunState::Idle;
        let started = Instant::now();

        for (index, step) in self.steps.iter().enumerate() {
            self.state = RunState::Running(index);
            reporter.notice(Notice::Started {
                index,
                name: step.name(),
            });
            tracing::debug!(
                step = step.name(),
                index,
                total,
                operation = %step.operation().describe(),
                "Starting step"
            );

            let step_started = Instant::now();
            if let Err(error) = step.operation().execute().await {
                tracing::error!(step = step.name(), index, error = %error, "Step failed");
                self.state = RunState::Failed(index);
                return Outcome::Failure {
                    index,
                    step: step.name().to_string(),
                    error,
                };
            }
            tracing::debug!(
                step = step.name(),
                elapsed_ms = step_started.elapsed().as_millis() as u64,
                "Step completed"
            );
        }

        self.state = RunState::Succeeded;
        reporter.notice(Notice::Succeeded);
        tracing::info!(
            steps = total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Suite passed"
        );
        Outcome::Success { steps_run: total }
    }
}

/// Run a list of steps once
///
/// Fails up front with [`Error::EmptySuite`] when `steps` is empty.
pub async fn run(steps: Vec<Step>, reporter: &mut dyn Reporter) -> Result<Outcome> {
    let mut suite = SuiteRun::new(steps)?;
    Ok(suite.run(reporter).await)
}
