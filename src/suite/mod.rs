//! Ordered integration suite
//!
//! Runs a fixed list of named steps against a deployed swap protocol. Each
//! step is awaited to completion before the next begins, because later steps
//! read the ledger state that earlier ones commit.

mod config;
mod runner;
mod step;

pub use config::*;
pub use runner::{
    run, ConsoleReporter, Notice, Outcome, Reporter, RunState, SuiteRun, START_PREFIX,
    SUCCESS_NOTICE,
};
pub use step::{Step, StepOperation};
