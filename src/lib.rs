//! onesol-suite - ordered integration runner for the 1sol swap aggregator
//!
//! The core is [`suite::SuiteRun`]: a strictly sequential runner over named
//! async steps that stops at the first failure and reports an
//! [`suite::Outcome`]. The remaining modules load suite files, adapt the
//! external collaborators into steps and talk to the ledger.

pub mod actions;
pub mod cli;
pub mod commands;
pub mod common;
pub mod ledger;
pub mod suite;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use suite::{Outcome, Step, StepOperation};
