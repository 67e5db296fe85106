//! Ledger access for steps that check on-chain state

mod client;

pub use client::{AccountSummary, LedgerClient};

#[cfg(test)]
pub(crate) use client::tests as test_support;
