//! Ledger configuration
//!
//! System account codes and the bounds of the atomic phase. The HTTP layer
//! loads these from the environment; tests build them directly.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::account::{AccountCategory, NewAccount};

/// Codes of the accounts the engine posts to on its own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemAccountCodes {
    /// Equity account absorbing opening-balance offsets
    pub opening_equity: String,
    /// Accounts receivable control account
    pub receivable_control: String,
    /// Accounts payable control account
    pub payable_control: String,
}

impl Default for SystemAccountCodes {
    fn default() -> Self {
        Self {
            opening_equity: "3900".to_string(),
            receivable_control: "1200".to_string(),
            payable_control: "2100".to_string(),
        }
    }
}

/// Ledger engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub system_accounts: SystemAccountCodes,
    /// Upper bound for one opening-balance batch, in seconds
    pub batch_timeout_secs: u64,
    /// Seed the standard manufacturing chart at startup
    pub seed_standard_chart: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            system_accounts: SystemAccountCodes::default(),
            batch_timeout_secs: 30,
            seed_standard_chart: false,
        }
    }
}

impl LedgerConfig {
    /// Timeout for the atomic phase of a batch
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }

    /// Definition used when the opening-balance equity account is first needed
    pub fn opening_equity_account(&self) -> NewAccount {
        NewAccount::new(
            self.system_accounts.opening_equity.clone(),
            "Opening Balance Equity",
            AccountCategory::Capital,
        )
        .with_description("System account offsetting opening balances")
    }
}
