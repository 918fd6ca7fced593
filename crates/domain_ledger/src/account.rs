//! Account types for the chart of accounts
//!
//! This module defines the account structure for double-entry bookkeeping.
//! Accounts form a tree through `parent_id` and are addressed by a unique,
//! immutable code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::AccountId;
use crate::config::SystemAccountCodes;
use crate::error::ValidationError;

/// Types of accounts in the chart of accounts
///
/// Declaration order is the listing order of the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Asset accounts (debit normal balance)
    Asset,
    /// Liability accounts (credit normal balance)
    Liability,
    /// Equity accounts (credit normal balance)
    Equity,
    /// Revenue accounts (credit normal balance)
    Revenue,
    /// Expense accounts (debit normal balance)
    Expense,
}

impl AccountType {
    /// Returns true if this account type has a debit normal balance
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, AccountType::Asset | AccountType::Expense)
    }

    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "ASSET",
            AccountType::Liability => "LIABILITY",
            AccountType::Equity => "EQUITY",
            AccountType::Revenue => "REVENUE",
            AccountType::Expense => "EXPENSE",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASSET" => Ok(AccountType::Asset),
            "LIABILITY" => Ok(AccountType::Liability),
            "EQUITY" => Ok(AccountType::Equity),
            "REVENUE" => Ok(AccountType::Revenue),
            "EXPENSE" => Ok(AccountType::Expense),
            other => Err(ValidationError::invalid_input(format!(
                "Unknown account type: {}",
                other
            ))),
        }
    }
}

/// Category of account for financial reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountCategory {
    CurrentAsset,
    FixedAsset,
    CurrentLiability,
    LongTermLiability,
    Capital,
    RetainedEarnings,
    OperatingRevenue,
    OtherRevenue,
    CostOfGoodsSold,
    OperatingExpense,
    OtherExpense,
}

impl AccountCategory {
    /// The account type every account in this category must have
    pub fn account_type(&self) -> AccountType {
        match self {
            AccountCategory::CurrentAsset | AccountCategory::FixedAsset => AccountType::Asset,
            AccountCategory::CurrentLiability | AccountCategory::LongTermLiability => {
                AccountType::Liability
            }
            AccountCategory::Capital | AccountCategory::RetainedEarnings => AccountType::Equity,
            AccountCategory::OperatingRevenue | AccountCategory::OtherRevenue => {
                AccountType::Revenue
            }
            AccountCategory::CostOfGoodsSold
            | AccountCategory::OperatingExpense
            | AccountCategory::OtherExpense => AccountType::Expense,
        }
    }

    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountCategory::CurrentAsset => "CURRENT_ASSET",
            AccountCategory::FixedAsset => "FIXED_ASSET",
            AccountCategory::CurrentLiability => "CURRENT_LIABILITY",
            AccountCategory::LongTermLiability => "LONG_TERM_LIABILITY",
            AccountCategory::Capital => "CAPITAL",
            AccountCategory::RetainedEarnings => "RETAINED_EARNINGS",
            AccountCategory::OperatingRevenue => "OPERATING_REVENUE",
            AccountCategory::OtherRevenue => "OTHER_REVENUE",
            AccountCategory::CostOfGoodsSold => "COST_OF_GOODS_SOLD",
            AccountCategory::OperatingExpense => "OPERATING_EXPENSE",
            AccountCategory::OtherExpense => "OTHER_EXPENSE",
        }
    }
}

impl fmt::Display for AccountCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let category = match s {
            "CURRENT_ASSET" => AccountCategory::CurrentAsset,
            "FIXED_ASSET" => AccountCategory::FixedAsset,
            "CURRENT_LIABILITY" => AccountCategory::CurrentLiability,
            "LONG_TERM_LIABILITY" => AccountCategory::LongTermLiability,
            "CAPITAL" => AccountCategory::Capital,
            "RETAINED_EARNINGS" => AccountCategory::RetainedEarnings,
            "OPERATING_REVENUE" => AccountCategory::OperatingRevenue,
            "OTHER_REVENUE" => AccountCategory::OtherRevenue,
            "COST_OF_GOODS_SOLD" => AccountCategory::CostOfGoodsSold,
            "OPERATING_EXPENSE" => AccountCategory::OperatingExpense,
            "OTHER_EXPENSE" => AccountCategory::OtherExpense,
            other => {
                return Err(ValidationError::invalid_input(format!(
                    "Unknown account category: {}",
                    other
                )))
            }
        };
        Ok(category)
    }
}

/// An account in the chart of accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,
    /// Account code (e.g., "1000"), unique and immutable
    pub code: String,
    /// Account name
    pub name: String,
    /// Account type
    pub account_type: AccountType,
    /// Reporting category
    pub category: AccountCategory,
    /// Parent account ID (for hierarchical charts)
    pub parent_id: Option<AccountId>,
    /// Whether the account holds cash or bank balances
    pub is_cash_account: bool,
    /// Whether account is active
    pub is_active: bool,
    /// Description
    pub description: Option<String>,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub category: AccountCategory,
    pub parent_id: Option<AccountId>,
    pub is_cash_account: bool,
    pub description: Option<String>,
}

impl NewAccount {
    /// Creates a new account definition
    ///
    /// # Arguments
    ///
    /// * `code` - Account code
    /// * `name` - Account name
    /// * `category` - Reporting category; the account type follows from it
    pub fn new(code: impl Into<String>, name: impl Into<String>, category: AccountCategory) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type: category.account_type(),
            category,
            parent_id: None,
            is_cash_account: false,
            description: None,
        }
    }

    /// Sets the parent account
    pub fn with_parent(mut self, parent_id: AccountId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Marks the account as a cash account
    pub fn cash(mut self) -> Self {
        self.is_cash_account = true;
        self
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks the definition without touching storage
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank code or name, or a category that
    /// does not belong to the account type.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.code.trim().is_empty() {
            return Err(ValidationError::invalid_input("Account code is required"));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::invalid_input("Account name is required"));
        }
        if self.category.account_type() != self.account_type {
            return Err(ValidationError::invalid_input(format!(
                "Category {} does not belong to account type {}",
                self.category, self.account_type
            )));
        }
        Ok(())
    }

    /// Materializes the account with a fresh identifier
    pub fn into_account(self) -> Account {
        Account {
            id: AccountId::new_v7(),
            code: self.code,
            name: self.name,
            account_type: self.account_type,
            category: self.category,
            parent_id: self.parent_id,
            is_cash_account: self.is_cash_account,
            is_active: true,
            description: self.description,
            created_at: Utc::now(),
        }
    }
}

/// Partial update of an account; the code is deliberately absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub category: Option<AccountCategory>,
    /// `Some(None)` detaches the account from its parent
    pub parent_id: Option<Option<AccountId>>,
    pub is_cash_account: Option<bool>,
    pub is_active: Option<bool>,
    pub description: Option<Option<String>>,
}

impl AccountUpdate {
    /// Applies the changes to an account
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank name or a category of another
    /// account type.
    pub fn apply_to(&self, account: &mut Account) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ValidationError::invalid_input("Account name is required"));
            }
            account.name = name.clone();
        }
        if let Some(category) = self.category {
            if category.account_type() != account.account_type {
                return Err(ValidationError::invalid_input(format!(
                    "Category {} does not belong to account type {}",
                    category, account.account_type
                )));
            }
            account.category = category;
        }
        if let Some(parent_id) = self.parent_id {
            account.parent_id = parent_id;
        }
        if let Some(is_cash) = self.is_cash_account {
            account.is_cash_account = is_cash;
        }
        if let Some(is_active) = self.is_active {
            account.is_active = is_active;
        }
        if let Some(description) = &self.description {
            account.description = description.clone();
        }
        Ok(())
    }
}

/// Listing filter for the chart of accounts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountFilter {
    /// Hide the account with this code
    pub exclude_code: Option<String>,
    /// Only return active accounts
    pub active_only: bool,
}

impl AccountFilter {
    /// Returns true if the account passes the filter
    pub fn matches(&self, account: &Account) -> bool {
        if self.active_only && !account.is_active {
            return false;
        }
        match &self.exclude_code {
            Some(code) => &account.code != code,
            None => true,
        }
    }
}

/// Standard chart of accounts for a discrete manufacturer
pub struct ManufacturingChartOfAccounts;

impl ManufacturingChartOfAccounts {
    /// Creates the standard account definitions
    ///
    /// The receivable and payable control accounts use the configured system
    /// codes. The opening-balance equity account is not part of the chart;
    /// it is created on first use.
    pub fn standard_accounts(codes: &SystemAccountCodes) -> Vec<NewAccount> {
        use AccountCategory::*;

        vec![
            // Assets
            NewAccount::new("1000", "Cash on Hand", CurrentAsset).cash(),
            NewAccount::new("1010", "Bank Accounts", CurrentAsset).cash(),
            NewAccount::new(codes.receivable_control.clone(), "Accounts Receivable", CurrentAsset)
                .with_description("Control account for the receivables sub-ledger"),
            NewAccount::new("1300", "Raw Materials Inventory", CurrentAsset),
            NewAccount::new("1310", "Work in Progress", CurrentAsset),
            NewAccount::new("1320", "Finished Goods Inventory", CurrentAsset),
            NewAccount::new("1500", "Plant and Machinery", FixedAsset),
            NewAccount::new("1510", "Accumulated Depreciation", FixedAsset),
            // Liabilities
            NewAccount::new(codes.payable_control.clone(), "Accounts Payable", CurrentLiability)
                .with_description("Control account for the payables sub-ledger"),
            NewAccount::new("2200", "Accrued Wages", CurrentLiability),
            NewAccount::new("2300", "Taxes Payable", CurrentLiability),
            NewAccount::new("2500", "Equipment Loans", LongTermLiability),
            // Equity
            NewAccount::new("3000", "Share Capital", Capital),
            NewAccount::new("3100", "Retained Earnings", RetainedEarnings),
            // Revenue
            NewAccount::new("4000", "Product Sales", OperatingRevenue),
            NewAccount::new("4100", "Scrap Sales", OtherRevenue),
            // Expenses
            NewAccount::new("5000", "Cost of Goods Sold", CostOfGoodsSold),
            NewAccount::new("5100", "Direct Labor", CostOfGoodsSold),
            NewAccount::new("5200", "Manufacturing Overhead", CostOfGoodsSold),
            NewAccount::new("6000", "Salaries and Wages", OperatingExpense),
            NewAccount::new("6100", "Utilities", OperatingExpense),
            NewAccount::new("6200", "Depreciation Expense", OperatingExpense),
            NewAccount::new("7000", "Interest Expense", OtherExpense),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_account_type_round_trips_through_storage_form() {
        for ty in [
            AccountType::Asset,
            AccountType::Liability,
            AccountType::Equity,
            AccountType::Revenue,
            AccountType::Expense,
        ] {
            assert_eq!(ty.as_str().parse::<AccountType>().unwrap(), ty);
        }
        assert!("BOGUS".parse::<AccountType>().is_err());
    }

    #[test]
    fn test_account_type_orders_like_the_chart() {
        assert!(AccountType::Asset < AccountType::Liability);
        assert!(AccountType::Equity < AccountType::Revenue);
        assert!(AccountType::Revenue < AccountType::Expense);
    }

    #[test]
    fn test_new_account_derives_type_from_category() {
        let account = NewAccount::new("5000", "COGS", AccountCategory::CostOfGoodsSold);
        assert_eq!(account.account_type, AccountType::Expense);
        assert!(account.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_mismatched_category() {
        let mut account = NewAccount::new("1000", "Cash", AccountCategory::CurrentAsset);
        account.account_type = AccountType::Revenue;
        assert!(matches!(
            account.validate(),
            Err(ValidationError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_rejects_blank_code() {
        let account = NewAccount::new("  ", "Cash", AccountCategory::CurrentAsset);
        assert!(account.validate().is_err());
    }

    #[test]
    fn test_update_never_touches_code() {
        let mut account = NewAccount::new("1000", "Cash", AccountCategory::CurrentAsset).into_account();
        let update = AccountUpdate {
            name: Some("Petty Cash".into()),
            is_active: Some(false),
            description: Some(Some("Office float".into())),
            ..Default::default()
        };
        update.apply_to(&mut account).unwrap();
        assert_eq!(account.code, "1000");
        assert_eq!(account.name, "Petty Cash");
        assert!(!account.is_active);
        assert_eq!(account.description.as_deref(), Some("Office float"));
    }

    #[test]
    fn test_filter_excludes_code_and_inactive() {
        let active = NewAccount::new("1000", "Cash", AccountCategory::CurrentAsset).into_account();
        let mut inactive = NewAccount::new("1010", "Bank", AccountCategory::CurrentAsset).into_account();
        inactive.is_active = false;

        let filter = AccountFilter {
            exclude_code: Some("1000".into()),
            active_only: true,
        };
        assert!(!filter.matches(&active));
        assert!(!filter.matches(&inactive));
        assert!(AccountFilter::default().matches(&inactive));
    }

    #[test]
    fn test_standard_chart_uses_configured_control_codes() {
        let codes = SystemAccountCodes::default();
        let chart = ManufacturingChartOfAccounts::standard_accounts(&codes);

        let unique: HashSet<_> = chart.iter().map(|a| a.code.as_str()).collect();
        assert_eq!(unique.len(), chart.len());
        assert!(unique.contains(codes.receivable_control.as_str()));
        assert!(unique.contains(codes.payable_control.as_str()));
        assert!(!unique.contains(codes.opening_equity.as_str()));
        assert!(chart.iter().all(|a| a.validate().is_ok()));
    }
}
