//! Test Data Builders
//!
//! Builder patterns for constructing ledger input with sensible defaults.
//! Tests specify only the relevant fields and take defaults for the rest.

use chrono::NaiveDate;
use core_kernel::{AccountId, Money, PartyId};
use domain_ledger::{
    AccountCategory, GeneralLine, NewAccount, OpeningBalanceBatch, SubLedgerOpening,
};

use crate::fixtures::{DateFixtures, IdFixtures};

/// Builder for opening-balance batches
#[derive(Debug, Clone)]
pub struct OpeningBatchBuilder {
    batch: OpeningBalanceBatch,
}

impl Default for OpeningBatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OpeningBatchBuilder {
    /// Creates an empty batch on the standard opening date
    pub fn new() -> Self {
        Self {
            batch: OpeningBalanceBatch::new(DateFixtures::opening_date()),
        }
    }

    /// Sets the batch date
    pub fn on(mut self, date: NaiveDate) -> Self {
        self.batch.date = date;
        self
    }

    /// Adds a general debit line
    pub fn debit(mut self, account_id: AccountId, amount: Money) -> Self {
        self.batch.general_lines.push(GeneralLine::debit(account_id, amount));
        self
    }

    /// Adds a general credit line
    pub fn credit(mut self, account_id: AccountId, amount: Money) -> Self {
        self.batch.general_lines.push(GeneralLine::credit(account_id, amount));
        self
    }

    /// Adds an arbitrary general line
    pub fn general_line(mut self, line: GeneralLine) -> Self {
        self.batch.general_lines.push(line);
        self
    }

    /// Adds a receivable for the standard customer
    pub fn receivable(self, invoice_number: impl Into<String>, amount: Money) -> Self {
        self.receivable_for(IdFixtures::customer_id(), invoice_number, amount)
    }

    /// Adds a receivable for a given customer
    pub fn receivable_for(
        mut self,
        customer: PartyId,
        invoice_number: impl Into<String>,
        amount: Money,
    ) -> Self {
        self.batch
            .receivables
            .push(SubLedgerOpening::new(customer, invoice_number, amount));
        self
    }

    /// Adds a payable for the standard supplier
    pub fn payable(self, invoice_number: impl Into<String>, amount: Money) -> Self {
        self.payable_for(IdFixtures::supplier_id(), invoice_number, amount)
    }

    /// Adds a payable for a given supplier
    pub fn payable_for(
        mut self,
        supplier: PartyId,
        invoice_number: impl Into<String>,
        amount: Money,
    ) -> Self {
        self.batch
            .payables
            .push(SubLedgerOpening::new(supplier, invoice_number, amount));
        self
    }

    /// Builds the batch
    pub fn build(self) -> OpeningBalanceBatch {
        self.batch
    }
}

/// Builder for account definitions
#[derive(Debug, Clone)]
pub struct TestAccountBuilder {
    code: String,
    name: String,
    category: AccountCategory,
    parent_id: Option<AccountId>,
    cash: bool,
}

impl TestAccountBuilder {
    /// Creates a current-asset account with the given code
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            name: format!("Test account {}", code),
            code,
            category: AccountCategory::CurrentAsset,
            parent_id: None,
            cash: false,
        }
    }

    /// Sets the name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the category (and with it the type)
    pub fn category(mut self, category: AccountCategory) -> Self {
        self.category = category;
        self
    }

    /// Sets the parent account
    pub fn under(mut self, parent_id: AccountId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Marks the account as a cash account
    pub fn cash(mut self) -> Self {
        self.cash = true;
        self
    }

    /// Builds the account definition
    pub fn build(self) -> NewAccount {
        let mut account = NewAccount::new(self.code, self.name, self.category);
        if let Some(parent) = self.parent_id {
            account = account.with_parent(parent);
        }
        if self.cash {
            account = account.cash();
        }
        account
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_ledger::AccountType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_batch_builder_defaults() {
        let account = AccountId::new();
        let batch = OpeningBatchBuilder::new()
            .debit(account, Money::new(dec!(10)))
            .receivable("INV-1", Money::new(dec!(5)))
            .build();

        assert_eq!(batch.date, DateFixtures::opening_date());
        assert_eq!(batch.general_lines.len(), 1);
        assert_eq!(batch.receivables[0].party_id, IdFixtures::customer_id());
        assert!(batch.payables.is_empty());
    }

    #[test]
    fn test_account_builder_derives_type_from_category() {
        let account = TestAccountBuilder::new("2999")
            .category(AccountCategory::LongTermLiability)
            .build();
        assert_eq!(account.account_type, AccountType::Liability);
        assert!(account.validate().is_ok());
    }
}
