//! Storage ports for the ledger
//!
//! The domain talks to storage through two traits. [`LedgerStore`] is the
//! long-lived handle shared by request handlers; it serves read-only queries
//! and opens units of work. [`LedgerUnitOfWork`] is one transaction: every
//! write happens through it, and nothing it does is visible to others until
//! [`LedgerUnitOfWork::commit`]. Dropping a unit of work without committing
//! rolls it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{
    AccountId, DomainPort, HealthCheckable, InvoiceId, JournalEntryId, Money, OrderId, PortError,
    UserId,
};
use crate::account::{Account, AccountFilter};
use crate::journal::{JournalEntry, Reference};
use crate::subledger::{Invoice, Order, SubLedgerKind};

#[cfg(any(test, feature = "mock"))]
pub mod memory;

/// Posted debit and credit totals of one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTotals {
    pub account_id: AccountId,
    pub debit: Money,
    pub credit: Money,
}

/// One storage transaction
///
/// Implementations must make all writes atomic: either `commit` succeeds
/// and every write is visible, or none is.
#[async_trait]
pub trait LedgerUnitOfWork: Send {
    // Accounts

    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, PortError>;

    async fn find_account_by_code(&mut self, code: &str) -> Result<Option<Account>, PortError>;

    /// Inserts a new account; a taken code is a `Conflict`
    async fn insert_account(&mut self, account: &Account) -> Result<(), PortError>;

    /// Inserts the account unless its code exists, returning the stored row
    ///
    /// Must be a single atomic statement keyed on the code so concurrent
    /// callers converge on one row.
    async fn upsert_account(&mut self, account: &Account) -> Result<Account, PortError>;

    /// Updates every mutable column; the code is never written
    async fn update_account(&mut self, account: &Account) -> Result<(), PortError>;

    async fn delete_account(&mut self, id: AccountId) -> Result<(), PortError>;

    /// Number of journal lines posting to the account, in any status
    async fn count_lines_for_account(&mut self, id: AccountId) -> Result<u64, PortError>;

    async fn count_child_accounts(&mut self, id: AccountId) -> Result<u64, PortError>;

    // Journal

    /// Writes the entry header and all its lines
    async fn insert_journal_entry(&mut self, entry: &JournalEntry) -> Result<(), PortError>;

    async fn find_journal_entry(
        &mut self,
        id: JournalEntryId,
    ) -> Result<Option<JournalEntry>, PortError>;

    /// Flips a DRAFT entry to POSTED
    async fn mark_entry_posted(
        &mut self,
        id: JournalEntryId,
        posted_by: UserId,
        posted_at: DateTime<Utc>,
    ) -> Result<(), PortError>;

    /// Ids of entries carrying the given document reference
    async fn find_entries_by_reference(
        &mut self,
        reference: &Reference,
    ) -> Result<Vec<JournalEntryId>, PortError>;

    /// Deletes the lines of the given entries, returning the number removed
    async fn delete_journal_lines(&mut self, entries: &[JournalEntryId]) -> Result<u64, PortError>;

    /// Deletes entry headers; their lines must already be gone
    async fn delete_journal_entries(&mut self, entries: &[JournalEntryId])
        -> Result<u64, PortError>;

    // Sub-ledger documents

    /// Inserts an order; a taken order number is a `Conflict`
    async fn insert_order(&mut self, order: &Order) -> Result<(), PortError>;

    /// Inserts an invoice; a taken invoice number is a `Conflict`
    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), PortError>;

    async fn find_order(&mut self, kind: SubLedgerKind, id: OrderId)
        -> Result<Option<Order>, PortError>;

    async fn find_invoice(
        &mut self,
        kind: SubLedgerKind,
        id: InvoiceId,
    ) -> Result<Option<Invoice>, PortError>;

    async fn delete_invoice(&mut self, kind: SubLedgerKind, id: InvoiceId) -> Result<(), PortError>;

    async fn delete_order(&mut self, kind: SubLedgerKind, id: OrderId) -> Result<(), PortError>;

    // Completion

    async fn commit(self) -> Result<(), PortError>;

    async fn rollback(self) -> Result<(), PortError>;
}

/// Shared storage handle for the ledger
#[async_trait]
pub trait LedgerStore: DomainPort + HealthCheckable {
    type UnitOfWork: LedgerUnitOfWork;

    /// Opens a unit of work
    async fn begin(&self) -> Result<Self::UnitOfWork, PortError>;

    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, PortError>;

    async fn find_account_by_code(&self, code: &str) -> Result<Option<Account>, PortError>;

    /// Accounts matching the filter, ordered by (type, code)
    async fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>, PortError>;

    async fn find_journal_entry(&self, id: JournalEntryId)
        -> Result<Option<JournalEntry>, PortError>;

    /// Debit and credit totals over POSTED entries, one row per account with
    /// lines, optionally restricted to one account
    async fn posted_totals(
        &self,
        account: Option<AccountId>,
    ) -> Result<Vec<AccountTotals>, PortError>;

    async fn invoice_number_exists(
        &self,
        kind: SubLedgerKind,
        invoice_number: &str,
    ) -> Result<bool, PortError>;

    async fn order_number_exists(
        &self,
        kind: SubLedgerKind,
        order_number: &str,
    ) -> Result<bool, PortError>;

    /// Opening-balance invoices of one kind, newest first
    async fn list_opening_invoices(&self, kind: SubLedgerKind) -> Result<Vec<Invoice>, PortError>;
}
