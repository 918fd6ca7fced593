//! In-memory ledger store for tests
//!
//! Units of work are serialized: `begin` takes an exclusive lock on the
//! shared state and works on a private copy. `commit` publishes the copy;
//! dropping the unit of work discards it. The store enforces the same
//! uniqueness and referential rules as the PostgreSQL schema so that
//! failure paths behave alike in both adapters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use core_kernel::{
    AccountId, AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, InvoiceId,
    JournalEntryId, Money, OrderId, PortError, UserId,
};
use crate::account::{Account, AccountFilter, NewAccount};
use crate::journal::{EntryStatus, JournalEntry, Reference};
use crate::ports::{AccountTotals, LedgerStore, LedgerUnitOfWork};
use crate::subledger::{Invoice, Order, SubLedgerKind};

#[derive(Debug, Clone, Default)]
struct LedgerState {
    accounts: HashMap<AccountId, Account>,
    entries: BTreeMap<JournalEntryId, JournalEntry>,
    orders: HashMap<(SubLedgerKind, OrderId), Order>,
    invoices: HashMap<(SubLedgerKind, InvoiceId), Invoice>,
}

impl LedgerState {
    fn account_by_code(&self, code: &str) -> Option<&Account> {
        self.accounts.values().find(|a| a.code == code)
    }

    fn check_parent(&self, account: &Account) -> Result<(), PortError> {
        match account.parent_id {
            Some(parent) if !self.accounts.contains_key(&parent) => Err(PortError::conflict(
                format!("parent account of {} does not exist", account.code),
            )),
            _ => Ok(()),
        }
    }

    fn insert_account(&mut self, account: &Account) -> Result<(), PortError> {
        if self.account_by_code(&account.code).is_some() {
            return Err(PortError::conflict(format!(
                "account code {} already exists",
                account.code
            )));
        }
        self.check_parent(account)?;
        self.accounts.insert(account.id, account.clone());
        Ok(())
    }

    fn lines_for_account(&self, id: AccountId) -> usize {
        self.entries
            .values()
            .flat_map(|e| e.lines.iter())
            .filter(|l| l.account_id == id)
            .count()
    }

    fn entry_ids_by_reference(&self, reference: &Reference) -> Vec<JournalEntryId> {
        self.entries
            .values()
            .filter(|e| &e.document == reference)
            .map(|e| e.id)
            .collect()
    }

    fn counts(&self) -> LedgerCounts {
        LedgerCounts {
            accounts: self.accounts.len(),
            entries: self.entries.len(),
            lines: self.entries.values().map(|e| e.lines.len()).sum(),
            orders: self.orders.len(),
            invoices: self.invoices.len(),
        }
    }
}

/// Row counts of every ledger table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerCounts {
    pub accounts: usize,
    pub entries: usize,
    pub lines: usize,
    pub orders: usize,
    pub invoices: usize,
}

/// In-memory implementation of [`LedgerStore`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<LedgerState>>,
    transactions_begun: Arc<AtomicUsize>,
    failing_invoices: Arc<Mutex<HashSet<String>>>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an account directly, bypassing units of work
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the code is taken or the parent is missing.
    pub async fn seed_account(&self, new_account: NewAccount) -> Result<Account, PortError> {
        let account = new_account.into_account();
        self.state.lock().await.insert_account(&account)?;
        Ok(account)
    }

    /// Makes every later attempt to insert this invoice number fail as if
    /// the connection dropped
    pub async fn fail_invoice_insert(&self, invoice_number: impl Into<String>) {
        self.failing_invoices.lock().await.insert(invoice_number.into());
    }

    /// Number of units of work opened so far
    pub fn transactions_begun(&self) -> usize {
        self.transactions_begun.load(Ordering::SeqCst)
    }

    /// Current committed row counts
    pub async fn counts(&self) -> LedgerCounts {
        self.state.lock().await.counts()
    }
}

impl DomainPort for InMemoryLedgerStore {}

#[async_trait]
impl HealthCheckable for InMemoryLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "in-memory-ledger".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some("In-memory store always healthy".to_string()),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    type UnitOfWork = InMemoryUnitOfWork;

    async fn begin(&self) -> Result<Self::UnitOfWork, PortError> {
        self.transactions_begun.fetch_add(1, Ordering::SeqCst);
        let failing_invoices = self.failing_invoices.lock().await.clone();
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(InMemoryUnitOfWork {
            guard,
            working,
            failing_invoices,
        })
    }

    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, PortError> {
        Ok(self.state.lock().await.accounts.get(&id).cloned())
    }

    async fn find_account_by_code(&self, code: &str) -> Result<Option<Account>, PortError> {
        Ok(self.state.lock().await.account_by_code(code).cloned())
    }

    async fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>, PortError> {
        let state = self.state.lock().await;
        let mut accounts: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        accounts.sort_by(|a, b| {
            a.account_type
                .cmp(&b.account_type)
                .then_with(|| a.code.cmp(&b.code))
        });
        Ok(accounts)
    }

    async fn find_journal_entry(
        &self,
        id: JournalEntryId,
    ) -> Result<Option<JournalEntry>, PortError> {
        Ok(self.state.lock().await.entries.get(&id).cloned())
    }

    async fn posted_totals(
        &self,
        account: Option<AccountId>,
    ) -> Result<Vec<AccountTotals>, PortError> {
        let state = self.state.lock().await;
        let mut totals: BTreeMap<AccountId, (Money, Money)> = BTreeMap::new();

        for line in state
            .entries
            .values()
            .filter(|e| e.status == EntryStatus::Posted)
            .flat_map(|e| e.lines.iter())
            .filter(|l| account.map_or(true, |id| l.account_id == id))
        {
            let slot = totals.entry(line.account_id).or_default();
            slot.0 = slot.0.checked_add(&line.debit).map_err(|e| PortError::internal(e.to_string()))?;
            slot.1 = slot.1.checked_add(&line.credit).map_err(|e| PortError::internal(e.to_string()))?;
        }

        Ok(totals
            .into_iter()
            .map(|(account_id, (debit, credit))| AccountTotals {
                account_id,
                debit,
                credit,
            })
            .collect())
    }

    async fn invoice_number_exists(
        &self,
        kind: SubLedgerKind,
        invoice_number: &str,
    ) -> Result<bool, PortError> {
        let state = self.state.lock().await;
        Ok(state
            .invoices
            .values()
            .any(|i| i.kind == kind && i.invoice_number == invoice_number))
    }

    async fn order_number_exists(
        &self,
        kind: SubLedgerKind,
        order_number: &str,
    ) -> Result<bool, PortError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .values()
            .any(|o| o.kind == kind && o.order_number == order_number))
    }

    async fn list_opening_invoices(&self, kind: SubLedgerKind) -> Result<Vec<Invoice>, PortError> {
        let state = self.state.lock().await;
        let mut invoices: Vec<Invoice> = state
            .invoices
            .values()
            .filter(|i| i.kind == kind && i.is_opening_balance)
            .cloned()
            .collect();
        invoices.sort_by(|a, b| {
            b.invoice_date
                .cmp(&a.invoice_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(invoices)
    }
}

/// Serialized unit of work over [`InMemoryLedgerStore`]
#[derive(Debug)]
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<LedgerState>,
    working: LedgerState,
    failing_invoices: HashSet<String>,
}

#[async_trait]
impl LedgerUnitOfWork for InMemoryUnitOfWork {
    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, PortError> {
        Ok(self.working.accounts.get(&id).cloned())
    }

    async fn find_account_by_code(&mut self, code: &str) -> Result<Option<Account>, PortError> {
        Ok(self.working.account_by_code(code).cloned())
    }

    async fn insert_account(&mut self, account: &Account) -> Result<(), PortError> {
        self.working.insert_account(account)
    }

    async fn upsert_account(&mut self, account: &Account) -> Result<Account, PortError> {
        if let Some(existing) = self.working.account_by_code(&account.code) {
            return Ok(existing.clone());
        }
        self.working.insert_account(account)?;
        Ok(account.clone())
    }

    async fn update_account(&mut self, account: &Account) -> Result<(), PortError> {
        let stored_code = self
            .working
            .accounts
            .get(&account.id)
            .map(|a| a.code.clone())
            .ok_or_else(|| PortError::not_found("Account", &account.code))?;
        if stored_code != account.code {
            return Err(PortError::conflict(format!(
                "account code {} cannot be changed",
                stored_code
            )));
        }
        self.working.check_parent(account)?;
        self.working.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn delete_account(&mut self, id: AccountId) -> Result<(), PortError> {
        if self.working.lines_for_account(id) > 0 {
            return Err(PortError::conflict("account is referenced by journal lines"));
        }
        if self.working.accounts.values().any(|a| a.parent_id == Some(id)) {
            return Err(PortError::conflict("account has child accounts"));
        }
        self.working
            .accounts
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PortError::not_found("Account", id))
    }

    async fn count_lines_for_account(&mut self, id: AccountId) -> Result<u64, PortError> {
        Ok(self.working.lines_for_account(id) as u64)
    }

    async fn count_child_accounts(&mut self, id: AccountId) -> Result<u64, PortError> {
        Ok(self
            .working
            .accounts
            .values()
            .filter(|a| a.parent_id == Some(id))
            .count() as u64)
    }

    async fn insert_journal_entry(&mut self, entry: &JournalEntry) -> Result<(), PortError> {
        if self.working.entries.contains_key(&entry.id) {
            return Err(PortError::conflict(format!("journal entry {} already exists", entry.id)));
        }
        for line in &entry.lines {
            if !self.working.accounts.contains_key(&line.account_id) {
                return Err(PortError::conflict(format!(
                    "journal line {} references a missing account",
                    line.line_no
                )));
            }
            if line.debit.is_negative() || line.credit.is_negative() {
                return Err(PortError::conflict(format!(
                    "journal line {} has a negative amount",
                    line.line_no
                )));
            }
        }
        self.working.entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn find_journal_entry(
        &mut self,
        id: JournalEntryId,
    ) -> Result<Option<JournalEntry>, PortError> {
        Ok(self.working.entries.get(&id).cloned())
    }

    async fn mark_entry_posted(
        &mut self,
        id: JournalEntryId,
        posted_by: UserId,
        posted_at: DateTime<Utc>,
    ) -> Result<(), PortError> {
        let entry = self
            .working
            .entries
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Journal entry", id))?;
        if entry.status == EntryStatus::Draft {
            entry.status = EntryStatus::Posted;
            entry.posted_by = Some(posted_by);
            entry.posted_at = Some(posted_at);
        }
        Ok(())
    }

    async fn find_entries_by_reference(
        &mut self,
        reference: &Reference,
    ) -> Result<Vec<JournalEntryId>, PortError> {
        Ok(self.working.entry_ids_by_reference(reference))
    }

    async fn delete_journal_lines(&mut self, entries: &[JournalEntryId]) -> Result<u64, PortError> {
        let mut removed = 0;
        for id in entries {
            if let Some(entry) = self.working.entries.get_mut(id) {
                removed += entry.lines.len() as u64;
                entry.lines.clear();
            }
        }
        Ok(removed)
    }

    async fn delete_journal_entries(
        &mut self,
        entries: &[JournalEntryId],
    ) -> Result<u64, PortError> {
        if entries
            .iter()
            .filter_map(|id| self.working.entries.get(id))
            .any(|e| !e.lines.is_empty())
        {
            return Err(PortError::conflict("journal entry still has lines"));
        }
        let mut removed = 0;
        for id in entries {
            if self.working.entries.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), PortError> {
        if self
            .working
            .orders
            .values()
            .any(|o| o.kind == order.kind && o.order_number == order.order_number)
        {
            return Err(PortError::conflict(format!(
                "order number {} already exists",
                order.order_number
            )));
        }
        self.working.orders.insert((order.kind, order.id), order.clone());
        Ok(())
    }

    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), PortError> {
        if self.failing_invoices.contains(&invoice.invoice_number) {
            return Err(PortError::connection(format!(
                "connection lost while inserting invoice {}",
                invoice.invoice_number
            )));
        }
        if self
            .working
            .invoices
            .values()
            .any(|i| i.kind == invoice.kind && i.invoice_number == invoice.invoice_number)
        {
            return Err(PortError::conflict(format!(
                "invoice number {} already exists",
                invoice.invoice_number
            )));
        }
        if !self.working.orders.contains_key(&(invoice.kind, invoice.order_id)) {
            return Err(PortError::conflict(format!(
                "invoice {} references a missing order",
                invoice.invoice_number
            )));
        }
        self.working
            .invoices
            .insert((invoice.kind, invoice.id), invoice.clone());
        Ok(())
    }

    async fn find_order(
        &mut self,
        kind: SubLedgerKind,
        id: OrderId,
    ) -> Result<Option<Order>, PortError> {
        Ok(self.working.orders.get(&(kind, id)).cloned())
    }

    async fn find_invoice(
        &mut self,
        kind: SubLedgerKind,
        id: InvoiceId,
    ) -> Result<Option<Invoice>, PortError> {
        Ok(self.working.invoices.get(&(kind, id)).cloned())
    }

    async fn delete_invoice(&mut self, kind: SubLedgerKind, id: InvoiceId) -> Result<(), PortError> {
        self.working
            .invoices
            .remove(&(kind, id))
            .map(|_| ())
            .ok_or_else(|| PortError::not_found(kind.invoice_entity(), id))
    }

    async fn delete_order(&mut self, kind: SubLedgerKind, id: OrderId) -> Result<(), PortError> {
        if self
            .working
            .invoices
            .values()
            .any(|i| i.kind == kind && i.order_id == id)
        {
            return Err(PortError::conflict("order is referenced by an invoice"));
        }
        self.working
            .orders
            .remove(&(kind, id))
            .map(|_| ())
            .ok_or_else(|| PortError::not_found(kind.order_entity(), id))
    }

    async fn commit(self) -> Result<(), PortError> {
        let InMemoryUnitOfWork { mut guard, working, .. } = self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self) -> Result<(), PortError> {
        Ok(())
    }
}
