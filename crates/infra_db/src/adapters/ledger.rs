//! PostgreSQL Ledger Adapter
//!
//! This module provides the database adapter for the ledger domain,
//! implementing `LedgerStore` and `LedgerUnitOfWork` on top of the
//! functions in `repositories::ledger`.
//!
//! # Overview
//!
//! - `PostgresLedgerStore` owns the pool and serves read-only queries on
//!   pooled connections
//! - `PgUnitOfWork` wraps one database transaction; dropping it without
//!   `commit` rolls the transaction back
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresLedgerStore;
//! use domain_ledger::{LedgerService, LedgerConfig};
//! use std::sync::Arc;
//!
//! let store = Arc::new(PostgresLedgerStore::new(pool));
//! let service = LedgerService::new(store, LedgerConfig::default());
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use core_kernel::{
    AccountId, AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, InvoiceId,
    JournalEntryId, JournalLineId, Money, OrderId, PartyId, PortError, UserId,
};
use domain_ledger::{
    Account, AccountCategory, AccountFilter, AccountTotals, EntryStatus, Invoice, InvoiceStatus,
    JournalEntry, JournalLine, LedgerStore, LedgerUnitOfWork, Order, OrderStatus, Reference,
    SubLedgerKind,
};

use crate::error::DatabaseError;
use crate::repositories::ledger::{
    self as repo, AccountRow, AccountTotalsRow, InvoiceRow, JournalEntryRow, JournalLineRow,
    OrderRow,
};

const ADAPTER_ID: &str = "postgres-ledger-store";

/// PostgreSQL-backed ledger store
///
/// # Error Handling
///
/// Database errors are translated to `PortError` variants:
/// - `DatabaseError::NotFound` -> `PortError::NotFound`
/// - Unique, foreign key and check violations -> `PortError::Conflict`
/// - Connection failures -> `PortError::Connection`
/// - Other errors -> `PortError::Internal`
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    /// Creates a new store over the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn acquire(&self) -> Result<PoolConnection<Postgres>, PortError> {
        Ok(self.pool.acquire().await.map_err(DatabaseError::from)?)
    }
}

// Mark as a domain port
impl DomainPort for PostgresLedgerStore {}

#[async_trait]
impl HealthCheckable for PostgresLedgerStore {
    /// Checks database connectivity with `SELECT 1`
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    type UnitOfWork = PgUnitOfWork;

    async fn begin(&self) -> Result<PgUnitOfWork, PortError> {
        let tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        Ok(PgUnitOfWork { tx })
    }

    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, PortError> {
        let mut conn = self.acquire().await?;
        repo::find_account(&mut conn, *id.as_uuid())
            .await?
            .map(row_to_account)
            .transpose()
    }

    async fn find_account_by_code(&self, code: &str) -> Result<Option<Account>, PortError> {
        let mut conn = self.acquire().await?;
        repo::find_account_by_code(&mut conn, code)
            .await?
            .map(row_to_account)
            .transpose()
    }

    #[instrument(skip(self))]
    async fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>, PortError> {
        let mut conn = self.acquire().await?;
        let rows =
            repo::list_accounts(&mut conn, filter.exclude_code.as_deref(), filter.active_only)
                .await?;
        debug!(count = rows.len(), "Listed accounts");
        rows.into_iter().map(row_to_account).collect()
    }

    async fn find_journal_entry(
        &self,
        id: JournalEntryId,
    ) -> Result<Option<JournalEntry>, PortError> {
        let mut conn = self.acquire().await?;
        repo::find_journal_entry(&mut conn, *id.as_uuid())
            .await?
            .map(|(header, lines)| rows_to_entry(header, lines))
            .transpose()
    }

    #[instrument(skip(self))]
    async fn posted_totals(
        &self,
        account: Option<AccountId>,
    ) -> Result<Vec<AccountTotals>, PortError> {
        let mut conn = self.acquire().await?;
        let rows = repo::posted_totals(&mut conn, account.map(|id| *id.as_uuid())).await?;
        Ok(rows.into_iter().map(row_to_totals).collect())
    }

    async fn invoice_number_exists(
        &self,
        kind: SubLedgerKind,
        invoice_number: &str,
    ) -> Result<bool, PortError> {
        let mut conn = self.acquire().await?;
        Ok(repo::invoice_number_exists(&mut conn, kind, invoice_number).await?)
    }

    async fn order_number_exists(
        &self,
        kind: SubLedgerKind,
        order_number: &str,
    ) -> Result<bool, PortError> {
        let mut conn = self.acquire().await?;
        Ok(repo::order_number_exists(&mut conn, kind, order_number).await?)
    }

    #[instrument(skip(self), fields(kind = %kind))]
    async fn list_opening_invoices(&self, kind: SubLedgerKind) -> Result<Vec<Invoice>, PortError> {
        let mut conn = self.acquire().await?;
        repo::list_opening_invoices(&mut conn, kind)
            .await?
            .into_iter()
            .map(|row| row_to_invoice(kind, row))
            .collect()
    }
}

/// One database transaction
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerUnitOfWork for PgUnitOfWork {
    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, PortError> {
        repo::find_account(&mut self.tx, *id.as_uuid())
            .await?
            .map(row_to_account)
            .transpose()
    }

    async fn find_account_by_code(&mut self, code: &str) -> Result<Option<Account>, PortError> {
        repo::find_account_by_code(&mut self.tx, code)
            .await?
            .map(row_to_account)
            .transpose()
    }

    async fn insert_account(&mut self, account: &Account) -> Result<(), PortError> {
        Ok(repo::insert_account(&mut self.tx, account).await?)
    }

    async fn upsert_account(&mut self, account: &Account) -> Result<Account, PortError> {
        row_to_account(repo::upsert_account(&mut self.tx, account).await?)
    }

    async fn update_account(&mut self, account: &Account) -> Result<(), PortError> {
        Ok(repo::update_account(&mut self.tx, account).await?)
    }

    async fn delete_account(&mut self, id: AccountId) -> Result<(), PortError> {
        Ok(repo::delete_account(&mut self.tx, *id.as_uuid()).await?)
    }

    async fn count_lines_for_account(&mut self, id: AccountId) -> Result<u64, PortError> {
        let count = repo::count_lines_for_account(&mut self.tx, *id.as_uuid()).await?;
        Ok(count.max(0) as u64)
    }

    async fn count_child_accounts(&mut self, id: AccountId) -> Result<u64, PortError> {
        let count = repo::count_child_accounts(&mut self.tx, *id.as_uuid()).await?;
        Ok(count.max(0) as u64)
    }

    #[instrument(skip(self, entry), fields(entry_id = %entry.id, lines = entry.lines.len()))]
    async fn insert_journal_entry(&mut self, entry: &JournalEntry) -> Result<(), PortError> {
        repo::insert_journal_entry(&mut self.tx, entry).await?;
        debug!("Journal entry written");
        Ok(())
    }

    async fn find_journal_entry(
        &mut self,
        id: JournalEntryId,
    ) -> Result<Option<JournalEntry>, PortError> {
        repo::find_journal_entry(&mut self.tx, *id.as_uuid())
            .await?
            .map(|(header, lines)| rows_to_entry(header, lines))
            .transpose()
    }

    async fn mark_entry_posted(
        &mut self,
        id: JournalEntryId,
        posted_by: UserId,
        posted_at: DateTime<Utc>,
    ) -> Result<(), PortError> {
        Ok(repo::mark_entry_posted(&mut self.tx, *id.as_uuid(), *posted_by.as_uuid(), posted_at)
            .await?)
    }

    async fn find_entries_by_reference(
        &mut self,
        reference: &Reference,
    ) -> Result<Vec<JournalEntryId>, PortError> {
        let ids = repo::find_entries_by_reference(
            &mut self.tx,
            reference.type_code(),
            reference.target_id(),
        )
        .await?;
        Ok(ids.into_iter().map(JournalEntryId::from_uuid).collect())
    }

    async fn delete_journal_lines(&mut self, entries: &[JournalEntryId]) -> Result<u64, PortError> {
        let ids = entry_uuids(entries);
        Ok(repo::delete_journal_lines(&mut self.tx, &ids).await?)
    }

    async fn delete_journal_entries(
        &mut self,
        entries: &[JournalEntryId],
    ) -> Result<u64, PortError> {
        let ids = entry_uuids(entries);
        Ok(repo::delete_journal_entries(&mut self.tx, &ids).await?)
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), PortError> {
        Ok(repo::insert_order(&mut self.tx, order).await?)
    }

    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), PortError> {
        Ok(repo::insert_invoice(&mut self.tx, invoice).await?)
    }

    async fn find_order(
        &mut self,
        kind: SubLedgerKind,
        id: OrderId,
    ) -> Result<Option<Order>, PortError> {
        repo::find_order(&mut self.tx, kind, *id.as_uuid())
            .await?
            .map(|row| row_to_order(kind, row))
            .transpose()
    }

    async fn find_invoice(
        &mut self,
        kind: SubLedgerKind,
        id: InvoiceId,
    ) -> Result<Option<Invoice>, PortError> {
        repo::find_invoice(&mut self.tx, kind, *id.as_uuid())
            .await?
            .map(|row| row_to_invoice(kind, row))
            .transpose()
    }

    async fn delete_invoice(&mut self, kind: SubLedgerKind, id: InvoiceId) -> Result<(), PortError> {
        Ok(repo::delete_invoice(&mut self.tx, kind, *id.as_uuid()).await?)
    }

    async fn delete_order(&mut self, kind: SubLedgerKind, id: OrderId) -> Result<(), PortError> {
        Ok(repo::delete_order(&mut self.tx, kind, *id.as_uuid()).await?)
    }

    async fn commit(self) -> Result<(), PortError> {
        // Deferred balance checks fire here
        self.tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), PortError> {
        self.tx.rollback().await.map_err(DatabaseError::from)?;
        Ok(())
    }
}

fn entry_uuids(entries: &[JournalEntryId]) -> Vec<uuid::Uuid> {
    entries.iter().map(|id| *id.as_uuid()).collect()
}

fn corrupt(what: &str, detail: impl std::fmt::Display) -> PortError {
    PortError::from(DatabaseError::SerializationError(format!("{}: {}", what, detail)))
}

fn row_to_account(row: AccountRow) -> Result<Account, PortError> {
    let category = row
        .category
        .parse::<AccountCategory>()
        .map_err(|e| corrupt("account category", e))?;

    Ok(Account {
        id: AccountId::from_uuid(row.id),
        code: row.code,
        name: row.name,
        account_type: row.account_type.into(),
        category,
        parent_id: row.parent_id.map(AccountId::from_uuid),
        is_cash_account: row.is_cash_account,
        is_active: row.is_active,
        description: row.description,
        created_at: row.created_at,
    })
}

fn rows_to_entry(header: JournalEntryRow, lines: Vec<JournalLineRow>) -> Result<JournalEntry, PortError> {
    let document = Reference::from_parts(&header.reference_type, header.reference_id)
        .map_err(|e| corrupt("journal entry reference", e))?;
    let status = header
        .status
        .parse::<EntryStatus>()
        .map_err(|e| corrupt("journal entry status", e))?;

    let lines = lines
        .into_iter()
        .map(|line| {
            let line_no = u32::try_from(line.line_no)
                .map_err(|_| corrupt("journal line number", line.line_no))?;
            Ok(JournalLine {
                id: JournalLineId::from_uuid(line.id),
                line_no,
                account_id: AccountId::from_uuid(line.account_id),
                debit: Money::new(line.debit),
                credit: Money::new(line.credit),
                description: line.description,
            })
        })
        .collect::<Result<Vec<_>, PortError>>()?;

    Ok(JournalEntry {
        id: JournalEntryId::from_uuid(header.id),
        entry_date: header.entry_date,
        description: header.description,
        reference: header.reference,
        document,
        is_auto_generated: header.is_auto_generated,
        created_by: UserId::from_uuid(header.created_by),
        status,
        posted_by: header.posted_by.map(UserId::from_uuid),
        posted_at: header.posted_at,
        created_at: header.created_at,
        lines,
    })
}

fn row_to_totals(row: AccountTotalsRow) -> AccountTotals {
    AccountTotals {
        account_id: AccountId::from_uuid(row.account_id),
        debit: Money::new(row.debit),
        credit: Money::new(row.credit),
    }
}

fn row_to_order(kind: SubLedgerKind, row: OrderRow) -> Result<Order, PortError> {
    let status = row.status.parse::<OrderStatus>().map_err(|e| corrupt("order status", e))?;
    Ok(Order {
        id: OrderId::from_uuid(row.id),
        kind,
        order_number: row.order_number,
        party_id: PartyId::from_uuid(row.party_id),
        order_date: row.order_date,
        status,
        total_amount: Money::new(row.total_amount),
        is_opening_balance: row.is_opening_balance,
        created_by: UserId::from_uuid(row.created_by),
        created_at: row.created_at,
    })
}

fn row_to_invoice(kind: SubLedgerKind, row: InvoiceRow) -> Result<Invoice, PortError> {
    let status = row
        .status
        .parse::<InvoiceStatus>()
        .map_err(|e| corrupt("invoice status", e))?;
    Ok(Invoice {
        id: InvoiceId::from_uuid(row.id),
        kind,
        invoice_number: row.invoice_number,
        order_id: OrderId::from_uuid(row.order_id),
        party_id: PartyId::from_uuid(row.party_id),
        invoice_date: row.invoice_date,
        due_date: row.due_date,
        total_amount: Money::new(row.total_amount),
        paid_amount: Money::new(row.paid_amount),
        status,
        is_opening_balance: row.is_opening_balance,
        created_by: UserId::from_uuid(row.created_by),
        created_at: row.created_at,
    })
}
