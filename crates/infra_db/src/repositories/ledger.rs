//! Ledger repository implementation
//!
//! SQL access for the chart of accounts, the journal and the sales/purchase
//! documents. Every function takes a `PgConnection` so the same query runs
//! on a pooled connection for reads or inside an open transaction for
//! writes.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use domain_ledger::{Account, Invoice, JournalEntry, Order, SubLedgerKind};

use crate::error::DatabaseError;

const ACCOUNT_COLUMNS: &str = "id, code, name, account_type, category, parent_id, \
     is_cash_account, is_active, description, created_at";

const ENTRY_COLUMNS: &str = "id, entry_date, description, reference, reference_type, \
     reference_id, is_auto_generated, status, created_by, posted_by, posted_at, created_at";

/// Account type as stored in the `account_type` enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "account_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

/// Database row for an account
#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub category: String,
    pub parent_id: Option<Uuid>,
    pub is_cash_account: bool,
    pub is_active: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Database row for a journal entry header
#[derive(Debug, Clone, FromRow)]
pub struct JournalEntryRow {
    pub id: Uuid,
    pub entry_date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub reference_type: String,
    pub reference_id: Option<Uuid>,
    pub is_auto_generated: bool,
    pub status: String,
    pub created_by: Uuid,
    pub posted_by: Option<Uuid>,
    pub posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Database row for a journal line
#[derive(Debug, Clone, FromRow)]
pub struct JournalLineRow {
    pub id: Uuid,
    pub journal_entry_id: Uuid,
    pub line_no: i32,
    pub account_id: Uuid,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: Option<String>,
}

/// Posted totals of one account
#[derive(Debug, Clone, FromRow)]
pub struct AccountTotalsRow {
    pub account_id: Uuid,
    pub debit: Decimal,
    pub credit: Decimal,
}

/// Database row for a sales or purchase order
///
/// `party_id` is the customer or supplier column, aliased.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub party_id: Uuid,
    pub order_date: NaiveDate,
    pub status: String,
    pub total_amount: Decimal,
    pub is_opening_balance: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Database row for a sales or purchase invoice
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub invoice_number: String,
    pub order_id: Uuid,
    pub party_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub status: String,
    pub is_opening_balance: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Table and party column names for one sub-ledger
#[derive(Debug, Clone, Copy)]
pub struct DocumentTables {
    pub orders: &'static str,
    pub invoices: &'static str,
    pub party_column: &'static str,
}

impl DocumentTables {
    pub fn for_kind(kind: SubLedgerKind) -> Self {
        match kind {
            SubLedgerKind::Receivable => Self {
                orders: "sales_orders",
                invoices: "sales_invoices",
                party_column: "customer_id",
            },
            SubLedgerKind::Payable => Self {
                orders: "purchase_orders",
                invoices: "purchase_invoices",
                party_column: "supplier_id",
            },
        }
    }

    fn order_columns(&self) -> String {
        format!(
            "id, order_number, {} AS party_id, order_date, status, total_amount, \
             is_opening_balance, created_by, created_at",
            self.party_column
        )
    }

    fn invoice_columns(&self) -> String {
        format!(
            "id, invoice_number, order_id, {} AS party_id, invoice_date, due_date, \
             total_amount, paid_amount, status, is_opening_balance, created_by, created_at",
            self.party_column
        )
    }
}

impl From<domain_ledger::AccountType> for AccountType {
    fn from(value: domain_ledger::AccountType) -> Self {
        match value {
            domain_ledger::AccountType::Asset => AccountType::Asset,
            domain_ledger::AccountType::Liability => AccountType::Liability,
            domain_ledger::AccountType::Equity => AccountType::Equity,
            domain_ledger::AccountType::Revenue => AccountType::Revenue,
            domain_ledger::AccountType::Expense => AccountType::Expense,
        }
    }
}

impl From<AccountType> for domain_ledger::AccountType {
    fn from(value: AccountType) -> Self {
        match value {
            AccountType::Asset => domain_ledger::AccountType::Asset,
            AccountType::Liability => domain_ledger::AccountType::Liability,
            AccountType::Equity => domain_ledger::AccountType::Equity,
            AccountType::Revenue => domain_ledger::AccountType::Revenue,
            AccountType::Expense => domain_ledger::AccountType::Expense,
        }
    }
}

// =============================================================================
// Accounts
// =============================================================================

pub async fn find_account(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<AccountRow>, DatabaseError> {
    let sql = format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS);
    let row = sqlx::query_as::<_, AccountRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn find_account_by_code(
    conn: &mut PgConnection,
    code: &str,
) -> Result<Option<AccountRow>, DatabaseError> {
    let sql = format!("SELECT {} FROM accounts WHERE code = $1", ACCOUNT_COLUMNS);
    let row = sqlx::query_as::<_, AccountRow>(&sql)
        .bind(code)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// Lists accounts in reporting order: by type, then by code
pub async fn list_accounts(
    conn: &mut PgConnection,
    exclude_code: Option<&str>,
    active_only: bool,
) -> Result<Vec<AccountRow>, DatabaseError> {
    let sql = format!(
        "SELECT {} FROM accounts \
         WHERE ($1::text IS NULL OR code <> $1) AND (NOT $2 OR is_active) \
         ORDER BY account_type, code",
        ACCOUNT_COLUMNS
    );
    let rows = sqlx::query_as::<_, AccountRow>(&sql)
        .bind(exclude_code)
        .bind(active_only)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

pub async fn insert_account(conn: &mut PgConnection, account: &Account) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO accounts (
            id, code, name, account_type, category, parent_id,
            is_cash_account, is_active, description, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(account.id.as_uuid())
    .bind(&account.code)
    .bind(&account.name)
    .bind(AccountType::from(account.account_type))
    .bind(account.category.as_str())
    .bind(account.parent_id.map(|id| *id.as_uuid()))
    .bind(account.is_cash_account)
    .bind(account.is_active)
    .bind(&account.description)
    .bind(account.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Inserts the account or returns the row already holding its code
///
/// The no-op update makes `RETURNING` yield the existing row, and the
/// unique index serializes concurrent callers onto one winner.
pub async fn upsert_account(
    conn: &mut PgConnection,
    account: &Account,
) -> Result<AccountRow, DatabaseError> {
    let sql = format!(
        r#"
        INSERT INTO accounts (
            id, code, name, account_type, category, parent_id,
            is_cash_account, is_active, description, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (code) DO UPDATE SET code = EXCLUDED.code
        RETURNING {}
        "#,
        ACCOUNT_COLUMNS
    );
    let row = sqlx::query_as::<_, AccountRow>(&sql)
        .bind(account.id.as_uuid())
        .bind(&account.code)
        .bind(&account.name)
        .bind(AccountType::from(account.account_type))
        .bind(account.category.as_str())
        .bind(account.parent_id.map(|id| *id.as_uuid()))
        .bind(account.is_cash_account)
        .bind(account.is_active)
        .bind(&account.description)
        .bind(account.created_at)
        .fetch_one(&mut *conn)
        .await?;
    Ok(row)
}

/// Writes every mutable column; `code` is guarded by a trigger
pub async fn update_account(conn: &mut PgConnection, account: &Account) -> Result<(), DatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE accounts
        SET code = $2,
            name = $3,
            account_type = $4,
            category = $5,
            parent_id = $6,
            is_cash_account = $7,
            is_active = $8,
            description = $9
        WHERE id = $1
        "#,
    )
    .bind(account.id.as_uuid())
    .bind(&account.code)
    .bind(&account.name)
    .bind(AccountType::from(account.account_type))
    .bind(account.category.as_str())
    .bind(account.parent_id.map(|id| *id.as_uuid()))
    .bind(account.is_cash_account)
    .bind(account.is_active)
    .bind(&account.description)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Account", &account.code));
    }
    Ok(())
}

pub async fn delete_account(conn: &mut PgConnection, id: Uuid) -> Result<(), DatabaseError> {
    let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Account", id));
    }
    Ok(())
}

pub async fn count_lines_for_account(conn: &mut PgConnection, id: Uuid) -> Result<i64, DatabaseError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM journal_lines WHERE account_id = $1",
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count)
}

pub async fn count_child_accounts(conn: &mut PgConnection, id: Uuid) -> Result<i64, DatabaseError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts WHERE parent_id = $1")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

// =============================================================================
// Journal
// =============================================================================

/// Writes the entry header followed by its lines
///
/// The balance trigger is deferred, so a partially written entry is only
/// rejected at commit.
pub async fn insert_journal_entry(
    conn: &mut PgConnection,
    entry: &JournalEntry,
) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO journal_entries (
            id, entry_date, description, reference, reference_type, reference_id,
            is_auto_generated, status, created_by, posted_by, posted_at, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(entry.id.as_uuid())
    .bind(entry.entry_date)
    .bind(&entry.description)
    .bind(&entry.reference)
    .bind(entry.document.type_code())
    .bind(entry.document.target_id())
    .bind(entry.is_auto_generated)
    .bind(entry.status.as_str())
    .bind(entry.created_by.as_uuid())
    .bind(entry.posted_by.map(|id| *id.as_uuid()))
    .bind(entry.posted_at)
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await?;

    for line in &entry.lines {
        let line_no = i32::try_from(line.line_no).map_err(|_| {
            DatabaseError::ConstraintViolation(format!("line number {} out of range", line.line_no))
        })?;
        sqlx::query(
            r#"
            INSERT INTO journal_lines (
                id, journal_entry_id, line_no, account_id, debit, credit, description
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(line.id.as_uuid())
        .bind(entry.id.as_uuid())
        .bind(line_no)
        .bind(line.account_id.as_uuid())
        .bind(line.debit.amount())
        .bind(line.credit.amount())
        .bind(&line.description)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Loads an entry header and its lines in line order
pub async fn find_journal_entry(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<(JournalEntryRow, Vec<JournalLineRow>)>, DatabaseError> {
    let sql = format!("SELECT {} FROM journal_entries WHERE id = $1", ENTRY_COLUMNS);
    let header = sqlx::query_as::<_, JournalEntryRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(header) = header else {
        return Ok(None);
    };

    let lines = sqlx::query_as::<_, JournalLineRow>(
        r#"
        SELECT id, journal_entry_id, line_no, account_id, debit, credit, description
        FROM journal_lines
        WHERE journal_entry_id = $1
        ORDER BY line_no
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some((header, lines)))
}

/// Flips a DRAFT entry to POSTED
pub async fn mark_entry_posted(
    conn: &mut PgConnection,
    id: Uuid,
    posted_by: Uuid,
    posted_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE journal_entries
        SET status = 'POSTED', posted_by = $2, posted_at = $3
        WHERE id = $1 AND status = 'DRAFT'
        "#,
    )
    .bind(id)
    .bind(posted_by)
    .bind(posted_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Draft journal entry", id));
    }
    Ok(())
}

pub async fn find_entries_by_reference(
    conn: &mut PgConnection,
    reference_type: &str,
    reference_id: Option<Uuid>,
) -> Result<Vec<Uuid>, DatabaseError> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id FROM journal_entries
        WHERE reference_type = $1 AND reference_id IS NOT DISTINCT FROM $2
        ORDER BY created_at, id
        "#,
    )
    .bind(reference_type)
    .bind(reference_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(ids)
}

pub async fn delete_journal_lines(conn: &mut PgConnection, entries: &[Uuid]) -> Result<u64, DatabaseError> {
    let result = sqlx::query("DELETE FROM journal_lines WHERE journal_entry_id = ANY($1)")
        .bind(entries)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_journal_entries(
    conn: &mut PgConnection,
    entries: &[Uuid],
) -> Result<u64, DatabaseError> {
    let result = sqlx::query("DELETE FROM journal_entries WHERE id = ANY($1)")
        .bind(entries)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Sums debits and credits over POSTED entries, per account
pub async fn posted_totals(
    conn: &mut PgConnection,
    account_id: Option<Uuid>,
) -> Result<Vec<AccountTotalsRow>, DatabaseError> {
    let rows = sqlx::query_as::<_, AccountTotalsRow>(
        r#"
        SELECT l.account_id,
               COALESCE(SUM(l.debit), 0) AS debit,
               COALESCE(SUM(l.credit), 0) AS credit
        FROM journal_lines l
        JOIN journal_entries e ON e.id = l.journal_entry_id
        WHERE e.status = 'POSTED'
          AND ($1::uuid IS NULL OR l.account_id = $1)
        GROUP BY l.account_id
        ORDER BY l.account_id
        "#,
    )
    .bind(account_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

// =============================================================================
// Sales and purchase documents
// =============================================================================

pub async fn insert_order(conn: &mut PgConnection, order: &Order) -> Result<(), DatabaseError> {
    let tables = DocumentTables::for_kind(order.kind);
    let sql = format!(
        r#"
        INSERT INTO {} (
            id, order_number, {}, order_date, status, total_amount,
            is_opening_balance, created_by, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
        tables.orders, tables.party_column
    );
    sqlx::query(&sql)
        .bind(order.id.as_uuid())
        .bind(&order.order_number)
        .bind(order.party_id.as_uuid())
        .bind(order.order_date)
        .bind(order.status.as_str())
        .bind(order.total_amount.amount())
        .bind(order.is_opening_balance)
        .bind(order.created_by.as_uuid())
        .bind(order.created_at)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn insert_invoice(conn: &mut PgConnection, invoice: &Invoice) -> Result<(), DatabaseError> {
    let tables = DocumentTables::for_kind(invoice.kind);
    let sql = format!(
        r#"
        INSERT INTO {} (
            id, invoice_number, order_id, {}, invoice_date, due_date, total_amount,
            paid_amount, status, is_opening_balance, created_by, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
        tables.invoices, tables.party_column
    );
    sqlx::query(&sql)
        .bind(invoice.id.as_uuid())
        .bind(&invoice.invoice_number)
        .bind(invoice.order_id.as_uuid())
        .bind(invoice.party_id.as_uuid())
        .bind(invoice.invoice_date)
        .bind(invoice.due_date)
        .bind(invoice.total_amount.amount())
        .bind(invoice.paid_amount.amount())
        .bind(invoice.status.as_str())
        .bind(invoice.is_opening_balance)
        .bind(invoice.created_by.as_uuid())
        .bind(invoice.created_at)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn find_order(
    conn: &mut PgConnection,
    kind: SubLedgerKind,
    id: Uuid,
) -> Result<Option<OrderRow>, DatabaseError> {
    let tables = DocumentTables::for_kind(kind);
    let sql = format!(
        "SELECT {} FROM {} WHERE id = $1",
        tables.order_columns(),
        tables.orders
    );
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn find_invoice(
    conn: &mut PgConnection,
    kind: SubLedgerKind,
    id: Uuid,
) -> Result<Option<InvoiceRow>, DatabaseError> {
    let tables = DocumentTables::for_kind(kind);
    let sql = format!(
        "SELECT {} FROM {} WHERE id = $1",
        tables.invoice_columns(),
        tables.invoices
    );
    let row = sqlx::query_as::<_, InvoiceRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn delete_invoice(
    conn: &mut PgConnection,
    kind: SubLedgerKind,
    id: Uuid,
) -> Result<(), DatabaseError> {
    let tables = DocumentTables::for_kind(kind);
    let sql = format!("DELETE FROM {} WHERE id = $1", tables.invoices);
    let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found(kind.invoice_entity(), id));
    }
    Ok(())
}

pub async fn delete_order(
    conn: &mut PgConnection,
    kind: SubLedgerKind,
    id: Uuid,
) -> Result<(), DatabaseError> {
    let tables = DocumentTables::for_kind(kind);
    let sql = format!("DELETE FROM {} WHERE id = $1", tables.orders);
    let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found(kind.order_entity(), id));
    }
    Ok(())
}

pub async fn invoice_number_exists(
    conn: &mut PgConnection,
    kind: SubLedgerKind,
    invoice_number: &str,
) -> Result<bool, DatabaseError> {
    let tables = DocumentTables::for_kind(kind);
    let sql = format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE invoice_number = $1)",
        tables.invoices
    );
    let exists = sqlx::query_scalar::<_, bool>(&sql)
        .bind(invoice_number)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

pub async fn order_number_exists(
    conn: &mut PgConnection,
    kind: SubLedgerKind,
    order_number: &str,
) -> Result<bool, DatabaseError> {
    let tables = DocumentTables::for_kind(kind);
    let sql = format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE order_number = $1)",
        tables.orders
    );
    let exists = sqlx::query_scalar::<_, bool>(&sql)
        .bind(order_number)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

/// Opening-balance invoices, newest first
pub async fn list_opening_invoices(
    conn: &mut PgConnection,
    kind: SubLedgerKind,
) -> Result<Vec<InvoiceRow>, DatabaseError> {
    let tables = DocumentTables::for_kind(kind);
    let sql = format!(
        "SELECT {} FROM {} WHERE is_opening_balance ORDER BY created_at DESC, invoice_number",
        tables.invoice_columns(),
        tables.invoices
    );
    let rows = sqlx::query_as::<_, InvoiceRow>(&sql)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_tables_per_kind() {
        let sales = DocumentTables::for_kind(SubLedgerKind::Receivable);
        assert_eq!(sales.invoices, "sales_invoices");
        assert_eq!(sales.party_column, "customer_id");

        let purchases = DocumentTables::for_kind(SubLedgerKind::Payable);
        assert_eq!(purchases.orders, "purchase_orders");
        assert!(purchases.invoice_columns().contains("supplier_id AS party_id"));
    }

    #[test]
    fn test_account_type_conversion_roundtrip() {
        for account_type in [
            domain_ledger::AccountType::Asset,
            domain_ledger::AccountType::Liability,
            domain_ledger::AccountType::Equity,
            domain_ledger::AccountType::Revenue,
            domain_ledger::AccountType::Expense,
        ] {
            let stored = AccountType::from(account_type);
            assert_eq!(domain_ledger::AccountType::from(stored), account_type);
        }
    }
}
