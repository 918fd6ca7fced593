//! Ledger Domain - Double-Entry General Ledger
//!
//! This crate implements the general ledger of a manufacturing ERP: a chart
//! of accounts, a journal engine that only accepts balanced entries, the
//! bridge that ties receivable and payable opening balances to commercial
//! documents, and the orchestrator that seeds a company's opening position
//! in one atomic batch.
//!
//! # Double-Entry Accounting Principles
//!
//! Every financial event is recorded as a journal entry whose lines balance:
//! - Debits increase asset/expense accounts
//! - Credits increase liability/equity/revenue accounts
//! - The sum of all debits equals the sum of all credits, exactly
//!
//! Account balances are never stored; they are derived from posted lines.
//!
//! # Storage
//!
//! Operations run inside a [`LedgerUnitOfWork`] obtained from a
//! [`LedgerStore`]. The PostgreSQL adapter lives in `infra_db`; an in-memory
//! adapter is available behind the `mock` feature.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_ledger::{LedgerService, OpeningBalanceBatch, GeneralLine};
//!
//! let mut batch = OpeningBalanceBatch::new(opening_date);
//! batch.general_lines.push(GeneralLine::debit(cash, Money::new(dec!(1000))));
//! batch.general_lines.push(GeneralLine::credit(loan, Money::new(dec!(400))));
//!
//! let outcome = service.save_opening_balance_batch(batch, user).await;
//! assert!(outcome.success);
//! ```

pub mod account;
pub mod config;
pub mod engine;
pub mod error;
pub mod journal;
pub mod opening;
pub mod ports;
pub mod registry;
pub mod reversal;
pub mod service;
pub mod subledger;

pub use account::{
    Account, AccountCategory, AccountFilter, AccountType, AccountUpdate,
    ManufacturingChartOfAccounts, NewAccount,
};
pub use config::{LedgerConfig, SystemAccountCodes};
pub use error::{ErrorKind, LedgerError, ValidationError};
pub use journal::{
    EntryStatus, JournalEntry, JournalLine, NewJournalEntry, NewJournalLine, PostOutcome,
    Reference,
};
pub use opening::{BatchSummary, GeneralLine, OpeningBalanceBatch, OpeningBalanceOrchestrator};
pub use ports::{AccountTotals, LedgerStore, LedgerUnitOfWork};
pub use registry::{AccountBalance, TrialBalance, TrialBalanceLine};
pub use reversal::DeletedOpening;
pub use service::{LedgerService, OperationOutcome, StaleView, TracingInvalidator, ViewInvalidator};
pub use subledger::{
    Invoice, InvoiceStatus, OpeningDocuments, Order, OrderStatus, SubLedgerKind, SubLedgerOpening,
};
