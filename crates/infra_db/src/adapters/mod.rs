//! Domain Adapters
//!
//! This module provides adapter implementations for domain ports,
//! connecting domain interfaces to the PostgreSQL database layer.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresLedgerStore;
//! use domain_ledger::LedgerStore;
//!
//! let store = PostgresLedgerStore::new(pool);
//! let accounts = store.list_accounts(&AccountFilter::default()).await?;
//! ```

pub mod ledger;

pub use ledger::{PgUnitOfWork, PostgresLedgerStore};
