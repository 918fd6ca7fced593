//! Infrastructure Database Layer
//!
//! This crate provides PostgreSQL persistence for the general ledger using
//! SQLx: pool management, the schema migrations, the SQL repositories, and
//! the adapter that implements the ledger's storage ports.
//!
//! # Architecture
//!
//! The crate follows the repository pattern. Repositories hold the SQL;
//! adapters translate rows into domain types and database errors into
//! `PortError`s.
//!
//! # Integrity
//!
//! The schema enforces the ledger's invariants independently of the
//! application: a deferred constraint trigger rejects unbalanced entries at
//! commit, account codes cannot change once assigned, document numbers are
//! unique, and foreign keys keep lines, accounts and documents consistent.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool_from_url, run_migrations, PostgresLedgerStore};
//!
//! let pool = create_pool_from_url("postgres://localhost/ledger").await?;
//! run_migrations(&pool).await?;
//! let store = PostgresLedgerStore::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{PgUnitOfWork, PostgresLedgerStore};
pub use error::DatabaseError;
pub use pool::{
    create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool,
    DEFAULT_DATABASE_URL,
};
