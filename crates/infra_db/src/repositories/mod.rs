//! Repository implementations for domain entities
//!
//! Repositories encapsulate SQL queries and the row types they return.
//! Mapping rows to domain types is left to the adapters.
//!
//! # Architecture
//!
//! - Runtime-checked queries (`sqlx::query` / `query_as`), so the crate
//!   builds without a live database
//! - Functions take a `PgConnection`, letting callers choose between a
//!   pooled connection and an open transaction

pub mod ledger;
