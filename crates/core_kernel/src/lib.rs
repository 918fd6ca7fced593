//! Core Kernel - Foundational types shared by the ledger crates
//!
//! This crate provides the building blocks used across the workspace:
//! - Money with exact fixed-point decimal arithmetic
//! - Strongly-typed identifiers
//! - Port error and health-check abstractions for storage adapters

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Money, MoneyError, MINOR_UNIT_SCALE};
pub use identifiers::{
    AccountId, JournalEntryId, JournalLineId, InvoiceId, OrderId, PartyId, UserId,
};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
