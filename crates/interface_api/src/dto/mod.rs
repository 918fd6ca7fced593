//! Request data transfer objects
//!
//! Responses serialize the ledger types directly; opening-balance batches
//! are accepted in their domain form.

pub mod accounts;
pub mod journal;
