//! Request handlers, one module per resource

pub mod accounts;
pub mod health;
pub mod journal;
pub mod opening;
