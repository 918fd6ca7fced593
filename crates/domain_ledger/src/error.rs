//! Ledger domain errors
//!
//! Every public operation reports failure through [`LedgerError`]. Messages
//! are display-ready and only echo identifiers the caller supplied.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{AccountId, JournalEntryId, Money, MoneyError, PortError};

/// Caller-correctable input problems
///
/// These are never retried; the request has to change before it can succeed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A journal entry was submitted without lines
    #[error("Journal entry must contain at least one line")]
    EmptyEntry,

    /// A line points at an account that does not exist
    #[error("Unknown account: {0}")]
    UnknownAccount(AccountId),

    /// A line carries a negative debit or credit
    #[error("Line {line} has a negative amount")]
    NegativeAmount { line: usize },

    /// Debits and credits differ
    #[error("Unbalanced entry: debits={debits}, credits={credits}")]
    UnbalancedEntry { debits: Money, credits: Money },

    /// A parent assignment would break the account tree
    #[error("Invalid account hierarchy: {0}")]
    InvalidHierarchy(String),

    /// Any other malformed input
    #[error("{0}")]
    InvalidInput(String),
}

impl ValidationError {
    /// Creates an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ValidationError::InvalidInput(message.into())
    }
}

/// Errors that can occur in the ledger domain
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// External reference (invoice number, order number, account code) already exists
    #[error("Duplicate reference: {0}")]
    DuplicateReference(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Account still referenced by journal lines
    #[error("Account {0} is referenced by journal lines and cannot be deleted")]
    AccountInUse(String),

    #[error("Journal entry {0} has already been reversed")]
    AlreadyReversed(JournalEntryId),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Calculation error: {0}")]
    Calculation(#[from] MoneyError),

    /// Storage failure or timeout inside an atomic phase
    #[error("Transaction failed: {0}")]
    TransactionFailure(String),
}

impl LedgerError {
    /// Creates a NotFound error
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        LedgerError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates an InvalidOperation error
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        LedgerError::InvalidOperation(message.into())
    }

    /// Returns the coarse error kind used by outer surfaces
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) | LedgerError::Calculation(_) => ErrorKind::Validation,
            LedgerError::DuplicateReference(_) => ErrorKind::DuplicateReference,
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::AccountInUse(_)
            | LedgerError::AlreadyReversed(_)
            | LedgerError::InvalidOperation(_) => ErrorKind::Conflict,
            LedgerError::TransactionFailure(_) => ErrorKind::TransactionFailure,
        }
    }

    /// Returns true for caller-correctable validation failures
    pub fn is_validation(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation)
    }
}

impl From<PortError> for LedgerError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => LedgerError::NotFound {
                entity: entity_type,
                id,
            },
            other => LedgerError::TransactionFailure(other.to_string()),
        }
    }
}

/// Coarse classification of a [`LedgerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    DuplicateReference,
    NotFound,
    Conflict,
    TransactionFailure,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbalanced_message_shows_totals() {
        let error = LedgerError::from(ValidationError::UnbalancedEntry {
            debits: Money::from_minor(100_000),
            credits: Money::from_minor(40_000),
        });
        assert_eq!(
            error.to_string(),
            "Unbalanced entry: debits=1000.00, credits=400.00"
        );
        assert!(error.is_validation());
    }

    #[test]
    fn test_port_conflict_becomes_transaction_failure() {
        let error = LedgerError::from(PortError::conflict("invoice number INV-9 already exists"));
        assert_eq!(error.kind(), ErrorKind::TransactionFailure);
        assert!(error.to_string().contains("INV-9"));
    }

    #[test]
    fn test_port_not_found_keeps_entity() {
        let error = LedgerError::from(PortError::not_found("Account", "1200"));
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.to_string(), "Account not found: 1200");
    }

    #[test]
    fn test_refused_transitions_are_conflicts() {
        assert_eq!(
            LedgerError::AccountInUse("1000".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            LedgerError::invalid_operation("draft").kind(),
            ErrorKind::Conflict
        );
    }
}
