//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for ledger types that give
//! more meaningful error messages than standard assertions.

use core_kernel::{AccountId, Money};
use domain_ledger::ports::memory::LedgerCounts;
use domain_ledger::{ErrorKind, JournalEntry, OperationOutcome, TrialBalance};

/// Asserts that an entry's debits equal its credits exactly
///
/// # Panics
///
/// Panics with both totals if the entry does not balance
pub fn assert_entry_balanced(entry: &JournalEntry) {
    assert!(
        entry.is_balanced(),
        "Journal entry {} is unbalanced: debits={}, credits={}",
        entry.id,
        entry.total_debit(),
        entry.total_credit()
    );
}

/// Asserts that an entry posts `amount` to `account` on the debit side
pub fn assert_debits(entry: &JournalEntry, account: AccountId, amount: Money) {
    let posted: Money = entry
        .lines
        .iter()
        .filter(|line| line.account_id == account)
        .map(|line| line.debit)
        .sum();
    assert_eq!(
        posted, amount,
        "Expected {} debited to {} in entry {}, found {}",
        amount, account, entry.id, posted
    );
}

/// Asserts that an entry posts `amount` to `account` on the credit side
pub fn assert_credits(entry: &JournalEntry, account: AccountId, amount: Money) {
    let posted: Money = entry
        .lines
        .iter()
        .filter(|line| line.account_id == account)
        .map(|line| line.credit)
        .sum();
    assert_eq!(
        posted, amount,
        "Expected {} credited to {} in entry {}, found {}",
        amount, account, entry.id, posted
    );
}

/// Asserts that a trial balance has equal debit and credit columns
pub fn assert_trial_balance_balanced(trial_balance: &TrialBalance) {
    assert!(
        trial_balance.is_balanced,
        "Trial balance is off: debits={}, credits={}",
        trial_balance.total_debits,
        trial_balance.total_credits
    );
    assert_eq!(trial_balance.total_debits, trial_balance.total_credits);
}

/// Asserts that no ledger table changed size
pub fn assert_counts_unchanged(before: &LedgerCounts, after: &LedgerCounts) {
    assert_eq!(
        before, after,
        "Ledger row counts changed: before={:?}, after={:?}",
        before, after
    );
}

/// Asserts that an outcome succeeded and returns its data
///
/// # Panics
///
/// Panics with the error message on failure, or if no data was attached
pub fn assert_outcome_ok<T: std::fmt::Debug>(outcome: OperationOutcome<T>) -> T {
    assert!(
        outcome.success,
        "Expected a successful outcome, got {:?}: {}",
        outcome.error_kind,
        outcome.error.as_deref().unwrap_or("<no message>")
    );
    match outcome.data {
        Some(data) => data,
        None => panic!("Successful outcome carried no data"),
    }
}

/// Asserts that an outcome failed with the given kind and returns the message
pub fn assert_outcome_failed<T: std::fmt::Debug>(
    outcome: OperationOutcome<T>,
    expected: ErrorKind,
) -> String {
    assert!(
        !outcome.success,
        "Expected a {:?} failure, got success with {:?}",
        expected, outcome.data
    );
    assert_eq!(
        outcome.error_kind,
        Some(expected),
        "Wrong failure kind, message: {}",
        outcome.error.as_deref().unwrap_or("<no message>")
    );
    assert!(outcome.data.is_none(), "Failed outcome carried data");
    outcome.error.unwrap_or_default()
}

/// Asserts that a result is Ok and returns the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Asserts that a result is Err and returns the error
#[macro_export]
macro_rules! assert_err {
    ($result:expr) => {
        match $result {
            Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
            Err(e) => e,
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(value) => panic!("{}: got Ok({:?})", $msg, value),
            Err(e) => e,
        }
    };
}

/// Asserts that an error matches a specific variant
#[macro_export]
macro_rules! assert_err_variant {
    ($result:expr, $pattern:pat) => {
        match $result {
            Ok(value) => panic!("Expected Err matching {}, got Ok({:?})", stringify!($pattern), value),
            Err(ref e) => {
                assert!(
                    matches!(e, $pattern),
                    "Error {:?} does not match pattern {}",
                    e,
                    stringify!($pattern)
                );
            }
        }
    };
}
