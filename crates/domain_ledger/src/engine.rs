//! Journal engine
//!
//! Validates and persists balanced journal entries and moves them from
//! DRAFT to POSTED. Every function here runs inside a unit of work supplied
//! by the caller and never opens one of its own.

use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, warn};

use core_kernel::{JournalEntryId, UserId};
use crate::error::{LedgerError, ValidationError};
use crate::journal::{JournalEntry, NewJournalEntry, PostOutcome, EntryStatus};
use crate::ports::{LedgerStore, LedgerUnitOfWork};

/// Validates and stores a new DRAFT entry
///
/// Validation runs in a fixed order: an empty line list, then unknown
/// accounts, then negative amounts, then the balance check. The first
/// failure wins.
///
/// # Arguments
///
/// * `uow` - The caller's unit of work
/// * `input` - Entry header and lines
///
/// # Errors
///
/// Returns `Validation` for the checks above and `TransactionFailure` if
/// storage rejects the write.
pub async fn create_journal_entry<U: LedgerUnitOfWork>(
    uow: &mut U,
    input: NewJournalEntry,
) -> Result<JournalEntry, LedgerError> {
    if input.lines.is_empty() {
        return Err(ValidationError::EmptyEntry.into());
    }

    let mut resolved = HashSet::new();
    for line in &input.lines {
        if resolved.insert(line.account_id) && uow.find_account(line.account_id).await?.is_none() {
            return Err(ValidationError::UnknownAccount(line.account_id).into());
        }
    }

    if let Some(line) = input.first_negative_line() {
        return Err(ValidationError::NegativeAmount { line }.into());
    }

    let (debits, credits) = input.totals()?;
    if debits != credits {
        return Err(ValidationError::UnbalancedEntry { debits, credits }.into());
    }

    let entry = input.into_draft();
    uow.insert_journal_entry(&entry).await?;

    debug!(
        entry_id = %entry.id,
        document = %entry.document,
        lines = entry.lines.len(),
        amount = %debits,
        "Journal entry created"
    );

    Ok(entry)
}

/// Posts an entry
///
/// Posting an entry that is already POSTED changes nothing and reports
/// [`PostOutcome::AlreadyPosted`]. Lines are not re-validated.
///
/// # Errors
///
/// Returns `NotFound` if the entry does not exist.
pub async fn post_journal<U: LedgerUnitOfWork>(
    uow: &mut U,
    entry_id: JournalEntryId,
    posted_by: UserId,
) -> Result<PostOutcome, LedgerError> {
    let mut entry = uow
        .find_journal_entry(entry_id)
        .await?
        .ok_or_else(|| LedgerError::not_found("Journal entry", entry_id))?;

    if entry.is_posted() {
        debug!(entry_id = %entry_id, "Journal entry already posted");
        return Ok(PostOutcome::AlreadyPosted);
    }

    post_draft(uow, &mut entry, posted_by).await?;
    Ok(PostOutcome::Posted)
}

/// Creates an entry and posts it in the same unit of work
pub async fn create_and_post<U: LedgerUnitOfWork>(
    uow: &mut U,
    input: NewJournalEntry,
    posted_by: UserId,
) -> Result<JournalEntry, LedgerError> {
    let mut entry = create_journal_entry(uow, input).await?;
    post_draft(uow, &mut entry, posted_by).await?;
    Ok(entry)
}

/// Loads an entry with its ordered lines
///
/// # Errors
///
/// Returns `NotFound` if the entry does not exist.
pub async fn get_journal_entry<S: LedgerStore>(
    store: &S,
    entry_id: JournalEntryId,
) -> Result<JournalEntry, LedgerError> {
    store
        .find_journal_entry(entry_id)
        .await?
        .ok_or_else(|| LedgerError::not_found("Journal entry", entry_id))
}

/// Commits the unit of work on success and rolls it back on failure
///
/// The error returned is always the one that caused the rollback; a failed
/// rollback is only logged.
pub(crate) async fn settle<U: LedgerUnitOfWork, T>(
    uow: U,
    result: Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = uow.rollback().await {
                warn!(error = %rollback_error, "Rollback failed");
            }
            Err(error)
        }
    }
}

async fn post_draft<U: LedgerUnitOfWork>(
    uow: &mut U,
    entry: &mut JournalEntry,
    posted_by: UserId,
) -> Result<(), LedgerError> {
    let posted_at = Utc::now();
    uow.mark_entry_posted(entry.id, posted_by, posted_at).await?;

    entry.status = EntryStatus::Posted;
    entry.posted_by = Some(posted_by);
    entry.posted_at = Some(posted_at);

    debug!(entry_id = %entry.id, posted_by = %posted_by, "Journal entry posted");
    Ok(())
}
