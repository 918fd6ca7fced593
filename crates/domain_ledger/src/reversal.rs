//! Reversal and deletion of ledger records
//!
//! Posted entries are corrected by a compensating entry with debits and
//! credits swapped. The only path that physically removes a posted entry is
//! [`hard_delete_opening_entry`], which undoes one sub-ledger opening as a
//! whole: its journal lines, its entries, the invoice, and the synthetic
//! order, in that order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use core_kernel::{InvoiceId, JournalEntryId, UserId};
use crate::engine;
use crate::error::{LedgerError, ValidationError};
use crate::journal::{EntryStatus, JournalEntry, NewJournalEntry, NewJournalLine, Reference};
use crate::ports::LedgerUnitOfWork;
use crate::subledger::SubLedgerKind;

/// What a hard delete removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedOpening {
    pub kind: SubLedgerKind,
    pub invoice_number: String,
    pub order_number: String,
    pub journal_entries: Vec<JournalEntryId>,
    pub lines_deleted: u64,
}

/// Removes an opening-balance invoice together with everything it created
///
/// # Arguments
///
/// * `uow` - The caller's unit of work
/// * `kind` - Receivable or payable
/// * `invoice_id` - The opening invoice
///
/// # Errors
///
/// - `NotFound` if the invoice or its order is missing
/// - `InvalidOperation` if the invoice is not an opening-balance document,
///   or if one of its entries has been reversed
pub async fn hard_delete_opening_entry<U: LedgerUnitOfWork>(
    uow: &mut U,
    kind: SubLedgerKind,
    invoice_id: InvoiceId,
) -> Result<DeletedOpening, LedgerError> {
    let invoice = uow
        .find_invoice(kind, invoice_id)
        .await?
        .ok_or_else(|| LedgerError::not_found(kind.invoice_entity(), invoice_id))?;

    if !invoice.is_opening_balance {
        return Err(LedgerError::invalid_operation(format!(
            "{} {} is not an opening balance",
            kind.invoice_entity(),
            invoice.invoice_number
        )));
    }

    let order = uow
        .find_order(kind, invoice.order_id)
        .await?
        .ok_or_else(|| LedgerError::not_found(kind.order_entity(), invoice.order_id))?;

    let entries = uow
        .find_entries_by_reference(&kind.invoice_reference(invoice_id))
        .await?;

    for entry_id in &entries {
        if !uow
            .find_entries_by_reference(&Reference::Reversal(*entry_id))
            .await?
            .is_empty()
        {
            return Err(LedgerError::invalid_operation(format!(
                "Opening balance for {} has been reversed and cannot be deleted",
                invoice.invoice_number
            )));
        }
    }

    let lines_deleted = uow.delete_journal_lines(&entries).await?;
    uow.delete_journal_entries(&entries).await?;
    uow.delete_invoice(kind, invoice_id).await?;
    uow.delete_order(kind, order.id).await?;

    info!(
        kind = %kind,
        invoice_number = %invoice.invoice_number,
        order_number = %order.order_number,
        entries = entries.len(),
        lines = lines_deleted,
        "Opening balance deleted"
    );

    Ok(DeletedOpening {
        kind,
        invoice_number: invoice.invoice_number,
        order_number: order.order_number,
        journal_entries: entries,
        lines_deleted,
    })
}

/// Posts a compensating entry for a posted entry
///
/// The new entry mirrors every line with debit and credit swapped, carries
/// the original free-text reference and is posted immediately.
///
/// # Errors
///
/// - `NotFound` if the entry does not exist
/// - `InvalidOperation` for DRAFT entries and for reversal entries
/// - `AlreadyReversed` if a reversal of the entry exists
pub async fn reverse<U: LedgerUnitOfWork>(
    uow: &mut U,
    entry_id: JournalEntryId,
    user: UserId,
    reason: &str,
    reversal_date: NaiveDate,
) -> Result<JournalEntry, LedgerError> {
    if reason.trim().is_empty() {
        return Err(ValidationError::invalid_input("A reversal reason is required").into());
    }

    let original = uow
        .find_journal_entry(entry_id)
        .await?
        .ok_or_else(|| LedgerError::not_found("Journal entry", entry_id))?;

    if original.status != EntryStatus::Posted {
        return Err(LedgerError::invalid_operation(
            "Only posted journal entries can be reversed",
        ));
    }
    if matches!(original.document, Reference::Reversal(_)) {
        return Err(LedgerError::invalid_operation(
            "A reversal entry cannot itself be reversed",
        ));
    }
    if !uow
        .find_entries_by_reference(&Reference::Reversal(entry_id))
        .await?
        .is_empty()
    {
        return Err(LedgerError::AlreadyReversed(entry_id));
    }

    let mut input = NewJournalEntry::new(
        reversal_date,
        format!("Reversal of {}: {}", original.description, reason),
        user,
    )
    .documenting(Reference::Reversal(entry_id))
    .auto_generated();
    if let Some(reference) = &original.reference {
        input = input.with_reference(reference.clone());
    }
    for line in &original.lines {
        input = input.line(NewJournalLine {
            account_id: line.account_id,
            debit: line.credit,
            credit: line.debit,
            description: Some(format!("Reversal: {}", reason)),
        });
    }

    let reversal = engine::create_and_post(uow, input, user).await?;

    info!(
        original = %entry_id,
        reversal = %reversal.id,
        reason = %reason,
        "Journal entry reversed"
    );
    Ok(reversal)
}
