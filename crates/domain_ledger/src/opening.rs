//! Opening balance orchestrator
//!
//! Seeds historical balances when a company moves onto the ledger. One batch
//! carries general-ledger lines plus receivable and payable invoices for a
//! single date. Everything the batch writes lands in one unit of work; the
//! difference between general debits and credits is absorbed by the
//! opening-balance equity account.
//!
//! # Workflow
//!
//! ```text
//! pre-check (no transaction)          atomic phase (one unit of work, bounded)
//! ──────────────────────────          ─────────────────────────────────────────
//! structural input checks      ──▶    get-or-create equity account
//! duplicate invoice / order           resolve AR / AP control accounts
//! numbers against storage             receivable openings  ─┐
//!                                     payable openings     ─┼─ posted entries
//!                                     general lines + equity offset ─┘
//!                                     commit
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{AccountId, InvoiceId, JournalEntryId, Money, UserId};
use crate::config::LedgerConfig;
use crate::engine;
use crate::error::{LedgerError, ValidationError};
use crate::journal::{NewJournalEntry, NewJournalLine, Reference};
use crate::ports::LedgerStore;
use crate::registry;
use crate::subledger::{self, SubLedgerKind, SubLedgerOpening};

/// One general-ledger line of an opening batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralLine {
    pub account_id: AccountId,
    #[serde(default)]
    pub debit: Money,
    #[serde(default)]
    pub credit: Money,
    pub description: Option<String>,
}

impl GeneralLine {
    /// A debit opening line
    pub fn debit(account_id: AccountId, amount: Money) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Money::ZERO,
            description: None,
        }
    }

    /// A credit opening line
    pub fn credit(account_id: AccountId, amount: Money) -> Self {
        Self {
            account_id,
            debit: Money::ZERO,
            credit: amount,
            description: None,
        }
    }

    /// Returns true when both sides are below one minor unit
    pub fn is_empty(&self) -> bool {
        self.debit.is_negligible() && self.credit.is_negligible()
    }
}

/// Opening balances for one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningBalanceBatch {
    pub date: NaiveDate,
    #[serde(default)]
    pub general_lines: Vec<GeneralLine>,
    #[serde(default)]
    pub receivables: Vec<SubLedgerOpening>,
    #[serde(default)]
    pub payables: Vec<SubLedgerOpening>,
}

impl OpeningBalanceBatch {
    /// Creates an empty batch
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            general_lines: Vec::new(),
            receivables: Vec::new(),
            payables: Vec::new(),
        }
    }

    /// Returns true when the batch carries nothing at all
    pub fn is_empty(&self) -> bool {
        self.general_lines.is_empty() && self.receivables.is_empty() && self.payables.is_empty()
    }

    /// Structural checks that need no storage
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty batch, a blank invoice number, a
    /// non-positive receivable or payable amount, or a negative general
    /// amount.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::invalid_input("Opening balance batch is empty"));
        }
        for opening in &self.receivables {
            opening.validate(SubLedgerKind::Receivable)?;
        }
        for opening in &self.payables {
            opening.validate(SubLedgerKind::Payable)?;
        }
        for (i, line) in self.general_lines.iter().enumerate() {
            if line.debit.is_negative() || line.credit.is_negative() {
                return Err(ValidationError::NegativeAmount { line: i + 1 });
            }
        }
        Ok(())
    }

    /// Difference between general debits and credits, ignoring empty lines
    pub fn equity_offset(&self) -> Result<Money, LedgerError> {
        let lines: Vec<&GeneralLine> = self.general_lines.iter().filter(|l| !l.is_empty()).collect();
        let debits = Money::checked_sum(lines.iter().map(|l| &l.debit))?;
        let credits = Money::checked_sum(lines.iter().map(|l| &l.credit))?;
        Ok(debits.checked_sub(&credits)?)
    }
}

/// What a committed batch created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub receivable_invoices: Vec<InvoiceId>,
    pub payable_invoices: Vec<InvoiceId>,
    /// Every posted entry, sub-ledger entries first
    pub journal_entries: Vec<JournalEntryId>,
    /// The consolidated general-ledger entry, if one was needed
    pub general_entry: Option<JournalEntryId>,
    /// Amount posted to the equity account by the general entry
    pub equity_offset: Money,
}

/// Drives an opening-balance batch from pre-check to commit
pub struct OpeningBalanceOrchestrator<S: LedgerStore> {
    store: Arc<S>,
    config: LedgerConfig,
}

impl<S: LedgerStore> OpeningBalanceOrchestrator<S> {
    /// Creates an orchestrator over a store
    pub fn new(store: Arc<S>, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// Validates, pre-checks and atomically applies a batch
    ///
    /// # Arguments
    ///
    /// * `batch` - General, receivable and payable opening lines
    /// * `user` - Acting user, recorded as creator and poster
    ///
    /// # Errors
    ///
    /// - `Validation` for malformed input
    /// - `DuplicateReference` if an invoice or synthetic order number exists
    /// - `NotFound` if a control account is missing
    /// - `TransactionFailure` on storage failure or timeout
    ///
    /// Any error leaves storage untouched.
    #[instrument(
        skip(self, batch),
        fields(
            date = %batch.date,
            general = batch.general_lines.len(),
            receivables = batch.receivables.len(),
            payables = batch.payables.len()
        )
    )]
    pub async fn save_batch(
        &self,
        batch: &OpeningBalanceBatch,
        user: UserId,
    ) -> Result<BatchSummary, LedgerError> {
        self.precheck(batch).await?;

        let timeout = self.config.batch_timeout();
        let summary = match tokio::time::timeout(timeout, self.apply_atomically(batch, user)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "Opening balance batch timed out");
                return Err(LedgerError::TransactionFailure(format!(
                    "opening balance batch did not complete within {} seconds",
                    timeout.as_secs()
                )));
            }
        };

        info!(
            entries = summary.journal_entries.len(),
            equity_offset = %summary.equity_offset,
            "Opening balance batch committed"
        );
        Ok(summary)
    }

    /// Checks a batch without opening a unit of work
    ///
    /// # Errors
    ///
    /// Returns `Validation` for malformed input and `DuplicateReference` for
    /// invoice numbers repeated within the batch or already in storage.
    pub async fn precheck(&self, batch: &OpeningBalanceBatch) -> Result<(), LedgerError> {
        batch.validate()?;
        self.reject_duplicates(SubLedgerKind::Receivable, &batch.receivables)
            .await?;
        self.reject_duplicates(SubLedgerKind::Payable, &batch.payables)
            .await
    }

    async fn reject_duplicates(
        &self,
        kind: SubLedgerKind,
        openings: &[SubLedgerOpening],
    ) -> Result<(), LedgerError> {
        let mut seen = HashSet::new();
        for opening in openings {
            if !seen.insert(opening.invoice_number.as_str()) {
                return Err(LedgerError::DuplicateReference(format!(
                    "{} {} appears more than once in the batch",
                    kind.invoice_entity(),
                    opening.invoice_number
                )));
            }
        }

        for opening in openings {
            let number = &opening.invoice_number;
            let order_number = kind.opening_order_number(number);

            if self.store.invoice_number_exists(kind, number).await?
                || self.store.order_number_exists(kind, &order_number).await?
            {
                return Err(LedgerError::DuplicateReference(format!(
                    "{} {} already exists",
                    kind.invoice_entity(),
                    number
                )));
            }
        }
        Ok(())
    }

    async fn apply_atomically(
        &self,
        batch: &OpeningBalanceBatch,
        user: UserId,
    ) -> Result<BatchSummary, LedgerError> {
        let mut uow = self.store.begin().await?;
        let result = self.apply(&mut uow, batch, user).await;
        engine::settle(uow, result).await
    }

    async fn apply(
        &self,
        uow: &mut S::UnitOfWork,
        batch: &OpeningBalanceBatch,
        user: UserId,
    ) -> Result<BatchSummary, LedgerError> {
        let codes = &self.config.system_accounts;
        let equity = registry::get_or_create(uow, self.config.opening_equity_account()).await?;

        let mut summary = BatchSummary {
            receivable_invoices: Vec::new(),
            payable_invoices: Vec::new(),
            journal_entries: Vec::new(),
            general_entry: None,
            equity_offset: Money::ZERO,
        };

        if !batch.receivables.is_empty() {
            let control = registry::find_by_code(uow, &codes.receivable_control).await?;
            for opening in &batch.receivables {
                let documents = subledger::create_receivable_opening(
                    uow, opening, batch.date, user, equity.id, control.id,
                )
                .await?;
                summary.receivable_invoices.push(documents.invoice.id);
                summary.journal_entries.push(documents.journal_entry_id);
            }
        }

        if !batch.payables.is_empty() {
            let control = registry::find_by_code(uow, &codes.payable_control).await?;
            for opening in &batch.payables {
                let documents = subledger::create_payable_opening(
                    uow, opening, batch.date, user, equity.id, control.id,
                )
                .await?;
                summary.payable_invoices.push(documents.invoice.id);
                summary.journal_entries.push(documents.journal_entry_id);
            }
        }

        let offset = batch.equity_offset()?;
        let lines: Vec<&GeneralLine> = batch.general_lines.iter().filter(|l| !l.is_empty()).collect();

        if !lines.is_empty() || !offset.is_negligible() {
            let mut entry = NewJournalEntry::new(batch.date, "Opening balances", user)
                .documenting(Reference::OpeningBalance)
                .auto_generated();
            for line in lines {
                entry = entry.line(NewJournalLine {
                    account_id: line.account_id,
                    debit: line.debit,
                    credit: line.credit,
                    description: line.description.clone(),
                });
            }
            if offset.is_positive() {
                entry = entry.line(
                    NewJournalLine::credit(equity.id, offset).with_description("Opening balance offset"),
                );
            } else if offset.is_negative() {
                entry = entry.line(
                    NewJournalLine::debit(equity.id, -offset).with_description("Opening balance offset"),
                );
            }

            let posted = engine::create_and_post(uow, entry, user).await?;
            summary.journal_entries.push(posted.id);
            summary.general_entry = Some(posted.id);
            summary.equity_offset = offset;
        }

        Ok(summary)
    }
}
