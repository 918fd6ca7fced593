//! Journal entries and lines
//!
//! A journal entry is the unit of double-entry bookkeeping: an ordered list
//! of lines whose debits and credits sum to the same amount. Entries are
//! written once as DRAFT and posted exactly once.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use core_kernel::{AccountId, InvoiceId, JournalEntryId, JournalLineId, Money, MoneyError, UserId};
use crate::error::ValidationError;

/// Lifecycle state of a journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Draft,
    Posted,
}

impl EntryStatus {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Draft => "DRAFT",
            EntryStatus::Posted => "POSTED",
        }
    }
}

impl FromStr for EntryStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(EntryStatus::Draft),
            "POSTED" => Ok(EntryStatus::Posted),
            other => Err(ValidationError::invalid_input(format!(
                "Unknown entry status: {}",
                other
            ))),
        }
    }
}

/// The document a journal entry records
///
/// Storage keeps this as a `(reference_type, reference_id)` pair; the pair is
/// only valid when the id is present exactly for the variants that carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reference {
    ManualEntry,
    OpeningBalance,
    SalesInvoice(InvoiceId),
    PurchaseInvoice(InvoiceId),
    Reversal(JournalEntryId),
}

impl Reference {
    /// Storage `reference_type`
    pub fn type_code(&self) -> &'static str {
        match self {
            Reference::ManualEntry => "MANUAL_ENTRY",
            Reference::OpeningBalance => "OPENING_BALANCE",
            Reference::SalesInvoice(_) => "SALES_INVOICE",
            Reference::PurchaseInvoice(_) => "PURCHASE_INVOICE",
            Reference::Reversal(_) => "REVERSAL",
        }
    }

    /// Storage `reference_id`
    pub fn target_id(&self) -> Option<Uuid> {
        match self {
            Reference::ManualEntry | Reference::OpeningBalance => None,
            Reference::SalesInvoice(id) | Reference::PurchaseInvoice(id) => Some(*id.as_uuid()),
            Reference::Reversal(id) => Some(*id.as_uuid()),
        }
    }

    /// Rebuilds a reference from its stored pair
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unknown type code, a missing id on a
    /// variant that needs one, or an id on a variant that has none.
    pub fn from_parts(type_code: &str, target_id: Option<Uuid>) -> Result<Self, ValidationError> {
        let reference = match (type_code, target_id) {
            ("MANUAL_ENTRY", None) => Reference::ManualEntry,
            ("OPENING_BALANCE", None) => Reference::OpeningBalance,
            ("SALES_INVOICE", Some(id)) => Reference::SalesInvoice(InvoiceId::from_uuid(id)),
            ("PURCHASE_INVOICE", Some(id)) => Reference::PurchaseInvoice(InvoiceId::from_uuid(id)),
            ("REVERSAL", Some(id)) => Reference::Reversal(JournalEntryId::from_uuid(id)),
            (code, id) => {
                return Err(ValidationError::invalid_input(format!(
                    "Invalid reference pair: type={}, id present={}",
                    code,
                    id.is_some()
                )))
            }
        };
        Ok(reference)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target_id() {
            Some(id) => write!(f, "{}:{}", self.type_code(), id),
            None => f.write_str(self.type_code()),
        }
    }
}

/// A stored journal line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub id: JournalLineId,
    /// Position within the entry, starting at 1
    pub line_no: u32,
    pub account_id: AccountId,
    pub debit: Money,
    pub credit: Money,
    pub description: Option<String>,
}

/// A stored journal entry with its ordered lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: JournalEntryId,
    pub entry_date: NaiveDate,
    pub description: String,
    /// Free-text external reference, e.g. an invoice number
    pub reference: Option<String>,
    /// Typed document reference
    pub document: Reference,
    pub is_auto_generated: bool,
    pub created_by: UserId,
    pub status: EntryStatus,
    pub posted_by: Option<UserId>,
    pub posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// Sum of line debits
    pub fn total_debit(&self) -> Money {
        self.lines.iter().map(|l| l.debit).sum()
    }

    /// Sum of line credits
    pub fn total_credit(&self) -> Money {
        self.lines.iter().map(|l| l.credit).sum()
    }

    /// Returns true when debits equal credits
    pub fn is_balanced(&self) -> bool {
        self.total_debit() == self.total_credit()
    }

    /// Returns true once the entry has been posted
    pub fn is_posted(&self) -> bool {
        self.status == EntryStatus::Posted
    }
}

/// Line input for a new entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJournalLine {
    pub account_id: AccountId,
    pub debit: Money,
    pub credit: Money,
    pub description: Option<String>,
}

impl NewJournalLine {
    /// A debit line
    pub fn debit(account_id: AccountId, amount: Money) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Money::ZERO,
            description: None,
        }
    }

    /// A credit line
    pub fn credit(account_id: AccountId, amount: Money) -> Self {
        Self {
            account_id,
            debit: Money::ZERO,
            credit: amount,
            description: None,
        }
    }

    /// Sets the line description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Input for a new journal entry
///
/// # Example
///
/// ```rust,ignore
/// let entry = NewJournalEntry::new(date, "Machine purchase", user)
///     .with_reference("PO-1044")
///     .debit(machinery, amount)
///     .credit(bank, amount);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJournalEntry {
    pub entry_date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub document: Reference,
    pub is_auto_generated: bool,
    pub created_by: UserId,
    pub lines: Vec<NewJournalLine>,
}

impl NewJournalEntry {
    /// Creates a manual entry without lines
    pub fn new(entry_date: NaiveDate, description: impl Into<String>, created_by: UserId) -> Self {
        Self {
            entry_date,
            description: description.into(),
            reference: None,
            document: Reference::ManualEntry,
            is_auto_generated: false,
            created_by,
            lines: Vec::new(),
        }
    }

    /// Sets the free-text reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Sets the typed document reference
    pub fn documenting(mut self, document: Reference) -> Self {
        self.document = document;
        self
    }

    /// Flags the entry as system generated
    pub fn auto_generated(mut self) -> Self {
        self.is_auto_generated = true;
        self
    }

    /// Appends a line
    pub fn line(mut self, line: NewJournalLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Appends a debit line
    pub fn debit(self, account_id: AccountId, amount: Money) -> Self {
        self.line(NewJournalLine::debit(account_id, amount))
    }

    /// Appends a credit line
    pub fn credit(self, account_id: AccountId, amount: Money) -> Self {
        self.line(NewJournalLine::credit(account_id, amount))
    }

    /// Debit and credit totals, failing on overflow
    pub fn totals(&self) -> Result<(Money, Money), MoneyError> {
        let debits = Money::checked_sum(self.lines.iter().map(|l| &l.debit))?;
        let credits = Money::checked_sum(self.lines.iter().map(|l| &l.credit))?;
        Ok((debits, credits))
    }

    /// Returns the 1-based position of the first line with a negative amount
    pub fn first_negative_line(&self) -> Option<usize> {
        self.lines
            .iter()
            .position(|l| l.debit.is_negative() || l.credit.is_negative())
            .map(|i| i + 1)
    }

    /// Materializes the entry as a DRAFT with fresh identifiers
    pub fn into_draft(self) -> JournalEntry {
        let lines = self
            .lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| JournalLine {
                id: JournalLineId::new_v7(),
                line_no: (i + 1) as u32,
                account_id: line.account_id,
                debit: line.debit,
                credit: line.credit,
                description: line.description,
            })
            .collect();

        JournalEntry {
            id: JournalEntryId::new_v7(),
            entry_date: self.entry_date,
            description: self.description,
            reference: self.reference,
            document: self.document,
            is_auto_generated: self.is_auto_generated,
            created_by: self.created_by,
            status: EntryStatus::Draft,
            posted_by: None,
            posted_at: None,
            created_at: Utc::now(),
            lines,
        }
    }
}

/// Result of a posting request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostOutcome {
    /// The entry moved from DRAFT to POSTED
    Posted,
    /// The entry was already posted; nothing changed
    AlreadyPosted,
}
