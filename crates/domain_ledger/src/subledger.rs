//! Sub-ledger bridge
//!
//! Receivable and payable opening balances attach to commercial documents.
//! For each one the bridge creates a synthetic fulfilled order, an unpaid
//! invoice carrying the external invoice number verbatim, and a posted
//! journal entry against the control account, all in the caller's unit of
//! work.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

use core_kernel::{AccountId, InvoiceId, JournalEntryId, Money, OrderId, PartyId, UserId};
use crate::engine;
use crate::error::{LedgerError, ValidationError};
use crate::journal::{NewJournalEntry, Reference};
use crate::ports::LedgerUnitOfWork;

/// Which sub-ledger a document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubLedgerKind {
    /// Accounts receivable (customers, sales documents)
    Receivable,
    /// Accounts payable (suppliers, purchase documents)
    Payable,
}

impl SubLedgerKind {
    /// Prefix of synthetic opening-balance order numbers
    pub fn order_prefix(&self) -> &'static str {
        match self {
            SubLedgerKind::Receivable => "SO-OPEN-",
            SubLedgerKind::Payable => "PO-OPEN-",
        }
    }

    /// Synthetic order number for an external invoice number
    pub fn opening_order_number(&self, invoice_number: &str) -> String {
        format!("{}{}", self.order_prefix(), invoice_number)
    }

    /// Journal reference of an invoice of this kind
    pub fn invoice_reference(&self, invoice_id: InvoiceId) -> Reference {
        match self {
            SubLedgerKind::Receivable => Reference::SalesInvoice(invoice_id),
            SubLedgerKind::Payable => Reference::PurchaseInvoice(invoice_id),
        }
    }

    /// Display name of the invoice entity
    pub fn invoice_entity(&self) -> &'static str {
        match self {
            SubLedgerKind::Receivable => "Sales invoice",
            SubLedgerKind::Payable => "Purchase invoice",
        }
    }

    /// Display name of the order entity
    pub fn order_entity(&self) -> &'static str {
        match self {
            SubLedgerKind::Receivable => "Sales order",
            SubLedgerKind::Payable => "Purchase order",
        }
    }

    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SubLedgerKind::Receivable => "RECEIVABLE",
            SubLedgerKind::Payable => "PAYABLE",
        }
    }
}

impl fmt::Display for SubLedgerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubLedgerKind {
    type Err = ValidationError;

    /// Accepts `receivable`/`ar` and `payable`/`ap` in any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "receivable" | "ar" => Ok(SubLedgerKind::Receivable),
            "payable" | "ap" => Ok(SubLedgerKind::Payable),
            other => Err(ValidationError::invalid_input(format!(
                "Unknown sub-ledger: {}",
                other
            ))),
        }
    }
}

/// Status of a sales or purchase order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "OPEN",
            OrderStatus::Fulfilled => "FULFILLED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(OrderStatus::Open),
            "FULFILLED" => Ok(OrderStatus::Fulfilled),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(ValidationError::invalid_input(format!(
                "Unknown order status: {}",
                other
            ))),
        }
    }
}

/// Status of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "UNPAID",
            InvoiceStatus::PartiallyPaid => "PARTIALLY_PAID",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNPAID" => Ok(InvoiceStatus::Unpaid),
            "PARTIALLY_PAID" => Ok(InvoiceStatus::PartiallyPaid),
            "PAID" => Ok(InvoiceStatus::Paid),
            "CANCELLED" => Ok(InvoiceStatus::Cancelled),
            other => Err(ValidationError::invalid_input(format!(
                "Unknown invoice status: {}",
                other
            ))),
        }
    }
}

/// A sales order (receivable) or purchase order (payable)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub kind: SubLedgerKind,
    pub order_number: String,
    /// Customer or supplier
    pub party_id: PartyId,
    pub order_date: NaiveDate,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub is_opening_balance: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// A sales invoice (receivable) or purchase invoice (payable)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub kind: SubLedgerKind,
    pub invoice_number: String,
    pub order_id: OrderId,
    /// Customer or supplier
    pub party_id: PartyId,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub status: InvoiceStatus,
    pub is_opening_balance: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Amount still owed
    pub fn outstanding(&self) -> Money {
        self.total_amount - self.paid_amount
    }
}

/// One receivable or payable line of an opening-balance batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubLedgerOpening {
    /// Customer (receivable) or supplier (payable)
    pub party_id: PartyId,
    /// External invoice number, stored verbatim
    pub invoice_number: String,
    pub amount: Money,
    /// Defaults to the batch date
    pub due_date: Option<NaiveDate>,
    pub description: Option<String>,
}

impl SubLedgerOpening {
    /// Creates an opening line without due date or description
    pub fn new(party_id: PartyId, invoice_number: impl Into<String>, amount: Money) -> Self {
        Self {
            party_id,
            invoice_number: invoice_number.into(),
            amount,
            due_date: None,
            description: None,
        }
    }

    /// Sets the due date
    pub fn due_on(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Structural checks that need no storage
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a blank invoice number or a non-positive
    /// amount.
    pub fn validate(&self, kind: SubLedgerKind) -> Result<(), ValidationError> {
        if self.invoice_number.trim().is_empty() {
            return Err(ValidationError::invalid_input(format!(
                "{} number is required",
                kind.invoice_entity()
            )));
        }
        if !self.amount.is_positive() {
            return Err(ValidationError::invalid_input(format!(
                "Opening amount for invoice {} must be positive",
                self.invoice_number
            )));
        }
        Ok(())
    }
}

/// The documents created for one sub-ledger opening
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningDocuments {
    pub order: Order,
    pub invoice: Invoice,
    pub journal_entry_id: JournalEntryId,
}

/// Creates a receivable opening: debit the AR control account, credit equity
///
/// # Arguments
///
/// * `uow` - The caller's unit of work
/// * `opening` - Customer, invoice number and amount
/// * `date` - Opening date, used for the order, invoice and entry
/// * `user` - Acting user
/// * `equity_account` - Opening-balance equity account
/// * `receivable_control` - AR control account
pub async fn create_receivable_opening<U: LedgerUnitOfWork>(
    uow: &mut U,
    opening: &SubLedgerOpening,
    date: NaiveDate,
    user: UserId,
    equity_account: AccountId,
    receivable_control: AccountId,
) -> Result<OpeningDocuments, LedgerError> {
    create_opening(
        uow,
        SubLedgerKind::Receivable,
        opening,
        date,
        user,
        equity_account,
        receivable_control,
    )
    .await
}

/// Creates a payable opening: debit equity, credit the AP control account
pub async fn create_payable_opening<U: LedgerUnitOfWork>(
    uow: &mut U,
    opening: &SubLedgerOpening,
    date: NaiveDate,
    user: UserId,
    equity_account: AccountId,
    payable_control: AccountId,
) -> Result<OpeningDocuments, LedgerError> {
    create_opening(
        uow,
        SubLedgerKind::Payable,
        opening,
        date,
        user,
        equity_account,
        payable_control,
    )
    .await
}

async fn create_opening<U: LedgerUnitOfWork>(
    uow: &mut U,
    kind: SubLedgerKind,
    opening: &SubLedgerOpening,
    date: NaiveDate,
    user: UserId,
    equity_account: AccountId,
    control_account: AccountId,
) -> Result<OpeningDocuments, LedgerError> {
    opening.validate(kind)?;
    let now = Utc::now();

    let order = Order {
        id: OrderId::new_v7(),
        kind,
        order_number: kind.opening_order_number(&opening.invoice_number),
        party_id: opening.party_id,
        order_date: date,
        status: OrderStatus::Fulfilled,
        total_amount: opening.amount,
        is_opening_balance: true,
        created_by: user,
        created_at: now,
    };
    uow.insert_order(&order).await?;

    let invoice = Invoice {
        id: InvoiceId::new_v7(),
        kind,
        invoice_number: opening.invoice_number.clone(),
        order_id: order.id,
        party_id: opening.party_id,
        invoice_date: date,
        due_date: opening.due_date.unwrap_or(date),
        total_amount: opening.amount,
        paid_amount: Money::ZERO,
        status: InvoiceStatus::Unpaid,
        is_opening_balance: true,
        created_by: user,
        created_at: now,
    };
    uow.insert_invoice(&invoice).await?;

    let (debit_account, credit_account) = match kind {
        SubLedgerKind::Receivable => (control_account, equity_account),
        SubLedgerKind::Payable => (equity_account, control_account),
    };
    let description = opening.description.clone().unwrap_or_else(|| {
        format!(
            "Opening balance - {} {}",
            kind.invoice_entity().to_lowercase(),
            opening.invoice_number
        )
    });

    let entry = engine::create_and_post(
        uow,
        NewJournalEntry::new(date, description, user)
            .with_reference(opening.invoice_number.clone())
            .documenting(kind.invoice_reference(invoice.id))
            .auto_generated()
            .debit(debit_account, opening.amount)
            .credit(credit_account, opening.amount),
        user,
    )
    .await?;

    info!(
        kind = %kind,
        invoice_number = %invoice.invoice_number,
        order_number = %order.order_number,
        amount = %opening.amount,
        entry_id = %entry.id,
        "Sub-ledger opening created"
    );

    Ok(OpeningDocuments {
        order,
        invoice,
        journal_entry_id: entry.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::account::{AccountCategory, NewAccount};
    use crate::journal::EntryStatus;
    use crate::ports::memory::InMemoryLedgerStore;
    use crate::ports::LedgerStore;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn test_kind_parses_short_and_long_forms() {
        assert_eq!("AR".parse::<SubLedgerKind>().unwrap(), SubLedgerKind::Receivable);
        assert_eq!("payable".parse::<SubLedgerKind>().unwrap(), SubLedgerKind::Payable);
        assert!("gl".parse::<SubLedgerKind>().is_err());
    }

    #[test]
    fn test_opening_order_numbers() {
        assert_eq!(
            SubLedgerKind::Receivable.opening_order_number("INV-100"),
            "SO-OPEN-INV-100"
        );
        assert_eq!(
            SubLedgerKind::Payable.opening_order_number("B/77"),
            "PO-OPEN-B/77"
        );
    }

    #[test]
    fn test_opening_requires_positive_amount() {
        let opening = SubLedgerOpening::new(PartyId::new(), "INV-1", Money::ZERO);
        assert!(opening.validate(SubLedgerKind::Receivable).is_err());

        let opening = SubLedgerOpening::new(PartyId::new(), " ", Money::new(dec!(1)));
        assert!(opening.validate(SubLedgerKind::Payable).is_err());
    }

    #[tokio::test]
    async fn test_payable_opening_debits_equity() {
        let store = InMemoryLedgerStore::new();
        let equity = store
            .seed_account(NewAccount::new("3900", "Opening Equity", AccountCategory::Capital))
            .await
            .unwrap();
        let payables = store
            .seed_account(NewAccount::new("2100", "AP", AccountCategory::CurrentLiability))
            .await
            .unwrap();
        let user = UserId::new();

        let mut uow = store.begin().await.unwrap();
        let documents = create_payable_opening(
            &mut uow,
            &SubLedgerOpening::new(PartyId::new(), "B-77", Money::new(dec!(1250.50)))
                .due_on(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()),
            date(),
            user,
            equity.id,
            payables.id,
        )
        .await
        .unwrap();
        uow.commit().await.unwrap();

        assert_eq!(documents.order.order_number, "PO-OPEN-B-77");
        assert_eq!(documents.invoice.due_date, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(documents.invoice.outstanding(), Money::new(dec!(1250.50)));

        let entry = store
            .find_journal_entry(documents.journal_entry_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.status, EntryStatus::Posted);
        assert_eq!(entry.document, Reference::PurchaseInvoice(documents.invoice.id));
        assert_eq!(entry.reference.as_deref(), Some("B-77"));
        assert!(entry.is_auto_generated);
        assert_eq!(entry.lines[0].account_id, equity.id);
        assert_eq!(entry.lines[0].debit, Money::new(dec!(1250.50)));
        assert_eq!(entry.lines[1].account_id, payables.id);
        assert_eq!(entry.lines[1].credit, Money::new(dec!(1250.50)));
    }
}
