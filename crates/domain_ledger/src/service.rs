//! Ledger service
//!
//! The caller-facing surface of the ledger. Every operation returns an
//! [`OperationOutcome`] instead of an error so that outer layers receive one
//! uniform `{success, error?, data?}` shape. Successful writes that change
//! what financial views show are announced to a [`ViewInvalidator`].

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{AccountId, InvoiceId, JournalEntryId, UserId};
use crate::account::{Account, AccountFilter, AccountUpdate, ManufacturingChartOfAccounts, NewAccount};
use crate::config::LedgerConfig;
use crate::engine;
use crate::error::{ErrorKind, LedgerError};
use crate::journal::{JournalEntry, NewJournalEntry, PostOutcome};
use crate::opening::{BatchSummary, OpeningBalanceBatch, OpeningBalanceOrchestrator};
use crate::ports::LedgerStore;
use crate::registry::{self, AccountBalance, TrialBalance};
use crate::reversal::{self, DeletedOpening};
use crate::subledger::{Invoice, SubLedgerKind};

/// Uniform result of a service operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOutcome<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> OperationOutcome<T> {
    /// A successful outcome carrying data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            error: None,
            error_kind: None,
            data: Some(data),
        }
    }

    /// A failed outcome
    pub fn failed(error: &LedgerError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            data: None,
        }
    }

    /// Converts back into a `Result`, pairing the message with its kind
    pub fn into_result(self) -> Result<Option<T>, (ErrorKind, String)> {
        if self.success {
            Ok(self.data)
        } else {
            Err((
                self.error_kind.unwrap_or(ErrorKind::TransactionFailure),
                self.error.unwrap_or_default(),
            ))
        }
    }
}

impl<T> From<Result<T, LedgerError>> for OperationOutcome<T> {
    fn from(result: Result<T, LedgerError>) -> Self {
        match result {
            Ok(data) => OperationOutcome::ok(data),
            Err(error) => {
                if error.is_validation() {
                    info!(error = %error, "Ledger operation rejected");
                } else {
                    warn!(error = %error, kind = ?error.kind(), "Ledger operation failed");
                }
                OperationOutcome::failed(&error)
            }
        }
    }
}

/// Cached views that a write makes stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaleView {
    FinanceDashboard,
    BalanceSheet,
    OpeningBalances,
    ChartOfAccounts,
}

/// Receives stale-view notifications; the refresh mechanism lives elsewhere
pub trait ViewInvalidator: Send + Sync {
    fn invalidate(&self, views: &[StaleView]);
}

/// Invalidator that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingInvalidator;

impl ViewInvalidator for TracingInvalidator {
    fn invalidate(&self, views: &[StaleView]) {
        info!(views = ?views, "Ledger views invalidated");
    }
}

const OPENING_VIEWS: &[StaleView] = &[
    StaleView::FinanceDashboard,
    StaleView::BalanceSheet,
    StaleView::OpeningBalances,
];

const POSTING_VIEWS: &[StaleView] = &[StaleView::FinanceDashboard, StaleView::BalanceSheet];

const CHART_VIEWS: &[StaleView] = &[StaleView::ChartOfAccounts];

/// Caller-facing ledger operations
pub struct LedgerService<S: LedgerStore> {
    store: Arc<S>,
    config: LedgerConfig,
    orchestrator: OpeningBalanceOrchestrator<S>,
    invalidator: Arc<dyn ViewInvalidator>,
}

impl<S: LedgerStore> LedgerService<S> {
    /// Creates a service that logs stale views
    pub fn new(store: Arc<S>, config: LedgerConfig) -> Self {
        Self {
            orchestrator: OpeningBalanceOrchestrator::new(store.clone(), config.clone()),
            store,
            config,
            invalidator: Arc::new(TracingInvalidator),
        }
    }

    /// Replaces the view invalidator
    pub fn with_invalidator(mut self, invalidator: Arc<dyn ViewInvalidator>) -> Self {
        self.invalidator = invalidator;
        self
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The active configuration
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // Opening balances

    /// Saves an opening-balance batch atomically
    #[instrument(skip(self, batch), fields(date = %batch.date))]
    pub async fn save_opening_balance_batch(
        &self,
        batch: OpeningBalanceBatch,
        user: UserId,
    ) -> OperationOutcome<BatchSummary> {
        let result = self.orchestrator.save_batch(&batch, user).await;
        self.notify_on_success(&result, OPENING_VIEWS);
        result.into()
    }

    /// Deletes an opening-balance invoice with its order and journal entries
    #[instrument(skip(self))]
    pub async fn delete_opening_entry(
        &self,
        invoice_id: InvoiceId,
        kind: SubLedgerKind,
    ) -> OperationOutcome<DeletedOpening> {
        let result = async {
            let mut uow = self.store.begin().await?;
            let result = reversal::hard_delete_opening_entry(&mut uow, kind, invoice_id).await;
            engine::settle(uow, result).await
        }
        .await;
        self.notify_on_success(&result, OPENING_VIEWS);
        result.into()
    }

    /// Opening-balance invoices of one kind, newest first
    pub async fn list_opening_entries(&self, kind: SubLedgerKind) -> OperationOutcome<Vec<Invoice>> {
        self.store
            .list_opening_invoices(kind)
            .await
            .map_err(LedgerError::from)
            .into()
    }

    // Chart of accounts

    /// Lists accounts ordered by type and code, optionally hiding one code
    pub async fn list_accounts(&self, exclude_code: Option<&str>) -> OperationOutcome<Vec<Account>> {
        let filter = AccountFilter {
            exclude_code: exclude_code.map(str::to_string),
            active_only: false,
        };
        self.store
            .list_accounts(&filter)
            .await
            .map_err(LedgerError::from)
            .into()
    }

    /// Creates an account
    #[instrument(skip(self, new_account), fields(code = %new_account.code))]
    pub async fn create_account(&self, new_account: NewAccount) -> OperationOutcome<Account> {
        let result = async {
            let mut uow = self.store.begin().await?;
            let result = registry::create(&mut uow, new_account).await;
            engine::settle(uow, result).await
        }
        .await;
        self.notify_on_success(&result, CHART_VIEWS);
        result.into()
    }

    /// Updates an account; the code is immutable
    #[instrument(skip(self, changes))]
    pub async fn update_account(
        &self,
        id: AccountId,
        changes: AccountUpdate,
    ) -> OperationOutcome<Account> {
        let result = async {
            let mut uow = self.store.begin().await?;
            let result = registry::update(&mut uow, id, &changes).await;
            engine::settle(uow, result).await
        }
        .await;
        self.notify_on_success(&result, CHART_VIEWS);
        result.into()
    }

    /// Deletes an account no journal line references
    #[instrument(skip(self))]
    pub async fn delete_account(&self, id: AccountId) -> OperationOutcome<Account> {
        let result = async {
            let mut uow = self.store.begin().await?;
            let result = registry::delete(&mut uow, id).await;
            engine::settle(uow, result).await
        }
        .await;
        self.notify_on_success(&result, CHART_VIEWS);
        result.into()
    }

    /// Balance of one account derived from posted lines
    pub async fn account_balance(&self, id: AccountId) -> OperationOutcome<AccountBalance> {
        async {
            let account = self
                .store
                .find_account(id)
                .await?
                .ok_or_else(|| LedgerError::not_found("Account", id))?;
            let totals = self.store.posted_totals(Some(id)).await?;
            AccountBalance::from_totals(&account, totals.first())
        }
        .await
        .into()
    }

    /// Trial balance over all posted entries
    pub async fn trial_balance(&self) -> OperationOutcome<TrialBalance> {
        async {
            let accounts = self.store.list_accounts(&AccountFilter::default()).await?;
            let totals = self.store.posted_totals(None).await?;
            TrialBalance::build(&accounts, &totals)
        }
        .await
        .into()
    }

    /// Creates every missing account of the standard manufacturing chart
    ///
    /// # Errors
    ///
    /// Returns the underlying error; this runs at startup, not per request.
    pub async fn seed_standard_chart(&self) -> Result<usize, LedgerError> {
        let chart = ManufacturingChartOfAccounts::standard_accounts(&self.config.system_accounts);
        let mut uow = self.store.begin().await?;
        let result = registry::seed_chart(&mut uow, chart).await;
        let created = engine::settle(uow, result).await?;

        info!(created, "Standard chart of accounts seeded");
        if created > 0 {
            self.invalidator.invalidate(CHART_VIEWS);
        }
        Ok(created)
    }

    // Journal entries

    /// Creates a manual entry, optionally posting it at once
    #[instrument(skip(self, entry), fields(lines = entry.lines.len()))]
    pub async fn create_manual_entry(
        &self,
        entry: NewJournalEntry,
        post_immediately: bool,
    ) -> OperationOutcome<JournalEntry> {
        let result = async {
            let mut uow = self.store.begin().await?;
            let created_by = entry.created_by;
            let result = if post_immediately {
                engine::create_and_post(&mut uow, entry, created_by).await
            } else {
                engine::create_journal_entry(&mut uow, entry).await
            };
            engine::settle(uow, result).await
        }
        .await;
        if post_immediately {
            self.notify_on_success(&result, POSTING_VIEWS);
        }
        result.into()
    }

    /// Posts an entry; posting twice is a no-op
    #[instrument(skip(self))]
    pub async fn post_entry(&self, id: JournalEntryId, posted_by: UserId) -> OperationOutcome<PostOutcome> {
        let result = async {
            let mut uow = self.store.begin().await?;
            let result = engine::post_journal(&mut uow, id, posted_by).await;
            engine::settle(uow, result).await
        }
        .await;
        if matches!(result, Ok(PostOutcome::Posted)) {
            self.invalidator.invalidate(POSTING_VIEWS);
        }
        result.into()
    }

    /// Posts a compensating entry for a posted entry
    ///
    /// The reversal is dated `reversal_date`, or today when absent.
    #[instrument(skip(self, reason))]
    pub async fn reverse_entry(
        &self,
        id: JournalEntryId,
        user: UserId,
        reason: String,
        reversal_date: Option<NaiveDate>,
    ) -> OperationOutcome<JournalEntry> {
        let date = reversal_date.unwrap_or_else(|| Utc::now().date_naive());
        let result = async {
            let mut uow = self.store.begin().await?;
            let result = reversal::reverse(&mut uow, id, user, &reason, date).await;
            engine::settle(uow, result).await
        }
        .await;
        self.notify_on_success(&result, POSTING_VIEWS);
        result.into()
    }

    /// Loads an entry with its lines
    pub async fn get_entry(&self, id: JournalEntryId) -> OperationOutcome<JournalEntry> {
        engine::get_journal_entry(self.store.as_ref(), id).await.into()
    }

    fn notify_on_success<T>(&self, result: &Result<T, LedgerError>, views: &[StaleView]) {
        if result.is_ok() {
            self.invalidator.invalidate(views);
        }
    }
}
