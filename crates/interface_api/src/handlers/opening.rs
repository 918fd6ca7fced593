//! Opening balance handlers

use axum::extract::State;
use uuid::Uuid;

use core_kernel::InvoiceId;
use domain_ledger::{
    BatchSummary, DeletedOpening, ErrorKind, Invoice, LedgerStore, OpeningBalanceBatch,
    SubLedgerKind,
};

use crate::error::{ApiError, ApiOutcome};
use crate::extract::{ActingUser, ApiJson, ApiPath};
use crate::AppState;

fn parse_kind(kind: &str) -> Result<SubLedgerKind, ApiError> {
    kind.parse().map_err(|e: domain_ledger::ValidationError| ApiError::Ledger {
        kind: ErrorKind::Validation,
        message: e.to_string(),
    })
}

/// Saves a batch of general, receivable and payable opening balances
pub async fn save_batch<S: LedgerStore>(
    State(state): State<AppState<S>>,
    ActingUser(user): ActingUser,
    ApiJson(batch): ApiJson<OpeningBalanceBatch>,
) -> ApiOutcome<BatchSummary> {
    ApiOutcome::created(state.service.save_opening_balance_batch(batch, user).await)
}

/// Lists opening invoices of one sub-ledger, newest first
pub async fn list_openings<S: LedgerStore>(
    State(state): State<AppState<S>>,
    ApiPath(kind): ApiPath<String>,
) -> Result<ApiOutcome<Vec<Invoice>>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(state.service.list_opening_entries(kind).await.into())
}

/// Deletes an opening invoice with its order and journal entries
pub async fn delete_opening<S: LedgerStore>(
    State(state): State<AppState<S>>,
    ApiPath((kind, id)): ApiPath<(String, Uuid)>,
) -> Result<ApiOutcome<DeletedOpening>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(state
        .service
        .delete_opening_entry(InvoiceId::from_uuid(id), kind)
        .await
        .into())
}
