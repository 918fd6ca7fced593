//! Chart of accounts handlers

use axum::extract::{Query, State};
use uuid::Uuid;

use core_kernel::AccountId;
use domain_ledger::{Account, AccountBalance, LedgerStore, TrialBalance};

use crate::dto::accounts::{CreateAccountRequest, ListAccountsQuery, UpdateAccountRequest};
use crate::error::ApiOutcome;
use crate::extract::{ApiJson, ApiPath};
use crate::AppState;

/// Lists accounts ordered by type and code
pub async fn list_accounts<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<ListAccountsQuery>,
) -> ApiOutcome<Vec<Account>> {
    state
        .service
        .list_accounts(query.exclude_code.as_deref())
        .await
        .into()
}

/// Creates an account
pub async fn create_account<S: LedgerStore>(
    State(state): State<AppState<S>>,
    ApiJson(request): ApiJson<CreateAccountRequest>,
) -> ApiOutcome<Account> {
    ApiOutcome::created(state.service.create_account(request.into()).await)
}

/// Updates an account's mutable fields
pub async fn update_account<S: LedgerStore>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateAccountRequest>,
) -> ApiOutcome<Account> {
    state
        .service
        .update_account(AccountId::from_uuid(id), request.into())
        .await
        .into()
}

/// Deletes an unused account
pub async fn delete_account<S: LedgerStore>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiOutcome<Account> {
    state
        .service
        .delete_account(AccountId::from_uuid(id))
        .await
        .into()
}

/// Posted balance of one account
pub async fn account_balance<S: LedgerStore>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiOutcome<AccountBalance> {
    state
        .service
        .account_balance(AccountId::from_uuid(id))
        .await
        .into()
}

/// Trial balance over all posted entries
pub async fn trial_balance<S: LedgerStore>(
    State(state): State<AppState<S>>,
) -> ApiOutcome<TrialBalance> {
    state.service.trial_balance().await.into()
}
