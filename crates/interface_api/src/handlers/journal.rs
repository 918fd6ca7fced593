//! Journal entry handlers

use axum::extract::State;
use uuid::Uuid;

use core_kernel::JournalEntryId;
use domain_ledger::{JournalEntry, LedgerStore, PostOutcome};

use crate::dto::journal::{CreateJournalEntryRequest, ReverseEntryRequest};
use crate::error::ApiOutcome;
use crate::extract::{ActingUser, ApiJson, ApiPath};
use crate::AppState;

/// Creates a manual entry, posting it when requested
pub async fn create_entry<S: LedgerStore>(
    State(state): State<AppState<S>>,
    ActingUser(user): ActingUser,
    ApiJson(request): ApiJson<CreateJournalEntryRequest>,
) -> ApiOutcome<JournalEntry> {
    let post = request.post;
    ApiOutcome::created(
        state
            .service
            .create_manual_entry(request.into_entry(user), post)
            .await,
    )
}

/// Loads an entry with its lines
pub async fn get_entry<S: LedgerStore>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiOutcome<JournalEntry> {
    state
        .service
        .get_entry(JournalEntryId::from_uuid(id))
        .await
        .into()
}

/// Posts a draft entry
pub async fn post_entry<S: LedgerStore>(
    State(state): State<AppState<S>>,
    ActingUser(user): ActingUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiOutcome<PostOutcome> {
    state
        .service
        .post_entry(JournalEntryId::from_uuid(id), user)
        .await
        .into()
}

/// Posts the compensating entry for a posted entry
pub async fn reverse_entry<S: LedgerStore>(
    State(state): State<AppState<S>>,
    ActingUser(user): ActingUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<ReverseEntryRequest>,
) -> ApiOutcome<JournalEntry> {
    ApiOutcome::created(
        state
            .service
            .reverse_entry(
                JournalEntryId::from_uuid(id),
                user,
                request.reason,
                request.reversal_date,
            )
            .await,
    )
}
