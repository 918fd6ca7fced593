//! Chart of accounts DTOs

use serde::Deserialize;
use uuid::Uuid;

use core_kernel::AccountId;
use domain_ledger::{AccountCategory, AccountUpdate, NewAccount};

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub code: String,
    pub name: String,
    pub category: AccountCategory,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub is_cash_account: bool,
    pub description: Option<String>,
}

impl From<CreateAccountRequest> for NewAccount {
    fn from(request: CreateAccountRequest) -> Self {
        let mut account = NewAccount::new(request.code, request.name, request.category);
        if let Some(parent) = request.parent_id {
            account = account.with_parent(AccountId::from_uuid(parent));
        }
        if request.is_cash_account {
            account = account.cash();
        }
        if let Some(description) = request.description {
            account = account.with_description(description);
        }
        account
    }
}

/// Partial update; `code` is not accepted
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub category: Option<AccountCategory>,
    pub parent_id: Option<Uuid>,
    /// Detach from the current parent
    #[serde(default)]
    pub clear_parent: bool,
    pub is_cash_account: Option<bool>,
    pub is_active: Option<bool>,
    pub description: Option<String>,
}

impl From<UpdateAccountRequest> for AccountUpdate {
    fn from(request: UpdateAccountRequest) -> Self {
        let parent_id = if request.clear_parent {
            Some(None)
        } else {
            request.parent_id.map(|id| Some(AccountId::from_uuid(id)))
        };

        AccountUpdate {
            name: request.name,
            category: request.category,
            parent_id,
            is_cash_account: request.is_cash_account,
            is_active: request.is_active,
            description: request.description.map(Some),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListAccountsQuery {
    /// Hide the account with this code, e.g. the opening-balance equity account
    pub exclude_code: Option<String>,
}
