//! Account registry
//!
//! Chart-of-accounts operations that run inside a unit of work, plus the
//! pure derivations of balances and the trial balance. Balances are never
//! stored; they are summed from posted journal lines on read.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::info;

use core_kernel::{AccountId, Money};
use crate::account::{Account, AccountType, AccountUpdate, NewAccount};
use crate::error::{LedgerError, ValidationError};
use crate::ports::{AccountTotals, LedgerUnitOfWork};

/// Looks an account up by code
///
/// # Errors
///
/// Returns `NotFound` if no account has the code.
pub async fn find_by_code<U: LedgerUnitOfWork>(uow: &mut U, code: &str) -> Result<Account, LedgerError> {
    uow.find_account_by_code(code)
        .await?
        .ok_or_else(|| LedgerError::not_found("Account", code))
}

/// Looks an account up by id
///
/// # Errors
///
/// Returns `NotFound` if the account does not exist.
pub async fn find<U: LedgerUnitOfWork>(uow: &mut U, id: AccountId) -> Result<Account, LedgerError> {
    uow.find_account(id)
        .await?
        .ok_or_else(|| LedgerError::not_found("Account", id))
}

/// Returns the account with the given code, creating it from `defaults` if absent
///
/// The write is a single upsert keyed on the code, so concurrent callers
/// all receive the same row.
pub async fn get_or_create<U: LedgerUnitOfWork>(
    uow: &mut U,
    defaults: NewAccount,
) -> Result<Account, LedgerError> {
    defaults.validate()?;
    let candidate = defaults.into_account();
    let account = uow.upsert_account(&candidate).await?;

    if account.id == candidate.id {
        info!(code = %account.code, account_id = %account.id, "System account created");
    }
    Ok(account)
}

/// Creates an account on behalf of an administrator
///
/// # Errors
///
/// - `Validation` for a malformed definition
/// - `DuplicateReference` if the code is taken
/// - `NotFound` if the parent does not exist
pub async fn create<U: LedgerUnitOfWork>(
    uow: &mut U,
    new_account: NewAccount,
) -> Result<Account, LedgerError> {
    new_account.validate()?;

    if uow.find_account_by_code(&new_account.code).await?.is_some() {
        return Err(LedgerError::DuplicateReference(format!(
            "Account code {} already exists",
            new_account.code
        )));
    }
    if let Some(parent_id) = new_account.parent_id {
        find(uow, parent_id).await?;
    }

    let account = new_account.into_account();
    uow.insert_account(&account).await?;

    info!(code = %account.code, account_id = %account.id, "Account created");
    Ok(account)
}

/// Applies an update to an account; the code never changes
///
/// # Errors
///
/// Returns `InvalidHierarchy` if the new parent is the account itself or
/// one of its descendants.
pub async fn update<U: LedgerUnitOfWork>(
    uow: &mut U,
    id: AccountId,
    changes: &AccountUpdate,
) -> Result<Account, LedgerError> {
    let mut account = find(uow, id).await?;
    changes.apply_to(&mut account)?;

    if let Some(Some(parent_id)) = changes.parent_id {
        ensure_acyclic(uow, id, parent_id).await?;
    }

    uow.update_account(&account).await?;
    info!(code = %account.code, account_id = %account.id, "Account updated");
    Ok(account)
}

/// Deletes an account that nothing references
///
/// # Errors
///
/// - `AccountInUse` while journal lines post to the account
/// - `InvalidOperation` while child accounts exist
pub async fn delete<U: LedgerUnitOfWork>(uow: &mut U, id: AccountId) -> Result<Account, LedgerError> {
    let account = find(uow, id).await?;

    if uow.count_lines_for_account(id).await? > 0 {
        return Err(LedgerError::AccountInUse(account.code));
    }
    if uow.count_child_accounts(id).await? > 0 {
        return Err(LedgerError::invalid_operation(format!(
            "Account {} has child accounts",
            account.code
        )));
    }

    uow.delete_account(id).await?;
    info!(code = %account.code, account_id = %id, "Account deleted");
    Ok(account)
}

/// Creates every missing account of a chart, returning how many were new
pub async fn seed_chart<U: LedgerUnitOfWork>(
    uow: &mut U,
    chart: Vec<NewAccount>,
) -> Result<usize, LedgerError> {
    let mut created = 0;
    for definition in chart {
        let candidate_code = definition.code.clone();
        let existed = uow.find_account_by_code(&candidate_code).await?.is_some();
        get_or_create(uow, definition).await?;
        if !existed {
            created += 1;
        }
    }
    Ok(created)
}

/// Walks up from `new_parent` and fails if it reaches `account_id`
async fn ensure_acyclic<U: LedgerUnitOfWork>(
    uow: &mut U,
    account_id: AccountId,
    new_parent: AccountId,
) -> Result<(), LedgerError> {
    if new_parent == account_id {
        return Err(ValidationError::InvalidHierarchy(
            "an account cannot be its own parent".to_string(),
        )
        .into());
    }

    let mut visited = HashSet::new();
    let mut cursor = Some(new_parent);
    while let Some(current) = cursor {
        if current == account_id {
            return Err(ValidationError::InvalidHierarchy(
                "the new parent is a descendant of the account".to_string(),
            )
            .into());
        }
        if !visited.insert(current) {
            break;
        }
        cursor = find(uow, current).await?.parent_id;
    }
    Ok(())
}

/// Balance of an account signed by its normal side
///
/// Debit-normal accounts (assets, expenses) report debits minus credits;
/// all others report credits minus debits.
pub fn derive_balance(account_type: AccountType, totals: &AccountTotals) -> Result<Money, LedgerError> {
    let balance = if account_type.is_debit_normal() {
        totals.debit.checked_sub(&totals.credit)?
    } else {
        totals.credit.checked_sub(&totals.debit)?
    };
    Ok(balance)
}

/// Posted totals and signed balance of one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub code: String,
    pub account_type: AccountType,
    pub debit_total: Money,
    pub credit_total: Money,
    pub balance: Money,
}

impl AccountBalance {
    /// Builds the balance from the account and its posted totals
    pub fn from_totals(account: &Account, totals: Option<&AccountTotals>) -> Result<Self, LedgerError> {
        let totals = totals.copied().unwrap_or(AccountTotals {
            account_id: account.id,
            debit: Money::ZERO,
            credit: Money::ZERO,
        });
        Ok(Self {
            account_id: account.id,
            code: account.code.clone(),
            account_type: account.account_type,
            debit_total: totals.debit,
            credit_total: totals.credit,
            balance: derive_balance(account.account_type, &totals)?,
        })
    }
}

/// One account row of a trial balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceLine {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    /// Net debit balance, zero when the account nets to credit
    pub debit: Money,
    /// Net credit balance, zero when the account nets to debit
    pub credit: Money,
}

/// Trial balance over all posted entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub lines: Vec<TrialBalanceLine>,
    pub total_debits: Money,
    pub total_credits: Money,
    pub is_balanced: bool,
}

impl TrialBalance {
    /// Builds a trial balance from the chart and per-account posted totals
    ///
    /// Lines follow the order of `accounts`; accounts without postings are
    /// omitted.
    pub fn build(accounts: &[Account], totals: &[AccountTotals]) -> Result<Self, LedgerError> {
        let by_account: HashMap<AccountId, &AccountTotals> =
            totals.iter().map(|t| (t.account_id, t)).collect();

        let mut lines = Vec::new();
        for account in accounts {
            let Some(t) = by_account.get(&account.id) else {
                continue;
            };
            let net = t.debit.checked_sub(&t.credit)?;
            let (debit, credit) = if net.is_negative() {
                (Money::ZERO, -net)
            } else {
                (net, Money::ZERO)
            };
            lines.push(TrialBalanceLine {
                account_id: account.id,
                code: account.code.clone(),
                name: account.name.clone(),
                account_type: account.account_type,
                debit,
                credit,
            });
        }

        let total_debits = Money::checked_sum(lines.iter().map(|l| &l.debit))?;
        let total_credits = Money::checked_sum(lines.iter().map(|l| &l.credit))?;

        Ok(Self {
            is_balanced: total_debits == total_credits,
            lines,
            total_debits,
            total_credits,
        })
    }
}
