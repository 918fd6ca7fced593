//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for the ledger: amounts, dates,
//! deterministic identifiers, and an in-memory ledger pre-seeded with the
//! standard manufacturing chart of accounts.

use chrono::NaiveDate;
use core_kernel::{AccountId, Money, PartyId, UserId};
use domain_ledger::ports::memory::InMemoryLedgerStore;
use domain_ledger::{
    Account, AccountFilter, LedgerConfig, LedgerService, LedgerStore, StaleView, ViewInvalidator,
};
use fake::Fake;
use once_cell::sync::Lazy;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Opening date used across the suite
pub static OPENING_DATE: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// 1,000.00
    pub fn thousand() -> Money {
        Money::new(dec!(1000.00))
    }

    /// 400.00
    pub fn four_hundred() -> Money {
        Money::new(dec!(400.00))
    }

    /// 5,000,000.00, a large receivable
    pub fn five_million() -> Money {
        Money::new(dec!(5000000.00))
    }

    /// One minor unit
    pub fn one_cent() -> Money {
        Money::minor_unit()
    }

    /// Below one minor unit before rounding; rounds to zero
    pub fn sub_cent() -> Money {
        Money::new(dec!(0.004))
    }
}

/// Fixture for dates
pub struct DateFixtures;

impl DateFixtures {
    /// Standard opening date (Jan 1, 2025)
    pub fn opening_date() -> NaiveDate {
        *OPENING_DATE
    }

    /// Standard due date for opening invoices
    pub fn due_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    /// A date for corrections after the opening
    pub fn correction_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 15).unwrap()
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// Deterministic acting user
    pub fn user_id() -> UserId {
        UserId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap())
    }

    /// Deterministic customer
    pub fn customer_id() -> PartyId {
        PartyId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440002").unwrap())
    }

    /// Deterministic supplier
    pub fn supplier_id() -> PartyId {
        PartyId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440003").unwrap())
    }

    /// An account id that no store knows about
    pub fn unknown_account_id() -> AccountId {
        AccountId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440004").unwrap())
    }
}

/// Standard account codes from the manufacturing chart
pub struct AccountCodes;

impl AccountCodes {
    pub const CASH: &'static str = "1010";
    pub const RECEIVABLE: &'static str = "1200";
    pub const INVENTORY: &'static str = "1300";
    pub const MACHINERY: &'static str = "1500";
    pub const PAYABLE: &'static str = "2100";
    pub const LOAN: &'static str = "2500";
    pub const OPENING_EQUITY: &'static str = "3900";
    pub const SALES: &'static str = "4000";
}

/// Generates `count` distinct invoice numbers with a random numeric part
pub fn fake_invoice_numbers(prefix: &str, count: usize) -> Vec<String> {
    let mut seen = HashSet::with_capacity(count);
    while seen.len() < count {
        let n: u32 = (100_000..999_999).fake();
        seen.insert(format!("{}-{}", prefix, n));
    }
    let mut numbers: Vec<String> = seen.into_iter().collect();
    numbers.sort();
    numbers
}

/// Invalidator that records every notification
#[derive(Debug, Default)]
pub struct RecordingInvalidator {
    calls: Mutex<Vec<Vec<StaleView>>>,
}

impl RecordingInvalidator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every notification so far, oldest first
    pub fn calls(&self) -> Vec<Vec<StaleView>> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of notifications so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ViewInvalidator for RecordingInvalidator {
    fn invalidate(&self, views: &[StaleView]) {
        self.calls.lock().unwrap().push(views.to_vec());
    }
}

/// In-memory ledger with the standard chart already in place
pub struct SeededLedger {
    pub store: Arc<InMemoryLedgerStore>,
    pub service: LedgerService<InMemoryLedgerStore>,
    pub invalidator: Arc<RecordingInvalidator>,
    accounts: HashMap<String, Account>,
}

impl SeededLedger {
    /// Seeds the standard chart with the default configuration
    pub async fn standard() -> Self {
        Self::with_config(LedgerConfig::default()).await
    }

    /// Seeds the standard chart with the given configuration
    pub async fn with_config(config: LedgerConfig) -> Self {
        let store = Arc::new(InMemoryLedgerStore::new());
        let service = LedgerService::new(store.clone(), config);
        service
            .seed_standard_chart()
            .await
            .expect("seeding the standard chart failed");

        let invalidator = RecordingInvalidator::new();
        let service = service.with_invalidator(invalidator.clone());

        let accounts = store
            .list_accounts(&AccountFilter::default())
            .await
            .expect("listing seeded accounts failed")
            .into_iter()
            .map(|account| (account.code.clone(), account))
            .collect();

        Self {
            store,
            service,
            invalidator,
            accounts,
        }
    }

    /// The seeded account with this code
    ///
    /// # Panics
    ///
    /// Panics if the chart has no such code
    pub fn account(&self, code: &str) -> &Account {
        self.accounts
            .get(code)
            .unwrap_or_else(|| panic!("no seeded account with code {}", code))
    }

    /// Shorthand for `account(code).id`
    pub fn id(&self, code: &str) -> AccountId {
        self.account(code).id
    }
}
