//! End-to-end tests for domain_ledger over the in-memory store

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::{Money, UserId};
use domain_ledger::ports::memory::InMemoryLedgerStore;
use domain_ledger::{
    registry, EntryStatus, ErrorKind, InvoiceStatus, LedgerConfig, LedgerService, LedgerStore,
    LedgerUnitOfWork, NewAccount, NewJournalEntry, PostOutcome, Reference, StaleView,
    SubLedgerKind,
};
use test_utils::{
    assert_counts_unchanged, assert_credits, assert_debits, assert_entry_balanced,
    assert_outcome_failed, assert_outcome_ok, assert_trial_balance_balanced, fake_invoice_numbers,
    AccountCodes, DateFixtures, IdFixtures, MoneyFixtures, OpeningBatchBuilder, SeededLedger,
};

fn user() -> UserId {
    IdFixtures::user_id()
}

// ============================================================================
// Opening Balance Tests
// ============================================================================

mod opening_balance_tests {
    use super::*;

    #[tokio::test]
    async fn test_general_lines_are_offset_against_equity() {
        let ledger = SeededLedger::standard().await;
        let batch = OpeningBatchBuilder::new()
            .debit(ledger.id(AccountCodes::CASH), MoneyFixtures::thousand())
            .credit(ledger.id(AccountCodes::LOAN), MoneyFixtures::four_hundred())
            .build();

        let summary = assert_outcome_ok(ledger.service.save_opening_balance_batch(batch, user()).await);
        assert_eq!(summary.equity_offset, Money::new(dec!(600)));
        assert_eq!(summary.journal_entries.len(), 1);

        let entry_id = summary.general_entry.expect("general entry");
        let entry = assert_outcome_ok(ledger.service.get_entry(entry_id).await);
        let equity = ledger
            .store
            .find_account_by_code(AccountCodes::OPENING_EQUITY)
            .await
            .unwrap()
            .expect("equity account created on first use");

        assert_eq!(entry.lines.len(), 3);
        assert_eq!(entry.status, EntryStatus::Posted);
        assert_eq!(entry.document, Reference::OpeningBalance);
        assert!(entry.is_auto_generated);
        assert_entry_balanced(&entry);
        assert_credits(&entry, equity.id, Money::new(dec!(600)));
    }

    #[tokio::test]
    async fn test_credit_heavy_batch_debits_equity() {
        let ledger = SeededLedger::standard().await;
        let batch = OpeningBatchBuilder::new()
            .debit(ledger.id(AccountCodes::INVENTORY), Money::new(dec!(250)))
            .credit(ledger.id(AccountCodes::LOAN), Money::new(dec!(900)))
            .build();

        let summary = assert_outcome_ok(ledger.service.save_opening_balance_batch(batch, user()).await);
        assert_eq!(summary.equity_offset, Money::new(dec!(-650)));

        let entry = assert_outcome_ok(
            ledger
                .service
                .get_entry(summary.general_entry.unwrap())
                .await,
        );
        let equity = ledger
            .store
            .find_account_by_code(AccountCodes::OPENING_EQUITY)
            .await
            .unwrap()
            .unwrap();
        assert_debits(&entry, equity.id, Money::new(dec!(650)));
    }

    #[tokio::test]
    async fn test_balanced_general_lines_need_no_offset_line() {
        let ledger = SeededLedger::standard().await;
        let batch = OpeningBatchBuilder::new()
            .debit(ledger.id(AccountCodes::MACHINERY), MoneyFixtures::thousand())
            .credit(ledger.id(AccountCodes::LOAN), MoneyFixtures::thousand())
            .build();

        let summary = assert_outcome_ok(ledger.service.save_opening_balance_batch(batch, user()).await);
        let entry = assert_outcome_ok(ledger.service.get_entry(summary.general_entry.unwrap()).await);

        assert!(summary.equity_offset.is_zero());
        assert_eq!(entry.lines.len(), 2);
    }

    #[tokio::test]
    async fn test_receivable_opening_creates_documents_and_entry() {
        let ledger = SeededLedger::standard().await;
        let customer = IdFixtures::customer_id();
        let batch = OpeningBatchBuilder::new()
            .receivable_for(customer, "INV-100", MoneyFixtures::five_million())
            .build();

        let summary = assert_outcome_ok(ledger.service.save_opening_balance_batch(batch, user()).await);
        assert_eq!(summary.receivable_invoices.len(), 1);
        assert!(summary.general_entry.is_none());

        let invoices = assert_outcome_ok(
            ledger
                .service
                .list_opening_entries(SubLedgerKind::Receivable)
                .await,
        );
        assert_eq!(invoices.len(), 1);
        let invoice = &invoices[0];
        assert_eq!(invoice.invoice_number, "INV-100");
        assert_eq!(invoice.party_id, customer);
        assert_eq!(invoice.total_amount, MoneyFixtures::five_million());
        assert_eq!(invoice.status, InvoiceStatus::Unpaid);
        assert_eq!(invoice.due_date, DateFixtures::opening_date());
        assert!(invoice.is_opening_balance);

        let entry = assert_outcome_ok(ledger.service.get_entry(summary.journal_entries[0]).await);
        let equity = ledger
            .store
            .find_account_by_code(AccountCodes::OPENING_EQUITY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.document, Reference::SalesInvoice(invoice.id));
        assert_eq!(entry.reference.as_deref(), Some("INV-100"));
        assert_debits(&entry, ledger.id(AccountCodes::RECEIVABLE), MoneyFixtures::five_million());
        assert_credits(&entry, equity.id, MoneyFixtures::five_million());

        let counts = ledger.store.counts().await;
        assert_eq!(counts.orders, 1);
        assert_eq!(counts.invoices, 1);
    }

    #[tokio::test]
    async fn test_payable_opening_credits_control_account() {
        let ledger = SeededLedger::standard().await;
        let batch = OpeningBatchBuilder::new()
            .payable("SUP-7781", Money::new(dec!(12500.50)))
            .build();

        let summary = assert_outcome_ok(ledger.service.save_opening_balance_batch(batch, user()).await);
        let entry = assert_outcome_ok(ledger.service.get_entry(summary.journal_entries[0]).await);

        assert_eq!(
            entry.document,
            Reference::PurchaseInvoice(summary.payable_invoices[0])
        );
        assert_credits(&entry, ledger.id(AccountCodes::PAYABLE), Money::new(dec!(12500.50)));

        let balance = assert_outcome_ok(
            ledger
                .service
                .account_balance(ledger.id(AccountCodes::PAYABLE))
                .await,
        );
        assert_eq!(balance.balance, Money::new(dec!(12500.50)));
    }

    #[tokio::test]
    async fn test_resubmitted_invoice_is_rejected_before_any_write() {
        let ledger = SeededLedger::standard().await;
        let batch = OpeningBatchBuilder::new()
            .receivable("INV-100", MoneyFixtures::five_million())
            .build();

        assert_outcome_ok(
            ledger
                .service
                .save_opening_balance_batch(batch.clone(), user())
                .await,
        );
        let before = ledger.store.counts().await;
        let begun = ledger.store.transactions_begun();

        let message = assert_outcome_failed(
            ledger.service.save_opening_balance_batch(batch, user()).await,
            ErrorKind::DuplicateReference,
        );

        assert!(message.contains("INV-100"));
        assert_counts_unchanged(&before, &ledger.store.counts().await);
        assert_eq!(ledger.store.transactions_begun(), begun);
    }

    #[tokio::test]
    async fn test_invoice_number_repeated_in_batch_is_rejected_before_any_write() {
        let ledger = SeededLedger::standard().await;
        let before = ledger.store.counts().await;
        let begun = ledger.store.transactions_begun();
        let batch = OpeningBatchBuilder::new()
            .receivable("INV-7", Money::new(dec!(10)))
            .receivable("INV-7", Money::new(dec!(20)))
            .build();

        let message = assert_outcome_failed(
            ledger.service.save_opening_balance_batch(batch, user()).await,
            ErrorKind::DuplicateReference,
        );

        assert!(message.contains("INV-7"));
        assert_counts_unchanged(&before, &ledger.store.counts().await);
        assert_eq!(ledger.store.transactions_begun(), begun);
    }

    #[tokio::test]
    async fn test_same_number_in_both_sub_ledgers_is_allowed() {
        let ledger = SeededLedger::standard().await;
        let batch = OpeningBatchBuilder::new()
            .receivable("DOC-1", Money::new(dec!(10)))
            .payable("DOC-1", Money::new(dec!(20)))
            .build();

        let summary = assert_outcome_ok(ledger.service.save_opening_balance_batch(batch, user()).await);
        assert_eq!(summary.receivable_invoices.len(), 1);
        assert_eq!(summary.payable_invoices.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_late_in_batch_rolls_back_everything() {
        let ledger = SeededLedger::standard().await;
        let before = ledger.store.counts().await;

        let numbers = fake_invoice_numbers("AP", 3);
        // Storage fails on the last payable, after everything else is written
        ledger.store.fail_invoice_insert(numbers[2].clone()).await;
        let batch = OpeningBatchBuilder::new()
            .debit(ledger.id(AccountCodes::CASH), MoneyFixtures::thousand())
            .receivable("INV-1", Money::new(dec!(300)))
            .payable(numbers[0].clone(), Money::new(dec!(120)))
            .payable(numbers[1].clone(), Money::new(dec!(80)))
            .payable(numbers[2].clone(), Money::new(dec!(45)))
            .build();

        let message = assert_outcome_failed(
            ledger.service.save_opening_balance_batch(batch, user()).await,
            ErrorKind::TransactionFailure,
        );

        assert!(message.contains(&numbers[2]));
        assert_counts_unchanged(&before, &ledger.store.counts().await);
        assert!(ledger
            .store
            .find_account_by_code(AccountCodes::OPENING_EQUITY)
            .await
            .unwrap()
            .is_none());
        assert_eq!(ledger.invalidator.call_count(), 0);
    }

    #[test]
    fn test_sub_minor_receivable_amount_does_not_decode() {
        let json = format!(
            r#"{{"date":"2025-01-01","receivables":[{{"party_id":"{}","invoice_number":"INV-1","amount":"0.004"}}]}}"#,
            IdFixtures::customer_id().as_uuid()
        );

        let result = serde_json::from_str::<domain_ledger::OpeningBalanceBatch>(&json);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_control_account_is_not_found() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let service = LedgerService::new(store.clone(), LedgerConfig::default());
        let batch = OpeningBatchBuilder::new()
            .receivable("INV-9", Money::new(dec!(10)))
            .build();

        assert_outcome_failed(
            service.save_opening_balance_batch(batch, user()).await,
            ErrorKind::NotFound,
        );
        assert_eq!(store.counts().await.accounts, 0);
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let ledger = SeededLedger::standard().await;
        let begun = ledger.store.transactions_begun();

        assert_outcome_failed(
            ledger
                .service
                .save_opening_balance_batch(OpeningBatchBuilder::new().build(), user())
                .await,
            ErrorKind::Validation,
        );
        assert_eq!(ledger.store.transactions_begun(), begun);
    }

    #[tokio::test]
    async fn test_negligible_general_lines_are_ignored() {
        let ledger = SeededLedger::standard().await;
        let batch = OpeningBatchBuilder::new()
            .debit(ledger.id(AccountCodes::CASH), MoneyFixtures::sub_cent())
            .payable("AP-55", Money::new(dec!(70)))
            .build();

        let summary = assert_outcome_ok(ledger.service.save_opening_balance_batch(batch, user()).await);

        assert!(summary.general_entry.is_none());
        assert_eq!(summary.journal_entries.len(), 1);
    }

    #[tokio::test]
    async fn test_batch_that_cannot_start_times_out() {
        let config = LedgerConfig {
            batch_timeout_secs: 1,
            ..LedgerConfig::default()
        };
        let ledger = SeededLedger::with_config(config).await;
        let batch = OpeningBatchBuilder::new()
            .debit(ledger.id(AccountCodes::CASH), MoneyFixtures::thousand())
            .build();

        // Another writer holds the store
        let held = ledger.store.begin().await.unwrap();

        let message = assert_outcome_failed(
            ledger.service.save_opening_balance_batch(batch, user()).await,
            ErrorKind::TransactionFailure,
        );
        assert!(message.contains("1 seconds"));

        held.rollback().await.unwrap();
        assert_eq!(ledger.store.counts().await.entries, 0);
    }

    #[tokio::test]
    async fn test_successful_batch_invalidates_opening_views() {
        let ledger = SeededLedger::standard().await;
        let batch = OpeningBatchBuilder::new()
            .debit(ledger.id(AccountCodes::CASH), MoneyFixtures::thousand())
            .build();

        assert_outcome_ok(ledger.service.save_opening_balance_batch(batch, user()).await);

        let calls = ledger.invalidator.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains(&StaleView::OpeningBalances));
        assert!(calls[0].contains(&StaleView::BalanceSheet));
    }
}

// ============================================================================
// Deletion and Reversal Tests
// ============================================================================

mod reversal_tests {
    use super::*;

    #[tokio::test]
    async fn test_hard_delete_removes_every_trace_of_an_opening() {
        let ledger = SeededLedger::standard().await;
        // Equity account exists before the measured batch
        assert_outcome_ok(
            ledger
                .service
                .save_opening_balance_batch(
                    OpeningBatchBuilder::new()
                        .debit(ledger.id(AccountCodes::CASH), Money::new(dec!(1)))
                        .build(),
                    user(),
                )
                .await,
        );
        let before = ledger.store.counts().await;

        let summary = assert_outcome_ok(
            ledger
                .service
                .save_opening_balance_batch(
                    OpeningBatchBuilder::new()
                        .receivable("INV-100", MoneyFixtures::five_million())
                        .build(),
                    user(),
                )
                .await,
        );

        let deleted = assert_outcome_ok(
            ledger
                .service
                .delete_opening_entry(summary.receivable_invoices[0], SubLedgerKind::Receivable)
                .await,
        );

        assert_eq!(deleted.invoice_number, "INV-100");
        assert_eq!(deleted.order_number, "SO-OPEN-INV-100");
        assert_eq!(deleted.lines_deleted, 2);
        assert_counts_unchanged(&before, &ledger.store.counts().await);

        let balance = assert_outcome_ok(
            ledger
                .service
                .account_balance(ledger.id(AccountCodes::RECEIVABLE))
                .await,
        );
        assert!(balance.balance.is_zero());
    }

    #[tokio::test]
    async fn test_deleted_invoice_number_can_be_reused() {
        let ledger = SeededLedger::standard().await;
        let batch = OpeningBatchBuilder::new()
            .payable("AP-1", Money::new(dec!(40)))
            .build();

        let summary = assert_outcome_ok(
            ledger
                .service
                .save_opening_balance_batch(batch.clone(), user())
                .await,
        );
        assert_outcome_ok(
            ledger
                .service
                .delete_opening_entry(summary.payable_invoices[0], SubLedgerKind::Payable)
                .await,
        );

        assert_outcome_ok(ledger.service.save_opening_balance_batch(batch, user()).await);
    }

    #[tokio::test]
    async fn test_reversed_opening_cannot_be_hard_deleted() {
        let ledger = SeededLedger::standard().await;
        let summary = assert_outcome_ok(
            ledger
                .service
                .save_opening_balance_batch(
                    OpeningBatchBuilder::new()
                        .receivable("INV-200", Money::new(dec!(900)))
                        .build(),
                    user(),
                )
                .await,
        );

        assert_outcome_ok(
            ledger
                .service
                .reverse_entry(
                    summary.journal_entries[0],
                    user(),
                    "customer disputed".into(),
                    Some(DateFixtures::correction_date()),
                )
                .await,
        );

        assert_outcome_failed(
            ledger
                .service
                .delete_opening_entry(summary.receivable_invoices[0], SubLedgerKind::Receivable)
                .await,
            ErrorKind::Conflict,
        );
    }

    #[tokio::test]
    async fn test_reversal_nets_account_balances_to_zero() {
        let ledger = SeededLedger::standard().await;
        let cash = ledger.id(AccountCodes::CASH);
        let sales = ledger.id(AccountCodes::SALES);

        let entry = assert_outcome_ok(
            ledger
                .service
                .create_manual_entry(
                    NewJournalEntry::new(DateFixtures::opening_date(), "Counter sale", user())
                        .debit(cash, Money::new(dec!(75.25)))
                        .credit(sales, Money::new(dec!(75.25))),
                    true,
                )
                .await,
        );

        let reversal = assert_outcome_ok(
            ledger
                .service
                .reverse_entry(entry.id, user(), "posted to wrong period".into(), None)
                .await,
        );
        assert_eq!(reversal.document, Reference::Reversal(entry.id));

        for account in [cash, sales] {
            let balance = assert_outcome_ok(ledger.service.account_balance(account).await);
            assert!(balance.balance.is_zero());
        }

        assert_outcome_failed(
            ledger
                .service
                .reverse_entry(entry.id, user(), "again".into(), None)
                .await,
            ErrorKind::Conflict,
        );
    }
}

// ============================================================================
// Journal and Trial Balance Tests
// ============================================================================

mod journal_tests {
    use super::*;

    #[tokio::test]
    async fn test_draft_entries_do_not_count_until_posted() {
        let ledger = SeededLedger::standard().await;
        let cash = ledger.id(AccountCodes::CASH);
        let sales = ledger.id(AccountCodes::SALES);

        let draft = assert_outcome_ok(
            ledger
                .service
                .create_manual_entry(
                    NewJournalEntry::new(DateFixtures::opening_date(), "Invoice 12", user())
                        .debit(cash, Money::new(dec!(40)))
                        .credit(sales, Money::new(dec!(40))),
                    false,
                )
                .await,
        );
        assert_eq!(draft.status, EntryStatus::Draft);

        let balance = assert_outcome_ok(ledger.service.account_balance(cash).await);
        assert!(balance.balance.is_zero());

        let outcome = assert_outcome_ok(ledger.service.post_entry(draft.id, user()).await);
        assert_eq!(outcome, PostOutcome::Posted);
        let again = assert_outcome_ok(ledger.service.post_entry(draft.id, user()).await);
        assert_eq!(again, PostOutcome::AlreadyPosted);

        let balance = assert_outcome_ok(ledger.service.account_balance(cash).await);
        assert_eq!(balance.balance, Money::new(dec!(40)));
    }

    #[tokio::test]
    async fn test_unknown_account_is_rejected() {
        let ledger = SeededLedger::standard().await;
        let before = ledger.store.counts().await;

        assert_outcome_failed(
            ledger
                .service
                .create_manual_entry(
                    NewJournalEntry::new(DateFixtures::opening_date(), "Bad", user())
                        .debit(IdFixtures::unknown_account_id(), Money::new(dec!(5)))
                        .credit(ledger.id(AccountCodes::CASH), Money::new(dec!(5))),
                    true,
                )
                .await,
            ErrorKind::Validation,
        );
        assert_counts_unchanged(&before, &ledger.store.counts().await);
    }

    #[tokio::test]
    async fn test_trial_balance_after_full_opening() {
        let ledger = SeededLedger::standard().await;
        let batch = OpeningBatchBuilder::new()
            .debit(ledger.id(AccountCodes::CASH), Money::new(dec!(15000)))
            .debit(ledger.id(AccountCodes::INVENTORY), Money::new(dec!(42000)))
            .credit(ledger.id(AccountCodes::LOAN), Money::new(dec!(20000)))
            .receivable("INV-100", Money::new(dec!(3000)))
            .receivable("INV-101", Money::new(dec!(1500)))
            .payable("AP-900", Money::new(dec!(8000)))
            .build();

        assert_outcome_ok(ledger.service.save_opening_balance_batch(batch, user()).await);

        let trial_balance = assert_outcome_ok(ledger.service.trial_balance().await);
        assert_trial_balance_balanced(&trial_balance);

        let receivable = assert_outcome_ok(
            ledger
                .service
                .account_balance(ledger.id(AccountCodes::RECEIVABLE))
                .await,
        );
        assert_eq!(receivable.balance, Money::new(dec!(4500)));

        // 37,000 general offset + 4,500 receivables - 8,000 payables
        let equity = ledger
            .store
            .find_account_by_code(AccountCodes::OPENING_EQUITY)
            .await
            .unwrap()
            .unwrap();
        let equity_balance = assert_outcome_ok(ledger.service.account_balance(equity.id).await);
        assert_eq!(equity_balance.balance, Money::new(dec!(33500)));
    }
}

// ============================================================================
// Concurrency Tests
// ============================================================================

mod concurrency_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_get_or_create_converges_on_one_account() {
        let store = InMemoryLedgerStore::new();
        let mut handles = Vec::new();

        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut uow = store.begin().await.unwrap();
                let account = registry::get_or_create(
                    &mut uow,
                    LedgerConfig::default().opening_equity_account(),
                )
                .await
                .unwrap();
                uow.commit().await.unwrap();
                account.id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }

        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(store.counts().await.accounts, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_batches_with_same_invoice_commit_once() {
        let ledger = Arc::new(SeededLedger::standard().await);
        let mut handles = Vec::new();

        for _ in 0..4 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                let batch = OpeningBatchBuilder::new()
                    .receivable("INV-RACE", Money::new(dec!(10)))
                    .build();
                ledger.service.save_opening_balance_batch(batch, user()).await.success
            }));
        }

        let mut committed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                committed += 1;
            }
        }

        assert_eq!(committed, 1);
        assert_eq!(ledger.store.counts().await.invoices, 1);
    }

    #[tokio::test]
    async fn test_account_created_in_rolled_back_unit_is_gone() {
        let store = InMemoryLedgerStore::new();
        let mut uow = store.begin().await.unwrap();
        registry::create(
            &mut uow,
            NewAccount::new("1000", "Cash", domain_ledger::AccountCategory::CurrentAsset),
        )
        .await
        .unwrap();
        drop(uow);

        assert!(store.find_account_by_code("1000").await.unwrap().is_none());
        assert_eq!(store.transactions_begun(), 1);
        assert_eq!(store.counts().await.accounts, 0);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use test_utils::{balanced_amounts_strategy, unbalanced_amounts_strategy, EntryAmounts};

    fn entry_for(ledger: &SeededLedger, amounts: &EntryAmounts) -> NewJournalEntry {
        let mut entry = NewJournalEntry::new(DateFixtures::opening_date(), "Generated", user());
        for debit in &amounts.debits {
            entry = entry.debit(ledger.id(AccountCodes::CASH), *debit);
        }
        for credit in &amounts.credits {
            entry = entry.credit(ledger.id(AccountCodes::SALES), *credit);
        }
        entry
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn balanced_entries_are_accepted(amounts in balanced_amounts_strategy()) {
            let entry = runtime().block_on(async {
                let ledger = SeededLedger::standard().await;
                let input = entry_for(&ledger, &amounts);
                ledger.service.create_manual_entry(input, true).await
            });
            prop_assert!(entry.success);
            let entry = entry.data.unwrap();
            prop_assert!(entry.is_balanced());
            prop_assert_eq!(entry.lines.len(), amounts.debits.len() + amounts.credits.len());
        }

        #[test]
        fn unbalanced_entries_are_rejected(amounts in unbalanced_amounts_strategy()) {
            let (outcome, counts_before, counts_after) = runtime().block_on(async {
                let ledger = SeededLedger::standard().await;
                let before = ledger.store.counts().await;
                let input = entry_for(&ledger, &amounts);
                let outcome = ledger.service.create_manual_entry(input, true).await;
                (outcome, before, ledger.store.counts().await)
            });
            prop_assert!(!outcome.success);
            prop_assert_eq!(outcome.error_kind, Some(ErrorKind::Validation));
            prop_assert_eq!(counts_before, counts_after);
        }
    }
}
