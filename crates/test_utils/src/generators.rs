//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating ledger amounts and
//! identifiers that respect (or deliberately break) domain invariants.

use core_kernel::{Money, PartyId};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Debit and credit amounts for one entry
#[derive(Debug, Clone)]
pub struct EntryAmounts {
    pub debits: Vec<Money>,
    pub credits: Vec<Money>,
}

impl EntryAmounts {
    pub fn total_debits(&self) -> Money {
        self.debits.iter().sum()
    }

    pub fn total_credits(&self) -> Money {
        self.credits.iter().sum()
    }
}

/// Strategy for generating valid positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000i64
}

/// Strategy for generating Money values with positive amounts
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(Money::from_minor)
}

/// Strategy for generating Money values with at most 2 decimal places
pub fn non_negative_money_strategy() -> impl Strategy<Value = Money> {
    (0i64..1_000_000_000i64).prop_map(Money::from_minor)
}

/// Strategy for decimals with more precision than the minor unit
pub fn high_precision_decimal_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64, 3u32..8u32).prop_map(|(m, s)| Decimal::new(m, s))
}

/// Strategy for balanced entry amounts
///
/// Debits are drawn freely; the same total is then split across a random
/// number of credit lines, every part at least one minor unit.
pub fn balanced_amounts_strategy() -> impl Strategy<Value = EntryAmounts> {
    (
        proptest::collection::vec(1i64..10_000_000i64, 1..6),
        proptest::collection::vec(1u32..1000u32, 1..6),
    )
        .prop_map(|(debits, weights)| {
            let total: i64 = debits.iter().sum();
            let credits = split_minor(total, &weights);
            EntryAmounts {
                debits: debits.into_iter().map(Money::from_minor).collect(),
                credits: credits.into_iter().map(Money::from_minor).collect(),
            }
        })
}

/// Strategy for entry amounts that are off by at least one minor unit
pub fn unbalanced_amounts_strategy() -> impl Strategy<Value = EntryAmounts> {
    (balanced_amounts_strategy(), 1i64..100_000i64).prop_map(|(mut amounts, skew)| {
        amounts.debits[0] = amounts.debits[0] + Money::from_minor(skew);
        amounts
    })
}

/// Splits `total` minor units proportionally to `weights`
///
/// Parts stay positive while `total` covers one unit per part; the last
/// part absorbs the rounding remainder.
fn split_minor(total: i64, weights: &[u32]) -> Vec<i64> {
    let parts = (weights.len() as i64).min(total).max(1) as usize;
    let weights = &weights[..parts];
    let weight_sum: i64 = weights.iter().map(|w| *w as i64).sum();
    let spare = total - parts as i64;

    let mut out: Vec<i64> = weights
        .iter()
        .map(|w| 1 + spare * (*w as i64) / weight_sum)
        .collect();
    let assigned: i64 = out.iter().sum();
    if let Some(last) = out.last_mut() {
        *last += total - assigned;
    }
    out
}

/// Strategy for invoice numbers
pub fn invoice_number_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{2,4}-[0-9]{3,6}".prop_map(|s| s)
}

/// Strategy for generating PartyId
pub fn party_id_strategy() -> impl Strategy<Value = PartyId> {
    any::<[u8; 16]>().prop_map(|bytes| PartyId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}
