//! Journal entry DTOs

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use core_kernel::{AccountId, Money, UserId};
use domain_ledger::{NewJournalEntry, NewJournalLine};

#[derive(Debug, Deserialize)]
pub struct JournalLineRequest {
    pub account_id: Uuid,
    #[serde(default)]
    pub debit: Money,
    #[serde(default)]
    pub credit: Money,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateJournalEntryRequest {
    pub entry_date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub lines: Vec<JournalLineRequest>,
    /// Post in the same transaction
    #[serde(default)]
    pub post: bool,
}

impl CreateJournalEntryRequest {
    /// Builds the domain input for a manual entry
    pub fn into_entry(self, created_by: UserId) -> NewJournalEntry {
        let mut entry = NewJournalEntry::new(self.entry_date, self.description, created_by);
        if let Some(reference) = self.reference {
            entry = entry.with_reference(reference);
        }
        for line in self.lines {
            entry = entry.line(NewJournalLine {
                account_id: AccountId::from_uuid(line.account_id),
                debit: line.debit,
                credit: line.credit,
                description: line.description,
            });
        }
        entry
    }
}

#[derive(Debug, Deserialize)]
pub struct ReverseEntryRequest {
    pub reason: String,
    /// Defaults to today
    pub reversal_date: Option<NaiveDate>,
}
