//! Raw ledger row as it arrives from the cleaning stage (or any CSV with
//! the same columns).
//!
//! Every money/date cell is kept as the raw string: the canonicalizer owns
//! all parsing and its declared failure modes. `RowOrder` is ingestion
//! position, retained for reconciliation display only — it never enters
//! identity or classification.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Date", default)]
    pub date: String,
    #[serde(rename = "YearMonth", default)]
    pub year_month: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Amount", default)]
    pub amount: String,
    #[serde(rename = "Balance", default)]
    pub balance: String,
    #[serde(rename = "Withdrawals", default)]
    pub withdrawals: String,
    #[serde(rename = "Deposits", default)]
    pub deposits: String,
    #[serde(rename = "SourceFile", default)]
    pub source_file: String,
    #[serde(rename = "RowOrder", default)]
    pub row_order: Option<u64>,
    #[serde(rename = "Txn_ID", default)]
    pub txn_id: String,
}

impl Default for RawRecord {
    fn default() -> Self {
        Self {
            date: String::new(),
            year_month: String::new(),
            description: String::new(),
            amount: String::new(),
            balance: String::new(),
            withdrawals: String::new(),
            deposits: String::new(),
            source_file: String::new(),
            row_order: None,
            txn_id: String::new(),
        }
    }
}

impl RawRecord {
    /// One-line summary for error messages and duplicate samples.
    pub fn summary(&self) -> String {
        format!(
            "Date={} Amount={} Description={} SourceFile={} Balance={}",
            blank_or(&self.date),
            blank_or(&self.amount),
            blank_or(&self.description),
            blank_or(&self.source_file),
            blank_or(&self.balance),
        )
    }

    pub fn has_txn_id(&self) -> bool {
        !self.txn_id.trim().is_empty()
    }
}

fn blank_or(s: &str) -> &str {
    let t = s.trim();
    if t.is_empty() { "<blank>" } else { t }
}
