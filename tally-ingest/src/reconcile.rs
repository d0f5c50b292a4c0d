//! Balance reconciliation: opening balance + sum(amount) vs closing
//! balance, per (SourceFile, YearMonth).
//!
//! Uses first and last present Balance in file order (RowOrder), not date
//! order, because Balance B/F lines may carry no date. Pure report; the
//! records are never mutated.

use std::collections::BTreeMap;

use serde::Serialize;

use tally_core::RawRecord;
use tally_core::canon::{MoneyCell, money_cell};

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileResult {
    #[serde(rename = "SourceFile")]
    pub source_file: String,
    #[serde(rename = "YearMonth")]
    pub year_month: String,
    #[serde(rename = "OpeningBalance")]
    pub opening_balance: Option<f64>,
    #[serde(rename = "SumAmount")]
    pub sum_amount: f64,
    #[serde(rename = "ClosingBalance")]
    pub closing_balance: Option<f64>,
    #[serde(rename = "Delta")]
    pub delta: Option<f64>,
    #[serde(rename = "OK")]
    pub ok: bool,
}

/// Reconcile every (SourceFile, YearMonth) group. `tolerance` is in
/// currency units (default 0.02 at the CLI); arithmetic runs in integer
/// cents.
pub fn reconcile(records: &[RawRecord], tolerance: f64) -> Vec<ReconcileResult> {
    let tolerance_cents = (tolerance * 100.0).round().abs() as i64;

    let mut groups: BTreeMap<(String, String), Vec<&RawRecord>> = BTreeMap::new();
    for record in records {
        let year_month = record.year_month.trim();
        if year_month.is_empty() {
            continue;
        }
        groups
            .entry((record.source_file.clone(), year_month.to_string()))
            .or_default()
            .push(record);
    }

    let mut results = Vec::with_capacity(groups.len());
    for ((source_file, year_month), mut members) in groups {
        members.sort_by_key(|r| r.row_order.unwrap_or(u64::MAX));

        let balances: Vec<i64> = members
            .iter()
            .filter_map(|r| cents(&r.balance))
            .collect();
        let opening = balances.first().copied();
        let closing = balances.last().copied();
        let sum_amount: i64 = members.iter().filter_map(|r| cents(&r.amount)).sum();

        let delta = match (opening, closing) {
            (Some(o), Some(c)) => Some(o + sum_amount - c),
            _ => None,
        };
        let ok = delta.map(|d| d.abs() <= tolerance_cents).unwrap_or(false);

        results.push(ReconcileResult {
            source_file,
            year_month,
            opening_balance: opening.map(dollars),
            sum_amount: dollars(sum_amount),
            closing_balance: closing.map(dollars),
            delta: delta.map(dollars),
            ok,
        });
    }
    results
}

fn cents(raw: &str) -> Option<i64> {
    match money_cell(raw) {
        MoneyCell::Cents(c) => Some(c),
        _ => None,
    }
}

fn dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}
