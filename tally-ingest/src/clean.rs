//! Statement CSV cleaning.
//!
//! Extracted statement CSVs carry three kinds of noise: page headers that
//! repeat mid-file (currency rows, repeated column-header rows, blank
//! separators), transaction descriptions wrapped across multiple rows, and
//! numeric columns formatted as strings with thousands separators. Rows
//! with a date or any money cell anchor a transaction; following rows that
//! carry only description text belong to the anchor above them.

use std::path::Path;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, info};

use tally_core::{LedgerError, RawRecord, Result, identity};

const EXPECTED_COLS: [&str; 5] = ["Date", "Description", "Withdrawals", "Deposits", "Balance"];

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// One raw statement line, all cells trimmed.
#[derive(Debug, Clone, Default)]
struct StatementLine {
    date: String,
    description: String,
    withdrawals: String,
    deposits: String,
    balance: String,
}

impl StatementLine {
    /// A new transaction starts when a date or any money cell is present.
    fn is_anchor(&self) -> bool {
        !self.date.is_empty()
            || !self.withdrawals.is_empty()
            || !self.deposits.is_empty()
            || !self.balance.is_empty()
    }

    fn is_noise(&self) -> bool {
        // Currency header row.
        if self.withdrawals.eq_ignore_ascii_case("SGD")
            && self.deposits.eq_ignore_ascii_case("SGD")
            && self.balance.eq_ignore_ascii_case("SGD")
        {
            return true;
        }
        // Repeated column-header row injected mid-file.
        let upper = [
            self.date.to_uppercase(),
            self.description.to_uppercase(),
            self.withdrawals.to_uppercase(),
            self.deposits.to_uppercase(),
            self.balance.to_uppercase(),
        ];
        if upper.contains(&"DATE".to_string()) && upper.contains(&"DESCRIPTION".to_string()) {
            return true;
        }
        if upper[0] == "DATE" || upper[1] == "DESCRIPTION" || upper[4] == "BALANCE" {
            return true;
        }
        // Fully blank separator row.
        upper.iter().all(String::is_empty)
    }
}

/// Clean one statement CSV into identified records.
///
/// Runs the identity assigner before returning, so every invariant
/// violation (indistinguishable duplicates, blank ids) aborts before any
/// output is written.
pub fn clean_statement_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let lines = read_lines(path)?;
    let kept: Vec<StatementLine> = lines.into_iter().filter(|l| !l.is_noise()).collect();
    debug!(path = %path.display(), rows = kept.len(), "statement rows after noise removal");

    let (year, file_month) = infer_year_month_from_filename(path);
    let source_file = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut records = Vec::new();
    let mut group: Option<(usize, StatementLine, Vec<String>)> = None;

    for (order, line) in kept.iter().enumerate() {
        let start_new = line.is_anchor() || group.is_none();
        if start_new {
            if let Some(g) = group.take() {
                push_record(&mut records, g, year, file_month, &source_file);
            }
            let mut anchor = line.clone();
            let desc = std::mem::take(&mut anchor.description);
            group = Some((order, anchor, non_empty(desc)));
        } else if let Some((_, _, parts)) = group.as_mut() {
            parts.extend(non_empty(line.description.clone()));
        }
    }
    if let Some(g) = group.take() {
        push_record(&mut records, g, year, file_month, &source_file);
    }

    // Drop rows with no signal at all.
    records.retain(|r| {
        !(r.date.is_empty()
            && r.description.is_empty()
            && matches!(r.amount.as_str(), "" | "0.00")
            && r.balance.is_empty())
    });

    let ids = identity::assign_ids(&records)?;
    for (record, id) in records.iter_mut().zip(ids) {
        record.txn_id = id.txn_id;
    }

    info!(path = %path.display(), records = records.len(), "cleaned statement");
    Ok(records)
}

/// Concatenate per-file outputs and re-assert Txn_ID uniqueness across the
/// union.
pub fn combine_cleaned(per_file: Vec<Vec<RawRecord>>) -> Result<Vec<RawRecord>> {
    let combined: Vec<RawRecord> = per_file.into_iter().flatten().collect();
    identity::assert_unique_ids(&combined)?;
    Ok(combined)
}

fn read_lines(path: &Path) -> Result<Vec<StatementLine>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let index_of = |name: &'static str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(LedgerError::MissingRequiredField {
                field: name,
                row: format!("{}: expected columns {:?}", path.display(), EXPECTED_COLS),
            })
    };
    let idx: Vec<usize> = EXPECTED_COLS
        .iter()
        .map(|c| index_of(c))
        .collect::<Result<_>>()?;

    let mut out = Vec::new();
    for row in reader.records() {
        let row = row?;
        let cell = |i: usize| row.get(idx[i]).unwrap_or("").trim().to_string();
        out.push(StatementLine {
            date: cell(0),
            description: cell(1),
            withdrawals: cell(2),
            deposits: cell(3),
            balance: cell(4),
        });
    }
    Ok(out)
}

fn non_empty(s: String) -> Vec<String> {
    let t = s.trim().to_string();
    if t.is_empty() { vec![] } else { vec![t] }
}

fn push_record(
    records: &mut Vec<RawRecord>,
    (order, anchor, desc_parts): (usize, StatementLine, Vec<String>),
    year: Option<i32>,
    file_month: Option<u32>,
    source_file: &str,
) {
    let parsed_date = parse_date_with_year(&anchor.date, year);
    let withdrawals = parse_money(&anchor.withdrawals);
    let deposits = parse_money(&anchor.deposits);
    let balance = parse_money(&anchor.balance);
    // Amount must not be absent when only one side exists.
    let amount = deposits.unwrap_or(0.0) - withdrawals.unwrap_or(0.0);

    let year_month = match parsed_date {
        Some(d) => d.format("%Y-%m").to_string(),
        None => match (year, file_month) {
            (Some(y), Some(m)) => format!("{y:04}-{m:02}"),
            _ => String::new(),
        },
    };

    records.push(RawRecord {
        date: parsed_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        year_month,
        description: desc_parts.join(" "),
        amount: format!("{amount:.2}"),
        balance: money_str(balance),
        withdrawals: money_str(withdrawals),
        deposits: money_str(deposits),
        source_file: source_file.to_string(),
        row_order: Some(order as u64),
        txn_id: String::new(),
    });
}

fn money_str(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_default()
}

/// Parse numeric strings like `3,610.00` or `(123.45)` (negative) into a
/// float. Returns None when blank or unparsable.
pub fn parse_money(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut s = trimmed.replace(',', "");
    s.retain(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '(' | ')'));
    if s.starts_with('(') && s.ends_with(')') && s.len() > 2 {
        s = format!("-{}", &s[1..s.len() - 1]);
    }
    s.parse::<f64>().ok()
}

/// Infer (year, month) from filenames like `2024_1. Jan24.csv` or
/// `UOB_2025_Mar.csv`. Month may be absent; a `Mon24`-style two-digit year
/// fills in when no four-digit year is present.
pub fn infer_year_month_from_filename(path: &Path) -> (Option<i32>, Option<u32>) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_uppercase())
        .unwrap_or_default();

    let year_re = Regex::new(r"(20\d{2})").expect("static pattern");
    let mut year = year_re
        .captures(&name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok());

    // Underscore counts as a separator: `UOB_2025_Mar.csv` style names
    // put the month token right after one.
    let month_re =
        Regex::new(r"(?:\b|_)(JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC)(\d{2})?(?:\b|_)")
            .expect("static pattern");
    let mut month = None;
    if let Some(caps) = month_re.captures(&name) {
        let token = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        month = MONTHS.iter().position(|m| *m == token).map(|i| i as u32 + 1);
        if year.is_none()
            && let Some(yy) = caps.get(2)
            && let Ok(yy) = yy.as_str().parse::<i32>()
        {
            year = Some(2000 + yy);
        }
    }
    (year, month)
}

const FULL_DATE_FORMATS: &[&str] = &["%d %b %Y", "%d %B %Y", "%d/%m/%Y", "%Y-%m-%d", "%d-%b-%Y"];

/// Parse statement dates. `02 Jan` rows get the filename-inferred year
/// appended; rows that already carry a year parse directly.
pub fn parse_date_with_year(raw: &str, year: Option<i32>) -> Option<NaiveDate> {
    let s = tally_core::canon::collapse_ws(raw);
    if s.is_empty() {
        return None;
    }

    let has_year = Regex::new(r"\b20\d{2}\b").expect("static pattern").is_match(&s);
    if !has_year && let Some(y) = year {
        let with_year = format!("{s} {y}");
        for fmt in ["%d %b %Y", "%d %B %Y"] {
            if let Ok(d) = NaiveDate::parse_from_str(&with_year, fmt) {
                return Some(d);
            }
        }
    }
    for fmt in FULL_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&s, fmt) {
            return Some(d);
        }
    }
    None
}
