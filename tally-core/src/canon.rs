//! Field canonicalization: normalize raw cell values into comparable,
//! hashable forms.
//!
//! All functions are pure. The only failure modes are the declared ones
//! (missing/unparsable required fields); everything else is total.

use chrono::NaiveDate;

use crate::error::{LedgerError, Result};
use crate::record::RawRecord;

/// Sentinel for a blank or unparsable date.
pub const DATE_NA: &str = "NA";

/// Sentinel for an absent optional money field inside a fingerprint.
pub const MONEY_NAN: &str = "NaN";

/// Collapse all internal whitespace runs to single spaces and trim.
pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse whitespace and uppercase (descriptions, source file names).
pub fn collapse_upper(s: &str) -> String {
    collapse_ws(s).to_uppercase()
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d %b %Y", "%d-%b-%Y", "%d %B %Y"];

/// Canonicalize a date cell to `YYYY-MM-DD`, or [`DATE_NA`] when blank or
/// unparsable. Day-first forms are accepted because bank statements in the
/// source region write them that way.
pub fn canon_date(raw: &str) -> String {
    let s = collapse_ws(raw);
    if s.is_empty() {
        return DATE_NA.to_string();
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&s, fmt) {
            return d.format("%Y-%m-%d").to_string();
        }
    }
    DATE_NA.to_string()
}

/// Outcome of parsing a money cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoneyCell {
    Missing,
    Invalid,
    Cents(i64),
}

/// Parse a money cell into integer cents. Blank is `Missing`, a present but
/// non-numeric value is `Invalid`; the caller decides which of those is
/// fatal for the field at hand.
pub fn money_cell(raw: &str) -> MoneyCell {
    let s = raw.trim().replace(',', "");
    if s.is_empty() {
        return MoneyCell::Missing;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => MoneyCell::Cents(to_cents(v)),
        _ => MoneyCell::Invalid,
    }
}

/// Round a float value to integer cents.
pub fn to_cents(v: f64) -> i64 {
    (v * 100.0).round() as i64
}

/// The canonical key fields of one record, derived and immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalFields {
    /// `YYYY-MM-DD` or [`DATE_NA`].
    pub date: String,
    pub year_month: String,
    pub amount_cents: i64,
    pub description: String,
    pub source_file: String,
    pub balance_cents: Option<i64>,
    pub withdrawals_cents: Option<i64>,
    pub deposits_cents: Option<i64>,
}

impl CanonicalFields {
    /// Canonicalize a raw record, failing on the declared required fields.
    pub fn from_record(record: &RawRecord) -> Result<Self> {
        let year_month = collapse_ws(&record.year_month);
        if year_month.is_empty() {
            return Err(LedgerError::MissingRequiredField {
                field: "YearMonth",
                row: record.summary(),
            });
        }

        let amount_cents = match money_cell(&record.amount) {
            MoneyCell::Cents(c) => c,
            MoneyCell::Missing => {
                return Err(LedgerError::MissingRequiredField {
                    field: "Amount",
                    row: record.summary(),
                });
            }
            MoneyCell::Invalid => {
                return Err(LedgerError::InvalidNumericField {
                    field: "Amount",
                    value: record.amount.trim().to_string(),
                    row: record.summary(),
                });
            }
        };

        let source_file = collapse_upper(&record.source_file);
        if source_file.is_empty() {
            return Err(LedgerError::MissingRequiredField {
                field: "SourceFile",
                row: record.summary(),
            });
        }

        Ok(Self {
            date: canon_date(&record.date),
            year_month,
            amount_cents,
            description: collapse_upper(&record.description),
            source_file,
            balance_cents: optional_cents(&record.balance),
            withdrawals_cents: optional_cents(&record.withdrawals),
            deposits_cents: optional_cents(&record.deposits),
        })
    }
}

/// Optional money fields: integer cents when present and numeric, otherwise
/// absent (rendered as the `NaN` sentinel in fingerprints).
fn optional_cents(raw: &str) -> Option<i64> {
    match money_cell(raw) {
        MoneyCell::Cents(c) => Some(c),
        _ => None,
    }
}

/// Render an optional cents value for hashing.
pub fn cents_or_nan(v: Option<i64>) -> String {
    match v {
        Some(c) => c.to_string(),
        None => MONEY_NAN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(amount: &str) -> RawRecord {
        RawRecord {
            date: "2024-01-15".into(),
            year_month: "2024-01".into(),
            description: "  ATM   WITHDRAWAL  79608204 ".into(),
            amount: amount.into(),
            source_file: "2024_01.csv".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_canon_date_formats() {
        assert_eq!(canon_date("2024-01-15"), "2024-01-15");
        assert_eq!(canon_date("15/01/2024"), "2024-01-15");
        assert_eq!(canon_date("15 Jan 2024"), "2024-01-15");
        assert_eq!(canon_date(""), "NA");
        assert_eq!(canon_date("not a date"), "NA");
    }

    #[test]
    fn test_money_cell() {
        assert_eq!(money_cell("-50.00"), MoneyCell::Cents(-5000));
        assert_eq!(money_cell("1,234.56"), MoneyCell::Cents(123456));
        assert_eq!(money_cell(""), MoneyCell::Missing);
        assert_eq!(money_cell("  "), MoneyCell::Missing);
        assert_eq!(money_cell("abc"), MoneyCell::Invalid);
    }

    #[test]
    fn test_to_cents_rounding() {
        assert_eq!(to_cents(0.015), 2);
        assert_eq!(to_cents(-0.015), -2);
        assert_eq!(to_cents(337482.92), 33748292);
    }

    #[test]
    fn test_canonical_fields_happy_path() {
        let c = CanonicalFields::from_record(&record("-50.00")).unwrap();
        assert_eq!(c.date, "2024-01-15");
        assert_eq!(c.amount_cents, -5000);
        assert_eq!(c.description, "ATM WITHDRAWAL 79608204");
        assert_eq!(c.source_file, "2024_01.CSV");
        assert_eq!(c.balance_cents, None);
    }

    #[test]
    fn test_missing_amount_is_fatal() {
        let err = CanonicalFields::from_record(&record("")).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::MissingRequiredField { field: "Amount", .. }
        ));
    }

    #[test]
    fn test_invalid_amount_is_fatal() {
        let err = CanonicalFields::from_record(&record("fifty")).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidNumericField { field: "Amount", .. }
        ));
    }

    #[test]
    fn test_missing_year_month_is_fatal() {
        let mut r = record("-50.00");
        r.year_month = "   ".into();
        let err = CanonicalFields::from_record(&r).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::MissingRequiredField { field: "YearMonth", .. }
        ));
    }

    #[test]
    fn test_missing_source_file_is_fatal() {
        let mut r = record("-50.00");
        r.source_file = "".into();
        let err = CanonicalFields::from_record(&r).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::MissingRequiredField { field: "SourceFile", .. }
        ));
    }

    #[test]
    fn test_blank_date_and_description_are_non_fatal() {
        let mut r = record("-50.00");
        r.date = "".into();
        r.description = "".into();
        let c = CanonicalFields::from_record(&r).unwrap();
        assert_eq!(c.date, "NA");
        assert_eq!(c.description, "");
    }
}
