//! tally-ingest: statement CSV cleaning and balance reconciliation.
//!
//! Turns extracted statement CSVs (repeated page headers, wrapped
//! descriptions, stringly numbers) into identified [`RawRecord`] rows ready
//! for classification.

pub mod clean;
pub mod reconcile;

pub use clean::{clean_statement_csv, combine_cleaned, infer_year_month_from_filename, parse_money};
pub use reconcile::{ReconcileResult, reconcile};

pub use tally_core::RawRecord;
