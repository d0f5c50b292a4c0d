//! Fatal error taxonomy for the ledger engine.
//!
//! Every variant aborts the run; deterministic data problems do not
//! self-resolve, so there is no row-level skip-and-continue.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// YearMonth, SourceFile or Amount absent where identity requires it.
    #[error("missing required field {field} ({row})")]
    MissingRequiredField { field: &'static str, row: String },

    /// A field was present but could not be parsed as a number.
    #[error("invalid numeric value {value:?} for {field} ({row})")]
    InvalidNumericField {
        field: &'static str,
        value: String,
        row: String,
    },

    /// Rows identical across every content field, or a Txn_ID collision.
    /// No order-independent resolution exists for either.
    #[error(
        "indistinguishable duplicate transactions: {groups} group(s) affecting {rows} row(s)\n{sample}"
    )]
    DuplicateIdentity {
        groups: usize,
        rows: usize,
        sample: String,
    },

    /// A computed Txn_ID came out empty.
    #[error("blank Txn_ID detected\n{sample}")]
    BlankIdentity { sample: String },

    /// The override table repeats a Txn_ID.
    #[error("duplicate Txn_ID in override table (must be unique): {ids:?}")]
    DuplicateOverrideKey { ids: Vec<String> },

    /// A boolean or enum cell does not map to a recognized token.
    #[error("unrecognized {column} value: {value:?}")]
    InvalidEnumValue { column: String, value: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
