//! Content hashing: BaseKey, RowFingerprint and Txn_ID.
//!
//! BaseKey defines the equivalence class of "same transaction content"
//! independent of row order — it never includes RowOrder. RowFingerprint
//! adds the optional money columns and is used solely as the final
//! deterministic tie-break inside a BaseKey group.

use sha1::{Digest, Sha1};

use crate::canon::{CanonicalFields, cents_or_nan};

/// SHA-1 hex digest of a string (40 lowercase hex chars).
pub fn sha1_hex(input: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Pipe-joined canonical key fields, fixed order.
pub fn base_key(c: &CanonicalFields) -> String {
    [
        c.date.as_str(),
        c.year_month.as_str(),
        &c.amount_cents.to_string(),
        c.description.as_str(),
        c.source_file.as_str(),
    ]
    .join("|")
}

/// Content hash over the base-key fields plus Balance/Withdrawals/Deposits
/// canonicalized to integer cents (`NaN` when absent).
pub fn row_fingerprint(c: &CanonicalFields) -> String {
    let key = [
        base_key(c),
        cents_or_nan(c.balance_cents),
        cents_or_nan(c.withdrawals_cents),
        cents_or_nan(c.deposits_cents),
    ]
    .join("|");
    sha1_hex(&key)
}

/// Txn_ID: SHA-1 of the base key plus the zero-padded occurrence index.
pub fn txn_id(base_key: &str, occurrence_index: u32) -> String {
    sha1_hex(&format!("{base_key}|OCC{occurrence_index:03}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical() -> CanonicalFields {
        CanonicalFields {
            date: "2024-01-15".into(),
            year_month: "2024-01".into(),
            amount_cents: -5000,
            description: "ATM WITHDRAWAL 79608204".into(),
            source_file: "2024_01.CSV".into(),
            balance_cents: Some(33748292),
            withdrawals_cents: Some(5000),
            deposits_cents: None,
        }
    }

    #[test]
    fn test_sha1_hex_known_vector() {
        assert_eq!(sha1_hex("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_base_key_layout() {
        assert_eq!(
            base_key(&canonical()),
            "2024-01-15|2024-01|-5000|ATM WITHDRAWAL 79608204|2024_01.CSV"
        );
    }

    #[test]
    fn test_row_fingerprint_includes_optional_money_fields() {
        assert_eq!(
            row_fingerprint(&canonical()),
            "886dcc5ae3e9516462ba94b390ca694056c67d51"
        );
    }

    #[test]
    fn test_txn_id_occurrence_padding() {
        let bk = base_key(&canonical());
        assert_eq!(txn_id(&bk, 1), "12fa8ca740f1d871518eeb1a11e70303a09a0126");
        assert_eq!(txn_id(&bk, 2), "a797694632c1213810028837b269ba0c4baccd83");
        assert_ne!(txn_id(&bk, 1), txn_id(&bk, 2));
    }
}
