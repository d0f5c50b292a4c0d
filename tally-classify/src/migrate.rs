//! Override-table migration: remap override keys minted against an older
//! identity assignment onto freshly assigned Txn_IDs.
//!
//! Records are matched on a canonical semantic key (date, amount cents,
//! description, source file, balance cents). A key claimed by more than one
//! id on either side is ambiguous and excluded — never guessed.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use tally_core::canon::{CanonicalFields, cents_or_nan};
use tally_core::{RawRecord, Result};

use crate::overrides::OverrideRow;

#[derive(Debug, Default)]
pub struct MigrationReport {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub unmatched_samples: Vec<String>,
    /// Semantic keys excluded because several records share them.
    pub ambiguous_keys: usize,
}

const UNMATCHED_SAMPLE_CAP: usize = 10;

/// Canonical semantic key for cross-assignment matching. Deliberately
/// excludes the occurrence index: the balance column is what tells
/// same-day duplicates apart.
pub fn semantic_key(record: &RawRecord) -> Result<String> {
    let c = CanonicalFields::from_record(record)?;
    Ok([
        c.date.as_str(),
        &c.amount_cents.to_string(),
        c.description.as_str(),
        c.source_file.as_str(),
        &cents_or_nan(c.balance_cents),
    ]
    .join("|"))
}

/// Rewrite each override row's Txn_ID from the old assignment to the new
/// one. Rows that cannot be matched are returned unchanged and reported.
pub fn migrate_overrides(
    old_records: &[RawRecord],
    new_records: &[RawRecord],
    rows: &[OverrideRow],
) -> Result<(Vec<OverrideRow>, MigrationReport)> {
    let (old_by_id, old_ambiguous) = id_to_key(old_records)?;
    let (new_by_key, new_ambiguous) = key_to_id(new_records)?;

    let mut report = MigrationReport {
        total: rows.len(),
        ambiguous_keys: old_ambiguous.len() + new_ambiguous.len(),
        ..Default::default()
    };

    let mut migrated = Vec::with_capacity(rows.len());
    for row in rows {
        let old_id = row.txn_id.trim();
        let target = old_by_id
            .get(old_id)
            .filter(|key| !old_ambiguous.contains(*key) && !new_ambiguous.contains(*key))
            .and_then(|key| new_by_key.get(key));

        let mut out = row.clone();
        match target {
            Some(new_id) => {
                out.txn_id = new_id.clone();
                report.matched += 1;
            }
            None => {
                report.unmatched += 1;
                if report.unmatched_samples.len() < UNMATCHED_SAMPLE_CAP {
                    report.unmatched_samples.push(old_id.to_string());
                }
            }
        }
        migrated.push(out);
    }

    if report.unmatched > 0 {
        warn!(
            unmatched = report.unmatched,
            total = report.total,
            "override rows could not be remapped; carried through unchanged"
        );
    }
    Ok((migrated, report))
}

/// old Txn_ID -> semantic key, plus the set of keys shared by several ids.
fn id_to_key(records: &[RawRecord]) -> Result<(HashMap<String, String>, HashSet<String>)> {
    let mut by_id = HashMap::new();
    let mut seen_keys: HashMap<String, usize> = HashMap::new();
    for record in records {
        if !record.has_txn_id() {
            continue;
        }
        let key = semantic_key(record)?;
        *seen_keys.entry(key.clone()).or_default() += 1;
        by_id.insert(record.txn_id.trim().to_string(), key);
    }
    let ambiguous = seen_keys
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(k, _)| k)
        .collect();
    Ok((by_id, ambiguous))
}

/// semantic key -> new Txn_ID, plus the set of keys claimed more than once.
fn key_to_id(records: &[RawRecord]) -> Result<(HashMap<String, String>, HashSet<String>)> {
    let mut by_key = HashMap::new();
    let mut ambiguous = HashSet::new();
    for record in records {
        if !record.has_txn_id() {
            continue;
        }
        let key = semantic_key(record)?;
        if by_key
            .insert(key.clone(), record.txn_id.trim().to_string())
            .is_some()
        {
            ambiguous.insert(key);
        }
    }
    Ok((by_key, ambiguous))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(desc: &str, balance: &str, txn_id: &str) -> RawRecord {
        RawRecord {
            date: "2024-01-15".into(),
            year_month: "2024-01".into(),
            description: desc.into(),
            amount: "-50.00".into(),
            balance: balance.into(),
            source_file: "2024_01.csv".into(),
            txn_id: txn_id.into(),
            ..Default::default()
        }
    }

    fn override_row(txn_id: &str) -> OverrideRow {
        OverrideRow {
            txn_id: txn_id.into(),
            enabled: "TRUE".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_semantic_key_shape() {
        let key = semantic_key(&record("ATM WITHDRAWAL", "100.00", "x")).unwrap();
        assert_eq!(key, "2024-01-15|-5000|ATM WITHDRAWAL|2024_01.CSV|10000");
    }

    #[test]
    fn test_basic_remap() {
        let old = vec![record("ATM WITHDRAWAL", "100.00", "old-1")];
        let new = vec![record("ATM WITHDRAWAL", "100.00", "new-1")];
        let rows = vec![override_row("old-1")];
        let (migrated, report) = migrate_overrides(&old, &new, &rows).unwrap();
        assert_eq!(migrated[0].txn_id, "new-1");
        assert_eq!(report.matched, 1);
        assert_eq!(report.unmatched, 0);
    }

    #[test]
    fn test_unmatched_carried_through() {
        let old = vec![record("ATM WITHDRAWAL", "100.00", "old-1")];
        let new: Vec<RawRecord> = vec![];
        let rows = vec![override_row("old-1"), override_row("unknown")];
        let (migrated, report) = migrate_overrides(&old, &new, &rows).unwrap();
        assert_eq!(migrated[0].txn_id, "old-1");
        assert_eq!(migrated[1].txn_id, "unknown");
        assert_eq!(report.unmatched, 2);
        assert_eq!(report.unmatched_samples.len(), 2);
    }

    #[test]
    fn test_ambiguous_keys_excluded() {
        // Two new records share the semantic key (both balances absent):
        // neither may be chosen.
        let old = vec![record("ATM WITHDRAWAL", "", "old-1")];
        let new = vec![
            record("ATM WITHDRAWAL", "", "new-1"),
            record("ATM WITHDRAWAL", "", "new-2"),
        ];
        let rows = vec![override_row("old-1")];
        let (migrated, report) = migrate_overrides(&old, &new, &rows).unwrap();
        assert_eq!(migrated[0].txn_id, "old-1");
        assert_eq!(report.unmatched, 1);
        assert!(report.ambiguous_keys >= 1);
    }

    #[test]
    fn test_distinct_balances_remap_independently() {
        let old = vec![
            record("ATM WITHDRAWAL", "100.00", "old-1"),
            record("ATM WITHDRAWAL", "200.00", "old-2"),
        ];
        let new = vec![
            record("ATM WITHDRAWAL", "200.00", "new-2"),
            record("ATM WITHDRAWAL", "100.00", "new-1"),
        ];
        let rows = vec![override_row("old-1"), override_row("old-2")];
        let (migrated, report) = migrate_overrides(&old, &new, &rows).unwrap();
        assert_eq!(migrated[0].txn_id, "new-1");
        assert_eq!(migrated[1].txn_id, "new-2");
        assert_eq!(report.matched, 2);
    }
}
