//! End-to-end classification pipeline: identity, rule scan, override merge.

use tracing::info;

use tally_core::canon::MoneyCell;
use tally_core::{LedgerError, RawRecord, Result, canon, identity};

use crate::merge::{self, FinalRecord};
use crate::overrides::OverrideTable;
use crate::rules::Classifier;

/// Classify every record and merge overrides into final records.
///
/// When every input row already carries a Txn_ID (the clean stage assigned
/// them), those ids are trusted after uniqueness re-assertion, keeping
/// override keys valid. Otherwise the whole set is re-derived — assignment
/// is order-independent, so recomputation is byte-stable.
pub fn classify_records(
    records: &[RawRecord],
    classifier: &Classifier,
    overrides: &OverrideTable,
) -> Result<Vec<FinalRecord>> {
    let ids: Vec<String> = if !records.is_empty() && records.iter().all(RawRecord::has_txn_id) {
        identity::assert_unique_ids(records)?;
        records.iter().map(|r| r.txn_id.trim().to_string()).collect()
    } else {
        identity::assign_ids(records)?
            .into_iter()
            .map(|i| i.txn_id)
            .collect()
    };

    let mut out = Vec::with_capacity(records.len());
    let mut overridden = 0usize;

    for (record, txn_id) in records.iter().zip(ids) {
        let amount = signed_amount(record)?;
        let class = classifier.classify(&record.description, amount);
        let mut final_record = FinalRecord::from_parts(record, txn_id, &class);

        if let Some(patch) = overrides.get(&final_record.txn_id) {
            let before = final_record.override_snapshot();
            merge::apply_patch(&mut final_record, patch, classifier.tables());
            merge::enforce_transfer_invariant(&mut final_record);
            final_record.was_overridden = final_record.override_snapshot() != before;
            if final_record.was_overridden {
                overridden += 1;
            }
        } else {
            merge::enforce_transfer_invariant(&mut final_record);
        }
        final_record.sync_aliases();
        out.push(final_record);
    }

    info!(
        rows = out.len(),
        overridden,
        overrides = overrides.len(),
        "classification complete"
    );
    Ok(out)
}

fn signed_amount(record: &RawRecord) -> Result<f64> {
    match canon::money_cell(&record.amount) {
        MoneyCell::Cents(c) => Ok(c as f64 / 100.0),
        MoneyCell::Missing => Err(LedgerError::MissingRequiredField {
            field: "Amount",
            row: record.summary(),
        }),
        MoneyCell::Invalid => Err(LedgerError::InvalidNumericField {
            field: "Amount",
            value: record.amount.trim().to_string(),
            row: record.summary(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::OverrideRow;
    use crate::taxonomy::CashflowStatement;

    fn record(desc: &str, amount: &str) -> RawRecord {
        RawRecord {
            date: "2024-01-02".into(),
            year_month: "2024-01".into(),
            description: desc.into(),
            amount: amount.into(),
            source_file: "test.csv".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_pipeline_assigns_ids_and_classifies() {
        let classifier = Classifier::new().unwrap();
        let records = vec![
            record("FAST TRANSFER WEILUN", "1200.00"),
            record("MISC EXPENSE", "-50.00"),
        ];
        let out = classify_records(&records, &classifier, &OverrideTable::empty()).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| !r.txn_id.is_empty()));
        assert_eq!(out[0].cashflow_statement, CashflowStatement::Transfer);
        assert_eq!(out[0].managerial_l1, "TRANSFER");
        assert_eq!(out[1].rule_id, "R15_GENERIC_OUTFLOW");
        assert!(!out[1].was_overridden);
    }

    #[test]
    fn test_pipeline_trusts_existing_ids() {
        let classifier = Classifier::new().unwrap();
        let mut records = vec![record("MISC EXPENSE", "-50.00")];
        records[0].txn_id = "preassigned".into();
        let out = classify_records(&records, &classifier, &OverrideTable::empty()).unwrap();
        assert_eq!(out[0].txn_id, "preassigned");
    }

    #[test]
    fn test_pipeline_applies_override_by_txn_id() {
        let classifier = Classifier::new().unwrap();
        let records = vec![record("MISC EXPENSE", "-50.00")];
        let base = classify_records(&records, &classifier, &OverrideTable::empty()).unwrap();
        let txn_id = base[0].txn_id.clone();

        let ov = OverrideRow {
            txn_id: txn_id.clone(),
            economic_l1: "HOUSING".into(),
            economic_l2: "RENOVATION".into(),
            override_reason: "Contractor invoice".into(),
            enabled: "TRUE".into(),
            ..Default::default()
        };
        let table = OverrideTable::from_rows(&[ov]).unwrap();
        let out = classify_records(&records, &classifier, &table).unwrap();

        let row = &out[0];
        assert!(row.was_overridden);
        assert_eq!(row.override_id_applied, "OVR_0001");
        assert_eq!(row.economic_l1, "HOUSING");
        assert_eq!(row.managerial_l1, "HOUSING");
        assert_eq!(row.managerial_l2, "RENOVATION");
        assert_eq!(row.override_reason, "Contractor invoice");
        assert_eq!(row.category_l1, "HOUSING");
    }

    #[test]
    fn test_override_with_no_effect_is_not_marked() {
        let classifier = Classifier::new().unwrap();
        let records = vec![record("MISC EXPENSE", "-50.00")];
        let base = classify_records(&records, &classifier, &OverrideTable::empty()).unwrap();

        // Override re-states the classifier's own values.
        let ov = OverrideRow {
            txn_id: base[0].txn_id.clone(),
            economic_l1: "LIFESTYLE".into(),
            economic_l2: "DISCRETIONARY".into(),
            enabled: "TRUE".into(),
            ..Default::default()
        };
        let table = OverrideTable::from_rows(&[ov]).unwrap();
        let out = classify_records(&records, &classifier, &table).unwrap();
        assert!(!out[0].was_overridden);
        // The match is still recorded for audit.
        assert_eq!(out[0].override_id_applied, "OVR_0001");
    }

    #[test]
    fn test_missing_amount_fails() {
        let classifier = Classifier::new().unwrap();
        let records = vec![record("MISC EXPENSE", "")];
        let err = classify_records(&records, &classifier, &OverrideTable::empty()).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::MissingRequiredField { field: "Amount", .. }
        ));
    }
}
