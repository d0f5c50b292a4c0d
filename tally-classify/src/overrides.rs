//! Manual override table: a CSV sheet keyed by Txn_ID, loaded once per run
//! and read-only afterwards.
//!
//! Only rows whose `Enabled` cell coerces to true are retained; each
//! retained row gets an `OVR_NNNN` audit id in file order. A repeated
//! Txn_ID is fatal. Missing optional columns are treated as all-blank.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use tally_core::{LedgerError, Result};

use crate::taxonomy::CashflowStatement;

/// Cell values that mean "no override for this field".
const BLANK_SENTINELS: &[&str] = &["NA", "BLANK", "(BLANK)"];

/// True when a cell carries no override value.
pub fn is_blank(cell: &str) -> bool {
    let t = cell.trim();
    t.is_empty() || BLANK_SENTINELS.contains(&t.to_uppercase().as_str())
}

/// One raw override row as it appears in the sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverrideRow {
    #[serde(rename = "Txn_ID", default)]
    pub txn_id: String,
    #[serde(rename = "Cashflow_Statement", default)]
    pub cashflow_statement: String,
    #[serde(rename = "Economic_Purpose_L1", default)]
    pub economic_l1: String,
    #[serde(rename = "Economic_Purpose_L2", default)]
    pub economic_l2: String,
    #[serde(rename = "Managerial_Purpose_L1", default)]
    pub managerial_l1: String,
    #[serde(rename = "Managerial_Purpose_L2", default)]
    pub managerial_l2: String,
    #[serde(rename = "Baseline_Eligible", default)]
    pub baseline_eligible: String,
    #[serde(rename = "Override_Reason", default)]
    pub override_reason: String,
    #[serde(rename = "Enabled", default)]
    pub enabled: String,
}

/// A parsed, enabled override ready to patch one record.
#[derive(Debug, Clone)]
pub struct OverridePatch {
    pub override_id: String,
    pub cashflow_statement: Option<CashflowStatement>,
    pub economic_l1: Option<String>,
    pub economic_l2: Option<String>,
    pub managerial_l1: Option<String>,
    pub managerial_l2: Option<String>,
    pub baseline_eligible: Option<bool>,
    pub override_reason: Option<String>,
}

/// All enabled overrides keyed by Txn_ID.
#[derive(Debug, Default)]
pub struct OverrideTable {
    patches: HashMap<String, OverridePatch>,
}

impl OverrideTable {
    /// No overrides configured: every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let rows: Vec<OverrideRow> = reader.deserialize().collect::<std::result::Result<_, _>>()?;
        let table = Self::from_rows(&rows)?;
        info!(path = %path.display(), enabled = table.len(), "loaded override table");
        Ok(table)
    }

    pub fn from_rows(rows: &[OverrideRow]) -> Result<Self> {
        let mut patches = HashMap::new();
        let mut duplicates = Vec::new();
        let mut seq = 0usize;

        for row in rows {
            // Validate the Enabled cell on every row, even ones dropped
            // later, so a typo never silently disables an override.
            let enabled = coerce_enabled(&row.enabled)?;
            let txn_id = row.txn_id.trim().to_string();
            if txn_id.is_empty() || !enabled {
                continue;
            }
            seq += 1;
            let patch = OverridePatch {
                override_id: format!("OVR_{seq:04}"),
                cashflow_statement: if is_blank(&row.cashflow_statement) {
                    None
                } else {
                    Some(CashflowStatement::parse(&row.cashflow_statement)?)
                },
                economic_l1: upper_cell(&row.economic_l1),
                economic_l2: upper_cell(&row.economic_l2),
                managerial_l1: upper_cell(&row.managerial_l1),
                managerial_l2: upper_cell(&row.managerial_l2),
                baseline_eligible: coerce_optional_bool(&row.baseline_eligible)?,
                override_reason: if is_blank(&row.override_reason) {
                    None
                } else {
                    Some(row.override_reason.trim().to_string())
                },
            };
            if patches.insert(txn_id.clone(), patch).is_some() {
                duplicates.push(txn_id);
            }
        }

        if !duplicates.is_empty() {
            duplicates.sort();
            duplicates.dedup();
            return Err(LedgerError::DuplicateOverrideKey { ids: duplicates });
        }
        Ok(Self { patches })
    }

    pub fn get(&self, txn_id: &str) -> Option<&OverridePatch> {
        self.patches.get(txn_id)
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

fn upper_cell(cell: &str) -> Option<String> {
    if is_blank(cell) {
        None
    } else {
        Some(cell.trim().to_uppercase())
    }
}

/// `Enabled` coercion: TRUE/1/YES/Y are true, FALSE/0/NO/N and blank are
/// false, anything else is fatal.
fn coerce_enabled(cell: &str) -> Result<bool> {
    match cell.trim().to_uppercase().as_str() {
        "TRUE" | "1" | "YES" | "Y" => Ok(true),
        "FALSE" | "0" | "NO" | "N" | "" => Ok(false),
        other => Err(LedgerError::InvalidEnumValue {
            column: "Enabled".into(),
            value: other.to_string(),
        }),
    }
}

/// `Baseline_Eligible` coercion: same tokens, but blank means "no override".
fn coerce_optional_bool(cell: &str) -> Result<Option<bool>> {
    if is_blank(cell) {
        return Ok(None);
    }
    match cell.trim().to_uppercase().as_str() {
        "TRUE" | "1" | "YES" | "Y" => Ok(Some(true)),
        "FALSE" | "0" | "NO" | "N" => Ok(Some(false)),
        other => Err(LedgerError::InvalidEnumValue {
            column: "Baseline_Eligible".into(),
            value: other.to_string(),
        }),
    }
}
