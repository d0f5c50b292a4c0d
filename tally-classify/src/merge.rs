//! Final record assembly: classifier output merged with manual overrides.
//!
//! Overrides never blank a field — only explicitly non-blank cells win.
//! After every merge, a final Cashflow_Statement of TRANSFER forces the
//! managerial pair to (TRANSFER, INTERNAL_TRANSFER) unconditionally.

use serde::Serialize;

use tally_core::RawRecord;

use crate::overrides::OverridePatch;
use crate::patterns::PatternTables;
use crate::taxonomy::{
    AssetContext, CashflowStatement, Classification, EventTag, FlowNature, RecordType,
    StabilityClass,
};

/// One fully classified, possibly overridden output row. Written once;
/// immutable after output.
///
/// `Cashflow_Section`, `Category_L1/L2` and `Instrument` are
/// backward-compatible aliases — downstream consumers filter on those
/// names.
#[derive(Debug, Clone, Serialize)]
pub struct FinalRecord {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "YearMonth")]
    pub year_month: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "Balance")]
    pub balance: String,
    #[serde(rename = "Withdrawals")]
    pub withdrawals: String,
    #[serde(rename = "Deposits")]
    pub deposits: String,
    #[serde(rename = "SourceFile")]
    pub source_file: String,
    #[serde(rename = "RowOrder")]
    pub row_order: Option<u64>,
    #[serde(rename = "Txn_ID")]
    pub txn_id: String,
    #[serde(rename = "Record_Type")]
    pub record_type: RecordType,
    #[serde(rename = "Flow_Nature")]
    pub flow_nature: FlowNature,
    #[serde(rename = "Cashflow_Statement")]
    pub cashflow_statement: CashflowStatement,
    #[serde(rename = "Economic_Purpose_L1")]
    pub economic_l1: String,
    #[serde(rename = "Economic_Purpose_L2")]
    pub economic_l2: String,
    #[serde(rename = "Asset_Context")]
    pub asset_context: AssetContext,
    #[serde(rename = "Stability_Class")]
    pub stability_class: StabilityClass,
    #[serde(rename = "Baseline_Eligible")]
    pub baseline_eligible: bool,
    #[serde(rename = "Event_Tag")]
    pub event_tag: EventTag,
    #[serde(rename = "Bank_Rail")]
    pub bank_rail: String,
    #[serde(rename = "Rule_ID")]
    pub rule_id: String,
    #[serde(rename = "Rule_Explanation")]
    pub rule_explanation: String,
    #[serde(rename = "Managerial_Purpose_L1")]
    pub managerial_l1: String,
    #[serde(rename = "Managerial_Purpose_L2")]
    pub managerial_l2: String,
    #[serde(rename = "Is_CC_Settlement")]
    pub is_cc_settlement: bool,
    #[serde(rename = "Cashflow_Section")]
    pub cashflow_section: CashflowStatement,
    #[serde(rename = "Category_L1")]
    pub category_l1: String,
    #[serde(rename = "Category_L2")]
    pub category_l2: String,
    #[serde(rename = "Instrument")]
    pub instrument: String,
    #[serde(rename = "Was_Overridden")]
    pub was_overridden: bool,
    #[serde(rename = "Override_ID_Applied")]
    pub override_id_applied: String,
    #[serde(rename = "Override_Reason")]
    pub override_reason: String,
}

impl FinalRecord {
    pub fn from_parts(record: &RawRecord, txn_id: String, class: &Classification) -> Self {
        let mut out = Self {
            date: record.date.clone(),
            year_month: record.year_month.clone(),
            description: record.description.clone(),
            amount: record.amount.clone(),
            balance: record.balance.clone(),
            withdrawals: record.withdrawals.clone(),
            deposits: record.deposits.clone(),
            source_file: record.source_file.clone(),
            row_order: record.row_order,
            txn_id,
            record_type: class.record_type,
            flow_nature: class.flow_nature,
            cashflow_statement: class.cashflow_statement,
            economic_l1: class.economic_l1.clone(),
            economic_l2: class.economic_l2.clone(),
            asset_context: class.asset_context,
            stability_class: class.stability_class,
            baseline_eligible: class.baseline_eligible,
            event_tag: class.event_tag,
            bank_rail: class.bank_rail.clone(),
            rule_id: class.rule_id.to_string(),
            rule_explanation: class.rule_explanation.clone(),
            managerial_l1: class.managerial_l1.clone(),
            managerial_l2: class.managerial_l2.clone(),
            is_cc_settlement: class.is_cc_settlement,
            cashflow_section: class.cashflow_statement,
            category_l1: class.economic_l1.clone(),
            category_l2: class.economic_l2.clone(),
            instrument: class.bank_rail.clone(),
            was_overridden: false,
            override_id_applied: String::new(),
            override_reason: String::new(),
        };
        out.sync_aliases();
        out
    }

    /// The six overridable taxonomy fields, for change detection.
    pub fn override_snapshot(&self) -> (CashflowStatement, String, String, String, String, bool) {
        (
            self.cashflow_statement,
            self.economic_l1.clone(),
            self.economic_l2.clone(),
            self.managerial_l1.clone(),
            self.managerial_l2.clone(),
            self.baseline_eligible,
        )
    }

    /// Copy canonical columns into their alias columns.
    pub fn sync_aliases(&mut self) {
        self.cashflow_section = self.cashflow_statement;
        self.category_l1 = self.economic_l1.clone();
        self.category_l2 = self.economic_l2.clone();
        self.instrument = self.bank_rail.clone();
    }
}

/// Patch one record with an enabled override. Non-blank cells win; blank
/// cells leave the classifier's value untouched. When the override supplies
/// an economic pair but no managerial pair, the managerial pair is derived
/// from the final economic pair.
pub fn apply_patch(record: &mut FinalRecord, patch: &OverridePatch, tables: &PatternTables) {
    let managerial_l1_provided = patch.managerial_l1.is_some();
    let managerial_l2_provided = patch.managerial_l2.is_some();

    if let Some(cfs) = patch.cashflow_statement {
        record.cashflow_statement = cfs;
    }
    if let Some(l1) = &patch.economic_l1 {
        record.economic_l1 = l1.clone();
    }
    if let Some(l2) = &patch.economic_l2 {
        record.economic_l2 = l2.clone();
    }
    if let Some(l1) = &patch.managerial_l1 {
        record.managerial_l1 = l1.clone();
    }
    if let Some(l2) = &patch.managerial_l2 {
        record.managerial_l2 = l2.clone();
    }
    if let Some(b) = patch.baseline_eligible {
        record.baseline_eligible = b;
    }
    if let Some(reason) = &patch.override_reason {
        // Append, never replace: the audit trail keeps every reason.
        if record.override_reason.trim().is_empty() {
            record.override_reason = reason.clone();
        } else {
            record.override_reason = format!("{} | {}", record.override_reason.trim(), reason);
        }
    }

    let (derived_l1, derived_l2) = tables.derive_managerial(&record.economic_l1, &record.economic_l2);
    if !managerial_l1_provided {
        record.managerial_l1 = derived_l1;
    }
    if !managerial_l2_provided {
        record.managerial_l2 = derived_l2;
    }

    record.override_id_applied = patch.override_id.clone();
}

/// Unconditional invariant: a final TRANSFER statement forces the
/// managerial pair, overriding anything derived or supplied.
pub fn enforce_transfer_invariant(record: &mut FinalRecord) {
    if record.cashflow_statement == CashflowStatement::Transfer {
        record.managerial_l1 = "TRANSFER".into();
        record.managerial_l2 = "INTERNAL_TRANSFER".into();
    }
}
