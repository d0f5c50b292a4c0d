//! Classification taxonomy: the closed enumerated domains and the full
//! per-record classification result.
//!
//! Cashflow statement, record type and flow nature are closed sets the
//! engine validates on input (overrides) and produces on output. The
//! purpose levels stay open strings because L2 carries issuer-suffixed
//! values like `CREDIT_CARD_SETTLEMENT_UOB`.

use std::fmt;

use serde::{Deserialize, Serialize};

use tally_core::{LedgerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CashflowStatement {
    #[serde(rename = "OPERATING")]
    Operating,
    #[serde(rename = "INVESTING")]
    Investing,
    #[serde(rename = "FINANCING")]
    Financing,
    #[serde(rename = "TRANSFER")]
    Transfer,
    #[serde(rename = "NON-CASH")]
    NonCash,
}

impl CashflowStatement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operating => "OPERATING",
            Self::Investing => "INVESTING",
            Self::Financing => "FINANCING",
            Self::Transfer => "TRANSFER",
            Self::NonCash => "NON-CASH",
        }
    }

    /// Parse an override cell; unrecognized tokens are fatal.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_uppercase().as_str() {
            "OPERATING" => Ok(Self::Operating),
            "INVESTING" => Ok(Self::Investing),
            "FINANCING" => Ok(Self::Financing),
            "TRANSFER" => Ok(Self::Transfer),
            "NON-CASH" => Ok(Self::NonCash),
            _ => Err(LedgerError::InvalidEnumValue {
                column: "Cashflow_Statement".into(),
                value: raw.trim().to_string(),
            }),
        }
    }
}

impl fmt::Display for CashflowStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    #[serde(rename = "TRANSACTION")]
    Transaction,
    #[serde(rename = "SUMMARY")]
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowNature {
    #[serde(rename = "INCOME")]
    Income,
    #[serde(rename = "EXPENSE")]
    Expense,
    #[serde(rename = "TRANSFER")]
    Transfer,
    #[serde(rename = "NON-CASH")]
    NonCash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetContext {
    #[serde(rename = "GENERAL")]
    General,
    #[serde(rename = "PROPERTY")]
    Property,
    #[serde(rename = "CAR")]
    Car,
    #[serde(rename = "FINANCIAL")]
    Financial,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StabilityClass {
    #[serde(rename = "STRUCTURAL_RECURRING")]
    StructuralRecurring,
    #[serde(rename = "SEMI_RECURRING")]
    SemiRecurring,
    #[serde(rename = "VARIABLE")]
    Variable,
    #[serde(rename = "ONE_OFF")]
    OneOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTag {
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "RENOVATION")]
    Renovation,
    #[serde(rename = "PROPERTY_ACQ")]
    PropertyAcq,
    #[serde(rename = "TAX_EVENT")]
    TaxEvent,
}

/// Full classification of one transaction. A pure function of the
/// normalized description and signed amount — recomputable at any time,
/// never persisted independently.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub record_type: RecordType,
    pub flow_nature: FlowNature,
    pub cashflow_statement: CashflowStatement,
    pub economic_l1: String,
    pub economic_l2: String,
    pub asset_context: AssetContext,
    pub stability_class: StabilityClass,
    pub baseline_eligible: bool,
    pub event_tag: EventTag,
    pub bank_rail: String,
    pub rule_id: &'static str,
    pub rule_explanation: String,
    pub managerial_l1: String,
    pub managerial_l2: String,
    pub is_cc_settlement: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cashflow_parse_tokens() {
        assert_eq!(
            CashflowStatement::parse(" operating ").unwrap(),
            CashflowStatement::Operating
        );
        assert_eq!(
            CashflowStatement::parse("NON-CASH").unwrap(),
            CashflowStatement::NonCash
        );
    }

    #[test]
    fn test_cashflow_parse_rejects_unknown() {
        let err = CashflowStatement::parse("CAPEX").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidEnumValue { .. }));
    }

    #[test]
    fn test_display_matches_output_domain() {
        assert_eq!(CashflowStatement::Transfer.to_string(), "TRANSFER");
        assert_eq!(CashflowStatement::NonCash.to_string(), "NON-CASH");
    }
}
