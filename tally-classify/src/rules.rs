//! The ordered rule chain: first match wins.
//!
//! Rules are explicit {id, predicate, result-builder} entries concatenated
//! from named tiers in a fixed order:
//!
//!   tier 0  structural/summary detection (Balance B/F)
//!   tier 1  protected income (salary, interest) — before any transfer logic
//!   tier 2  transfer neutralization (bank-specific, then generic self-entity)
//!   tier 3  specific domain patterns (sign constraint + pattern membership)
//!   tier 4  fallbacks — always the last three, making the chain total
//!
//! New rules belong before the tier-4 fallbacks and after any more specific
//! rule they could shadow; the engine does not detect shadowing, rule-level
//! tests must.
//!
//! No rule reads anything beyond description and amount.

use tally_core::canon::collapse_upper;

use crate::patterns::{PatternConfig, PatternTables, contains_any_token, has_any};
use crate::taxonomy::{
    AssetContext, CashflowStatement, Classification, EventTag, FlowNature, RecordType,
    StabilityClass,
};

/// Normalized view of one transaction handed to each predicate/builder.
pub struct RuleInput {
    /// Whitespace-collapsed, uppercased description.
    pub desc: String,
    /// Signed amount: positive inflow, negative outflow.
    pub amount: f64,
    /// Detected bank rail (plumbing, not meaning).
    pub rail: String,
    /// Detected card issuer, if any.
    pub issuer: Option<String>,
}

type Predicate = Box<dyn Fn(&RuleInput, &PatternTables) -> bool + Send + Sync>;
type Builder = Box<dyn Fn(&RuleInput, &PatternTables) -> Classification + Send + Sync>;

pub struct Rule {
    pub id: &'static str,
    matches: Predicate,
    build: Builder,
}

impl Rule {
    fn new(
        id: &'static str,
        matches: impl Fn(&RuleInput, &PatternTables) -> bool + Send + Sync + 'static,
        build: impl Fn(&RuleInput, &PatternTables) -> Classification + Send + Sync + 'static,
    ) -> Self {
        Self {
            id,
            matches: Box::new(matches),
            build: Box::new(build),
        }
    }
}

/// Strict-priority classifier over the ordered rule chain.
pub struct Classifier {
    tables: PatternTables,
    rules: Vec<Rule>,
}

impl Classifier {
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_config(&PatternConfig::default())
    }

    pub fn with_config(config: &PatternConfig) -> Result<Self, regex::Error> {
        let tables = PatternTables::compile(config)?;
        let mut rules = Vec::new();
        rules.extend(tier_structural());
        rules.extend(tier_protected_income());
        rules.extend(tier_transfer_neutralization());
        rules.extend(tier_domain());
        rules.extend(tier_fallback());
        Ok(Self { tables, rules })
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id).collect()
    }

    pub fn tables(&self) -> &PatternTables {
        &self.tables
    }

    /// Classify one transaction. Total: the fallback tier guarantees a
    /// match for every (description, amount) pair.
    pub fn classify(&self, description: &str, amount: f64) -> Classification {
        let desc = collapse_upper(description);
        let rail = self.tables.infer_rail(&desc);
        let issuer = self.tables.card_issuer(&desc).map(str::to_string);
        let input = RuleInput {
            desc,
            amount,
            rail,
            issuer,
        };
        for rule in &self.rules {
            if (rule.matches)(&input, &self.tables) {
                return (rule.build)(&input, &self.tables);
            }
        }
        unreachable!("fallback tier guarantees a match")
    }
}

// Tier 0 — structural/summary detection.
fn tier_structural() -> Vec<Rule> {
    vec![Rule::new(
        "R00_BALANCE_BF",
        |input, t| has_any(&t.balance_carry, &input.desc),
        |input, _| Classification {
            record_type: RecordType::Summary,
            flow_nature: FlowNature::NonCash,
            cashflow_statement: CashflowStatement::NonCash,
            economic_l1: "NON-CASH".into(),
            economic_l2: "BALANCE_BF".into(),
            asset_context: AssetContext::Unknown,
            stability_class: StabilityClass::OneOff,
            baseline_eligible: false,
            event_tag: EventTag::None,
            bank_rail: input.rail.clone(),
            rule_id: "R00_BALANCE_BF",
            rule_explanation:
                "Balance B/F is a non-cash summary line; excluded from cashflow analytics.".into(),
            managerial_l1: "NON-CASH".into(),
            managerial_l2: "BALANCE_BF".into(),
            is_cc_settlement: false,
        },
    )]
}

// Tier 1 — protected income; evaluated before any transfer logic so income
// can never be neutralized as an internal transfer.
fn tier_protected_income() -> Vec<Rule> {
    vec![
        Rule::new(
            "R01_SALARY",
            |input, t| {
                input.amount > 0.0
                    && (has_any(&t.salary, &input.desc)
                        || contains_any_token(&input.desc, &t.salary_employers))
            },
            |input, t| {
                let employer = t
                    .salary_employers
                    .iter()
                    .find(|e| input.desc.contains(e.as_str()))
                    .map(String::as_str)
                    .unwrap_or("EMPLOYER");
                Classification {
                    record_type: RecordType::Transaction,
                    flow_nature: FlowNature::Income,
                    cashflow_statement: CashflowStatement::Operating,
                    economic_l1: "INCOME".into(),
                    economic_l2: "SALARY".into(),
                    asset_context: AssetContext::General,
                    stability_class: StabilityClass::StructuralRecurring,
                    baseline_eligible: true,
                    event_tag: EventTag::None,
                    bank_rail: input.rail.clone(),
                    rule_id: "R01_SALARY",
                    rule_explanation: format!(
                        "Detected salary income (employer token: {employer}). Income can never be classified as lifestyle."
                    ),
                    managerial_l1: "INCOME".into(),
                    managerial_l2: "SALARY".into(),
                    is_cc_settlement: false,
                }
            },
        ),
        Rule::new(
            "R02_INTEREST",
            |input, t| input.amount > 0.0 && has_any(&t.interest, &input.desc),
            |input, _| Classification {
                record_type: RecordType::Transaction,
                flow_nature: FlowNature::Income,
                cashflow_statement: CashflowStatement::Operating,
                economic_l1: "INCOME".into(),
                economic_l2: "INTEREST".into(),
                asset_context: AssetContext::Financial,
                stability_class: StabilityClass::SemiRecurring,
                baseline_eligible: true,
                event_tag: EventTag::None,
                bank_rail: input.rail.clone(),
                rule_id: "R02_INTEREST",
                rule_explanation: "Interest credited (bank/bonus interest). Operating income."
                    .into(),
                managerial_l1: "INCOME".into(),
                managerial_l2: "INTEREST".into(),
                is_cc_settlement: false,
            },
        ),
    ]
}

// Tier 2 — transfer neutralization: bank-specific phrasing first, then
// generic self-entity/rail detection. Always non-baseline.
fn tier_transfer_neutralization() -> Vec<Rule> {
    vec![
        Rule::new(
            "R03_TRUST_INTERNAL",
            |input, t| has_any(&t.bank_internal_transfer, &input.desc),
            |input, _| transfer_result(
                input,
                "R03_TRUST_INTERNAL",
                "Trust Bank OTHR Transfer is internal inter-bank fund reallocation; neutralized as Transfer.",
            ),
        ),
        Rule::new(
            "R13_INTERNAL_TRANSFER",
            |input, t| {
                (has_any(&t.transfer, &input.desc)
                    || matches!(input.rail.as_str(), "FAST" | "PAYNOW" | "GIRO"))
                    && contains_any_token(&input.desc, &t.self_entities)
            },
            |input, _| transfer_result(
                input,
                "R13_INTERNAL_TRANSFER",
                "Detected self-controlled transfer (ownership unchanged). Neutralized as Transfer.",
            ),
        ),
    ]
}

fn transfer_result(input: &RuleInput, rule_id: &'static str, why: &str) -> Classification {
    Classification {
        record_type: RecordType::Transaction,
        flow_nature: FlowNature::Transfer,
        cashflow_statement: CashflowStatement::Transfer,
        economic_l1: "TRANSFER".into(),
        economic_l2: "INTERNAL_TRANSFER".into(),
        asset_context: AssetContext::General,
        stability_class: StabilityClass::StructuralRecurring,
        baseline_eligible: false,
        event_tag: EventTag::None,
        bank_rail: input.rail.clone(),
        rule_id,
        rule_explanation: why.into(),
        managerial_l1: "TRANSFER".into(),
        managerial_l2: "INTERNAL_TRANSFER".into(),
        is_cc_settlement: false,
    }
}

// Tier 3 — specific domain patterns: sign constraint + pattern membership.
fn tier_domain() -> Vec<Rule> {
    vec![
        Rule::new(
            "R04_PROPERTY_DOWNPAYMENT",
            |input, t| input.amount < 0.0 && has_any(&t.property_downpayment, &input.desc),
            |input, _| Classification {
                record_type: RecordType::Transaction,
                flow_nature: FlowNature::Expense,
                cashflow_statement: CashflowStatement::Investing,
                economic_l1: "HOUSING".into(),
                economic_l2: "PROPERTY_PURCHASE".into(),
                asset_context: AssetContext::Property,
                stability_class: StabilityClass::OneOff,
                baseline_eligible: false,
                event_tag: EventTag::PropertyAcq,
                bank_rail: input.rail.clone(),
                rule_id: "R04_PROPERTY_DOWNPAYMENT",
                rule_explanation:
                    "Cheque/DR CO CHARGES treated as property downpayment (cash -> property asset). Investing cashflow."
                        .into(),
                managerial_l1: "HOUSING".into(),
                managerial_l2: "PROPERTY_PURCHASE".into(),
                is_cc_settlement: false,
            },
        ),
        Rule::new(
            "R05_TAX",
            |input, t| input.amount < 0.0 && has_any(&t.tax, &input.desc),
            |input, _| Classification {
                record_type: RecordType::Transaction,
                flow_nature: FlowNature::Expense,
                cashflow_statement: CashflowStatement::Operating,
                economic_l1: "TAXES".into(),
                economic_l2: "IRAS_TAX".into(),
                asset_context: AssetContext::General,
                stability_class: StabilityClass::SemiRecurring,
                baseline_eligible: true,
                event_tag: EventTag::TaxEvent,
                bank_rail: input.rail.clone(),
                rule_id: "R05_TAX",
                rule_explanation: "IRAS-related tax payment. Operating cashflow.".into(),
                managerial_l1: "TAXES".into(),
                managerial_l2: "IRAS_TAX".into(),
                is_cc_settlement: false,
            },
        ),
        Rule::new(
            "R06_MORTGAGE",
            |input, t| input.amount < 0.0 && has_any(&t.mortgage, &input.desc),
            |input, _| Classification {
                record_type: RecordType::Transaction,
                flow_nature: FlowNature::Expense,
                cashflow_statement: CashflowStatement::Financing,
                economic_l1: "DEBT_SERVICE".into(),
                economic_l2: "MORTGAGE_PAYMENT".into(),
                asset_context: AssetContext::Property,
                stability_class: StabilityClass::StructuralRecurring,
                baseline_eligible: true,
                event_tag: EventTag::None,
                bank_rail: input.rail.clone(),
                rule_id: "R06_MORTGAGE",
                rule_explanation:
                    "Detected mortgage/housing loan payment. Financing cashflow (debt service)."
                        .into(),
                managerial_l1: "DEBT_SERVICE".into(),
                managerial_l2: "MORTGAGE_PAYMENT".into(),
                is_cc_settlement: false,
            },
        ),
        Rule::new(
            "R07_CAR_LOAN",
            |input, t| input.amount < 0.0 && has_any(&t.car_finance, &input.desc),
            |input, _| Classification {
                record_type: RecordType::Transaction,
                flow_nature: FlowNature::Expense,
                cashflow_statement: CashflowStatement::Financing,
                economic_l1: "DEBT_SERVICE".into(),
                economic_l2: "CAR_LOAN_PAYMENT".into(),
                asset_context: AssetContext::Car,
                stability_class: StabilityClass::StructuralRecurring,
                baseline_eligible: true,
                event_tag: EventTag::None,
                bank_rail: input.rail.clone(),
                rule_id: "R07_CAR_LOAN",
                rule_explanation: "Detected car loan payment. Financing cashflow (debt service)."
                    .into(),
                managerial_l1: "DEBT_SERVICE".into(),
                managerial_l2: "CAR_LOAN_PAYMENT".into(),
                is_cc_settlement: false,
            },
        ),
        Rule::new(
            "R08_RENOVATION",
            |input, t| input.amount < 0.0 && has_any(&t.renovation, &input.desc),
            |input, _| Classification {
                record_type: RecordType::Transaction,
                flow_nature: FlowNature::Expense,
                cashflow_statement: CashflowStatement::Investing,
                economic_l1: "HOUSING".into(),
                economic_l2: "RENOVATION".into(),
                asset_context: AssetContext::Property,
                stability_class: StabilityClass::OneOff,
                baseline_eligible: false,
                event_tag: EventTag::Renovation,
                bank_rail: input.rail.clone(),
                rule_id: "R08_RENOVATION",
                rule_explanation:
                    "Renovation/capex improvement detected. Investing cashflow (property).".into(),
                managerial_l1: "HOUSING".into(),
                managerial_l2: "RENOVATION".into(),
                is_cc_settlement: false,
            },
        ),
        Rule::new(
            "R09_MCST",
            |input, t| input.amount < 0.0 && has_any(&t.condo_fees, &input.desc),
            |input, _| Classification {
                record_type: RecordType::Transaction,
                flow_nature: FlowNature::Expense,
                cashflow_statement: CashflowStatement::Operating,
                economic_l1: "HOUSING".into(),
                economic_l2: "HOA_CONDO_FEES".into(),
                asset_context: AssetContext::Property,
                stability_class: StabilityClass::SemiRecurring,
                baseline_eligible: true,
                event_tag: EventTag::None,
                bank_rail: input.rail.clone(),
                rule_id: "R09_MCST",
                rule_explanation:
                    "MCST/condo maintenance fees are operating housing costs (not lifestyle)."
                        .into(),
                managerial_l1: "HOUSING".into(),
                managerial_l2: "HOA_CONDO_FEES".into(),
                is_cc_settlement: false,
            },
        ),
        Rule::new(
            "R10_INS_IN",
            |input, t| {
                input.amount > 0.0
                    && contains_any_token(&input.desc, &t.insurers)
                    && has_any(&t.insurance_inflow_markers, &input.desc)
            },
            |input, _| Classification {
                record_type: RecordType::Transaction,
                flow_nature: FlowNature::Income,
                cashflow_statement: CashflowStatement::Operating,
                economic_l1: "INCOME".into(),
                economic_l2: "INSURANCE_PAYOUT".into(),
                asset_context: AssetContext::General,
                stability_class: StabilityClass::Variable,
                baseline_eligible: false,
                event_tag: EventTag::None,
                bank_rail: input.rail.clone(),
                rule_id: "R10_INS_IN",
                rule_explanation:
                    "Insurer-related inflow (refund/payout). Treated as operating income.".into(),
                managerial_l1: "INCOME".into(),
                managerial_l2: "INSURANCE_PAYOUT".into(),
                is_cc_settlement: false,
            },
        ),
        Rule::new(
            "R11_INS_OUT",
            |input, t| input.amount < 0.0 && contains_any_token(&input.desc, &t.insurers),
            |input, _| Classification {
                record_type: RecordType::Transaction,
                flow_nature: FlowNature::Expense,
                cashflow_statement: CashflowStatement::Operating,
                economic_l1: "INSURANCE".into(),
                economic_l2: "PREMIUM".into(),
                asset_context: AssetContext::General,
                stability_class: StabilityClass::StructuralRecurring,
                baseline_eligible: true,
                event_tag: EventTag::None,
                bank_rail: input.rail.clone(),
                rule_id: "R11_INS_OUT",
                rule_explanation:
                    "Insurer-related outflow treated as insurance premium (operating).".into(),
                managerial_l1: "INSURANCE".into(),
                managerial_l2: "PREMIUM".into(),
                is_cc_settlement: false,
            },
        ),
        Rule::new(
            "R12_CC_SETTLEMENT",
            |input, _| {
                input.amount < 0.0
                    && input.issuer.is_some()
                    && (input.desc.contains("BILL PAYMENT")
                        || input.desc.contains("CC")
                        || input.desc.contains("CARDS"))
            },
            |input, _| {
                let issuer = input.issuer.as_deref().unwrap_or("UNKNOWN");
                Classification {
                    record_type: RecordType::Transaction,
                    flow_nature: FlowNature::Expense,
                    cashflow_statement: CashflowStatement::Financing,
                    economic_l1: "DEBT_SERVICE".into(),
                    economic_l2: format!("CREDIT_CARD_SETTLEMENT_{issuer}"),
                    asset_context: AssetContext::General,
                    stability_class: StabilityClass::SemiRecurring,
                    baseline_eligible: true,
                    event_tag: EventTag::None,
                    bank_rail: "CARD".into(),
                    rule_id: "R12_CC_SETTLEMENT",
                    rule_explanation:
                        "Credit card settlement is liability repayment; classify as financing (debt service)."
                            .into(),
                    managerial_l1: "LIFESTYLE".into(),
                    managerial_l2: "CREDIT_CARD_SPEND_PROXY".into(),
                    is_cc_settlement: true,
                }
            },
        ),
    ]
}

// Tier 4 — fallbacks. Deliberately the lowest-confidence rules; must stay
// the last three evaluated.
fn tier_fallback() -> Vec<Rule> {
    vec![
        Rule::new(
            "R14_OTHER_INCOME",
            |input, _| input.amount > 0.0,
            |input, _| Classification {
                record_type: RecordType::Transaction,
                flow_nature: FlowNature::Income,
                cashflow_statement: CashflowStatement::Operating,
                economic_l1: "INCOME".into(),
                economic_l2: "OTHER_INCOME".into(),
                asset_context: AssetContext::General,
                stability_class: StabilityClass::Variable,
                baseline_eligible: false,
                event_tag: EventTag::None,
                bank_rail: input.rail.clone(),
                rule_id: "R14_OTHER_INCOME",
                rule_explanation:
                    "Unmapped inflow treated as other operating income (review later if needed)."
                        .into(),
                managerial_l1: "INCOME".into(),
                managerial_l2: "OTHER_INCOME".into(),
                is_cc_settlement: false,
            },
        ),
        Rule::new(
            "R15_GENERIC_OUTFLOW",
            |input, _| input.amount < 0.0,
            |input, _| Classification {
                record_type: RecordType::Transaction,
                flow_nature: FlowNature::Expense,
                cashflow_statement: CashflowStatement::Operating,
                economic_l1: "LIFESTYLE".into(),
                economic_l2: "DISCRETIONARY".into(),
                asset_context: AssetContext::General,
                stability_class: StabilityClass::Variable,
                baseline_eligible: false,
                event_tag: EventTag::None,
                bank_rail: input.rail.clone(),
                rule_id: "R15_GENERIC_OUTFLOW",
                rule_explanation:
                    "Unmapped outflow treated as lifestyle discretionary (conservative fallback)."
                        .into(),
                managerial_l1: "LIFESTYLE".into(),
                managerial_l2: "DISCRETIONARY".into(),
                is_cc_settlement: false,
            },
        ),
        Rule::new(
            "R16_ZERO_ADJ",
            |_, _| true,
            |input, _| Classification {
                record_type: RecordType::Transaction,
                flow_nature: FlowNature::NonCash,
                cashflow_statement: CashflowStatement::NonCash,
                economic_l1: "NON-CASH".into(),
                economic_l2: "ACCOUNTING_ADJUSTMENT".into(),
                asset_context: AssetContext::Unknown,
                stability_class: StabilityClass::OneOff,
                baseline_eligible: false,
                event_tag: EventTag::None,
                bank_rail: input.rail.clone(),
                rule_id: "R16_ZERO_ADJ",
                rule_explanation:
                    "Zero-amount row treated as non-cash adjustment (should be rare).".into(),
                managerial_l1: "NON-CASH".into(),
                managerial_l2: "ACCOUNTING_ADJUSTMENT".into(),
                is_cc_settlement: false,
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new().unwrap()
    }

    #[test]
    fn test_fallbacks_are_last_three() {
        let ids = classifier().rule_ids();
        assert_eq!(
            &ids[ids.len() - 3..],
            &["R14_OTHER_INCOME", "R15_GENERIC_OUTFLOW", "R16_ZERO_ADJ"]
        );
    }

    #[test]
    fn test_balance_bf_is_summary() {
        let c = classifier().classify("BALANCE B/F", 0.0);
        assert_eq!(c.rule_id, "R00_BALANCE_BF");
        assert_eq!(c.record_type, RecordType::Summary);
        assert!(!c.baseline_eligible);
    }

    #[test]
    fn test_salary_inflow() {
        // Scenario: giro salary row classifies as protected income.
        let c = classifier().classify("GIRO SALARY XYZ CORP", 5000.0);
        assert_eq!(c.rule_id, "R01_SALARY");
        assert_eq!(c.cashflow_statement, CashflowStatement::Operating);
        assert!(c.baseline_eligible);
    }

    #[test]
    fn test_salary_precedes_transfer_tier() {
        // A description matching both salary and transfer patterns stays
        // income: tier 1 runs before tier 2.
        let c = classifier().classify("FAST TRANSFER SALARY PAYMENT WEILUN", 4200.0);
        assert_eq!(c.rule_id, "R01_SALARY");
        assert_eq!(c.flow_nature, FlowNature::Income);
    }

    #[test]
    fn test_trust_internal_ignores_sign() {
        // Scenario: Trust Bank OTHR transfer neutralized even as outflow.
        let c = classifier().classify("TRUST BANK OTHR TRANSFER", -200.0);
        assert_eq!(c.rule_id, "R03_TRUST_INTERNAL");
        assert_eq!(c.cashflow_statement, CashflowStatement::Transfer);
        assert!(!c.baseline_eligible);
    }

    #[test]
    fn test_self_entity_transfer_neutralized() {
        let c = classifier().classify("FAST TRANSFER WEILUN", 1200.0);
        assert_eq!(c.rule_id, "R13_INTERNAL_TRANSFER");
        assert_eq!(c.managerial_l1, "TRANSFER");
        assert_eq!(c.managerial_l2, "INTERNAL_TRANSFER");
    }

    #[test]
    fn test_interest_income() {
        let c = classifier().classify("BONUS INTEREST", 12.34);
        assert_eq!(c.rule_id, "R02_INTEREST");
        assert_eq!(c.asset_context, AssetContext::Financial);
    }

    #[test]
    fn test_tax_outflow_only() {
        let out = classifier().classify("IRAS INCOME TAX", -800.0);
        assert_eq!(out.rule_id, "R05_TAX");
        assert_eq!(out.event_tag, EventTag::TaxEvent);
        // Inflow from the tax office is not a tax payment.
        let refund = classifier().classify("IRAS INCOME TAX", 800.0);
        assert_eq!(refund.rule_id, "R14_OTHER_INCOME");
    }

    #[test]
    fn test_mortgage_and_car_loan() {
        let m = classifier().classify("TRF. WD. LOANS 123", -2500.0);
        assert_eq!(m.rule_id, "R06_MORTGAGE");
        assert_eq!(m.cashflow_statement, CashflowStatement::Financing);

        let car = classifier().classify("HONG LEONG FINANCE HLF-884213", -980.0);
        assert_eq!(car.rule_id, "R07_CAR_LOAN");
        assert_eq!(car.asset_context, AssetContext::Car);
    }

    #[test]
    fn test_property_downpayment() {
        let c = classifier().classify("CHEQUE WITHDRAWAL CO-123456-001", -150000.0);
        assert_eq!(c.rule_id, "R04_PROPERTY_DOWNPAYMENT");
        assert_eq!(c.event_tag, EventTag::PropertyAcq);
        assert!(!c.baseline_eligible);
    }

    #[test]
    fn test_insurance_flows() {
        let premium = classifier().classify("PRUDENTIAL DR - GIRO", -310.0);
        assert_eq!(premium.rule_id, "R11_INS_OUT");

        let payout = classifier().classify("PRUDENTIAL INWARD CR", 95.0);
        assert_eq!(payout.rule_id, "R10_INS_IN");
        assert!(!payout.baseline_eligible);

        // Insurer inflow without an inflow marker is not a payout.
        let other = classifier().classify("PRUDENTIAL", 95.0);
        assert_eq!(other.rule_id, "R14_OTHER_INCOME");
    }

    #[test]
    fn test_cc_settlement_issuer_suffix() {
        let c = classifier().classify("BILL PAYMENT UOB CARDS", -3200.0);
        assert_eq!(c.rule_id, "R12_CC_SETTLEMENT");
        assert_eq!(c.economic_l2, "CREDIT_CARD_SETTLEMENT_UOB");
        assert_eq!(c.bank_rail, "CARD");
        assert!(c.is_cc_settlement);
        assert_eq!(c.managerial_l2, "CREDIT_CARD_SPEND_PROXY");
    }

    #[test]
    fn test_fallbacks() {
        let inflow = classifier().classify("MYSTERY CREDIT", 10.0);
        assert_eq!(inflow.rule_id, "R14_OTHER_INCOME");
        assert!(!inflow.baseline_eligible);

        let outflow = classifier().classify("MYSTERY DEBIT", -10.0);
        assert_eq!(outflow.rule_id, "R15_GENERIC_OUTFLOW");
        assert_eq!(outflow.economic_l2, "DISCRETIONARY");

        let zero = classifier().classify("MYSTERY", 0.0);
        assert_eq!(zero.rule_id, "R16_ZERO_ADJ");
        assert_eq!(zero.flow_nature, FlowNature::NonCash);
    }

    #[test]
    fn test_classifier_purity() {
        let c = classifier();
        let a = c.classify("GIRO SALARY XYZ CORP", 5000.0);
        let b = c.classify("GIRO SALARY XYZ CORP", 5000.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_description_normalization() {
        let c = classifier().classify("  giro   salary  xyz corp ", 5000.0);
        assert_eq!(c.rule_id, "R01_SALARY");
    }
}
