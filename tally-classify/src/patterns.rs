//! Pattern and token tables driving the rule engine.
//!
//! All of this is immutable configuration injected at classifier
//! construction: [`PatternConfig`] is plain serde data (with compiled-in
//! defaults), [`PatternTables`] is its compiled form. Tests can substitute
//! any table without touching the engine.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A named card issuer with its description patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardIssuer {
    pub name: String,
    pub patterns: Vec<String>,
}

/// A named bank rail with its description pattern. Order matters: the
/// first matching rail wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RailPattern {
    pub name: String,
    pub pattern: String,
}

/// One (economic L1, economic L2) -> (managerial L1, managerial L2) entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerialMapping {
    pub economic_l1: String,
    pub economic_l2: String,
    pub managerial_l1: String,
    pub managerial_l2: String,
}

/// Serializable pattern configuration. Bank rail is plumbing, not economic
/// meaning: rails are detected for audit display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    pub salary_employers: Vec<String>,
    pub insurers: Vec<String>,
    /// Self-controlled entities; transfers to/from these are reallocations.
    pub self_entities: Vec<String>,
    pub card_issuers: Vec<CardIssuer>,
    pub rails: Vec<RailPattern>,
    pub balance_carry: Vec<String>,
    pub interest: Vec<String>,
    pub salary: Vec<String>,
    pub tax: Vec<String>,
    pub mortgage: Vec<String>,
    pub condo_fees: Vec<String>,
    pub property_downpayment: Vec<String>,
    pub renovation: Vec<String>,
    pub car_finance: Vec<String>,
    pub transfer: Vec<String>,
    /// Bank-specific internal-transfer phrasing (authoritative).
    pub bank_internal_transfer: Vec<String>,
    pub insurance_inflow_markers: Vec<String>,
    pub insurance_outflow_markers: Vec<String>,
    pub managerial_map: Vec<ManagerialMapping>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            salary_employers: strings(&[
                "HP",
                "MICROSOFT",
                "ABBOTT",
                "CHANGI AIRPORT GROUP",
                "KERING",
            ]),
            insurers: strings(&[
                "AIA",
                "PRUDENTIAL",
                "GREAT EASTERN",
                "NTUC",
                "MANULIFE",
                "AVIVA",
                "AXA",
                "HSBC LIFE",
            ]),
            self_entities: strings(&["WEILUN", "SAM", "SAMANTHA", "SAMANTHA SEAH", "TRUST BANK"]),
            card_issuers: vec![
                issuer("CITI", &[r"\bCITI\b"]),
                issuer("SCB", &[r"\bSCB\b", r"\bSTANDARD\s+CHARTERED\b"]),
                issuer("HSBC", &[r"\bHSBC\b"]),
                issuer("UOB", &[r"\bUOB\b"]),
                issuer("OCBC", &[r"\bOCBC\b"]),
                issuer("AMEX", &[r"\bAMEX\b", r"\bAMERICAN\s+EXPRESS\b"]),
            ],
            rails: vec![
                rail("GIRO", r"\bGIRO\b"),
                rail("FAST", r"\bFAST\b"),
                rail("PAYNOW", r"\bPAYNOW\b"),
                rail("NETS", r"\bNETS\b"),
                rail("ATM", r"\bATM\b|\bCASH\s+WITHDRAWAL\b"),
                rail("CHEQUE", r"\bCHEQUE\b"),
                rail(
                    "CARD",
                    r"\bBILL\s+PAYMENT\b|\bMBK-\w+\s+CC\b|\bUOB\s+CARDS\b|\bCARD(S)?\b",
                ),
            ],
            balance_carry: strings(&[r"\bBALANCE\s+B/F\b"]),
            interest: strings(&[r"\bINTEREST\s+CREDIT\b", r"\bBONUS\s+INTEREST\b"]),
            salary: strings(&[r"\bSALARY\b", r"\bGIRO\s+SALA"]),
            tax: strings(&[
                r"\bIRAS\b",
                r"\bINCOME\s+TAX\b",
                r"\bPROPERTY\s+TAX\b",
                r"\bITX\b",
                r"\bPTXP\b",
            ]),
            mortgage: strings(&[
                r"\bTRF\.\s*WD\.\s*LOANS\b",
                r"\bWD\.\s*LOANS\b",
                r"\bMORTGAGE\b",
                r"\bHOUSING\s+LOAN\b",
            ]),
            condo_fees: strings(&[r"\bMCST\b", r"\bMANAGEMENT\s+CORP\b"]),
            property_downpayment: strings(&[
                r"\bCHEQUE\s+WITHDRAWAL\b",
                r"\bDR\s+CO\s+CHARGES\b",
                r"\bCO-\d{6}-\d{3}\b",
            ]),
            renovation: strings(&[
                r"\bBUILD\s+BUILT\b",
                r"\bRENOV",
                r"\bCONTRACTOR\b",
                r"\bCARPENTRY\b",
            ]),
            car_finance: strings(&[r"\bHONG\s+LEONG\s+FINANCE\b", r"\bHLF-\d+\b"]),
            transfer: strings(&[r"\bFUNDS\s+TRF\b", r"\bTRANSFER\b", r"\bOTHR\s+TRANSFER\b"]),
            bank_internal_transfer: strings(&[
                r"\bTRUST\s+BANK\b.*\bOTHR\s+TRANSFER\b",
                r"\bOTHR\s+TRANSFER\b.*\bTRUST\s+BANK\b",
            ]),
            insurance_inflow_markers: strings(&[r"\bINWARD\s+CR\b", r"\bCR\s*-\s*GIRO\b"]),
            insurance_outflow_markers: strings(&[r"\bINWARD\s+DR\b", r"\bDR\s*-\s*GIRO\b"]),
            managerial_map: default_managerial_map(),
        }
    }
}

fn issuer(name: &str, patterns: &[&str]) -> CardIssuer {
    CardIssuer {
        name: name.to_string(),
        patterns: strings(patterns),
    }
}

fn rail(name: &str, pattern: &str) -> RailPattern {
    RailPattern {
        name: name.to_string(),
        pattern: pattern.to_string(),
    }
}

fn mapping(el1: &str, el2: &str, ml1: &str, ml2: &str) -> ManagerialMapping {
    ManagerialMapping {
        economic_l1: el1.to_string(),
        economic_l2: el2.to_string(),
        managerial_l1: ml1.to_string(),
        managerial_l2: ml2.to_string(),
    }
}

fn default_managerial_map() -> Vec<ManagerialMapping> {
    vec![
        mapping("NON-CASH", "BALANCE_BF", "NON-CASH", "BALANCE_BF"),
        mapping("INCOME", "SALARY", "INCOME", "SALARY"),
        mapping("INCOME", "INTEREST", "INCOME", "INTEREST"),
        mapping("TRANSFER", "INTERNAL_TRANSFER", "TRANSFER", "INTERNAL_TRANSFER"),
        mapping("HOUSING", "PROPERTY_PURCHASE", "HOUSING", "PROPERTY_PURCHASE"),
        mapping("TAXES", "IRAS_TAX", "TAXES", "IRAS_TAX"),
        mapping("DEBT_SERVICE", "MORTGAGE_PAYMENT", "DEBT_SERVICE", "MORTGAGE_PAYMENT"),
        mapping("DEBT_SERVICE", "CAR_LOAN_PAYMENT", "DEBT_SERVICE", "CAR_LOAN_PAYMENT"),
        mapping("HOUSING", "RENOVATION", "HOUSING", "RENOVATION"),
        mapping("HOUSING", "HOA_CONDO_FEES", "HOUSING", "HOA_CONDO_FEES"),
        mapping("INCOME", "INSURANCE_PAYOUT", "INCOME", "INSURANCE_PAYOUT"),
        mapping("INSURANCE", "PREMIUM", "INSURANCE", "PREMIUM"),
        mapping("INCOME", "OTHER_INCOME", "INCOME", "OTHER_INCOME"),
        mapping("LIFESTYLE", "DISCRETIONARY", "LIFESTYLE", "DISCRETIONARY"),
        mapping("NON-CASH", "ACCOUNTING_ADJUSTMENT", "NON-CASH", "ACCOUNTING_ADJUSTMENT"),
    ]
}

/// Compiled form of [`PatternConfig`]: regexes compiled once, tokens
/// uppercased, managerial map keyed for lookup.
pub struct PatternTables {
    pub salary_employers: Vec<String>,
    pub insurers: Vec<String>,
    pub self_entities: Vec<String>,
    card_issuers: Vec<(String, Vec<Regex>)>,
    rails: Vec<(String, Regex)>,
    pub balance_carry: Vec<Regex>,
    pub interest: Vec<Regex>,
    pub salary: Vec<Regex>,
    pub tax: Vec<Regex>,
    pub mortgage: Vec<Regex>,
    pub condo_fees: Vec<Regex>,
    pub property_downpayment: Vec<Regex>,
    pub renovation: Vec<Regex>,
    pub car_finance: Vec<Regex>,
    pub transfer: Vec<Regex>,
    pub bank_internal_transfer: Vec<Regex>,
    pub insurance_inflow_markers: Vec<Regex>,
    pub insurance_outflow_markers: Vec<Regex>,
    managerial_map: HashMap<(String, String), (String, String)>,
}

impl PatternTables {
    pub fn compile(config: &PatternConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            salary_employers: upper(&config.salary_employers),
            insurers: upper(&config.insurers),
            self_entities: upper(&config.self_entities),
            card_issuers: config
                .card_issuers
                .iter()
                .map(|i| Ok((i.name.clone(), compile_set(&i.patterns)?)))
                .collect::<Result<_, regex::Error>>()?,
            rails: config
                .rails
                .iter()
                .map(|r| Ok((r.name.clone(), Regex::new(&r.pattern)?)))
                .collect::<Result<_, regex::Error>>()?,
            balance_carry: compile_set(&config.balance_carry)?,
            interest: compile_set(&config.interest)?,
            salary: compile_set(&config.salary)?,
            tax: compile_set(&config.tax)?,
            mortgage: compile_set(&config.mortgage)?,
            condo_fees: compile_set(&config.condo_fees)?,
            property_downpayment: compile_set(&config.property_downpayment)?,
            renovation: compile_set(&config.renovation)?,
            car_finance: compile_set(&config.car_finance)?,
            transfer: compile_set(&config.transfer)?,
            bank_internal_transfer: compile_set(&config.bank_internal_transfer)?,
            insurance_inflow_markers: compile_set(&config.insurance_inflow_markers)?,
            insurance_outflow_markers: compile_set(&config.insurance_outflow_markers)?,
            managerial_map: config
                .managerial_map
                .iter()
                .map(|m| {
                    (
                        (m.economic_l1.to_uppercase(), m.economic_l2.to_uppercase()),
                        (m.managerial_l1.to_uppercase(), m.managerial_l2.to_uppercase()),
                    )
                })
                .collect(),
        })
    }

    /// First matching rail wins; `OTHER` when nothing matches.
    pub fn infer_rail(&self, desc: &str) -> String {
        for (name, pattern) in &self.rails {
            if pattern.is_match(desc) {
                return name.clone();
            }
        }
        "OTHER".to_string()
    }

    pub fn card_issuer(&self, desc: &str) -> Option<&str> {
        for (name, patterns) in &self.card_issuers {
            if patterns.iter().any(|p| p.is_match(desc)) {
                return Some(name);
            }
        }
        None
    }

    /// Derive managerial purpose from an economic pair. Credit-card
    /// settlements map to the lifestyle spend proxy regardless of issuer;
    /// unmapped pairs default to the economic pair itself.
    pub fn derive_managerial(&self, economic_l1: &str, economic_l2: &str) -> (String, String) {
        let l1 = economic_l1.trim().to_uppercase();
        let l2 = economic_l2.trim().to_uppercase();
        if l1 == "DEBT_SERVICE" && l2.starts_with("CREDIT_CARD_SETTLEMENT") {
            return ("LIFESTYLE".into(), "CREDIT_CARD_SPEND_PROXY".into());
        }
        self.managerial_map
            .get(&(l1.clone(), l2.clone()))
            .cloned()
            .unwrap_or((l1, l2))
    }
}

fn upper(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.to_uppercase()).collect()
}

fn compile_set(patterns: &[String]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|p| Regex::new(p)).collect()
}

/// True when any pattern in the set matches.
pub fn has_any(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

/// Plain substring membership over a token list (tokens are uppercased at
/// compile time; callers pass uppercased text).
pub fn contains_any_token(text: &str, tokens: &[String]) -> bool {
    tokens.iter().any(|t| text.contains(t.as_str()))
}
