//! tally-classify: rule-based transaction classification and manual
//! override merging on top of tally-core identities.

pub mod merge;
pub mod migrate;
pub mod overrides;
pub mod patterns;
pub mod pipeline;
pub mod rules;
pub mod taxonomy;

pub use merge::FinalRecord;
pub use migrate::{MigrationReport, migrate_overrides};
pub use overrides::{OverrideRow, OverrideTable};
pub use patterns::{PatternConfig, PatternTables};
pub use pipeline::classify_records;
pub use rules::{Classifier, RuleInput};
pub use taxonomy::{
    AssetContext, CashflowStatement, Classification, EventTag, FlowNature, RecordType,
    StabilityClass,
};
