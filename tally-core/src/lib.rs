//! tally-core: canonicalization, fingerprinting and identity assignment
//! for bank-statement ledger rows.

pub mod canon;
pub mod error;
pub mod fingerprint;
pub mod identity;
pub mod record;

pub use canon::{CanonicalFields, MoneyCell};
pub use error::{LedgerError, Result};
pub use fingerprint::{base_key, row_fingerprint, sha1_hex, txn_id};
pub use identity::{Identity, VerifyReport, assign_ids, assert_unique_ids, verify_ids};
pub use record::RawRecord;
