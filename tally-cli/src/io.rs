use std::path::Path;

use anyhow::{Context, Result};

use tally_classify::{FinalRecord, OverrideRow};
use tally_core::RawRecord;
use tally_ingest::ReconcileResult;

pub fn read_records(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<RawRecord>, _>>()
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(records)
}

pub fn write_records(path: &Path, records: &[RawRecord]) -> Result<()> {
    write_all(path, records)
}

pub fn write_final_records(path: &Path, records: &[FinalRecord]) -> Result<()> {
    write_all(path, records)
}

pub fn write_reconciliation(path: &Path, results: &[ReconcileResult]) -> Result<()> {
    write_all(path, results)
}

pub fn read_override_rows(path: &Path) -> Result<Vec<OverrideRow>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<OverrideRow>, _>>()
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(rows)
}

pub fn write_override_rows(path: &Path, rows: &[OverrideRow]) -> Result<()> {
    write_all(path, rows)
}

fn write_all<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        let records = vec![RawRecord {
            date: "2024-01-02".into(),
            year_month: "2024-01".into(),
            description: "GIRO SALARY".into(),
            amount: "5000.00".into(),
            source_file: "jan.csv".into(),
            row_order: Some(3),
            ..Default::default()
        }];
        write_records(&path, &records).unwrap();
        let back = read_records(&path).unwrap();
        assert_eq!(back, records);
    }
}
