//! Clean-and-reconcile flow over multiple statement files.

use std::io::Write;
use std::path::PathBuf;

use tally_ingest::{clean_statement_csv, combine_cleaned, reconcile};

fn write_statement(dir: &std::path::Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(body.as_bytes()).unwrap();
    path
}

#[test]
fn two_months_clean_combine_and_reconcile() {
    let dir = tempfile::tempdir().unwrap();

    let jan = write_statement(
        dir.path(),
        "2024_1. Jan24.csv",
        "\
Date,Description,Withdrawals,Deposits,Balance
,BALANCE B/F,,,\"1,000.00\"
02 Jan,GIRO SALARY,,\"5,000.00\",\"6,000.00\"
15 Jan,ATM WITHDRAWAL,50.00,,\"5,950.00\"
",
    );
    let feb = write_statement(
        dir.path(),
        "2024_2. Feb24.csv",
        "\
Date,Description,Withdrawals,Deposits,Balance
,BALANCE B/F,,,\"5,950.00\"
10 Feb,ATM WITHDRAWAL,50.00,,\"5,900.00\"
",
    );

    let jan_records = clean_statement_csv(&jan).unwrap();
    let feb_records = clean_statement_csv(&feb).unwrap();
    assert_eq!(jan_records.len(), 3);
    assert_eq!(feb_records.len(), 2);

    // Same description and amount in both months stays distinct: the
    // source file is part of the base key.
    let combined = combine_cleaned(vec![jan_records, feb_records]).unwrap();
    assert_eq!(combined.len(), 5);
    let atm: Vec<_> = combined
        .iter()
        .filter(|r| r.description == "ATM WITHDRAWAL")
        .collect();
    assert_eq!(atm.len(), 2);
    assert_ne!(atm[0].txn_id, atm[1].txn_id);

    let reports = reconcile(&combined, 0.02);
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.ok), "both months should reconcile");

    let jan_report = reports
        .iter()
        .find(|r| r.year_month == "2024-01")
        .unwrap();
    assert_eq!(jan_report.opening_balance, Some(1000.0));
    assert_eq!(jan_report.closing_balance, Some(5950.0));
    assert_eq!(jan_report.sum_amount, 4950.0);
}

#[test]
fn year_month_falls_back_to_filename_for_undated_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_statement(
        dir.path(),
        "2024_1. Jan24.csv",
        "\
Date,Description,Withdrawals,Deposits,Balance
,BALANCE B/F,,,100.00
",
    );
    let records = clean_statement_csv(&path).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].date, "");
    assert_eq!(records[0].year_month, "2024-01");
}
