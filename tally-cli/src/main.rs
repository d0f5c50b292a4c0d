use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tally_classify::{Classifier, OverrideTable, classify_records, migrate_overrides};
use tally_core::identity;
use tally_ingest::{clean_statement_csv, combine_cleaned, reconcile};

mod config;
mod io;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "tally", version, about = "Audit-grade bank statement ledger")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean statement CSVs: strip page noise, merge wrapped rows, assign
    /// stable Txn_IDs, reconcile balances
    Clean {
        /// Directory containing statement CSVs
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Explicit list of statement CSVs (instead of --input-dir)
        #[arg(long, num_args = 1..)]
        files: Vec<PathBuf>,

        /// Directory to write outputs
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Reconciliation tolerance in currency units
        #[arg(long)]
        tolerance: Option<f64>,
    },

    /// Classify cleaned records and apply manual overrides
    Classify {
        /// Cleaned/combined CSV to classify
        #[arg(long)]
        input: PathBuf,

        /// Directory to write the classified output
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Override table CSV keyed by Txn_ID
        #[arg(long)]
        overrides: Option<PathBuf>,
    },

    /// Clean then classify in one run
    Pipeline {
        #[arg(long)]
        input_dir: Option<PathBuf>,

        #[arg(long)]
        output_dir: Option<PathBuf>,

        #[arg(long)]
        overrides: Option<PathBuf>,

        #[arg(long)]
        tolerance: Option<f64>,
    },

    /// Verify that Txn_ID assignment is order-independent and matches the
    /// embedded ids
    Verify {
        /// CSV with already-assigned Txn_IDs
        #[arg(long)]
        csv: PathBuf,
    },

    /// Remap an override table from an old identity assignment to a new one
    MigrateOverrides {
        /// Classified/cleaned CSV carrying the old Txn_IDs
        #[arg(long)]
        old: PathBuf,

        /// Classified/cleaned CSV carrying the new Txn_IDs
        #[arg(long)]
        new: PathBuf,

        /// Override table to migrate
        #[arg(long)]
        overrides: PathBuf,

        /// Where to write the migrated table
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config()?;

    match cli.command {
        Command::Clean {
            input_dir,
            files,
            output_dir,
            tolerance,
        } => {
            let out_dir = resolve_output_dir(output_dir, &cfg)?;
            let files = resolve_input_files(input_dir, files, &cfg)?;
            let tolerance = tolerance.unwrap_or(cfg.reconcile.tolerance);
            run_clean(&files, &out_dir, tolerance)?;
        }

        Command::Classify {
            input,
            output_dir,
            overrides,
        } => {
            let out_dir = resolve_output_dir(output_dir, &cfg)?;
            let overrides = overrides.or(cfg.paths.overrides);
            run_classify(&input, &out_dir, overrides.as_deref())?;
        }

        Command::Pipeline {
            input_dir,
            output_dir,
            overrides,
            tolerance,
        } => {
            let out_dir = resolve_output_dir(output_dir, &cfg)?;
            let files = resolve_input_files(input_dir, Vec::new(), &cfg)?;
            let tolerance = tolerance.unwrap_or(cfg.reconcile.tolerance);
            let overrides = overrides.or(cfg.paths.overrides);

            let combined = run_clean(&files, &out_dir, tolerance)?;
            run_classify(&combined, &out_dir, overrides.as_deref())?;
        }

        Command::Verify { csv } => {
            run_verify(&csv)?;
        }

        Command::MigrateOverrides {
            old,
            new,
            overrides,
            output,
        } => {
            run_migrate(&old, &new, &overrides, &output)?;
        }
    }

    Ok(())
}

fn resolve_output_dir(flag: Option<PathBuf>, cfg: &Config) -> Result<PathBuf> {
    let dir = flag
        .or_else(|| cfg.paths.output_dir.clone())
        .context("missing output dir: pass --output-dir or set paths.output_dir in tally.toml")?;
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    Ok(dir)
}

fn resolve_input_files(
    input_dir: Option<PathBuf>,
    files: Vec<PathBuf>,
    cfg: &Config,
) -> Result<Vec<PathBuf>> {
    if !files.is_empty() {
        return Ok(files);
    }
    let dir = input_dir
        .or_else(|| cfg.paths.input_dir.clone())
        .context("missing input: pass --input-dir, --files, or set paths.input_dir in tally.toml")?;
    if !dir.exists() {
        bail!("input directory does not exist: {}", dir.display());
    }
    let mut found: Vec<PathBuf> = std::fs::read_dir(&dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")))
        .collect();
    found.sort();
    if found.is_empty() {
        bail!("no CSV files found in {}", dir.display());
    }
    Ok(found)
}

/// Clean every statement file, combine, reconcile. Returns the path of the
/// combined output for the pipeline command.
fn run_clean(files: &[PathBuf], out_dir: &Path, tolerance: f64) -> Result<PathBuf> {
    let mut per_file = Vec::new();
    let mut reports = Vec::new();

    for file in files {
        let records = clean_statement_csv(file)
            .with_context(|| format!("cleaning {}", file.display()))?;

        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "statement".to_string());
        let cleaned_path = out_dir.join(format!("cleaned_{stem}.csv"));
        io::write_records(&cleaned_path, &records)?;

        reports.extend(reconcile(&records, tolerance));
        per_file.push(records);
    }

    let combined = combine_cleaned(per_file).context("combining cleaned statements")?;
    let combined_path = out_dir.join("combined_cleaned.csv");
    io::write_records(&combined_path, &combined)?;

    let report_path = out_dir.join("reconciliation_report.csv");
    io::write_reconciliation(&report_path, &reports)?;

    println!("Processed {} files ({} records).", files.len(), combined.len());
    println!("Wrote outputs to: {}", out_dir.display());

    if !reports.is_empty() {
        let ok = reports.iter().filter(|r| r.ok).count();
        println!(
            "Reconciliation OK rate: {:.1}%",
            100.0 * ok as f64 / reports.len() as f64
        );
        let failing: Vec<_> = reports.iter().filter(|r| !r.ok).collect();
        if !failing.is_empty() {
            println!("\nMonths failing reconciliation (investigate these first):");
            for r in failing {
                println!(
                    "  {} {} delta={}",
                    r.source_file,
                    r.year_month,
                    r.delta.map(|d| format!("{d:.2}")).unwrap_or_else(|| "n/a".into())
                );
            }
        }
    }

    Ok(combined_path)
}

fn run_classify(input: &Path, out_dir: &Path, overrides: Option<&Path>) -> Result<()> {
    let records = io::read_records(input)?;
    if records.is_empty() {
        bail!("no records found in {}", input.display());
    }

    let classifier = Classifier::new().context("compiling classifier patterns")?;
    let table = match overrides {
        Some(path) if path.exists() => OverrideTable::load(path)?,
        Some(path) => {
            // No overrides yet is not an error.
            info!(path = %path.display(), "override table not found; classifying without it");
            OverrideTable::empty()
        }
        None => OverrideTable::empty(),
    };

    let finals = classify_records(&records, &classifier, &table)
        .with_context(|| format!("classifying {}", input.display()))?;

    let output_path = out_dir.join("classified_transactions.csv");
    io::write_final_records(&output_path, &finals)?;

    let overridden = finals.iter().filter(|r| r.was_overridden).count();
    println!(
        "Classified {} records ({} overridden) -> {}",
        finals.len(),
        overridden,
        output_path.display()
    );
    Ok(())
}

fn run_verify(csv: &Path) -> Result<()> {
    let records = io::read_records(csv)?;
    if records.is_empty() {
        bail!("no records found in {}", csv.display());
    }

    let report = identity::verify_ids(&records)
        .with_context(|| format!("verifying {}", csv.display()))?;

    println!("Rows checked:        {}", report.rows);
    println!("Without embedded id: {}", report.unidentified);
    println!("Mismatched ids:      {}", report.mismatched);
    println!("Order-dependent:     {}", report.order_dependent);
    for sample in &report.mismatch_samples {
        println!("  {sample}");
    }

    if !report.is_stable() {
        bail!("Txn_ID verification failed");
    }
    println!("Txn_ID assignment is stable and order-independent.");
    Ok(())
}

fn run_migrate(old: &Path, new: &Path, overrides: &Path, output: &Path) -> Result<()> {
    let old_records = io::read_records(old)?;
    let new_records = io::read_records(new)?;
    let rows = io::read_override_rows(overrides)?;

    let (migrated, report) = migrate_overrides(&old_records, &new_records, &rows)
        .context("migrating override table")?;
    io::write_override_rows(output, &migrated)?;

    println!(
        "Migrated {}/{} override rows -> {}",
        report.matched,
        report.total,
        output.display()
    );
    if report.ambiguous_keys > 0 {
        println!("Ambiguous semantic keys excluded: {}", report.ambiguous_keys);
    }
    if report.unmatched > 0 {
        println!("Unmatched rows carried through unchanged:");
        for id in &report.unmatched_samples {
            println!("  {id}");
        }
    }
    Ok(())
}
