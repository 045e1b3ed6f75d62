//! Modalcheck - validate reconstructed modal spectra against Testlab data
//!
//! Command line entry point. Reads Universal File dataset 58 records,
//! compares reconstructed spectra against testlab references, and renders
//! quantitative validation reports.
//!
//! # Usage
//!
//! ```bash
//! # List the function records in a testlab file
//! modalcheck list bridge_test.unv
//!
//! # Validate reconstructed files against testlab record 2
//! modalcheck validate bridge_test.unv run_001.unv run_002.unv --record 2
//!
//! # Tighten the matching tolerance and save a JSON report
//! modalcheck validate bridge_test.unv run_001.unv --tolerance 0.02 --json report.json
//!
//! # Export a record as a linear-amplitude UNV file
//! modalcheck export bridge_test.unv --record 2
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::debug;

use modalcheck_core::unv::{
    export_file_name, read_reconstructed_batch, read_records, write_record_file,
};
use modalcheck_core::{validate, Record, RecordKind, ValidationParams, ValidationReport};

#[derive(Parser)]
#[command(name = "modalcheck")]
#[command(about = "Validate reconstructed modal spectra against Testlab UNV measurements")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List the function records in a UNV file
    List {
        /// UNV file to inspect
        file: PathBuf,
    },

    /// Validate reconstructed spectra against a testlab reference record
    Validate {
        /// Testlab UNV file holding the reference records
        testlab: PathBuf,

        /// Reconstructed UNV files, one function record each
        #[arg(required = true)]
        reconstructed: Vec<PathBuf>,

        /// Testlab record to validate against (1-based; defaults to the
        /// first FRF, or the first record when the file holds no FRF)
        #[arg(short, long)]
        record: Option<usize>,

        /// Relative frequency tolerance for alignment and peak matching
        #[arg(long, default_value = "0.05")]
        tolerance: f64,

        /// Peak prominence floor as a fraction of the magnitude maximum
        #[arg(long, default_value = "0.10")]
        prominence: f64,

        /// Fail when FRAC cannot be computed instead of reporting it missing
        #[arg(long)]
        require_frac: bool,

        /// Write all reports as a JSON array to this path
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Export a testlab record as a linear-amplitude UNV file
    Export {
        /// Testlab UNV file
        testlab: PathBuf,

        /// Record to export (1-based)
        #[arg(short, long, default_value = "1")]
        record: usize,

        /// Output path (defaults to Linear_<label>.unv beside the input)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::List { file } => list_records(&file),
        Commands::Validate {
            testlab,
            reconstructed,
            record,
            tolerance,
            prominence,
            require_frac,
            json,
        } => {
            let params = ValidationParams::default()
                .with_frequency_tolerance(tolerance)
                .with_prominence_ratio(prominence)
                .with_require_frac(require_frac);
            run_validation(&testlab, &reconstructed, record, &params, json.as_deref())
        }
        Commands::Export { testlab, record, out } => export_record(&testlab, record, out.as_deref()),
    }
}

fn init_tracing(verbose: u8) {
    let directive = match verbose {
        0 => "modalcheck=info",
        1 => "modalcheck=debug",
        _ => "modalcheck=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(directive.parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn list_records(file: &Path) -> Result<()> {
    let records = read_records(file).with_context(|| format!("failed to read {}", file.display()))?;

    println!(
        "{} {} function record(s) in {}",
        "▶".blue(),
        records.len(),
        file.display()
    );
    for (i, record) in records.iter().enumerate() {
        let (low, high) = record.frequency_range();
        println!(
            "  {:3}. {}  [{}]  {} pts  {:.2}-{:.2} Hz",
            i + 1,
            record.label().bold(),
            record.kind(),
            record.len(),
            low,
            high
        );
    }
    Ok(())
}

fn run_validation(
    testlab_path: &Path,
    reconstructed_paths: &[PathBuf],
    record_index: Option<usize>,
    params: &ValidationParams,
    json_path: Option<&Path>,
) -> Result<()> {
    println!(
        "{} modalcheck v{} ({})",
        "▶".blue(),
        modalcheck_core::VERSION,
        modalcheck_core::BUILD_DATE
    );

    let testlab = load_testlab_record(testlab_path, record_index)?;
    println!(
        "{} Testlab reference: {} [{}] with {} points",
        "▶".blue(),
        testlab.label().bold(),
        testlab.kind(),
        testlab.len()
    );

    let loaded = read_reconstructed_batch(reconstructed_paths);
    let mut load_failures = 0usize;
    for (name, outcome) in &loaded {
        match outcome {
            Ok(record) => debug!(file = %name, points = record.len(), "reconstructed file loaded"),
            Err(err) => {
                println!("  {} {}: {}", "✗".red(), name, err);
                load_failures += 1;
            }
        }
    }
    let successful = loaded.len() - load_failures;
    if load_failures > 0 {
        println!(
            "{} Loaded {} reconstructed file(s) ({} failed)",
            "⚠".yellow(),
            successful,
            load_failures
        );
    } else {
        println!("{} Loaded {} reconstructed file(s)", "▶".blue(), successful);
    }

    let mut reports: Vec<ValidationReport> = Vec::new();
    let mut validation_failures = 0usize;

    for (name, outcome) in &loaded {
        let Ok(reconstructed) = outcome else { continue };
        println!();
        println!("{} {}", "▶".blue(), name.bold());
        match validate(&testlab, reconstructed, params) {
            Ok(report) => {
                println!("{}", report.render_text());
                reports.push(report);
            }
            Err(err) => {
                println!("  {} validation failed: {}", "✗".red(), err);
                validation_failures += 1;
            }
        }
    }

    if let Some(path) = json_path {
        let json = serde_json::to_string_pretty(&reports)?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        println!();
        println!("{} Report saved to: {}", "✓".green(), path.display());
    }

    if load_failures > 0 || validation_failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn export_record(testlab_path: &Path, record_index: usize, out: Option<&Path>) -> Result<()> {
    let record = load_testlab_record(testlab_path, Some(record_index))?;
    let path = match out {
        Some(path) => path.to_path_buf(),
        None => testlab_path.with_file_name(export_file_name(&record)),
    };

    write_record_file(&record, &path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "{} Saved transformed record {} to: {}",
        "✓".green(),
        record.label().bold(),
        path.display()
    );
    Ok(())
}

/// Load one record from a testlab file
///
/// An explicit index is 1-based. Without one, the first FRF is selected,
/// falling back to the first record in the file.
fn load_testlab_record(path: &Path, record_index: Option<usize>) -> Result<Record> {
    let records =
        read_records(path).with_context(|| format!("failed to read {}", path.display()))?;
    let count = records.len();

    match record_index {
        Some(index) => records
            .into_iter()
            .nth(index.wrapping_sub(1))
            .with_context(|| {
                format!(
                    "record index {} out of range: {} has {} record(s)",
                    index,
                    path.display(),
                    count
                )
            }),
        None => {
            let frf = records.iter().position(|r| r.kind() == RecordKind::Frf);
            records
                .into_iter()
                .nth(frf.unwrap_or(0))
                .with_context(|| format!("{} holds no records", path.display()))
        }
    }
}
