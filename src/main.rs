use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

mod engine;
mod error;
mod logging;
mod models;
mod report;
mod rounding;
mod source;

use crate::error::AuditError;
use crate::models::RoomFilter;

#[derive(Parser)]
#[command(name = "gradebook-audit")]
#[command(about = "Reconcile gradebook totals and summarise averages and toppers", long_about = None)]
struct Cli {
    /// Gradebook sheet exported as CSV (falls back to GRADEBOOK_PATH, then data.csv)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Only include this room number; negative means every room
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    room: i64,
    /// Export the report in this format
    #[arg(long, value_enum)]
    export: Option<ExportFormat>,
    /// Where the exported report is written
    #[arg(long, default_value = "report.json")]
    out: PathBuf,
    /// Write the gradebook with corrected totals to this path
    #[arg(long)]
    corrected: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExportFormat {
    Json,
}

fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let started = Instant::now();
    let cli = Cli::parse();

    let input = match cli.input {
        Some(path) => path,
        None => std::env::var("GRADEBOOK_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data.csv")),
    };
    let filter = RoomFilter::from_sentinel(cli.room);

    let gradebook = source::read_gradebook(&input).context("failed to load gradebook")?;
    if gradebook.defaulted_cells > 0 {
        println!(
            "Note: {} numeric cells could not be read and were counted as zero.",
            gradebook.defaulted_cells
        );
    }

    let result = match engine::aggregate(&gradebook.rows, filter) {
        Ok(result) => result,
        Err(AuditError::EmptyResultSet { skipped, ranking }) => {
            warn!(skipped, "no rows to aggregate");
            println!("No gradebook rows found for this selection.");
            println!();
            print!("{}", report::build_toppers(&ranking));
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    print!("{}", report::build_report(&result, filter, chrono::Utc::now()));

    if let Some(ExportFormat::Json) = cli.export {
        report::export_json(&result, &cli.out)?;
        println!();
        println!("Data successfully exported to {}.", cli.out.display());
    }

    if let Some(path) = cli.corrected {
        source::write_corrected(&path, &gradebook, &result.corrections)?;
        println!("Corrected gradebook written to {}.", path.display());
    }

    info!(elapsed_ms = started.elapsed().as_millis() as u64, "audit finished");
    Ok(())
}
