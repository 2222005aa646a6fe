mod extract;
mod report;
mod segment;

use clap::Parser;
use std::path::PathBuf;

/// A Rust CLI tool that consolidates repeated solver runs into one table:
/// split a concatenated log file into per-run blocks, extract the metric
/// fields from each block, and write one CSV row per run.
#[derive(Parser, Debug)]
#[command(name = "soplog", version, about)]
pub struct Cli {
    /// Solver log file containing one or more concatenated run reports
    input: PathBuf,

    /// Destination CSV report
    #[arg(default_value = "report.csv")]
    output: PathBuf,

    /// Extra logging (per-field extraction decisions)
    #[arg(short, long)]
    verbose: bool,

    /// Suppress progress output, only errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    if let Err(e) = run(&cli) {
        tracing::error!(error = %e, "conversion failed");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), ConvertError> {
    let document = std::fs::read_to_string(&cli.input).map_err(|e| ConvertError::ReadInput {
        path: cli.input.clone(),
        source: e,
    })?;

    let blocks = segment::split_runs(&document);
    tracing::debug!(fragments = blocks.len(), "segmented document");

    // The first fragment is the solver's preamble, cut off before any run
    // data; it never produces a row. A document with no delimiter at all is
    // one big preamble and yields an empty table.
    let records: Vec<extract::RunRecord> = blocks
        .iter()
        .skip(1)
        .map(|block| extract::extract_run(block))
        .collect();
    tracing::info!(runs = records.len(), "extracted run records");

    report::write_report(&records, &cli.output).map_err(ConvertError::WriteReport)?;
    tracing::info!(path = %cli.output.display(), "report written");
    Ok(())
}

#[derive(Debug)]
enum ConvertError {
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },
    WriteReport(report::ReportError),
}

impl std::fmt::Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertError::ReadInput { path, source } => {
                write!(f, "failed to read log file {}: {source}", path.display())
            }
            ConvertError::WriteReport(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::ReadInput { source, .. } => Some(source),
            ConvertError::WriteReport(e) => Some(e),
        }
    }
}
