//! StatWorkbench CLI
//!
//! Reads a YAML or JSON request document, runs one calculator and prints the
//! result as pretty JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sw_core::Dataset;
use sw_inference::{DatasetRequest, TestRequest};

mod calc;
mod document;

use calc::CalcRequest;
use document::{read_document, write_json};

#[derive(Parser)]
#[command(name = "statwb")]
#[command(about = "StatWorkbench - hypothesis tests and statistical calculators")]
#[command(version)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a hypothesis test from summary or raw inputs
    Test {
        /// Test request (YAML or JSON), tagged by `test`
        #[arg(short, long)]
        input: PathBuf,

        /// Override the significance level of the request
        #[arg(long)]
        alpha: Option<f64>,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run an analysis on named columns of a dataset
    Analyze {
        /// Dataset document: `{"columns": [{"name": ..., "values": [...]}]}`
        #[arg(short, long)]
        dataset: PathBuf,

        /// Analysis request (YAML or JSON), tagged by `analysis`
        #[arg(short, long)]
        request: PathBuf,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Distribution, probability and interval calculators
    Calc {
        /// Calculator request (YAML or JSON), tagged by `calc`
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Test { input, alpha, output } => cmd_test(&input, alpha, output.as_ref()),
        Commands::Analyze { dataset, request, output } => {
            cmd_analyze(&dataset, &request, output.as_ref())
        }
        Commands::Calc { input, output } => cmd_calc(&input, output.as_ref()),
        Commands::Version => {
            println!("statwb {}", sw_core::VERSION);
            Ok(())
        }
    }
}

fn cmd_test(input: &PathBuf, alpha: Option<f64>, output: Option<&PathBuf>) -> Result<()> {
    let mut request: TestRequest = read_document(input)?;
    if let Some(a) = alpha {
        request.set_alpha(a);
    }
    tracing::info!(kind = ?request.kind(), "running test");

    let outcome = request.run()?;
    if let Some(test) = outcome.primary() {
        tracing::info!(
            statistic = test.statistic,
            p_value = test.p_value,
            decision = ?test.decision,
            "test complete"
        );
    }
    write_json(output, &outcome)
}

fn cmd_analyze(dataset: &PathBuf, request: &PathBuf, output: Option<&PathBuf>) -> Result<()> {
    let data: Dataset = read_document(dataset)?;
    let request: DatasetRequest = read_document(request)?;
    tracing::info!(rows = data.n_rows(), columns = data.columns().len(), "dataset loaded");

    let outcome = request.run(&data)?;
    tracing::info!("analysis complete");
    write_json(output, &outcome)
}

fn cmd_calc(input: &PathBuf, output: Option<&PathBuf>) -> Result<()> {
    let request: CalcRequest = read_document(input)?;
    tracing::debug!(?request, "running calculator");
    let outcome = request.run()?;
    write_json(output, &outcome)
}
