//! CLI entry point for the construction verifier.
//!
//! Usage:
//!   construction-verifier construct <unit> [--param key=value]... [options]
//!   construction-verifier verify <unit> <construction.json> [--param key=value]... [options]
//!   construction-verifier verify <unit> --stdin [--param key=value]... [options]
//!
//! Options:
//!   --params-json <file>          JSON object of integer parameters
//!   --max-steps <n>               Cap on permutation search assignments (default: 5000000)
//!   --cycle-search-budget <n>     Cap on DFS expansions per cycle query (default: unbounded)
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default: warn).

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use construction_verifier::{ParamAssignment, Parameters, SearchConfig, Unit};

#[derive(Parser)]
#[command(name = "construction-verifier")]
#[command(about = "Constructive-proof generators and independent verifiers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a construction and print it as JSON (`null` when none exists)
    Construct {
        #[arg(value_enum)]
        unit: Unit,

        #[command(flatten)]
        params: ParamArgs,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Check a construction and print the per-check report
    Verify {
        #[arg(value_enum)]
        unit: Unit,

        /// Path to the construction (use --stdin to read from stdin)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Read the construction from stdin instead of a file
        #[arg(long)]
        stdin: bool,

        #[command(flatten)]
        params: ParamArgs,

        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Args)]
struct ParamArgs {
    /// Integer parameter as key=value; repeatable, overrides --params-json
    #[arg(long = "param", value_name = "KEY=VALUE")]
    assignments: Vec<ParamAssignment>,

    /// JSON object of integer parameters, e.g. {"n": 5}
    #[arg(long, value_name = "FILE")]
    params_json: Option<PathBuf>,
}

#[derive(Args)]
struct SearchArgs {
    /// Maximum assignments tried by the permutation search
    #[arg(long, default_value = "5000000")]
    max_steps: usize,

    /// Maximum DFS node expansions per cycle query
    #[arg(long)]
    cycle_search_budget: Option<usize>,
}

impl ParamArgs {
    fn resolve(&self) -> Result<Parameters> {
        let mut params = match &self.params_json {
            Some(path) => {
                let text = read_file(path)?;
                serde_json::from_str::<Parameters>(&text)
                    .with_context(|| format!("parameters in {} must be a JSON object of integers", path.display()))?
            }
            None => Parameters::new(),
        };
        for ParamAssignment { key, value } in &self.assignments {
            params.insert(key, *value);
        }
        Ok(params)
    }
}

impl From<&SearchArgs> for SearchConfig {
    fn from(args: &SearchArgs) -> Self {
        SearchConfig {
            max_steps: args.max_steps,
            cycle_search_budget: args.cycle_search_budget,
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Construct { unit, params, search } => {
            let params = params.resolve()?;
            let config = SearchConfig::from(&search);
            tracing::info!(%unit, ?params, "constructing");

            let construction = match unit.construct_json(&params, &config) {
                Ok(value) => value,
                Err(err) => {
                    eprintln!("Error: {unit}: {err}");
                    return Ok(ExitCode::FAILURE);
                }
            };
            println!("{}", serde_json::to_string_pretty(&construction)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify {
            unit,
            file,
            stdin,
            params,
            search,
        } => {
            let text = match (file, stdin) {
                (_, true) => {
                    let mut buffer = String::new();
                    io::stdin()
                        .read_to_string(&mut buffer)
                        .context("failed to read construction from stdin")?;
                    buffer
                }
                (Some(path), false) => read_file(&path)?,
                (None, false) => bail!("must provide either a file path or --stdin"),
            };
            let params = params.resolve()?;
            let config = SearchConfig::from(&search);
            tracing::info!(%unit, ?params, bytes = text.len(), "verifying");

            let report = unit.verify_text(&text, &params, &config);
            if let Some(summary) = report.failure_summary() {
                tracing::info!(%unit, %summary, "construction rejected");
            }
            println!("{}", serde_json::to_string_pretty(&report)?);

            Ok(if report.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
