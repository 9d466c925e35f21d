use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use r1cs_checker::checker::{discover, TestCase};
use r1cs_checker::{
    CheckError, CheckerConfig, CircuitChecker, ExpectedOutput, WitnessInput, WitnessType,
};

#[derive(Parser)]
#[command(name = "r1cs-checker")]
#[command(about = "Checks circom witnesses against their constraint system and expected outputs")]
struct Cli {
    /// Print debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum WitnessKind {
    Bin,
    Wtns,
    Text,
    Json,
}

impl From<WitnessKind> for WitnessType {
    fn from(kind: WitnessKind) -> Self {
        match kind {
            WitnessKind::Bin | WitnessKind::Wtns => WitnessType::Bin,
            WitnessKind::Text | WitnessKind::Json => WitnessType::Text,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check every test case (input.json + witness + output.json) of a compiled circuit
    #[command(alias = "test")]
    Check {
        /// Directory holding circuit.r1cs and circuit.sym
        circuit_dir: PathBuf,
        /// Directory searched for test cases (defaults to the circuit dir)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
        /// Witness file each test case provides
        #[arg(short, long, value_enum)]
        witness_type: Option<WitnessKind>,
        /// Config file (defaults to <circuit_dir>/checker.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Check a single witness file
    Verify {
        #[arg(long)]
        r1cs: PathBuf,
        #[arg(long)]
        sym: PathBuf,
        #[arg(short, long)]
        witness: PathBuf,
        /// Expected outputs as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// `RUST_LOG` directives (default `info`); `--verbose` raises the global
/// level to `debug` on top of them.
fn log_filter(env_directives: Option<&str>, verbose: bool) -> EnvFilter {
    let filter = env_directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    if verbose {
        filter.add_directive(LevelFilter::DEBUG.into())
    } else {
        filter
    }
}

fn init_tracing(verbose: bool) {
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(env_directives.as_deref(), verbose))
        .with_target(false)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check {
            circuit_dir,
            data_dir,
            witness_type,
            config,
        } => {
            let mut config = match config {
                Some(path) => CheckerConfig::load(&path),
                None => CheckerConfig::for_circuit_dir(&circuit_dir),
            }
            .context("loading checker config")?;
            if let Some(kind) = witness_type {
                config.witness_type = kind.into();
            }
            let data_dir = data_dir.unwrap_or_else(|| circuit_dir.clone());
            check_circuit_dir(&circuit_dir, &data_dir, &config)
        }
        Commands::Verify {
            r1cs,
            sym,
            witness,
            output,
        } => {
            let mut checker = CircuitChecker::new();
            checker
                .load(&r1cs, &sym)
                .with_context(|| format!("loading {}", r1cs.display()))?;
            let expected = output
                .as_deref()
                .map(ExpectedOutput::load)
                .transpose()
                .context("reading expected outputs")?;
            match checker.verify(WitnessInput::Path(&witness), expected.as_ref()) {
                Ok(()) => {
                    info!("{} passed", witness.display());
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) if err.is_test_failure() => {
                    error!("{} failed", witness.display());
                    eprintln!("{err}");
                    Ok(ExitCode::FAILURE)
                }
                Err(err) => Err(err).context("checking witness"),
            }
        }
    }
}

fn check_circuit_dir(
    circuit_dir: &Path,
    data_dir: &Path,
    config: &CheckerConfig,
) -> Result<ExitCode> {
    let (r1cs, sym) = config.artifact_paths(circuit_dir);
    let mut checker = CircuitChecker::with_config(config);
    checker
        .load(&r1cs, &sym)
        .with_context(|| format!("loading circuit from {}", circuit_dir.display()))?;

    let cases = discover(data_dir, config.witness_type)?;
    if cases.is_empty() {
        info!("no test cases found under {}", data_dir.display());
        return Ok(ExitCode::SUCCESS);
    }

    let results: Vec<(&TestCase, Result<(), CheckError>)> = cases
        .par_iter()
        .map(|case| (case, checker.check_test_case(&case.witness, Some(&case.expected_output))))
        .collect();

    let mut failed = 0usize;
    for (case, result) in &results {
        match result {
            Ok(()) => info!("test {} passed", case.dir.display()),
            Err(err) => {
                failed += 1;
                error!("test {} failed", case.dir.display());
                eprintln!("{err}\n");
            }
        }
    }

    println!("{} passed, {} failed", results.len() - failed, failed);
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
