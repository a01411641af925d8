//! markov - solve a Markov decision process described in a model file
//!
//! Prints the number of policy-iteration rounds, the chosen successor of
//! every decision node and the value of every node.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::error;
use markov::mdp::{load_model, render, Objective, Solver, SolverConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "markov")]
#[command(version, about = "Solve a Markov decision process with policy iteration", long_about = None)]
struct Args {
    /// Model file to solve
    model: PathBuf,

    /// Minimise values instead of maximising them
    #[arg(long)]
    min: bool,

    /// Discount factor applied to successor values [default: 1.0]
    #[arg(long = "df", value_name = "FACTOR")]
    discount_factor: Option<f64>,

    /// Convergence tolerance of an evaluation sweep [default: 0.001]
    #[arg(long = "tol", value_name = "TOLERANCE")]
    tolerance: Option<f64>,

    /// Maximum evaluation sweeps per round [default: 100]
    #[arg(long = "iter", value_name = "SWEEPS")]
    max_sweeps: Option<usize>,

    /// Give up after this many rounds [default: 1000]
    #[arg(long, value_name = "ROUNDS")]
    max_rounds: Option<usize>,

    /// Fail if the model produced any diagnostics
    #[arg(long)]
    strict: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn solver_config(&self) -> SolverConfig {
        let mut config = SolverConfig::default();
        if self.min {
            config = config.with_objective(Objective::Minimize);
        }
        if let Some(discount_factor) = self.discount_factor {
            config = config.with_discount_factor(discount_factor);
        }
        if let Some(tolerance) = self.tolerance {
            config = config.with_tolerance(tolerance);
        }
        if let Some(max_sweeps) = self.max_sweeps {
            config = config.with_max_sweeps_per_round(max_sweeps);
        }
        if let Some(max_rounds) = self.max_rounds {
            config = config.with_max_rounds(max_rounds);
        }
        config
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("markov={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<ExitCode> {
    let solver = Solver::new(args.solver_config()).context("invalid options")?;
    let model = load_model(&args.model)?;
    let solution = solver.solve_model(model);

    print!("{}", render(&solution));

    if !solution.is_converged() {
        return Ok(ExitCode::FAILURE);
    }
    if args.strict && !solution.diagnostics().is_empty() {
        error!(
            "{} diagnostics in {} (--strict)",
            solution.diagnostics().len(),
            args.model.display()
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
