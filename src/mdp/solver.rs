//! Modified policy iteration.
//!
//! The solver alternates a bounded evaluation of the current policy with a
//! greedy improvement step until a round leaves the policy unchanged. Unlike
//! textbook policy iteration, evaluation is not run to an exact fixed point;
//! it stops once values settle within `tolerance` or after
//! `max_sweeps_per_round` sweeps.

use std::collections::BTreeMap;

use log::{debug, info, warn};

use super::diagnostic::Diagnostic;
use super::evaluator::{evaluate, EvaluationParams};
use super::graph::Graph;
use super::initializer::initialize;
use super::loader::LoadedModel;
use super::policy::{extract_policy, Objective};
use crate::error::{Error, Result};

/// Configuration options for [`Solver`].
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Whether to maximise or minimise value
    pub objective: Objective,
    /// Discount factor (0 <= gamma <= 1)
    pub discount_factor: f64,
    /// Per-node convergence tolerance of an evaluation sweep
    pub tolerance: f64,
    /// Maximum number of evaluation sweeps in one round
    pub max_sweeps_per_round: usize,
    /// Maximum number of evaluate/improve rounds before giving up
    pub max_rounds: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            objective: Objective::Maximize,
            discount_factor: 1.0,
            tolerance: 0.001,
            max_sweeps_per_round: 100,
            max_rounds: 1000,
        }
    }
}

impl SolverConfig {
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_discount_factor(mut self, discount_factor: f64) -> Self {
        self.discount_factor = discount_factor;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_sweeps_per_round(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps_per_round = max_sweeps;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Checks that every option is in range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(Error::invalid_config(format!(
                "discount factor must be between 0 and 1, got {}",
                self.discount_factor
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(Error::invalid_config(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if self.max_sweeps_per_round == 0 {
            return Err(Error::invalid_config(
                "max sweeps per round must be at least 1",
            ));
        }
        if self.max_rounds == 0 {
            return Err(Error::invalid_config("max rounds must be at least 1"));
        }
        Ok(())
    }

    pub fn evaluation_params(&self) -> EvaluationParams {
        EvaluationParams {
            discount_factor: self.discount_factor,
            tolerance: self.tolerance,
            max_sweeps: self.max_sweeps_per_round,
        }
    }
}

/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// A round finished without changing the policy.
    Converged,
    /// `max_rounds` rounds ran and the policy was still changing.
    MaxRoundsExceeded,
}

/// Final policy and values of a solve.
#[derive(Debug, Clone)]
pub struct Solution {
    policy: BTreeMap<String, String>,
    values: BTreeMap<String, f64>,
    rounds: usize,
    total_sweeps: usize,
    status: SolveStatus,
    diagnostics: Vec<Diagnostic>,
    graph: Graph,
}

impl Solution {
    fn from_graph(
        graph: Graph,
        rounds: usize,
        total_sweeps: usize,
        status: SolveStatus,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let mut policy = BTreeMap::new();
        let mut values = BTreeMap::new();
        for node in graph.nodes() {
            values.insert(node.name().to_string(), node.value());
            if node.is_decision() && node.successors().len() > 1 {
                if let Some(choice) = node.policy() {
                    policy.insert(
                        node.name().to_string(),
                        graph.node(choice).name().to_string(),
                    );
                }
            }
        }
        Self {
            policy,
            values,
            rounds,
            total_sweeps,
            status,
            diagnostics,
            graph,
        }
    }

    /// Chosen successor of every decision node that has a real choice,
    /// i.e. more than one successor.
    pub fn policy(&self) -> &BTreeMap<String, String> {
        &self.policy
    }

    /// Final value of every node, terminals included.
    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn choice_of(&self, name: &str) -> Option<&str> {
        self.policy.get(name).map(String::as_str)
    }

    /// Number of evaluate/improve rounds executed.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Evaluation sweeps summed over all rounds.
    pub fn total_sweeps(&self) -> usize {
        self.total_sweeps
    }

    pub fn status(&self) -> SolveStatus {
        self.status
    }

    pub fn is_converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }

    /// Loader and initializer diagnostics, in the order they were found.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The solved graph, with final values and policy on its nodes.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }
}

/// Policy-iteration solver over a [`Graph`].
///
/// # Examples
///
/// ```
/// use markov::mdp::{parse_model, Solver, SolverConfig};
///
/// let model = parse_model(
///     "S : [Safe, Risky]\n\
///      Risky : [Win, Lose]\n\
///      Risky % 0.5 0.5\n\
///      Safe=10\nWin=30\nLose=-20\n",
/// );
/// let solver = Solver::new(SolverConfig::default()).unwrap();
/// let solution = solver.solve_model(model);
///
/// assert!(solution.is_converged());
/// assert_eq!(solution.choice_of("S"), Some("Safe"));
/// assert_eq!(solution.value_of("Risky"), Some(5.0));
/// ```
#[derive(Debug, Clone)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    /// Creates a solver, rejecting out-of-range configuration.
    pub fn new(config: SolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solves a loaded model, carrying its loader diagnostics into the solution.
    pub fn solve_model(&self, model: LoadedModel) -> Solution {
        let LoadedModel { graph, diagnostics } = model;
        self.solve_with_diagnostics(graph, diagnostics)
    }

    pub fn solve(&self, graph: Graph) -> Solution {
        self.solve_with_diagnostics(graph, Vec::new())
    }

    fn solve_with_diagnostics(
        &self,
        mut graph: Graph,
        mut diagnostics: Vec<Diagnostic>,
    ) -> Solution {
        info!(
            "solving {} nodes ({:?}, discount {}, tolerance {})",
            graph.len(),
            self.config.objective,
            self.config.discount_factor,
            self.config.tolerance
        );
        diagnostics.extend(initialize(&mut graph, self.config.objective));

        let params = self.config.evaluation_params();
        let mut rounds = 0;
        let mut total_sweeps = 0;
        let status = loop {
            if rounds == self.config.max_rounds {
                break SolveStatus::MaxRoundsExceeded;
            }
            rounds += 1;

            let snapshot = graph.policy_snapshot();
            let evaluation = evaluate(&mut graph, &params);
            total_sweeps += evaluation.sweeps;
            let changed = extract_policy(&mut graph, self.config.objective);
            debug!(
                "round {}: {} sweeps (settled: {}), {} policy changes",
                rounds, evaluation.sweeps, evaluation.converged, changed
            );

            if graph.policy_snapshot() == snapshot {
                break SolveStatus::Converged;
            }
        };

        match status {
            SolveStatus::Converged => info!(
                "policy stable after {} rounds ({} sweeps)",
                rounds, total_sweeps
            ),
            SolveStatus::MaxRoundsExceeded => warn!(
                "policy still changing after {} rounds, giving up",
                rounds
            ),
        }

        Solution::from_graph(graph, rounds, total_sweeps, status, diagnostics)
    }
}
