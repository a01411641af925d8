//! Policy iteration for finite Markov decision processes.
//!
//! A model is a graph of three kinds of nodes:
//! - decision nodes, where the agent nominates one successor that is reached
//!   with a "slip" probability;
//! - chance nodes, with a fixed distribution over their successors;
//! - terminal nodes, whose value is their reward.
//!
//! [`parse_model`] or [`load_model`] builds a [`Graph`] from the text format,
//! and [`Solver`] runs modified policy iteration over it.

pub mod diagnostic;
pub mod evaluator;
pub mod graph;
pub mod initializer;
pub mod loader;
pub mod policy;
pub mod report;
pub mod solver;

pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use evaluator::{backup, evaluate, Evaluation, EvaluationParams};
pub use graph::{
    check_probabilities, Graph, Node, NodeId, Transition, PROBABILITY_SUM_EPSILON,
};
pub use initializer::initialize;
pub use loader::{load_model, parse_model, LoadedModel};
pub use policy::{extract_policy, Objective};
pub use report::{format_value, render};
pub use solver::{Solution, SolveStatus, Solver, SolverConfig};
