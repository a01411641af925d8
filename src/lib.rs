pub mod error;
pub mod mdp;

pub use error::{Error, Result};
pub use mdp::{load_model, parse_model, Objective, Solution, SolveStatus, Solver, SolverConfig};
