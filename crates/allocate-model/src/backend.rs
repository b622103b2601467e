use allocate_solver::{LpProblem, Solution, Solver};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Solver {0} is unavailable")]
    Unavailable(String),
    #[error("Solver {name} failed: {message}")]
    Internal { name: String, message: String },
}

/// Anything that can solve an LP once and report a status with values
pub trait LpBackend {
    /// Get the solver name for logging/debugging
    fn name(&self) -> &str;

    /// Solve the problem. Infeasible or unbounded outcomes are statuses in
    /// the returned solution; errors mean the solver itself failed.
    fn solve(&self, problem: &LpProblem) -> Result<Solution, BackendError>;
}

impl LpBackend for Solver {
    fn name(&self) -> &str {
        "simplex"
    }

    fn solve(&self, problem: &LpProblem) -> Result<Solution, BackendError> {
        Ok(Solver::solve(self, problem))
    }
}
