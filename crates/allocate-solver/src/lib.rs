mod problem;
mod simplex;
mod solution;

pub use problem::{Bounds, Constraint, ConstraintOp, LpProblem, Objective, ProblemError, Sense};
pub use simplex::Solver;
pub use solution::{Analysis, ReducedCost, ShadowPrice, Solution, SolutionStatus};
