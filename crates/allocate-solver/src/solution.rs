use std::fmt;

/// The result of solving an LP problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Optimal values for each variable (empty unless the status is optimal)
    pub values: Vec<f64>,
    /// Optimal objective value
    pub objective_value: Option<f64>,
    /// Detailed analysis
    pub analysis: Analysis,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The solver stopped before reaching a verdict (iteration limit)
    NotSolved,
    /// The problem could not be interpreted by the solver
    Undefined,
}

impl SolutionStatus {
    pub fn label(self) -> &'static str {
        match self {
            SolutionStatus::Optimal => "Optimal",
            SolutionStatus::Infeasible => "Infeasible",
            SolutionStatus::Unbounded => "Unbounded",
            SolutionStatus::NotSolved => "Not Solved",
            SolutionStatus::Undefined => "Undefined",
        }
    }

    pub fn is_optimal(self) -> bool {
        self == SolutionStatus::Optimal
    }
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Detailed analysis of the optimal solution
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// Shadow prices (dual values) for each constraint
    /// Indicates how much the objective would change per unit relaxation
    pub shadow_prices: Vec<ShadowPrice>,

    /// Reduced costs for each variable
    pub reduced_costs: Vec<ReducedCost>,

    /// Constraints whose left-hand side meets the right-hand side at optimum
    pub binding_constraints: Vec<String>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ShadowPrice {
    /// Constraint name
    pub constraint: String,
    /// Change in objective per unit increase of the right-hand side
    pub value: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ReducedCost {
    /// Variable name
    pub variable: String,
    /// Current value in solution
    pub value: f64,
    /// Reduced cost
    pub reduced_cost: f64,
    /// Is this variable in the basis?
    pub is_basic: bool,
}

impl Solution {
    pub fn optimal(values: Vec<f64>, objective_value: f64, analysis: Analysis) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            values,
            objective_value: Some(objective_value),
            analysis,
        }
    }

    /// A terminal status without any variable values
    pub fn without_values(status: SolutionStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: None,
            analysis: Analysis::default(),
        }
    }

    pub fn infeasible() -> Self {
        Self::without_values(SolutionStatus::Infeasible)
    }

    pub fn unbounded() -> Self {
        Self::without_values(SolutionStatus::Unbounded)
    }

    pub fn not_solved() -> Self {
        Self::without_values(SolutionStatus::NotSolved)
    }

    pub fn undefined() -> Self {
        Self::without_values(SolutionStatus::Undefined)
    }

    /// Value of variable `var`, if the solver produced one
    pub fn value(&self, var: usize) -> Option<f64> {
        if self.status.is_optimal() {
            self.values.get(var).copied()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(SolutionStatus::Optimal.to_string(), "Optimal");
        assert_eq!(SolutionStatus::NotSolved.to_string(), "Not Solved");
        assert_eq!(SolutionStatus::Undefined.label(), "Undefined");
    }

    #[test]
    fn test_non_optimal_has_no_values() {
        let mut solution = Solution::infeasible();
        solution.values = vec![1.0];
        assert_eq!(solution.value(0), None);
        assert_eq!(solution.objective_value, None);
    }
}
