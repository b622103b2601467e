use thiserror::Error;

/// Represents a linear programming problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Problem name (for diagnostics)
    pub name: String,
    /// Variable names
    pub variables: Vec<String>,
    /// Bounds for each variable
    pub bounds: Vec<Bounds>,
    /// Objective function coefficients
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// `[0, +inf)`, the default for a freshly declared variable
    pub fn non_negative() -> Self {
        Self::new(0.0, f64::INFINITY)
    }

    pub fn has_upper(&self) -> bool {
        self.upper.is_finite()
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::non_negative()
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub sense: Sense,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl ConstraintOp {
    /// The operator obtained by multiplying both sides by -1
    pub fn flipped(self) -> Self {
        match self {
            ConstraintOp::Le => ConstraintOp::Ge,
            ConstraintOp::Ge => ConstraintOp::Le,
            ConstraintOp::Eq => ConstraintOp::Eq,
        }
    }
}

/// Structural defects that prevent a problem from being handed to the simplex
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("Objective has {found} coefficients but the problem declares {expected} variables")]
    ObjectiveLength { expected: usize, found: usize },
    #[error("Constraint {name} has {found} coefficients but the problem declares {expected} variables")]
    ConstraintLength {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Variable {name} has invalid bounds [{lower}, {upper}]")]
    InvalidBounds { name: String, lower: f64, upper: f64 },
    #[error("Non-finite coefficient in {0}")]
    NonFinite(String),
}

impl LpProblem {
    pub fn new(name: impl Into<String>, variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            name: name.into(),
            variables,
            bounds: vec![Bounds::default(); n],
            objective: Objective {
                coefficients: vec![0.0; n],
                sense: Sense::Minimize,
            },
            constraints: Vec::new(),
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, sense: Sense) {
        self.objective = Objective { coefficients, sense };
    }

    pub fn set_bounds(&mut self, var: usize, bounds: Bounds) {
        self.bounds[var] = bounds;
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Check dimensions, bounds and coefficients before solving
    pub fn validate(&self) -> Result<(), ProblemError> {
        let n = self.num_variables();

        if self.objective.coefficients.len() != n {
            return Err(ProblemError::ObjectiveLength {
                expected: n,
                found: self.objective.coefficients.len(),
            });
        }
        if self.objective.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ProblemError::NonFinite("objective".to_string()));
        }

        for (name, b) in self.variables.iter().zip(&self.bounds) {
            if !b.lower.is_finite() || b.upper.is_nan() || b.lower > b.upper {
                return Err(ProblemError::InvalidBounds {
                    name: name.clone(),
                    lower: b.lower,
                    upper: b.upper,
                });
            }
        }

        for c in &self.constraints {
            if c.coefficients.len() != n {
                return Err(ProblemError::ConstraintLength {
                    name: c.name.clone(),
                    expected: n,
                    found: c.coefficients.len(),
                });
            }
            if !c.rhs.is_finite() || c.coefficients.iter().any(|x| !x.is_finite()) {
                return Err(ProblemError::NonFinite(c.name.clone()));
            }
        }

        Ok(())
    }

    /// Evaluate the objective at the given point
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(c, v)| c * v)
            .sum()
    }
}
