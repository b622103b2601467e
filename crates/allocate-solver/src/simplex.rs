use log::{debug, trace, warn};

use crate::problem::{ConstraintOp, LpProblem, Sense};
use crate::solution::{Analysis, ReducedCost, ShadowPrice, Solution};

/// Consecutive degenerate pivots tolerated before switching to Bland's rule
const DEGENERATE_PIVOT_LIMIT: usize = 50;

/// Simplex solver for linear programming problems
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum iterations (per phase) before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Solve the LP problem using the two-phase simplex method
    pub fn solve(&self, problem: &LpProblem) -> Solution {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            warn!("{}: tolerance must be finite and positive, got {}", problem.name, self.tolerance);
            return Solution::undefined();
        }
        if let Err(e) = problem.validate() {
            warn!("{}: {}", problem.name, e);
            return Solution::undefined();
        }

        let mut tableau = self.build_tableau(problem);
        debug!(
            "{}: {} rows, {} structural / {} slack / {} artificial columns",
            problem.name,
            tableau.num_rows(),
            tableau.n_vars,
            tableau.n_slack,
            tableau.n_artificial
        );

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau) {
                PhaseOne::Feasible => {}
                PhaseOne::Infeasible => return Solution::infeasible(),
                PhaseOne::IterationLimit => return Solution::not_solved(),
            }
        }

        // Phase 2: Optimize
        let limit = tableau.artificial_start();
        match self.iterate(&mut tableau, limit) {
            SimplexResult::Optimal => self.extract_solution(&tableau, problem),
            SimplexResult::Unbounded => Solution::unbounded(),
            SimplexResult::IterationLimit => Solution::not_solved(),
        }
    }

    /// Shift variables to a zero lower bound, add upper-bound rows, and make
    /// every right-hand side non-negative
    fn standard_rows(&self, problem: &LpProblem) -> Vec<StandardRow> {
        let n_vars = problem.num_variables();
        let lower: Vec<f64> = problem.bounds.iter().map(|b| b.lower).collect();
        let mut rows = Vec::with_capacity(problem.num_constraints() + n_vars);

        for (i, c) in problem.constraints.iter().enumerate() {
            let shift: f64 = c.coefficients.iter().zip(&lower).map(|(a, l)| a * l).sum();
            rows.push(StandardRow::new(
                RowOrigin::Constraint(i),
                c.coefficients.clone(),
                c.op,
                c.rhs - shift,
            ));
        }

        for (j, b) in problem.bounds.iter().enumerate() {
            if b.has_upper() {
                let mut coefficients = vec![0.0; n_vars];
                coefficients[j] = 1.0;
                rows.push(StandardRow::new(
                    RowOrigin::UpperBound,
                    coefficients,
                    ConstraintOp::Le,
                    b.upper - b.lower,
                ));
            }
        }

        rows
    }

    fn build_tableau(&self, problem: &LpProblem) -> Tableau {
        let rows = self.standard_rows(problem);
        let n_vars = problem.num_variables();
        let n_rows = rows.len();

        let n_slack = rows.iter().filter(|r| r.op != ConstraintOp::Eq).count();
        let n_artificial = rows.iter().filter(|r| r.op != ConstraintOp::Le).count();

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let mut data = vec![vec![0.0; total_cols]; n_rows + 1]; // +1 for objective
        let mut basic_vars = vec![0; n_rows];
        let mut row_info = Vec::with_capacity(n_rows);

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, row) in rows.into_iter().enumerate() {
            data[i][..n_vars].copy_from_slice(&row.coefficients);
            data[i][total_cols - 1] = row.rhs;

            // The dual of a row is read off the objective entry of a column
            // whose constraint-matrix column is +e_i or -e_i
            let (dual_column, dual_sign) = match row.op {
                ConstraintOp::Le => {
                    data[i][slack_idx] = 1.0;
                    basic_vars[i] = slack_idx;
                    slack_idx += 1;
                    (slack_idx - 1, -1.0)
                }
                ConstraintOp::Ge => {
                    data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    data[i][artificial_idx] = 1.0;
                    basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                    (slack_idx - 1, 1.0)
                }
                ConstraintOp::Eq => {
                    data[i][artificial_idx] = 1.0;
                    basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                    (artificial_idx - 1, -1.0)
                }
            };

            row_info.push(RowInfo {
                origin: row.origin,
                flipped: row.flipped,
                dual_column,
                dual_sign,
            });
        }

        // Objective row (last row). The simplex maximizes; a positive entry
        // means the column can still improve the objective.
        for (j, &coef) in problem.objective.coefficients.iter().enumerate() {
            data[n_rows][j] = match problem.objective.sense {
                Sense::Minimize => -coef,
                Sense::Maximize => coef,
            };
        }

        Tableau {
            data,
            basic_vars,
            n_vars,
            n_slack,
            n_artificial,
            rows: row_info,
        }
    }

    fn phase1(&self, tableau: &mut Tableau) -> PhaseOne {
        let n_rows = tableau.num_rows();
        let n_cols = tableau.num_cols();
        let obj_row = n_rows;
        let art_start = tableau.artificial_start();

        // Maximize -sum(artificials), expressed against the starting basis
        let orig_obj = std::mem::replace(&mut tableau.data[obj_row], vec![0.0; n_cols]);
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[obj_row][j] = -1.0;
        }
        for i in 0..n_rows {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] += tableau.data[i][j];
                }
            }
        }

        match self.iterate(tableau, n_cols - 1) {
            SimplexResult::Optimal => {}
            // The auxiliary objective is bounded by zero
            SimplexResult::Unbounded => return PhaseOne::Infeasible,
            SimplexResult::IterationLimit => return PhaseOne::IterationLimit,
        }

        let rhs_col = n_cols - 1;
        let residual = (0..n_rows).any(|i| {
            tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col].abs() > self.tolerance
        });
        if residual {
            debug!("phase 1 ended with positive artificials");
            return PhaseOne::Infeasible;
        }

        self.drive_out_artificials(tableau);

        // Restore original objective and adjust for basic variables
        tableau.data[obj_row] = orig_obj;
        for i in 0..n_rows {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[obj_row][basic];
            if ratio.abs() > self.tolerance {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        PhaseOne::Feasible
    }

    /// Replace artificials left in the basis at zero level. Rows with no
    /// usable column are redundant and keep their artificial at zero.
    fn drive_out_artificials(&self, tableau: &mut Tableau) {
        let art_start = tableau.artificial_start();
        for i in 0..tableau.num_rows() {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            if let Some(j) = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance) {
                trace!("driving artificial out of row {} via column {}", i, j);
                self.pivot(tableau, i, j);
            }
        }
    }

    /// Pivot until no column below `limit` can improve the objective
    fn iterate(&self, tableau: &mut Tableau, limit: usize) -> SimplexResult {
        let rhs_col = tableau.num_cols() - 1;
        let mut degenerate_run = 0;

        for _ in 0..self.max_iterations {
            let bland = degenerate_run >= DEGENERATE_PIVOT_LIMIT;
            let Some(pivot_col) = self.find_pivot_column(tableau, limit, bland) else {
                return SimplexResult::Optimal;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return SimplexResult::Unbounded;
            };

            if tableau.data[pivot_row][rhs_col] <= self.tolerance {
                degenerate_run += 1;
            } else {
                degenerate_run = 0;
            }

            trace!("pivot row {} col {}", pivot_row, pivot_col);
            self.pivot(tableau, pivot_row, pivot_col);
        }

        if self.find_pivot_column(tableau, limit, false).is_none() {
            SimplexResult::Optimal
        } else {
            warn!("simplex stopped after {} iterations", self.max_iterations);
            SimplexResult::IterationLimit
        }
    }

    /// Most positive reduced cost, or the lowest improving index under Bland's rule
    fn find_pivot_column(&self, tableau: &Tableau, limit: usize, bland: bool) -> Option<usize> {
        let obj_row = &tableau.data[tableau.num_rows()];

        if bland {
            return (0..limit).find(|&j| obj_row[j] > self.tolerance);
        }

        let mut max_val = self.tolerance;
        let mut max_col = None;
        for (j, &val) in obj_row.iter().enumerate().take(limit) {
            if val > max_val {
                max_val = val;
                max_col = Some(j);
            }
        }
        max_col
    }

    /// Minimum ratio test; ties go to the lowest basic variable index
    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.num_cols() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;

        for i in 0..tableau.num_rows() {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.data[i][rhs_col] / val;
            let better = match min_row {
                None => true,
                Some(r) => {
                    ratio < min_ratio - self.tolerance
                        || (ratio <= min_ratio + self.tolerance
                            && tableau.basic_vars[i] < tableau.basic_vars[r])
                }
            };
            if better {
                min_ratio = ratio;
                min_row = Some(i);
            }
        }

        min_row
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.num_cols();

        // Update basic variable
        tableau.basic_vars[row] = col;

        // Scale pivot row
        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        // Eliminate column in other rows
        for i in 0..n_rows {
            if i != row {
                let factor = tableau.data[i][col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n_cols {
                    tableau.data[i][j] -= factor * tableau.data[row][j];
                }
            }
        }
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &LpProblem) -> Solution {
        let n_vars = problem.num_variables();
        let rhs_col = tableau.num_cols() - 1;

        // Non-basic variables sit at their lower bound
        let mut values: Vec<f64> = problem.bounds.iter().map(|b| b.lower).collect();
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < n_vars {
                values[basic] += tableau.data[i][rhs_col];
            }
        }

        // Snap round-off onto the bounds
        for (v, b) in values.iter_mut().zip(&problem.bounds) {
            if (*v - b.lower).abs() <= self.tolerance {
                *v = b.lower;
            } else if b.has_upper() && (*v - b.upper).abs() <= self.tolerance {
                *v = b.upper;
            }
        }

        let objective_value = problem.objective_value(&values);
        debug!("{}: optimal objective {}", problem.name, objective_value);

        let analysis = self.analyze(tableau, problem, &values);
        Solution::optimal(values, objective_value, analysis)
    }

    fn analyze(&self, tableau: &Tableau, problem: &LpProblem, values: &[f64]) -> Analysis {
        let obj_row = tableau.num_rows();
        let minimize = problem.objective.sense == Sense::Minimize;

        // Shadow prices, in the units of the caller's objective
        let mut shadow_prices = Vec::new();
        for row in &tableau.rows {
            let RowOrigin::Constraint(index) = row.origin else {
                continue;
            };
            let mut value = row.dual_sign * tableau.data[obj_row][row.dual_column];
            if row.flipped {
                value = -value;
            }
            if minimize {
                value = -value;
            }
            if value.abs() < self.tolerance {
                value = 0.0;
            }
            shadow_prices.push(ShadowPrice {
                constraint: problem.constraints[index].name.clone(),
                value,
            });
        }

        // Reduced costs: objective change per unit increase of a non-basic variable
        let reduced_costs = problem
            .variables
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let is_basic = tableau.basic_vars.contains(&j);
                let entry = tableau.data[obj_row][j];
                let reduced_cost = if is_basic {
                    0.0
                } else if minimize {
                    -entry
                } else {
                    entry
                };
                ReducedCost {
                    variable: name.clone(),
                    value: values[j],
                    reduced_cost,
                    is_basic,
                }
            })
            .collect();

        // Tight rows, whether or not their dual is non-zero
        let binding_constraints = problem
            .constraints
            .iter()
            .filter(|c| {
                let lhs: f64 = c.coefficients.iter().zip(values).map(|(a, v)| a * v).sum();
                (lhs - c.rhs).abs() <= self.tolerance * (1.0 + c.rhs.abs())
            })
            .map(|c| c.name.clone())
            .collect();

        Analysis {
            shadow_prices,
            reduced_costs,
            binding_constraints,
        }
    }
}

/// A constraint row after bound shifting and sign normalization
struct StandardRow {
    origin: RowOrigin,
    coefficients: Vec<f64>,
    op: ConstraintOp,
    rhs: f64,
    flipped: bool,
}

impl StandardRow {
    fn new(origin: RowOrigin, mut coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) -> Self {
        if rhs < 0.0 {
            for a in coefficients.iter_mut() {
                *a = -*a;
            }
            Self {
                origin,
                coefficients,
                op: op.flipped(),
                rhs: -rhs,
                flipped: true,
            }
        } else {
            Self {
                origin,
                coefficients,
                op,
                rhs,
                flipped: false,
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RowOrigin {
    Constraint(usize),
    UpperBound,
}

struct RowInfo {
    origin: RowOrigin,
    flipped: bool,
    dual_column: usize,
    dual_sign: f64,
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
    rows: Vec<RowInfo>,
}

impl Tableau {
    fn num_rows(&self) -> usize {
        self.basic_vars.len()
    }

    fn num_cols(&self) -> usize {
        self.data[0].len()
    }

    fn artificial_start(&self) -> usize {
        self.n_vars + self.n_slack
    }
}

enum SimplexResult {
    Optimal,
    Unbounded,
    IterationLimit,
}

enum PhaseOne {
    Feasible,
    Infeasible,
    IterationLimit,
}
