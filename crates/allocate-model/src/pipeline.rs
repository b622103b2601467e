//! Build, solve, interpret. Each step consumes the previous state, so a run
//! moves strictly forward and the LP is solved at most once.

use allocate_solver::Solution;
use log::{debug, info};
use thiserror::Error;

use crate::backend::{BackendError, LpBackend};
use crate::builder::{AllocationModel, BuildError, ModelBuilder};
use crate::data::ProductionData;
use crate::interpret::{Report, interpret};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Build error: {0}")]
    Build(#[from] BuildError),
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Input captured, no model yet
#[derive(Debug)]
pub struct Unbuilt {
    data: ProductionData,
}

/// LP instance ready for the solver
#[derive(Debug)]
pub struct Built {
    model: AllocationModel,
}

/// Solver has returned
#[derive(Debug)]
pub struct Solved {
    model: AllocationModel,
    solution: Solution,
}

#[derive(Debug)]
pub struct Pipeline<S> {
    state: S,
}

impl Pipeline<Unbuilt> {
    pub fn new(data: ProductionData) -> Self {
        Self {
            state: Unbuilt { data },
        }
    }

    pub fn data(&self) -> &ProductionData {
        &self.state.data
    }

    pub fn build(self, builder: &ModelBuilder) -> Result<Pipeline<Built>, PipelineError> {
        let model = builder.build(&self.state.data)?;
        Ok(Pipeline {
            state: Built { model },
        })
    }
}

impl Pipeline<Built> {
    pub fn model(&self) -> &AllocationModel {
        &self.state.model
    }

    /// Hand the LP to `backend` exactly once
    pub fn solve<B: LpBackend + ?Sized>(self, backend: &B) -> Result<Pipeline<Solved>, PipelineError> {
        let model = self.state.model;
        debug!("solving {} with {}", model.problem().name, backend.name());

        let solution = backend.solve(model.problem())?;
        if solution.status.is_optimal() && solution.values.len() != model.num_variables() {
            return Err(BackendError::Internal {
                name: backend.name().to_string(),
                message: format!(
                    "returned {} values for {} variables",
                    solution.values.len(),
                    model.num_variables()
                ),
            }
            .into());
        }

        info!("{} finished: {}", backend.name(), solution.status);
        Ok(Pipeline {
            state: Solved { model, solution },
        })
    }
}

impl Pipeline<Solved> {
    pub fn model(&self) -> &AllocationModel {
        &self.state.model
    }

    pub fn solution(&self) -> &Solution {
        &self.state.solution
    }

    pub fn report(&self) -> Report {
        interpret(&self.state.model, &self.state.solution)
    }
}

/// Run the whole pipeline and return the interpreted report
pub fn run<B: LpBackend + ?Sized>(
    data: ProductionData,
    builder: &ModelBuilder,
    backend: &B,
) -> Result<Report, PipelineError> {
    let solved = Pipeline::new(data).build(builder)?.solve(backend)?;
    Ok(solved.report())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Resource;
    use crate::interpret::Allocation;
    use crate::product::{Product, ProductMap};
    use allocate_solver::{LpProblem, SolutionStatus, Solver};
    use std::cell::Cell;

    const EPS: f64 = 1e-6;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn data(rows: &[(&str, f64, [f64; 3])]) -> ProductionData {
        ProductionData::new(
            rows.iter()
                .map(|(name, cap, p)| Resource::new(*name, *cap, ProductMap::new(p[0], p[1], p[2])))
                .collect(),
        )
        .unwrap()
    }

    fn solve(data: ProductionData) -> Pipeline<Solved> {
        Pipeline::new(data)
            .build(&ModelBuilder::new())
            .unwrap()
            .solve(&Solver::new())
            .unwrap()
    }

    /// Answers every problem with a fixed status
    struct FixedStatus {
        status: SolutionStatus,
        calls: Cell<usize>,
    }

    impl LpBackend for FixedStatus {
        fn name(&self) -> &str {
            "fixed"
        }

        fn solve(&self, _problem: &LpProblem) -> Result<Solution, BackendError> {
            self.calls.set(self.calls.get() + 1);
            Ok(Solution::without_values(self.status))
        }
    }

    struct Offline;

    impl LpBackend for Offline {
        fn name(&self) -> &str {
            "offline"
        }

        fn solve(&self, _problem: &LpProblem) -> Result<Solution, BackendError> {
            Err(BackendError::Unavailable("offline".to_string()))
        }
    }

    /// Claims optimality but returns too few values
    struct Truncating;

    impl LpBackend for Truncating {
        fn name(&self) -> &str {
            "truncating"
        }

        fn solve(&self, _problem: &LpProblem) -> Result<Solution, BackendError> {
            Ok(Solution::optimal(vec![1.0], 1.0, Default::default()))
        }
    }

    #[test]
    fn test_non_binding_capacity_fills_every_variable() {
        init();
        let solved = solve(data(&[("flour", 10.0, [5.0, 3.0, 1.0])]));
        let report = solved.report();

        assert_eq!(report.status, SolutionStatus::Optimal);
        assert_eq!(
            report.selected(),
            vec!["Product 1 for flour", "Product 2 for flour", "Product 3 for flour"]
        );
        for allocation in &report.allocations {
            assert!((allocation.value - 1.0).abs() < EPS, "{} = {}", allocation, allocation.value);
        }
        assert!((report.objective.unwrap() - 9.0).abs() < EPS);
        // Capacity is slack, so it has no value at the margin
        assert!(!report.sensitivity[0].binding);
    }

    #[test]
    fn test_zero_capacity_selects_nothing() {
        init();
        let solved = solve(data(&[("flour", 0.0, [5.0, 3.0, 1.0])]));
        let report = solved.report();

        assert_eq!(report.status, SolutionStatus::Optimal);
        assert!(report.allocations.is_empty());
        assert!(solved.solution().values.iter().all(|v| v.abs() < EPS));
        assert!(report.objective.unwrap().abs() < EPS);
    }

    #[test]
    fn test_negative_capacity_is_infeasible() {
        init();
        let solved = solve(data(&[
            ("flour", 10.0, [5.0, 3.0, 1.0]),
            ("sugar", -1.0, [1.0, 1.0, 1.0]),
        ]));
        let report = solved.report();

        assert_eq!(report.status, SolutionStatus::Infeasible);
        assert_ne!(report.status, SolutionStatus::Optimal);
        assert!(report.allocations.is_empty());
        assert_eq!(report.objective, None);
    }

    #[test]
    fn test_resources_are_independent() {
        init();
        let alone = solve(data(&[("flour", 1.0, [1.0, 2.0, 3.0])])).report();
        let paired = solve(data(&[
            ("flour", 1.0, [1.0, 2.0, 3.0]),
            ("sugar", 2.0, [-1.0, 4.0, 4.0]),
        ]))
        .report();
        let paired_other = solve(data(&[
            ("flour", 1.0, [1.0, 2.0, 3.0]),
            ("sugar", 0.5, [100.0, -50.0, 7.0]),
        ]))
        .report();

        let flour = |r: &Report| -> Vec<Allocation> { r.allocations_for("flour").cloned().collect() };
        assert_eq!(flour(&alone), flour(&paired));
        assert_eq!(flour(&alone), flour(&paired_other));
        assert_eq!(alone.selected(), vec!["Product 3 for flour"]);

        assert_eq!(
            paired.selected(),
            vec!["Product 3 for flour", "Product 2 for sugar", "Product 3 for sugar"]
        );
        assert!((paired.objective.unwrap() - 11.0).abs() < EPS);
    }

    #[test]
    fn test_fractional_allocation_is_reported() {
        let report = solve(data(&[("flour", 1.5, [5.0, 3.0, 1.0])])).report();

        assert_eq!(report.selected(), vec!["Product 1 for flour", "Product 2 for flour"]);
        assert!((report.allocations[0].value - 1.0).abs() < EPS);
        assert!((report.allocations[1].value - 0.5).abs() < EPS);
        assert!((report.objective.unwrap() - 6.5).abs() < EPS);

        // Binding capacity: one more unit would go to Product 2 at 3 per unit
        let flour = &report.sensitivity[0];
        assert!(flour.binding);
        assert!((flour.shadow_price - 3.0).abs() < EPS, "shadow price = {}", flour.shadow_price);

        // Moving capacity from Product 2 to Product 3 loses 2 per unit
        let third = &report.reduced_costs[2];
        assert_eq!(third.product, Product::Three);
        assert!(!third.is_basic);
        assert!((third.reduced_cost + 2.0).abs() < EPS, "reduced cost = {}", third.reduced_cost);
        assert!(report.reduced_costs[..2].iter().all(|rc| rc.reduced_cost == 0.0));
    }

    #[test]
    fn test_tight_zero_capacity_is_binding() {
        let report = solve(data(&[("flour", 0.0, [-1.0, -2.0, -3.0])])).report();

        assert_eq!(report.status, SolutionStatus::Optimal);
        assert!(report.allocations.is_empty());
        assert!(report.sensitivity[0].binding);
        assert_eq!(report.sensitivity[0].shadow_price, 0.0);
    }

    #[test]
    fn test_nan_tolerance_is_not_reported_optimal() {
        let report = run(
            data(&[("flour", 10.0, [5.0, 3.0, 1.0])]),
            &ModelBuilder::new(),
            &Solver::new().with_tolerance(f64::NAN),
        )
        .unwrap();

        assert_eq!(report.status, SolutionStatus::Undefined);
        assert!(report.allocations.is_empty());
        assert_eq!(report.objective, None);
    }

    #[test]
    fn test_solution_invariants() {
        init();
        let rows = [
            ("a", 0.0, [1.0, 2.0, 3.0]),
            ("b", 0.3, [4.0, -1.0, 4.5]),
            ("c", 1.0, [0.0, 0.0, 0.0]),
            ("d", 2.2, [-1.0, -2.0, 6.0]),
            ("e", 3.0, [2.0, 2.0, 2.0]),
            ("f", 1.75, [1.5, 2.5, 3.5]),
            ("g", 0.9, [-3.0, -2.0, -1.0]),
        ];
        let solved = solve(data(&rows));
        let solution = solved.solution();
        let model = solved.model();

        assert_eq!(solution.status, SolutionStatus::Optimal);

        for v in &solution.values {
            assert!((-EPS..=1.0 + EPS).contains(v), "value {} outside [0, 1]", v);
        }

        for (i, (name, capacity, _)) in rows.iter().enumerate() {
            let used: f64 = Product::ALL
                .iter()
                .map(|&p| solution.values[model.column(i, p).unwrap()])
                .sum();
            assert!(used <= capacity + EPS, "{} uses {} of {}", name, used, capacity);
        }

        let report = solved.report();
        assert!(report.allocations.iter().all(|a| a.value > 0.0));
        assert!(report.allocations_for("g").next().is_none());
        assert!(report.allocations_for("a").next().is_none());
    }

    #[test]
    fn test_rebuilding_gives_same_objective() {
        let rows = [("flour", 2.0, [3.0, 3.0, 3.0]), ("sugar", 1.0, [1.0, 1.0, 0.5])];
        let first = solve(data(&rows)).report();
        let second = solve(data(&rows)).report();

        assert_eq!(first.status, second.status);
        let (a, b) = (first.objective.unwrap(), second.objective.unwrap());
        assert!((a - b).abs() < EPS);
        assert!((a - 7.0).abs() < EPS, "objective = {}", a);
    }

    #[test]
    fn test_backend_called_once_and_status_propagated() {
        for status in [SolutionStatus::NotSolved, SolutionStatus::Undefined, SolutionStatus::Unbounded] {
            let backend = FixedStatus {
                status,
                calls: Cell::new(0),
            };
            let report = run(data(&[("flour", 1.0, [1.0, 1.0, 1.0])]), &ModelBuilder::new(), &backend).unwrap();

            assert_eq!(backend.calls.get(), 1);
            assert_eq!(report.status, status);
            assert!(report.allocations.is_empty());
        }
    }

    #[test]
    fn test_backend_failure_is_fatal() {
        let err = run(data(&[("flour", 1.0, [1.0, 1.0, 1.0])]), &ModelBuilder::new(), &Offline).unwrap_err();
        assert_eq!(err, PipelineError::Backend(BackendError::Unavailable("offline".to_string())));

        let err = run(data(&[("flour", 1.0, [1.0, 1.0, 1.0])]), &ModelBuilder::new(), &Truncating).unwrap_err();
        assert!(matches!(err, PipelineError::Backend(BackendError::Internal { .. })));
    }

    #[test]
    fn test_strict_build_stops_before_solving() {
        let backend = FixedStatus {
            status: SolutionStatus::Optimal,
            calls: Cell::new(0),
        };
        let err = run(
            data(&[("flour", -1.0, [1.0, 1.0, 1.0])]),
            &ModelBuilder::new().strict(true),
            &backend,
        )
        .unwrap_err();

        assert!(matches!(err, PipelineError::Build(BuildError::NegativeCapacity { .. })));
        assert_eq!(backend.calls.get(), 0);
    }

    #[test]
    fn test_iteration_limit_surfaces_as_not_solved() {
        let report = run(
            data(&[("flour", 10.0, [5.0, 3.0, 1.0])]),
            &ModelBuilder::new(),
            &Solver::new().with_max_iterations(0),
        )
        .unwrap();

        assert_eq!(report.status, SolutionStatus::NotSolved);
        assert!(report.allocations.is_empty());
    }
}
