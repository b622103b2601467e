use allocate_solver::{Bounds, ConstraintOp, LpProblem, Sense};
use log::{debug, warn};
use thiserror::Error;

use crate::data::ProductionData;
use crate::product::Product;

pub const PROBLEM_NAME: &str = "Production_Optimization";

/// Domain of every allocation variable. Continuous, not a 0/1 selection.
pub const VARIABLE_BOUNDS: Bounds = Bounds {
    lower: 0.0,
    upper: 1.0,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Negative capacity {capacity} for resource {resource}")]
    NegativeCapacity { resource: String, capacity: f64 },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Reject negative capacities instead of passing them to the solver
    pub strict: bool,
}

/// Identifies the decision variable for one (resource, product) pair
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableKey {
    /// Position of the resource in the input
    pub resource: usize,
    pub product: Product,
}

/// LP instance for a production snapshot, plus the mapping from LP columns
/// back to (resource, product) pairs
#[derive(Debug, Clone)]
pub struct AllocationModel {
    problem: LpProblem,
    resources: Vec<String>,
    keys: Vec<VariableKey>,
}

impl AllocationModel {
    pub fn problem(&self) -> &LpProblem {
        &self.problem
    }

    /// Resource names in input order
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    pub fn resource_name(&self, index: usize) -> Option<&str> {
        self.resources.get(index).map(String::as_str)
    }

    pub fn num_variables(&self) -> usize {
        self.keys.len()
    }

    /// LP column of the variable for `product` on resource `resource`
    pub fn column(&self, resource: usize, product: Product) -> Option<usize> {
        (resource < self.resources.len()).then(|| column_index(resource, product))
    }

    /// Column lookup by resource name
    pub fn column_by_name(&self, resource: &str, product: Product) -> Option<usize> {
        let index = self.resources.iter().position(|r| r == resource)?;
        self.column(index, product)
    }

    pub fn key(&self, column: usize) -> Option<VariableKey> {
        self.keys.get(column).copied()
    }

    /// All variables in column order: resources in input order, products 1..3
    pub fn variables(&self) -> impl Iterator<Item = (usize, VariableKey)> + '_ {
        self.keys.iter().copied().enumerate()
    }
}

fn column_index(resource: usize, product: Product) -> usize {
    resource * Product::ALL.len() + product.index()
}

pub fn variable_name(product: Product, resource: &str) -> String {
    format!("x{}[{}]", product.number(), resource)
}

/// Builds the allocation LP from production data
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    options: BuildOptions,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    pub fn build(&self, data: &ProductionData) -> Result<AllocationModel, BuildError> {
        for resource in data.negative_capacities() {
            if self.options.strict {
                return Err(BuildError::NegativeCapacity {
                    resource: resource.name.clone(),
                    capacity: resource.capacity,
                });
            }
            warn!(
                "resource {} has negative capacity {}; the model cannot be feasible",
                resource.name, resource.capacity
            );
        }

        let resources = data.resources();
        let n = resources.len() * Product::ALL.len();

        let mut names = Vec::with_capacity(n);
        let mut keys = Vec::with_capacity(n);
        for (i, resource) in resources.iter().enumerate() {
            for product in Product::ALL {
                names.push(variable_name(product, &resource.name));
                keys.push(VariableKey { resource: i, product });
            }
        }

        let mut problem = LpProblem::new(PROBLEM_NAME, names);
        for j in 0..n {
            problem.set_bounds(j, VARIABLE_BOUNDS);
        }

        // Total profit
        let objective = keys
            .iter()
            .map(|k| resources[k.resource].profits[k.product])
            .collect();
        problem.set_objective(objective, Sense::Maximize);

        // One capacity row per resource over its three variables
        for (i, resource) in resources.iter().enumerate() {
            let mut coefficients = vec![0.0; n];
            for product in Product::ALL {
                coefficients[column_index(i, product)] = 1.0;
            }
            problem.add_constraint(resource.name.clone(), coefficients, ConstraintOp::Le, resource.capacity);
        }

        debug!(
            "built {} with {} variables and {} capacity constraints",
            PROBLEM_NAME,
            problem.num_variables(),
            problem.num_constraints()
        );

        Ok(AllocationModel {
            problem,
            resources: resources.iter().map(|r| r.name.clone()).collect(),
            keys,
        })
    }
}
