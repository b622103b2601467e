use std::fmt;

use allocate_solver::{Solution, SolutionStatus};

use crate::builder::AllocationModel;
use crate::product::Product;

/// A product that received a non-zero share of a resource
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub product: Product,
    pub resource: String,
    /// Resolved variable value, in (0, 1]
    pub value: f64,
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} for {}", self.product, self.resource)
    }
}

/// Dual information for one capacity constraint
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSensitivity {
    pub resource: String,
    /// Profit gained per extra unit of capacity
    pub shadow_price: f64,
    /// Capacity fully used at the optimum
    pub binding: bool,
}

/// Marginal value of one (resource, product) variable
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedProfit {
    pub product: Product,
    pub resource: String,
    pub value: f64,
    /// Profit change per unit increase; zero for basic variables
    pub reduced_cost: f64,
    pub is_basic: bool,
}

impl fmt::Display for ReducedProfit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} for {}", self.product, self.resource)
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub status: SolutionStatus,
    /// Total profit, only for an optimal solve
    pub objective: Option<f64>,
    /// Non-zero allocations in input resource order, then product order
    pub allocations: Vec<Allocation>,
    pub sensitivity: Vec<ResourceSensitivity>,
    /// One entry per variable, in the same order as allocations are considered
    pub reduced_costs: Vec<ReducedProfit>,
}

impl Report {
    /// A report carrying only a status
    pub fn status_only(status: SolutionStatus) -> Self {
        Self {
            status,
            objective: None,
            allocations: Vec::new(),
            sensitivity: Vec::new(),
            reduced_costs: Vec::new(),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }

    /// "Product N for resource" descriptions of every allocation
    pub fn selected(&self) -> Vec<String> {
        self.allocations.iter().map(|a| a.to_string()).collect()
    }

    pub fn allocations_for<'a>(&'a self, resource: &'a str) -> impl Iterator<Item = &'a Allocation> {
        self.allocations.iter().filter(move |a| a.resource == resource)
    }
}

/// Map solved variable values back onto (product, resource) pairs
pub fn interpret(model: &AllocationModel, solution: &Solution) -> Report {
    if !solution.status.is_optimal() {
        return Report::status_only(solution.status);
    }

    let mut allocations = Vec::new();
    let mut reduced_costs = Vec::new();
    for (column, key) in model.variables() {
        let (Some(value), Some(resource)) = (solution.value(column), model.resource_name(key.resource))
        else {
            continue;
        };
        if value > 0.0 {
            allocations.push(Allocation {
                product: key.product,
                resource: resource.to_string(),
                value,
            });
        }
        if let Some(rc) = solution.analysis.reduced_costs.get(column) {
            reduced_costs.push(ReducedProfit {
                product: key.product,
                resource: resource.to_string(),
                value,
                reduced_cost: rc.reduced_cost,
                is_basic: rc.is_basic,
            });
        }
    }

    // Capacity rows are added in resource order
    let sensitivity = model
        .resources()
        .iter()
        .zip(&solution.analysis.shadow_prices)
        .map(|(resource, sp)| ResourceSensitivity {
            resource: resource.clone(),
            shadow_price: sp.value,
            binding: solution.analysis.binding_constraints.contains(&sp.constraint),
        })
        .collect();

    Report {
        status: solution.status,
        objective: solution.objective_value,
        allocations,
        sensitivity,
        reduced_costs,
    }
}
