use std::collections::HashSet;

use thiserror::Error;

use crate::product::{Product, ProductMap};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("No resources supplied")]
    Empty,
    #[error("Column {column} has {found} values but there are {expected} resources")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("Duplicate resource: {0}")]
    DuplicateResource(String),
    #[error("Empty resource name at row {0}")]
    EmptyName(usize),
    #[error("Non-finite capacity for resource {0}")]
    NonFiniteCapacity(String),
    #[error("Non-finite profit for {product} on resource {resource}")]
    NonFiniteProfit { resource: String, product: Product },
}

/// A constrained input with a capacity limit and a profit per product
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub name: String,
    /// Maximum combined allocation across all products
    pub capacity: f64,
    pub profits: ProductMap<f64>,
}

impl Resource {
    pub fn new(name: impl Into<String>, capacity: f64, profits: ProductMap<f64>) -> Self {
        Self {
            name: name.into(),
            capacity,
            profits,
        }
    }
}

/// Validated snapshot of resources, in input order
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionData {
    resources: Vec<Resource>,
}

impl ProductionData {
    pub fn new(resources: Vec<Resource>) -> Result<Self, InputError> {
        if resources.is_empty() {
            return Err(InputError::Empty);
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(resources.len());
        for (row, resource) in resources.iter().enumerate() {
            if resource.name.trim().is_empty() {
                return Err(InputError::EmptyName(row + 1));
            }
            if !seen.insert(resource.name.as_str()) {
                return Err(InputError::DuplicateResource(resource.name.clone()));
            }
            if !resource.capacity.is_finite() {
                return Err(InputError::NonFiniteCapacity(resource.name.clone()));
            }
            if let Some((product, _)) = resource.profits.iter().find(|(_, v)| !v.is_finite()) {
                return Err(InputError::NonFiniteProfit {
                    resource: resource.name.clone(),
                    product,
                });
            }
        }

        Ok(Self { resources })
    }

    /// Assemble from positionally aligned columns
    pub fn from_columns(
        names: Vec<String>,
        capacities: Vec<f64>,
        product_1: Vec<f64>,
        product_2: Vec<f64>,
        product_3: Vec<f64>,
    ) -> Result<Self, InputError> {
        let expected = names.len();
        let columns = [
            ("Resource Limit", capacities.len()),
            (Product::One.label(), product_1.len()),
            (Product::Two.label(), product_2.len()),
            (Product::Three.label(), product_3.len()),
        ];
        for (column, found) in columns {
            if found != expected {
                return Err(InputError::LengthMismatch {
                    column: column.to_string(),
                    expected,
                    found,
                });
            }
        }

        let resources = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                Resource::new(
                    name,
                    capacities[i],
                    ProductMap::new(product_1[i], product_2[i], product_3[i]),
                )
            })
            .collect();

        Self::new(resources)
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resources whose capacity makes every allocation infeasible
    pub fn negative_capacities(&self) -> Vec<&Resource> {
        self.resources.iter().filter(|r| r.capacity < 0.0).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_columns() {
        let data = ProductionData::from_columns(
            names(&["flour", "sugar"]),
            vec![10.0, 4.0],
            vec![5.0, 1.0],
            vec![3.0, 2.0],
            vec![1.0, 3.0],
        )
        .unwrap();

        assert_eq!(data.len(), 2);
        let sugar = &data.resources()[1];
        assert_eq!(sugar.name, "sugar");
        assert_eq!(sugar.capacity, 4.0);
        assert_eq!(sugar.profits[Product::Three], 3.0);
    }

    #[test]
    fn test_mismatched_columns() {
        let err = ProductionData::from_columns(
            names(&["flour", "sugar"]),
            vec![10.0, 4.0],
            vec![5.0, 1.0],
            vec![3.0],
            vec![1.0, 3.0],
        )
        .unwrap_err();

        assert_eq!(
            err,
            InputError::LengthMismatch {
                column: "Product 2".to_string(),
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = ProductionData::from_columns(vec![], vec![], vec![], vec![], vec![]).unwrap_err();
        assert_eq!(err, InputError::Empty);
    }

    #[test]
    fn test_duplicate_resource_rejected() {
        let err = ProductionData::from_columns(
            names(&["flour", "flour"]),
            vec![1.0, 1.0],
            vec![1.0, 1.0],
            vec![1.0, 1.0],
            vec![1.0, 1.0],
        )
        .unwrap_err();
        assert_eq!(err, InputError::DuplicateResource("flour".to_string()));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let err = ProductionData::new(vec![Resource::new(
            "flour",
            f64::NAN,
            ProductMap::new(1.0, 1.0, 1.0),
        )])
        .unwrap_err();
        assert_eq!(err, InputError::NonFiniteCapacity("flour".to_string()));

        let err = ProductionData::new(vec![Resource::new(
            "flour",
            1.0,
            ProductMap::new(1.0, f64::INFINITY, 1.0),
        )])
        .unwrap_err();
        assert_eq!(
            err,
            InputError::NonFiniteProfit {
                resource: "flour".to_string(),
                product: Product::Two
            }
        );
    }

    #[test]
    fn test_negative_capacities_flagged() {
        let data = ProductionData::from_columns(
            names(&["flour", "sugar"]),
            vec![-1.0, 4.0],
            vec![1.0, 1.0],
            vec![1.0, 1.0],
            vec![1.0, 1.0],
        )
        .unwrap();

        let flagged: Vec<&str> = data.negative_capacities().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(flagged, vec!["flour"]);
    }
}
