use std::fmt;
use std::ops::{Index, IndexMut};

/// The fixed set of products competing for every resource
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Product {
    One,
    Two,
    Three,
}

impl Product {
    /// All products, in reporting order
    pub const ALL: [Product; 3] = [Product::One, Product::Two, Product::Three];

    pub fn index(self) -> usize {
        match self {
            Product::One => 0,
            Product::Two => 1,
            Product::Three => 2,
        }
    }

    /// 1-based number used in labels and variable names
    pub fn number(self) -> usize {
        self.index() + 1
    }

    /// Column header used by tabular input
    pub fn label(self) -> &'static str {
        match self {
            Product::One => "Product 1",
            Product::Two => "Product 2",
            Product::Three => "Product 3",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A value for each product
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProductMap<T>([T; 3]);

impl<T> ProductMap<T> {
    pub fn new(one: T, two: T, three: T) -> Self {
        Self([one, two, three])
    }

    pub fn from_fn(mut f: impl FnMut(Product) -> T) -> Self {
        Self(Product::ALL.map(&mut f))
    }

    /// Pairs in product order
    pub fn iter(&self) -> impl Iterator<Item = (Product, &T)> {
        Product::ALL.into_iter().zip(self.0.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T> Index<Product> for ProductMap<T> {
    type Output = T;

    fn index(&self, product: Product) -> &T {
        &self.0[product.index()]
    }
}

impl<T> IndexMut<Product> for ProductMap<T> {
    fn index_mut(&mut self, product: Product) -> &mut T {
        &mut self.0[product.index()]
    }
}
