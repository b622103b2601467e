pub mod backend;
pub mod builder;
pub mod data;
pub mod interpret;
pub mod pipeline;
pub mod product;
pub mod table;

pub use backend::{BackendError, LpBackend};
pub use builder::{AllocationModel, BuildError, BuildOptions, ModelBuilder, VariableKey};
pub use data::{InputError, ProductionData, Resource};
pub use interpret::{Allocation, ReducedProfit, Report, ResourceSensitivity, interpret};
pub use pipeline::{Built, Pipeline, PipelineError, Solved, Unbuilt, run};
pub use product::{Product, ProductMap};
pub use table::{Table, TableError, read_production_data};
