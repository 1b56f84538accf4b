//! SQL generation: builder, options, factory registry and default factories.

pub mod builder;
pub mod factories;
pub mod options;
pub mod registry;

pub use builder::SqlBuilder;
pub use options::{LockMode, SqlFactoryOptions, TableOptions};
pub use registry::{FactoryLayer, FactoryTable, SqlFactory, SqlFactoryRegistry};
