//! # sqlweave
//!
//! One schema model and one SQL generator for many database products.
//!
//! This library provides:
//!
//! - **Versioned dialects** resolved from a product name and server version
//! - **Type coercion** of vendor types against per-dialect catalogs, widening
//!   to a surrogate type when a size exceeds the declared bounds
//! - **SQL factories** for DDL and DML, overridable per dialect version
//! - **Diff-based ALTER generation** between two schema snapshots
//! - **Script splitting** that honours comments, literals and delimiter changes
//! - **Versioned script apply** with per-version concurrency checks
//!
//! ## Example
//!
//! ```rust,no_run
//! use sqlweave::version::VersionScript;
//! use sqlweave::{DialectResolver, InMemoryConnection, InMemoryScriptSource};
//! use sqlweave::{Direction, VersionApplier, VersionLedger, VersioningConfig};
//!
//! #[tokio::main]
//! async fn main() -> sqlweave::Result<()> {
//!     let resolver = DialectResolver::with_builtins()?;
//!     let dialect = resolver.resolve("PostgreSQL", 16, 2, None);
//!
//!     let ledger = VersionLedger::new(dialect, &VersioningConfig::default());
//!     let source = InMemoryScriptSource::new().with_script(
//!         VersionScript::new(1, "create_item", "CREATE TABLE item (id INT);")
//!             .with_down("DROP TABLE item;"),
//!     );
//!     let mut conn = InMemoryConnection::new();
//!
//!     let applier = VersionApplier::new(dialect, &ledger);
//!     let report = applier.apply(&mut conn, &source, Direction::Up).await?;
//!     println!("Applied versions {:?}", report.into_result()?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod dialect;
pub mod diff;
pub mod drivers;
pub mod error;
pub mod splitter;
pub mod sql;
pub mod version;

// Re-exports for convenient access
pub use config::{Config, TargetConfig, VersioningConfig};
pub use core::{Column, DataType, DbObject, ObjectKind, Schema, SqlOperation, SqlType, SqlValue, Table};
pub use dialect::{Dialect, DialectResolver, DialectVersion, Product, ProductLattice};
pub use diff::{SchemaComparer, SchemaDifference};
pub use error::{Result, SqlWeaveError};
pub use splitter::{SplitResult, SqlSplitter};
pub use sql::{SqlFactoryOptions, SqlFactoryRegistry};
pub use version::{
    Connection, Direction, InMemoryConnection, InMemoryScriptSource, VersionApplier,
    VersionLedger, VersionReport,
};
