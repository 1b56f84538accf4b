//! Core abstractions shared by every dialect.
//!
//! - [`schema`]: tables, columns, constraints, sequences and views
//! - [`datatype`]: the canonical type every vendor type maps onto
//! - [`operation`]: emitted statements and factory keys
//! - [`identifier`]: identifier validation and quoting
//! - [`value`]: values rendered into SQL literals

pub mod datatype;
pub mod identifier;
pub mod operation;
pub mod schema;
pub mod value;

pub use datatype::{DataType, TypeFamily};
pub use identifier::{validate_identifier, DefaultCase, QuotePair};
pub use operation::{DbObject, ObjectKind, SqlOperation, SqlType};
pub use schema::{
    CascadeRule, CheckConstraint, Column, Domain, ForeignKey, Index, PrimaryKey, Schema,
    Sequence, Table, UniqueConstraint, View,
};
pub use value::SqlValue;
