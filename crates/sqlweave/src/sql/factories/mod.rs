//! Default SQL factories shared by every dialect.
//!
//! Each factory reads the dialect's syntax strategies through the registry,
//! so most products need no factory of their own. Product layers in
//! `drivers` replace or remove entries where a strategy value is not enough.

pub mod column;
pub mod constraint;
pub mod dml;
pub mod index;
pub mod sequence;
pub mod table;
pub mod view;

use crate::core::{DbObject, ObjectKind, SqlOperation, SqlType};
use crate::error::{Result, SqlWeaveError};

use super::registry::FactoryTable;

pub use column::{AddColumn, AlterColumn, DropColumn};
pub use constraint::{
    AddCheckConstraint, AddForeignKey, AddPrimaryKey, AddUniqueConstraint, DropConstraint,
};
pub use dml::{DeleteByPk, InsertRow, MergeByPk, SelectAll, UpdateByPk};
pub use index::{CreateIndex, DropIndex, IndexTypePosition};
pub use sequence::{AlterSequence, CreateSequence, DropSequence};
pub use table::{AlterTable, CreateTable, DropTable, LockTable, TruncateTable};
pub use view::{AlterView, CreateView, DropView};

/// Register the shared factories for every `(ObjectKind, SqlType)` pair.
pub fn register_defaults(table: &mut FactoryTable) {
    table
        .register(ObjectKind::Table, SqlType::Create, CreateTable)
        .register(ObjectKind::Table, SqlType::Drop, DropTable)
        .register(ObjectKind::Table, SqlType::Alter, AlterTable)
        .register(ObjectKind::Table, SqlType::Truncate, TruncateTable)
        .register(ObjectKind::Table, SqlType::Lock, LockTable)
        .register(ObjectKind::Table, SqlType::Insert, InsertRow)
        .register(ObjectKind::Table, SqlType::Update, UpdateByPk)
        .register(ObjectKind::Table, SqlType::Delete, DeleteByPk)
        .register(ObjectKind::Table, SqlType::MergeByPk, MergeByPk)
        .register(ObjectKind::Table, SqlType::SelectAll, SelectAll)
        .register(ObjectKind::Column, SqlType::Create, AddColumn)
        .register(ObjectKind::Column, SqlType::Drop, DropColumn)
        .register(ObjectKind::Column, SqlType::Alter, AlterColumn)
        .register(ObjectKind::PrimaryKey, SqlType::Create, AddPrimaryKey)
        .register(ObjectKind::PrimaryKey, SqlType::Drop, DropConstraint)
        .register(ObjectKind::UniqueConstraint, SqlType::Create, AddUniqueConstraint)
        .register(ObjectKind::UniqueConstraint, SqlType::Drop, DropConstraint)
        .register(ObjectKind::ForeignKey, SqlType::Create, AddForeignKey)
        .register(ObjectKind::ForeignKey, SqlType::Drop, DropConstraint)
        .register(ObjectKind::CheckConstraint, SqlType::Create, AddCheckConstraint)
        .register(ObjectKind::CheckConstraint, SqlType::Drop, DropConstraint)
        .register(ObjectKind::Index, SqlType::Create, CreateIndex::default())
        .register(ObjectKind::Index, SqlType::Drop, DropIndex)
        .register(ObjectKind::Sequence, SqlType::Create, CreateSequence)
        .register(ObjectKind::Sequence, SqlType::Drop, DropSequence)
        .register(ObjectKind::Sequence, SqlType::Alter, AlterSequence)
        .register(ObjectKind::View, SqlType::Create, CreateView)
        .register(ObjectKind::View, SqlType::Drop, DropView)
        .register(ObjectKind::View, SqlType::Alter, AlterView);
}

/// Error for a factory handed an object of the wrong kind.
pub(crate) fn wrong_object(object: &DbObject<'_>, expected: ObjectKind) -> SqlWeaveError {
    SqlWeaveError::Config(format!(
        "Factory for {:?} called with {:?} '{}'",
        expected,
        object.kind(),
        object.qualified_name()
    ))
}

/// A single-statement result.
pub(crate) fn single(sql: String, sql_type: SqlType, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
    Ok(vec![SqlOperation::new(sql, sql_type, object)])
}

/// Text as a quoted string literal.
pub(crate) fn string_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Dialect, Product};

    #[test]
    fn test_defaults_cover_every_object_kind() {
        let dialect = Dialect::new("d", "D", Product::Ansi);
        let registry = dialect.sql_factory_registry();
        for kind in [
            ObjectKind::Table,
            ObjectKind::Column,
            ObjectKind::PrimaryKey,
            ObjectKind::UniqueConstraint,
            ObjectKind::ForeignKey,
            ObjectKind::CheckConstraint,
            ObjectKind::Index,
            ObjectKind::Sequence,
            ObjectKind::View,
        ] {
            assert!(registry.contains(kind, SqlType::Create), "{:?} create", kind);
            assert!(registry.contains(kind, SqlType::Drop), "{:?} drop", kind);
        }
        assert_eq!(registry.len(), 29);
    }

    #[test]
    fn test_string_literal_doubles_quotes() {
        assert_eq!(string_literal("it's"), "'it''s'");
    }
}
