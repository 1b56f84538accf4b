//! Table-level DDL factories: create, drop, alter, truncate and lock.

use std::collections::HashSet;

use crate::core::{DbObject, ObjectKind, SqlOperation, SqlType, Table};
use crate::diff::{referenced_columns, DiffState, SchemaDifference};
use crate::dialect::LockStyle;
use crate::error::{Result, SqlWeaveError};
use crate::sql::options::LockMode;
use crate::sql::registry::{SqlFactory, SqlFactoryRegistry};

use super::constraint::{check_clause, enabled, foreign_key_clause, primary_key_clause, unique_clause};
use super::{single, string_literal, wrong_object};

/// `COMMENT ON <target> <name> IS '...'`, when the dialect has the statement.
pub(crate) fn comment_on(
    registry: &SqlFactoryRegistry<'_>,
    target: &str,
    name: &str,
    remarks: Option<&str>,
    object: &DbObject<'_>,
) -> Option<SqlOperation> {
    if !registry.dialect().features.supports_comment_statement {
        return None;
    }
    let text = remarks.map_or_else(|| "NULL".to_string(), string_literal);
    let mut b = registry.builder();
    b.keyword("COMMENT ON").keyword(target).keyword(name).keyword("IS").keyword(&text);
    Some(SqlOperation::new(b.into_sql(), SqlType::Alter, object))
}

fn table_of<'a>(object: &DbObject<'a>) -> Result<&'a Table> {
    match object {
        DbObject::Table(table) => Ok(*table),
        other => Err(wrong_object(other, ObjectKind::Table)),
    }
}

/// Multi-line `CREATE TABLE` with inline primary key, unique and check
/// constraints, followed by the table's indexes, foreign keys and comments.
///
/// Foreign keys are emitted as separate statements so that tables of one
/// schema can be created in any order, unless the dialect cannot add
/// constraints to an existing table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateTable;

impl SqlFactory for CreateTable {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let table = table_of(object)?;
        let dialect = registry.dialect();
        let inline_fks = !dialect.features.supports_alter_add_constraint
            && enabled(registry, ObjectKind::ForeignKey);

        let mut b = registry.builder();
        b.create().keyword("TABLE").table_name(table).line_break().append("(").indent();
        for (i, column) in table.columns.iter().enumerate() {
            b.separator(i == 0, ",").line_break().column_definition(table, column);
        }
        if let Some(pk) = table.primary_key.as_ref().filter(|pk| !pk.columns.is_empty()) {
            b.comma().line_break();
            primary_key_clause(&mut b, pk);
        }
        if enabled(registry, ObjectKind::UniqueConstraint) {
            for unique in &table.unique_constraints {
                b.comma().line_break();
                unique_clause(&mut b, unique);
            }
        }
        if enabled(registry, ObjectKind::CheckConstraint) {
            for check in &table.check_constraints {
                b.comma().line_break();
                check_clause(&mut b, check);
            }
        }
        if inline_fks {
            for fk in &table.foreign_keys {
                b.comma().line_break();
                foreign_key_clause(&mut b, fk);
            }
        }
        b.unindent().line_break().append(")");

        let mut operations = vec![SqlOperation::new(b.into_sql(), SqlType::Create, object)];
        for index in &table.indexes {
            operations.extend(registry.create_sql(SqlType::Create, &DbObject::Index(table, index))?);
        }
        if !inline_fks && enabled(registry, ObjectKind::ForeignKey) {
            for fk in &table.foreign_keys {
                operations.extend(registry.create_sql(SqlType::Create, &DbObject::ForeignKey(table, fk))?);
            }
        }
        operations.extend(table_comments(registry, table, object));
        Ok(operations)
    }
}

fn table_comments(registry: &SqlFactoryRegistry<'_>, table: &Table, object: &DbObject<'_>) -> Vec<SqlOperation> {
    let b = registry.builder();
    let table_name = b.qualified_name(table.schema_name.as_deref(), &table.name);
    let mut operations = Vec::new();
    if let Some(remarks) = table.remarks.as_deref() {
        operations.extend(comment_on(registry, "TABLE", &table_name, Some(remarks), object));
    }
    for column in table.columns.iter().filter(|c| c.remarks.is_some()) {
        let name = format!("{}.{}", table_name, b.column_name(&column.name));
        operations.extend(comment_on(
            registry,
            "COLUMN",
            &name,
            column.remarks.as_deref(),
            &DbObject::Column(table, column),
        ));
    }
    operations
}

/// `DROP TABLE [IF EXISTS] t`
#[derive(Debug, Clone, Copy, Default)]
pub struct DropTable;

impl SqlFactory for DropTable {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let table = table_of(object)?;
        let mut b = registry.builder();
        b.drop().keyword("TABLE").if_exists().table_name(table);
        single(b.into_sql(), SqlType::Drop, object)
    }
}

/// `TRUNCATE TABLE t`
#[derive(Debug, Clone, Copy, Default)]
pub struct TruncateTable;

impl SqlFactory for TruncateTable {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let table = table_of(object)?;
        let mut b = registry.builder();
        b.keyword("TRUNCATE TABLE").table_name(table);
        single(b.into_sql(), SqlType::Truncate, object)
    }
}

/// Table lock, spelled per [`LockStyle`] in the configured [`LockMode`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LockTable;

impl SqlFactory for LockTable {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let table = table_of(object)?;
        let mode = registry.options().table.lock_mode;
        let write = mode == LockMode::Exclusive;
        let mut b = registry.builder();
        match registry.dialect().syntax.lock {
            LockStyle::InMode => {
                b.keyword("LOCK TABLE")
                    .table_name(table)
                    .keyword("IN")
                    .keyword(mode.keyword())
                    .keyword("MODE");
            }
            LockStyle::LockTables => {
                b.keyword("LOCK TABLES")
                    .table_name(table)
                    .keyword(if write { "WRITE" } else { "READ" });
            }
            LockStyle::LockTableWrite => {
                b.keyword("LOCK TABLE")
                    .table_name(table)
                    .keyword(if write { "WRITE" } else { "READ" });
            }
            LockStyle::TableLockHint => {
                b.select()
                    .keyword("COUNT(*)")
                    .from()
                    .table_name(table)
                    .keyword(if write { "WITH (TABLOCKX)" } else { "WITH (TABLOCK)" });
            }
            LockStyle::Unsupported => {
                return Err(SqlWeaveError::unregistered(
                    ObjectKind::Table,
                    SqlType::Lock,
                    registry.dialect().id(),
                ));
            }
        }
        single(b.into_sql(), SqlType::Lock, object)
    }
}

/// Turns one table into another.
///
/// Statements come in dependency order: constraints and indexes that are
/// removed, changed or read a changed column are dropped first, then columns
/// are dropped, altered and added, and finally the target's constraints that
/// were dropped or are new are created (foreign keys last).
#[derive(Debug, Clone, Copy, Default)]
pub struct AlterTable;

impl SqlFactory for AlterTable {
    fn create_sql(&self, _registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        Err(SqlWeaveError::Config(format!(
            "ALTER of table {} needs a schema difference",
            object.qualified_name()
        )))
    }

    fn create_diff_sql(
        &self,
        registry: &SqlFactoryRegistry<'_>,
        diff: &SchemaDifference<'_>,
    ) -> Result<Vec<SqlOperation>> {
        let (Some(DbObject::Table(original)), Some(DbObject::Table(target))) = (diff.original, diff.target)
        else {
            return Err(SqlWeaveError::Config(format!(
                "Table difference for {} lacks one of its tables",
                diff.name
            )));
        };

        let changed_columns: HashSet<String> = diff
            .children_of(ObjectKind::Column)
            .filter(|c| c.state != DiffState::Added)
            .map(|c| c.name.to_ascii_lowercase())
            .collect();
        let child_changed = |object: &DbObject<'_>| -> bool {
            let child = match object.kind() {
                ObjectKind::PrimaryKey => diff.children_of(ObjectKind::PrimaryKey).next(),
                kind => diff.child(kind, object.name()),
            };
            child.map_or(false, |c| c.state != DiffState::Added)
        };
        let reads_changed_column = |object: &DbObject<'_>| -> bool {
            referenced_columns(object)
                .iter()
                .any(|c| changed_columns.contains(&c.to_ascii_lowercase()))
        };

        let mut operations = Vec::new();

        // Drops, most dependent first.
        let originals = original
            .foreign_keys
            .iter()
            .map(|fk| DbObject::ForeignKey(original, fk))
            .chain(original.check_constraints.iter().map(|c| DbObject::CheckConstraint(original, c)))
            .chain(original.unique_constraints.iter().map(|u| DbObject::UniqueConstraint(original, u)))
            .chain(original.indexes.iter().map(|i| DbObject::Index(original, i)))
            .chain(original.primary_key.iter().map(|pk| DbObject::PrimaryKey(original, pk)));
        let mut dropped: HashSet<(ObjectKind, String)> = HashSet::new();
        for object in originals {
            if child_changed(&object) || reads_changed_column(&object) {
                operations.extend(registry.create_sql(SqlType::Drop, &object)?);
                dropped.insert((object.kind(), object.name().to_ascii_lowercase()));
            }
        }

        // Columns: removed, modified, added.
        for state in [DiffState::Removed, DiffState::Modified, DiffState::Added] {
            for child in diff.children_of(ObjectKind::Column).filter(|c| c.state == state) {
                operations.extend(registry.diff_sql(child)?);
            }
        }

        // Creates, foreign keys last.
        let was_dropped_or_added = |object: &DbObject<'_>| -> bool {
            if dropped.contains(&(object.kind(), object.name().to_ascii_lowercase())) {
                return true;
            }
            let child = match object.kind() {
                ObjectKind::PrimaryKey => diff.children_of(ObjectKind::PrimaryKey).next(),
                kind => diff.child(kind, object.name()),
            };
            child.map_or(false, |c| c.state != DiffState::Removed)
        };
        let targets = target
            .primary_key
            .iter()
            .map(|pk| DbObject::PrimaryKey(target, pk))
            .chain(target.unique_constraints.iter().map(|u| DbObject::UniqueConstraint(target, u)))
            .chain(target.check_constraints.iter().map(|c| DbObject::CheckConstraint(target, c)))
            .chain(target.indexes.iter().map(|i| DbObject::Index(target, i)))
            .chain(target.foreign_keys.iter().map(|fk| DbObject::ForeignKey(target, fk)));
        for object in targets {
            if was_dropped_or_added(&object) {
                operations.extend(registry.create_sql(SqlType::Create, &object)?);
            }
        }

        if diff.has_property("remarks") {
            let table_name = registry
                .builder()
                .qualified_name(target.schema_name.as_deref(), &target.name);
            operations.extend(comment_on(
                registry,
                "TABLE",
                &table_name,
                target.remarks.as_deref(),
                &DbObject::Table(target),
            ));
        }
        Ok(operations)
    }
}
