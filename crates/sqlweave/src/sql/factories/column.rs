//! Column factories: add, drop and in-place alter.

use tracing::warn;

use crate::core::{Column, DbObject, ObjectKind, SqlOperation, SqlType, Table};
use crate::diff::SchemaDifference;
use crate::dialect::{AlterColumnStyle, DefaultStyle};
use crate::error::{Result, SqlWeaveError};
use crate::sql::builder::SqlBuilder;
use crate::sql::registry::{SqlFactory, SqlFactoryRegistry};

use super::table::comment_on;
use super::{single, wrong_object};

fn column_of<'a>(object: &DbObject<'a>) -> Result<(&'a Table, &'a Column)> {
    match object {
        DbObject::Column(table, column) => Ok((*table, *column)),
        other => Err(wrong_object(other, ObjectKind::Column)),
    }
}

fn column_comment(registry: &SqlFactoryRegistry<'_>, table: &Table, column: &Column) -> Option<SqlOperation> {
    let b = registry.builder();
    let name = format!(
        "{}.{}",
        b.qualified_name(table.schema_name.as_deref(), &table.name),
        b.column_name(&column.name)
    );
    comment_on(
        registry,
        "COLUMN",
        &name,
        column.remarks.as_deref(),
        &DbObject::Column(table, column),
    )
}

/// `ALTER TABLE t ADD [COLUMN] <definition>`
#[derive(Debug, Clone, Copy, Default)]
pub struct AddColumn;

impl SqlFactory for AddColumn {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let (table, column) = column_of(object)?;
        let mut b = registry.builder();
        b.alter_table(table)
            .keyword(registry.dialect().syntax.add_column)
            .column_definition(table, column);
        let mut operations = vec![SqlOperation::new(b.into_sql(), SqlType::Create, object)];
        if column.remarks.is_some() {
            operations.extend(column_comment(registry, table, column));
        }
        Ok(operations)
    }
}

/// `ALTER TABLE t DROP COLUMN c`
#[derive(Debug, Clone, Copy, Default)]
pub struct DropColumn;

impl SqlFactory for DropColumn {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let (table, column) = column_of(object)?;
        let mut b = registry.builder();
        b.alter_table(table).drop().keyword("COLUMN").name(&column.name);
        single(b.into_sql(), SqlType::Drop, object)
    }
}

/// Changes a column in place, spelled per [`AlterColumnStyle`].
///
/// A changed formula cannot be altered in place anywhere; the column is
/// dropped and added again.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlterColumn;

impl AlterColumn {
    fn statement<'b>(registry: &'b SqlFactoryRegistry<'_>, table: &Table) -> SqlBuilder<'b> {
        let mut b = registry.builder();
        b.alter_table(table);
        b
    }

    /// `ALTER COLUMN c ...` statements for the standard styles.
    fn standard(
        registry: &SqlFactoryRegistry<'_>,
        diff: &SchemaDifference<'_>,
        table: &Table,
        column: &Column,
        type_keyword: &str,
    ) -> Vec<String> {
        let dialect = registry.dialect();
        let mut statements = Vec::new();
        let alter = || {
            let mut b = Self::statement(registry, table);
            b.keyword("ALTER COLUMN").name(&column.name);
            b
        };
        if diff.has_property("data_type") {
            let mut b = alter();
            b.keyword(type_keyword).keyword(&dialect.column_type_sql(column));
            statements.push(b.into_sql());
        }
        if diff.has_property("default_value") {
            let mut b = alter();
            match &column.default_value {
                Some(default) => b.keyword("SET DEFAULT").keyword(default),
                None => b.keyword("DROP DEFAULT"),
            };
            statements.push(b.into_sql());
        }
        if diff.has_property("not_null") {
            let mut b = alter();
            b.keyword(if column.not_null { "SET NOT NULL" } else { "DROP NOT NULL" });
            statements.push(b.into_sql());
        }
        statements
    }

    /// The type and nullability are restated together. Named defaults
    /// (`df_<table>_<column>`, as written by CREATE) are dropped and added
    /// again; inline defaults use `SET DEFAULT` and `DROP DEFAULT`.
    fn redefine(
        registry: &SqlFactoryRegistry<'_>,
        diff: &SchemaDifference<'_>,
        table: &Table,
        column: &Column,
    ) -> Vec<String> {
        let dialect = registry.dialect();
        let named = dialect.syntax.default == DefaultStyle::NamedConstraint;
        let default_changed = diff.has_property("default_value");
        let constraint = DefaultStyle::constraint_name(&table.name, &column.name);
        let mut statements = Vec::new();
        if default_changed && named {
            let had_default = diff
                .property("default_value")
                .map_or(false, |change| !change.old.is_null());
            if had_default {
                let mut b = Self::statement(registry, table);
                b.drop().keyword("CONSTRAINT").constraint_name(&constraint);
                statements.push(b.into_sql());
            }
        }
        if diff.has_property("data_type") || diff.has_property("not_null") {
            let mut b = Self::statement(registry, table);
            b.keyword("ALTER COLUMN")
                .name(&column.name)
                .keyword(&dialect.column_type_sql(column))
                .keyword(if column.not_null { "NOT NULL" } else { "NULL" });
            statements.push(b.into_sql());
        }
        if default_changed {
            let mut b = Self::statement(registry, table);
            match (&column.default_value, named) {
                (Some(default), true) => {
                    b.keyword("ADD CONSTRAINT")
                        .constraint_name(&constraint)
                        .keyword("DEFAULT")
                        .keyword(default)
                        .keyword("FOR")
                        .name(&column.name);
                }
                (None, true) => return statements,
                (Some(default), false) => {
                    b.keyword("ALTER COLUMN")
                        .name(&column.name)
                        .keyword("SET DEFAULT")
                        .keyword(default);
                }
                (None, false) => {
                    b.keyword("ALTER COLUMN").name(&column.name).keyword("DROP DEFAULT");
                }
            }
            statements.push(b.into_sql());
        }
        statements
    }

    /// MySQL: one `MODIFY COLUMN` restating the whole definition.
    fn modify_column(registry: &SqlFactoryRegistry<'_>, table: &Table, column: &Column) -> Vec<String> {
        let mut b = Self::statement(registry, table);
        b.keyword("MODIFY COLUMN").column_definition(table, column);
        vec![b.into_sql()]
    }

    /// Oracle: `MODIFY (c type [DEFAULT x] [NULL|NOT NULL])`; nullability is
    /// only restated when it changed.
    fn modify_paren(
        registry: &SqlFactoryRegistry<'_>,
        diff: &SchemaDifference<'_>,
        table: &Table,
        column: &Column,
    ) -> Vec<String> {
        let dialect = registry.dialect();
        let mut b = Self::statement(registry, table);
        b.keyword("MODIFY").lparen().name(&column.name);
        if diff.has_property("data_type") {
            b.keyword(&dialect.column_type_sql(column));
        }
        if diff.has_property("default_value") {
            b.keyword("DEFAULT")
                .keyword(column.default_value.as_deref().unwrap_or("NULL"));
        }
        if diff.has_property("not_null") {
            b.keyword(if column.not_null { "NOT NULL" } else { "NULL" });
        }
        b.rparen();
        vec![b.into_sql()]
    }
}

impl SqlFactory for AlterColumn {
    fn create_sql(&self, _registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        Err(SqlWeaveError::Config(format!(
            "ALTER of column {} needs a schema difference",
            object.qualified_name()
        )))
    }

    fn create_diff_sql(
        &self,
        registry: &SqlFactoryRegistry<'_>,
        diff: &SchemaDifference<'_>,
    ) -> Result<Vec<SqlOperation>> {
        let (Some(original), Some(target)) = (diff.original, diff.target) else {
            return Err(SqlWeaveError::Config(format!(
                "Column difference for {} lacks one of its columns",
                diff.name
            )));
        };
        let (table, column) = column_of(&target)?;

        if diff.has_property("formula") {
            let mut operations = registry.create_sql(SqlType::Drop, &original)?;
            operations.extend(registry.create_sql(SqlType::Create, &target)?);
            return Ok(operations);
        }
        if diff.has_property("identity") {
            warn!(
                "Identity change on {} cannot be altered in place, ignored",
                target.qualified_name()
            );
        }

        let style = registry.dialect().syntax.alter_column;
        let restates_on_update =
            style == AlterColumnStyle::ModifyColumn && registry.dialect().syntax.on_update_clause;
        if diff.has_property("on_update") && !restates_on_update {
            warn!(
                "ON UPDATE change on {} cannot be expressed by this dialect, ignored",
                target.qualified_name()
            );
        }
        let definition_changed = ["data_type", "not_null", "default_value"]
            .iter()
            .any(|p| diff.has_property(p))
            || (restates_on_update && diff.has_property("on_update"));
        let statements = if !definition_changed {
            Vec::new()
        } else {
            match style {
                AlterColumnStyle::AlterType => Self::standard(registry, diff, table, column, "TYPE"),
                AlterColumnStyle::SetDataType => {
                    Self::standard(registry, diff, table, column, "SET DATA TYPE")
                }
                AlterColumnStyle::Redefine => Self::redefine(registry, diff, table, column),
                AlterColumnStyle::ModifyColumn => Self::modify_column(registry, table, column),
                AlterColumnStyle::ModifyParen => Self::modify_paren(registry, diff, table, column),
            }
        };

        let mut operations: Vec<SqlOperation> = statements
            .into_iter()
            .map(|sql| SqlOperation::new(sql, SqlType::Alter, &target))
            .collect();
        if diff.has_property("remarks") {
            operations.extend(column_comment(registry, table, column));
        }
        Ok(operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, DefaultCase};
    use crate::diff::SchemaComparer;
    use crate::dialect::{Dialect, Product};

    fn dialect(style: AlterColumnStyle) -> Dialect {
        let mut dialect = Dialect::new("d", "D", Product::Ansi);
        dialect.syntax.default_case = DefaultCase::LowerCase;
        dialect.syntax.alter_column = style;
        dialect
    }

    fn pair() -> (Table, Table) {
        let original = Table::new("t").with_column(
            Column::new("c")
                .with_type(DataType::Varchar)
                .with_length(10)
                .with_default("'x'"),
        );
        let mut target = original.clone();
        target.columns[0].length = Some(20);
        target.columns[0].not_null = true;
        (original, target)
    }

    fn alter(style: AlterColumnStyle, original: &Table, target: &Table) -> Vec<String> {
        alter_with(&dialect(style), original, target)
    }

    fn alter_with(dialect: &Dialect, original: &Table, target: &Table) -> Vec<String> {
        let diff = SchemaComparer::new(dialect).compare_tables(original, target);
        let registry = dialect.sql_factory_registry();
        registry
            .diff_sql(&diff)
            .unwrap()
            .into_iter()
            .map(|op| op.sql)
            .collect()
    }

    #[test]
    fn test_add_and_drop_column() {
        let dialect = dialect(AlterColumnStyle::SetDataType);
        let registry = dialect.sql_factory_registry();
        let table = Table::new("t");
        let column = Column::new("c").with_type(DataType::Int).with_default("0").not_null();
        let object = DbObject::Column(&table, &column);
        assert_eq!(
            registry.create_sql(SqlType::Create, &object).unwrap()[0].sql,
            "ALTER TABLE t ADD COLUMN c INT DEFAULT 0 NOT NULL"
        );
        assert_eq!(
            registry.create_sql(SqlType::Drop, &object).unwrap()[0].sql,
            "ALTER TABLE t DROP COLUMN c"
        );
    }

    #[test]
    fn test_standard_styles() {
        let (original, target) = pair();
        assert_eq!(
            alter(AlterColumnStyle::SetDataType, &original, &target),
            vec![
                "ALTER TABLE t ALTER COLUMN c SET DATA TYPE VARCHAR(20)",
                "ALTER TABLE t ALTER COLUMN c SET NOT NULL",
            ]
        );
        assert_eq!(
            alter(AlterColumnStyle::AlterType, &original, &target)[0],
            "ALTER TABLE t ALTER COLUMN c TYPE VARCHAR(20)"
        );
    }

    #[test]
    fn test_redefine_style_handles_default_constraint() {
        let (original, mut target) = pair();
        target.columns[0].default_value = Some("'y'".into());
        let mut dialect = dialect(AlterColumnStyle::Redefine);
        dialect.syntax.default = DefaultStyle::NamedConstraint;
        assert_eq!(
            alter_with(&dialect, &original, &target),
            vec![
                "ALTER TABLE t DROP CONSTRAINT df_t_c",
                "ALTER TABLE t ALTER COLUMN c VARCHAR(20) NOT NULL",
                "ALTER TABLE t ADD CONSTRAINT df_t_c DEFAULT 'y' FOR c",
            ]
        );
    }

    #[test]
    fn test_redefine_style_with_inline_defaults() {
        let (original, mut target) = pair();
        target.columns[0].default_value = None;
        assert_eq!(
            alter(AlterColumnStyle::Redefine, &original, &target),
            vec![
                "ALTER TABLE t ALTER COLUMN c VARCHAR(20) NOT NULL",
                "ALTER TABLE t ALTER COLUMN c DROP DEFAULT",
            ]
        );
    }

    #[test]
    fn test_named_default_dropped_by_its_created_name() {
        let mut dialect = dialect(AlterColumnStyle::Redefine);
        dialect.syntax.default = DefaultStyle::NamedConstraint;
        let registry = dialect.sql_factory_registry();
        let original = Table::new("t").with_column(Column::new("a").with_type(DataType::Int).with_default("0"));
        let created = registry
            .create_sql(SqlType::Create, &DbObject::Table(&original))
            .unwrap();
        assert!(created[0].sql.contains("a INT CONSTRAINT df_t_a DEFAULT 0"), "{}", created[0].sql);

        let mut target = original.clone();
        target.columns[0].default_value = Some("1".into());
        assert_eq!(
            alter_with(&dialect, &original, &target),
            vec![
                "ALTER TABLE t DROP CONSTRAINT df_t_a",
                "ALTER TABLE t ADD CONSTRAINT df_t_a DEFAULT 1 FOR a",
            ]
        );
    }

    #[test]
    fn test_on_update_change_only_where_expressible() {
        let original = Table::new("t").with_column(Column::new("ts").with_type(DataType::Timestamp));
        let mut target = original.clone();
        target.columns[0].on_update = Some("CURRENT_TIMESTAMP".into());

        assert!(alter(AlterColumnStyle::SetDataType, &original, &target).is_empty());
        assert!(alter(AlterColumnStyle::Redefine, &original, &target).is_empty());
        assert!(alter(AlterColumnStyle::ModifyColumn, &original, &target).is_empty());

        let mut dialect = dialect(AlterColumnStyle::ModifyColumn);
        dialect.syntax.on_update_clause = true;
        assert_eq!(
            alter_with(&dialect, &original, &target),
            vec!["ALTER TABLE t MODIFY COLUMN ts TIMESTAMP ON UPDATE CURRENT_TIMESTAMP"]
        );
    }

    #[test]
    fn test_modify_styles() {
        let (original, target) = pair();
        assert_eq!(
            alter(AlterColumnStyle::ModifyColumn, &original, &target),
            vec!["ALTER TABLE t MODIFY COLUMN c VARCHAR(20) DEFAULT 'x' NOT NULL"]
        );
        assert_eq!(
            alter(AlterColumnStyle::ModifyParen, &original, &target),
            vec!["ALTER TABLE t MODIFY (c VARCHAR(20) NOT NULL)"]
        );
    }

    #[test]
    fn test_formula_change_recreates_column() {
        let original = Table::new("t").with_column(Column {
            formula: Some("a + b".into()),
            ..Column::new("c").with_type(DataType::Int)
        });
        let mut target = original.clone();
        target.columns[0].formula = Some("a * b".into());
        assert_eq!(
            alter(AlterColumnStyle::SetDataType, &original, &target),
            vec![
                "ALTER TABLE t DROP COLUMN c",
                "ALTER TABLE t ADD COLUMN c INT GENERATED ALWAYS AS (a * b)",
            ]
        );
    }
}
