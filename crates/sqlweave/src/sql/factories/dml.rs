//! Row-level statement factories with named parameters (`:column`).
//!
//! Timestamp and optimistic lock columns follow the options bag: created-at
//! and updated-at columns take the dialect's current timestamp, lock columns
//! are incremented on update and checked in the WHERE clause.

use crate::core::{Column, DbObject, ObjectKind, SqlOperation, SqlType, Table};
use crate::dialect::MergeStyle;
use crate::error::{Result, SqlWeaveError};
use crate::sql::builder::SqlBuilder;
use crate::sql::registry::{SqlFactory, SqlFactoryRegistry};

use super::{single, wrong_object};

const SOURCE_ALIAS: &str = "_source";

fn table_of<'a>(object: &DbObject<'a>) -> Result<&'a Table> {
    match object {
        DbObject::Table(table) => Ok(*table),
        other => Err(wrong_object(other, ObjectKind::Table)),
    }
}

fn key_columns(table: &Table) -> Result<&[String]> {
    table.key_columns().ok_or_else(|| {
        SqlWeaveError::Config(format!(
            "Table {} has no primary key or unique constraint",
            table.full_name()
        ))
    })
}

/// Columns a row insert supplies: everything but identity and computed columns.
fn insert_columns(table: &Table) -> Vec<&Column> {
    table
        .columns
        .iter()
        .filter(|c| !c.identity && c.formula.is_none())
        .collect()
}

/// Columns an update by key rewrites.
fn update_columns<'t>(registry: &SqlFactoryRegistry<'_>, table: &'t Table) -> Vec<&'t Column> {
    let options = &registry.options().table;
    insert_columns(table)
        .into_iter()
        .filter(|c| !table.is_key_column(&c.name) && !options.is_created_at(c))
        .collect()
}

fn lock_columns<'t>(registry: &SqlFactoryRegistry<'_>, table: &'t Table) -> Vec<&'t Column> {
    let options = &registry.options().table;
    table
        .columns
        .iter()
        .filter(|c| options.is_optimistic_lock(c))
        .collect()
}

/// Value expression of a column in an insert, given its bound value.
fn insert_value(registry: &SqlFactoryRegistry<'_>, column: &Column, value: &str) -> String {
    let options = &registry.options().table;
    if options.is_created_at(column) || options.is_updated_at(column) {
        return registry.dialect().syntax.current_timestamp.clone();
    }
    match &column.default_value {
        Some(default) if options.with_coalesce_at_insert => format!("COALESCE({}, {})", value, default),
        _ => value.to_string(),
    }
}

/// Value expression of a column in an update, given its bound value and the
/// expression for its current value.
fn update_value(registry: &SqlFactoryRegistry<'_>, column: &Column, value: &str, current: &str) -> String {
    let options = &registry.options().table;
    if options.is_updated_at(column) {
        registry.dialect().syntax.current_timestamp.clone()
    } else if options.is_optimistic_lock(column) {
        format!("{} + 1", current)
    } else if options.with_coalesce_at_update {
        format!("COALESCE({}, {})", value, current)
    } else {
        value.to_string()
    }
}

fn set_clause(b: &mut SqlBuilder<'_>, registry: &SqlFactoryRegistry<'_>, columns: &[&Column]) {
    b.set();
    for (i, column) in columns.iter().enumerate() {
        let current = b.column_name(&column.name);
        let value = update_value(registry, column, &format!(":{}", column.name), &current);
        b.separator(i == 0, ",").name(&column.name).keyword("=").keyword(&value);
    }
}

fn key_predicate(b: &mut SqlBuilder<'_>, keys: &[&str]) {
    for (i, key) in keys.iter().enumerate() {
        b.separator(i == 0, "AND").name(key).keyword("=").parameter(key);
    }
}

/// `UPDATE t SET .. WHERE keys [AND lock = :lock]`
fn update_statement(registry: &SqlFactoryRegistry<'_>, table: &Table) -> Result<String> {
    let keys = key_columns(table)?;
    let columns = update_columns(registry, table);
    if columns.is_empty() {
        return Err(SqlWeaveError::Config(format!(
            "Table {} has no updatable column",
            table.full_name()
        )));
    }
    let mut predicate: Vec<&str> = keys.iter().map(String::as_str).collect();
    predicate.extend(lock_columns(registry, table).iter().map(|c| c.name.as_str()));

    let mut b = registry.builder();
    b.update(table);
    set_clause(&mut b, registry, &columns);
    b.where_();
    key_predicate(&mut b, &predicate);
    Ok(b.into_sql())
}

/// `INSERT INTO t (..) VALUES (..)`, with `dml_batch_size` rows whose
/// parameters are suffixed `_1`, `_2`, .. when the batch holds more than one.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertRow;

impl SqlFactory for InsertRow {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let table = table_of(object)?;
        let columns = insert_columns(table);
        let batch = registry.options().table.dml_batch_size.max(1);

        let mut b = registry.builder();
        b.insert_into(table).lparen();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        b.names(&names).rparen().values();
        for row in 0..batch {
            b.separator(row == 0, ",");
            if batch > 1 {
                b.line_break();
            }
            b.lparen();
            for (i, column) in columns.iter().enumerate() {
                let parameter = if batch > 1 {
                    format!(":{}_{}", column.name, row + 1)
                } else {
                    format!(":{}", column.name)
                };
                b.separator(i == 0, ",").keyword(&insert_value(registry, column, &parameter));
            }
            b.rparen();
        }
        single(b.into_sql(), SqlType::Insert, object)
    }
}

/// `UPDATE t SET .. WHERE pk = :pk`
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateByPk;

impl SqlFactory for UpdateByPk {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let table = table_of(object)?;
        single(update_statement(registry, table)?, SqlType::Update, object)
    }
}

/// `DELETE FROM t WHERE pk = :pk`
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteByPk;

impl SqlFactory for DeleteByPk {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let table = table_of(object)?;
        let keys: Vec<&str> = key_columns(table)?.iter().map(String::as_str).collect();
        let mut b = registry.builder();
        b.delete_from(table).where_();
        key_predicate(&mut b, &keys);
        single(b.into_sql(), SqlType::Delete, object)
    }
}

/// `SELECT cols FROM t [ORDER BY keys]`
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectAll;

impl SqlFactory for SelectAll {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let table = table_of(object)?;
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        let mut b = registry.builder();
        b.select();
        if names.is_empty() {
            b.keyword("*");
        } else {
            b.names(&names);
        }
        b.from().table_name(table);
        if let Some(keys) = table.key_columns() {
            b.keyword("ORDER BY").names(keys);
        }
        single(b.into_sql(), SqlType::SelectAll, object)
    }
}

/// Insert-or-update by key, spelled per [`MergeStyle`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeByPk;

impl MergeByPk {
    fn merge(registry: &SqlFactoryRegistry<'_>, table: &Table) -> Result<String> {
        let dialect = registry.dialect();
        let keys = key_columns(table)?;
        let target = registry.options().table.temporary_alias.clone();
        let columns = insert_columns(table);
        let updates = update_columns(registry, table);

        let mut b = registry.builder();
        b.merge_into(table).keyword(&target);
        b.line_break().keyword("USING").lparen().select();
        for (i, column) in columns.iter().enumerate() {
            b.separator(i == 0, ",")
                .parameter(&column.name)
                .keyword("AS")
                .name(&column.name);
        }
        if let Some(dual) = &dialect.syntax.dual_table {
            b.from().keyword(dual);
        }
        b.rparen().keyword(SOURCE_ALIAS);
        b.line_break().on().lparen();
        for (i, key) in keys.iter().enumerate() {
            let name = b.column_name(key);
            b.separator(i == 0, "AND")
                .keyword(&format!("{}.{}", target, name))
                .keyword("=")
                .keyword(&format!("{}.{}", SOURCE_ALIAS, name));
        }
        b.rparen();
        if !updates.is_empty() {
            b.line_break().keyword("WHEN MATCHED THEN UPDATE").set();
            for (i, column) in updates.iter().enumerate() {
                let name = b.column_name(&column.name);
                let value = update_value(
                    registry,
                    column,
                    &format!("{}.{}", SOURCE_ALIAS, name),
                    &format!("{}.{}", target, name),
                );
                b.separator(i == 0, ",").keyword(&name).keyword("=").keyword(&value);
            }
        }
        b.line_break().keyword("WHEN NOT MATCHED THEN INSERT").lparen();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        b.names(&names).rparen().values().lparen();
        for (i, column) in columns.iter().enumerate() {
            let value = format!("{}.{}", SOURCE_ALIAS, b.column_name(&column.name));
            b.separator(i == 0, ",").keyword(&insert_value(registry, column, &value));
        }
        b.rparen();
        Ok(b.into_sql())
    }

    /// `INSERT .. ON CONFLICT (keys) DO UPDATE SET c = EXCLUDED.c`
    fn on_conflict(registry: &SqlFactoryRegistry<'_>, table: &Table) -> Result<String> {
        let keys = key_columns(table)?;
        let updates = update_columns(registry, table);
        let mut b = Self::insert_values(registry, table);
        b.keyword("ON CONFLICT").lparen().names(keys).rparen();
        if updates.is_empty() {
            b.keyword("DO NOTHING");
            return Ok(b.into_sql());
        }
        let table_alias = b.dialect().quote_if_needed(&table.name);
        b.keyword("DO UPDATE").set();
        for (i, column) in updates.iter().enumerate() {
            let name = b.column_name(&column.name);
            let value = update_value(
                registry,
                column,
                &format!("EXCLUDED.{}", name),
                &format!("{}.{}", table_alias, name),
            );
            b.separator(i == 0, ",").keyword(&name).keyword("=").keyword(&value);
        }
        Ok(b.into_sql())
    }

    /// `INSERT .. ON DUPLICATE KEY UPDATE c = VALUES(c)`
    fn on_duplicate_key(registry: &SqlFactoryRegistry<'_>, table: &Table) -> Result<String> {
        let keys = key_columns(table)?;
        let updates = update_columns(registry, table);
        let mut b = Self::insert_values(registry, table);
        b.keyword("ON DUPLICATE KEY UPDATE");
        if updates.is_empty() {
            let name = b.column_name(&keys[0]);
            b.keyword(&name).keyword("=").keyword(&name);
            return Ok(b.into_sql());
        }
        for (i, column) in updates.iter().enumerate() {
            let name = b.column_name(&column.name);
            let value = update_value(registry, column, &format!("VALUES({})", name), &name);
            b.separator(i == 0, ",").keyword(&name).keyword("=").keyword(&value);
        }
        Ok(b.into_sql())
    }

    /// `MERGE INTO t (..) KEY (keys) VALUES (..)`
    fn merge_key(registry: &SqlFactoryRegistry<'_>, table: &Table) -> Result<String> {
        let keys = key_columns(table)?;
        let columns = insert_columns(table);
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let mut b = registry.builder();
        b.merge_into(table)
            .lparen()
            .names(&names)
            .rparen()
            .keyword("KEY")
            .lparen()
            .names(keys)
            .rparen()
            .values()
            .lparen();
        for (i, column) in columns.iter().enumerate() {
            b.separator(i == 0, ",")
                .keyword(&insert_value(registry, column, &format!(":{}", column.name)));
        }
        b.rparen();
        Ok(b.into_sql())
    }

    /// `INSERT INTO t (..) SELECT .. WHERE NOT EXISTS (SELECT 1 FROM t WHERE keys)`
    fn insert_if_absent(registry: &SqlFactoryRegistry<'_>, table: &Table) -> Result<String> {
        let dialect = registry.dialect();
        let keys: Vec<&str> = key_columns(table)?.iter().map(String::as_str).collect();
        let columns = insert_columns(table);
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let mut b = registry.builder();
        b.insert_into(table).lparen().names(&names).rparen().select();
        for (i, column) in columns.iter().enumerate() {
            b.separator(i == 0, ",")
                .keyword(&insert_value(registry, column, &format!(":{}", column.name)));
        }
        if let Some(dual) = &dialect.syntax.dual_table {
            b.from().keyword(dual);
        }
        b.keyword("WHERE NOT EXISTS")
            .lparen()
            .select()
            .keyword("1")
            .from()
            .table_name(table)
            .where_();
        key_predicate(&mut b, &keys);
        b.rparen();
        Ok(b.into_sql())
    }

    fn insert_values<'b>(registry: &'b SqlFactoryRegistry<'_>, table: &Table) -> SqlBuilder<'b> {
        let columns = insert_columns(table);
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let mut b = registry.builder();
        b.insert_into(table).lparen().names(&names).rparen().values().lparen();
        for (i, column) in columns.iter().enumerate() {
            b.separator(i == 0, ",")
                .keyword(&insert_value(registry, column, &format!(":{}", column.name)));
        }
        b.rparen();
        b
    }
}

impl SqlFactory for MergeByPk {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let table = table_of(object)?;
        let statements = match registry.dialect().syntax.merge {
            MergeStyle::Merge => vec![Self::merge(registry, table)?],
            MergeStyle::OnConflict => vec![Self::on_conflict(registry, table)?],
            MergeStyle::OnDuplicateKey => vec![Self::on_duplicate_key(registry, table)?],
            MergeStyle::MergeKey => vec![Self::merge_key(registry, table)?],
            MergeStyle::UpdateThenInsert => vec![
                update_statement(registry, table)?,
                Self::insert_if_absent(registry, table)?,
            ],
        };
        Ok(statements
            .into_iter()
            .map(|sql| SqlOperation::new(sql, SqlType::MergeByPk, object))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, DefaultCase};
    use crate::dialect::{Dialect, Product};
    use pretty_assertions::assert_eq;

    fn dialect(merge: MergeStyle) -> Dialect {
        let mut dialect = Dialect::new("d", "D", Product::Ansi);
        dialect.syntax.default_case = DefaultCase::LowerCase;
        dialect.syntax.merge = merge;
        dialect
    }

    fn account() -> Table {
        Table::new("account")
            .with_column(Column::new("id").with_type(DataType::BigInt).not_null())
            .with_column(Column::new("owner").with_type(DataType::Varchar).with_length(40))
            .with_column(Column::new("created_at").with_type(DataType::Timestamp))
            .with_column(Column::new("updated_at").with_type(DataType::Timestamp))
            .with_column(Column::new("lock_version").with_type(DataType::Int))
            .with_primary_key(&["id"])
    }

    fn sql(dialect: &Dialect, operation: SqlType, table: &Table) -> Vec<String> {
        dialect
            .sql_factory_registry()
            .create_sql(operation, &DbObject::Table(table))
            .unwrap()
            .into_iter()
            .map(|o| o.sql)
            .collect()
    }

    #[test]
    fn test_insert_fills_timestamps() {
        let dialect = dialect(MergeStyle::Merge);
        assert_eq!(
            sql(&dialect, SqlType::Insert, &account()),
            vec![
                "INSERT INTO account (id, owner, created_at, updated_at, lock_version) \
                 VALUES (:id, :owner, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP, :lock_version)"
            ]
        );
    }

    #[test]
    fn test_insert_batch_and_coalesce() {
        let dialect = dialect(MergeStyle::Merge);
        let table = Table::new("t")
            .with_column(Column::new("id").identity().with_type(DataType::Int))
            .with_column(Column::new("a").with_type(DataType::Int).with_default("0"));
        let mut registry = dialect.sql_factory_registry();
        registry.options_mut().table.dml_batch_size = 2;
        registry.options_mut().table.with_coalesce_at_insert = true;
        let ops = registry.create_sql(SqlType::Insert, &DbObject::Table(&table)).unwrap();
        assert_eq!(
            ops[0].sql,
            "INSERT INTO t (a) VALUES\n(COALESCE(:a_1, 0)),\n(COALESCE(:a_2, 0))"
        );
    }

    #[test]
    fn test_update_by_pk_with_optimistic_lock() {
        let dialect = dialect(MergeStyle::Merge);
        assert_eq!(
            sql(&dialect, SqlType::Update, &account()),
            vec![
                "UPDATE account SET owner = :owner, updated_at = CURRENT_TIMESTAMP, \
                 lock_version = lock_version + 1 WHERE id = :id AND lock_version = :lock_version"
            ]
        );
    }

    #[test]
    fn test_delete_and_select() {
        let dialect = dialect(MergeStyle::Merge);
        assert_eq!(sql(&dialect, SqlType::Delete, &account()), vec!["DELETE FROM account WHERE id = :id"]);
        assert_eq!(
            sql(&dialect, SqlType::SelectAll, &account()),
            vec!["SELECT id, owner, created_at, updated_at, lock_version FROM account ORDER BY id"]
        );
    }

    #[test]
    fn test_keyless_table_is_rejected() {
        let dialect = dialect(MergeStyle::Merge);
        let table = Table::new("log").with_column(Column::new("msg"));
        let registry = dialect.sql_factory_registry();
        assert!(registry.create_sql(SqlType::Delete, &DbObject::Table(&table)).is_err());
        assert!(registry.create_sql(SqlType::MergeByPk, &DbObject::Table(&table)).is_err());
    }

    fn person() -> Table {
        Table::new("person")
            .with_column(Column::new("id").with_type(DataType::Int).not_null())
            .with_column(Column::new("name").with_type(DataType::Varchar).with_length(20))
            .with_primary_key(&["id"])
    }

    #[test]
    fn test_merge_styles() {
        let table = person();
        assert_eq!(
            sql(&dialect(MergeStyle::Merge), SqlType::MergeByPk, &table),
            vec![
                "MERGE INTO person _target\nUSING (SELECT :id AS id, :name AS name) _source\n\
                 ON (_target.id = _source.id)\nWHEN MATCHED THEN UPDATE SET name = _source.name\n\
                 WHEN NOT MATCHED THEN INSERT (id, name) VALUES (_source.id, _source.name)"
            ]
        );
        assert_eq!(
            sql(&dialect(MergeStyle::OnConflict), SqlType::MergeByPk, &table),
            vec!["INSERT INTO person (id, name) VALUES (:id, :name) ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name"]
        );
        assert_eq!(
            sql(&dialect(MergeStyle::OnDuplicateKey), SqlType::MergeByPk, &table),
            vec!["INSERT INTO person (id, name) VALUES (:id, :name) ON DUPLICATE KEY UPDATE name = VALUES(name)"]
        );
        assert_eq!(
            sql(&dialect(MergeStyle::MergeKey), SqlType::MergeByPk, &table),
            vec!["MERGE INTO person (id, name) KEY (id) VALUES (:id, :name)"]
        );
        assert_eq!(
            sql(&dialect(MergeStyle::UpdateThenInsert), SqlType::MergeByPk, &table),
            vec![
                "UPDATE person SET name = :name WHERE id = :id",
                "INSERT INTO person (id, name) SELECT :id, :name WHERE NOT EXISTS (SELECT 1 FROM person WHERE id = :id)",
            ]
        );
    }

    #[test]
    fn test_merge_uses_dual_table() {
        let mut dialect = dialect(MergeStyle::Merge);
        dialect.syntax.dual_table = Some("DUAL".into());
        let merged = sql(&dialect, SqlType::MergeByPk, &person());
        assert!(merged[0].contains("USING (SELECT :id AS id, :name AS name FROM DUAL) _source"));
    }
}
