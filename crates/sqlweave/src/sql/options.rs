//! Options bag shared by the factories of one registry.
//!
//! The bag is plain data owned by the caller: clone it per generation call
//! rather than sharing one mutable bag across threads.

use serde::{Deserialize, Serialize};

use crate::core::Column;

/// LOCK TABLE mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockMode {
    #[default]
    Exclusive,
    Share,
}

impl LockMode {
    pub fn keyword(&self) -> &'static str {
        match self {
            LockMode::Exclusive => "EXCLUSIVE",
            LockMode::Share => "SHARE",
        }
    }
}

/// Options for statement generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlFactoryOptions {
    /// Prefix object names with their schema.
    pub decorate_schema_name: bool,

    /// Always quote table/constraint/index names instead of only when needed.
    pub quote_object_name: bool,

    /// Always quote column names instead of only when needed.
    pub quote_column_name: bool,

    /// Table and DML options.
    pub table: TableOptions,
}

impl Default for SqlFactoryOptions {
    fn default() -> Self {
        Self {
            decorate_schema_name: true,
            quote_object_name: false,
            quote_column_name: false,
            table: TableOptions::default(),
        }
    }
}

/// Table-level generation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    /// Emit FOREIGN KEY constraints in CREATE TABLE and diffs.
    pub with_foreign_key_constraint: bool,

    /// Emit UNIQUE constraints.
    pub with_unique_constraint: bool,

    /// Emit CHECK constraints.
    pub with_check_constraint: bool,

    /// Rows per generated DML statement.
    pub dml_batch_size: usize,

    /// Alias of the target table in MERGE statements.
    pub temporary_alias: String,

    /// Keep the column default when an inserted value is NULL.
    pub with_coalesce_at_insert: bool,

    /// Keep the current value when an updated value is NULL.
    pub with_coalesce_at_update: bool,

    /// Column names filled with the current timestamp on insert.
    pub created_at_columns: Vec<String>,

    /// Column names filled with the current timestamp on insert and update.
    pub updated_at_columns: Vec<String>,

    /// Column names incremented on every update and checked in its WHERE.
    pub optimistic_lock_columns: Vec<String>,

    /// Mode used by LOCK TABLE statements.
    pub lock_mode: LockMode,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            with_foreign_key_constraint: true,
            with_unique_constraint: true,
            with_check_constraint: true,
            dml_batch_size: 1,
            temporary_alias: "_target".to_string(),
            with_coalesce_at_insert: false,
            with_coalesce_at_update: false,
            created_at_columns: vec!["created_at".to_string()],
            updated_at_columns: vec!["updated_at".to_string()],
            optimistic_lock_columns: vec!["lock_version".to_string(), "version_no".to_string()],
            lock_mode: LockMode::Exclusive,
        }
    }
}

fn named(names: &[String], column: &Column) -> bool {
    names.iter().any(|n| n.eq_ignore_ascii_case(&column.name))
}

impl TableOptions {
    pub fn is_created_at(&self, column: &Column) -> bool {
        named(&self.created_at_columns, column)
            && column.data_type.map_or(true, |dt| dt.is_date_time())
    }

    pub fn is_updated_at(&self, column: &Column) -> bool {
        named(&self.updated_at_columns, column)
            && column.data_type.map_or(true, |dt| dt.is_date_time())
    }

    pub fn is_optimistic_lock(&self, column: &Column) -> bool {
        named(&self.optimistic_lock_columns, column)
            && column.data_type.map_or(true, |dt| dt.is_numeric())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;

    #[test]
    fn test_defaults() {
        let options = SqlFactoryOptions::default();
        assert!(options.decorate_schema_name);
        assert_eq!(options.table.dml_batch_size, 1);
        assert_eq!(options.table.temporary_alias, "_target");
        assert_eq!(options.table.lock_mode, LockMode::Exclusive);
    }

    #[test]
    fn test_column_predicates() {
        let options = TableOptions::default();
        assert!(options.is_created_at(&Column::new("CREATED_AT").with_type(DataType::Timestamp)));
        assert!(!options.is_created_at(&Column::new("created_at").with_type(DataType::Varchar)));
        assert!(options.is_updated_at(&Column::new("updated_at")));
        assert!(options.is_optimistic_lock(&Column::new("version_no").with_type(DataType::Int)));
        assert!(!options.is_optimistic_lock(&Column::new("version_no").with_type(DataType::Date)));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let options: SqlFactoryOptions =
            serde_yaml::from_str("quote_column_name: true\ntable:\n  dml_batch_size: 50\n").unwrap();
        assert!(options.quote_column_name);
        assert_eq!(options.table.dml_batch_size, 50);
        assert_eq!(options.table.temporary_alias, "_target");
    }
}
