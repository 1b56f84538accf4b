//! Schema model: tables, columns, constraints, indexes, sequences and views.
//!
//! These types are populated by an external metadata reader (or built by
//! hand) and consumed read-only by the diff engine and the SQL factories.
//! Only the type matcher mutates a [`Column`], and only when explicitly asked.

use serde::{Deserialize, Serialize};

use super::datatype::DataType;

/// Referential action of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeRule {
    #[default]
    None,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl CascadeRule {
    /// SQL spelling, `None` when the clause should be omitted.
    pub fn sql(&self) -> Option<&'static str> {
        match self {
            CascadeRule::None => None,
            CascadeRule::Restrict => Some("RESTRICT"),
            CascadeRule::Cascade => Some("CASCADE"),
            CascadeRule::SetNull => Some("SET NULL"),
            CascadeRule::SetDefault => Some("SET DEFAULT"),
        }
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Canonical type, `None` until matched or set.
    #[serde(default)]
    pub data_type: Option<DataType>,

    /// Explicit vendor spelling kept when the canonical type alone cannot
    /// reproduce it (e.g. `TEXT` for a long varchar).
    #[serde(default)]
    pub data_type_name: Option<String>,

    /// Length for character/binary types, precision for numeric types.
    #[serde(default)]
    pub length: Option<u64>,

    /// Numeric scale.
    #[serde(default)]
    pub scale: Option<u32>,

    /// Whether the column rejects NULL.
    #[serde(default)]
    pub not_null: bool,

    /// Default value expression, verbatim.
    #[serde(default)]
    pub default_value: Option<String>,

    /// Whether the column is an identity/auto-increment column.
    #[serde(default)]
    pub identity: bool,

    /// ON UPDATE expression (MySQL/HSQLDB timestamp columns).
    #[serde(default)]
    pub on_update: Option<String>,

    /// Computed column expression.
    #[serde(default)]
    pub formula: Option<String>,

    #[serde(default)]
    pub remarks: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn with_length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_type_name(mut self, name: impl Into<String>) -> Self {
        self.data_type_name = Some(name.into());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn identity(mut self) -> Self {
        self.identity = true;
        self.not_null = true;
        self
    }

    pub fn with_on_update(mut self, expr: impl Into<String>) -> Self {
        self.on_update = Some(expr.into());
        self
    }

    /// Canonical type, falling back to [`DataType::Other`].
    pub fn data_type_or_other(&self) -> DataType {
        self.data_type.unwrap_or(DataType::Other)
    }
}

/// Primary key constraint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PrimaryKey {
    pub name: String,
    pub columns: Vec<String>,
}

/// Unique constraint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UniqueConstraint {
    pub name: String,
    pub columns: Vec<String>,
}

/// Foreign key metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name.
    pub name: String,

    /// Source column names.
    pub columns: Vec<String>,

    /// Referenced schema name.
    #[serde(default)]
    pub ref_schema: Option<String>,

    /// Referenced table name.
    pub ref_table: String,

    /// Referenced column names.
    pub ref_columns: Vec<String>,

    #[serde(default)]
    pub on_delete: CascadeRule,

    #[serde(default)]
    pub on_update: CascadeRule,
}

/// Check constraint metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CheckConstraint {
    /// Constraint name.
    pub name: String,

    /// Constraint definition (SQL expression).
    pub definition: String,

    /// Columns the expression reads; used to order drops before column changes.
    #[serde(default)]
    pub columns: Vec<String>,
}

/// Index metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Index {
    /// Index name.
    pub name: String,

    /// Indexed column names.
    pub columns: Vec<String>,

    /// Whether the index is unique.
    #[serde(default)]
    pub unique: bool,

    /// Vendor index type (e.g. "BTREE", "GIN", "CLUSTERED").
    #[serde(default)]
    pub index_type: Option<String>,

    /// Included columns (non-key).
    #[serde(default)]
    pub includes: Vec<String>,
}

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    /// Schema name.
    #[serde(default)]
    pub schema_name: Option<String>,

    /// Table name.
    pub name: String,

    /// Column definitions in ordinal order.
    #[serde(default)]
    pub columns: Vec<Column>,

    #[serde(default)]
    pub primary_key: Option<PrimaryKey>,

    #[serde(default)]
    pub unique_constraints: Vec<UniqueConstraint>,

    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,

    #[serde(default)]
    pub check_constraints: Vec<CheckConstraint>,

    #[serde(default)]
    pub indexes: Vec<Index>,

    #[serde(default)]
    pub remarks: Option<String>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema_name = Some(schema.into());
        self
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Set the primary key; the constraint is named `pk_<table>`.
    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = Some(PrimaryKey {
            name: format!("pk_{}", self.name),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn with_unique(mut self, name: impl Into<String>, columns: &[&str]) -> Self {
        self.unique_constraints.push(UniqueConstraint {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn with_foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn with_check(mut self, check: CheckConstraint) -> Self {
        self.check_constraints.push(check);
        self
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Get the fully qualified table name.
    pub fn full_name(&self) -> String {
        match &self.schema_name {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    /// Find a column by name (case-insensitive).
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Key columns used for by-PK statements: the primary key, else the first
    /// unique constraint.
    pub fn key_columns(&self) -> Option<&[String]> {
        if let Some(pk) = &self.primary_key {
            if !pk.columns.is_empty() {
                return Some(&pk.columns);
            }
        }
        self.unique_constraints
            .first()
            .map(|u| u.columns.as_slice())
    }

    pub fn is_key_column(&self, name: &str) -> bool {
        self.key_columns()
            .map(|cols| cols.iter().any(|c| c.eq_ignore_ascii_case(name)))
            .unwrap_or(false)
    }
}

/// Sequence metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(default)]
    pub schema_name: Option<String>,
    pub name: String,
    #[serde(default)]
    pub start: Option<i64>,
    #[serde(default)]
    pub increment: Option<i64>,
    #[serde(default)]
    pub min_value: Option<i64>,
    #[serde(default)]
    pub max_value: Option<i64>,
    #[serde(default)]
    pub cache: Option<i64>,
    #[serde(default)]
    pub cycle: bool,
}

impl Sequence {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// View metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct View {
    #[serde(default)]
    pub schema_name: Option<String>,
    pub name: String,
    /// The SELECT body of the view.
    pub statement: String,
}

/// A schema-level domain: a named alias for a sized canonical type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(default)]
    pub scale: Option<u32>,
}

/// A schema: the unit a metadata reader yields for diffing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub sequences: Vec<Sequence>,
    #[serde(default)]
    pub views: Vec<View>,
    #[serde(default)]
    pub domains: Vec<Domain>,
}

impl Schema {
    pub fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_table() -> Table {
        Table::new("employee")
            .with_schema("hr")
            .with_column(Column::new("id").with_type(DataType::Int).not_null())
            .with_column(
                Column::new("name")
                    .with_type(DataType::Varchar)
                    .with_length(10),
            )
            .with_primary_key(&["id"])
    }

    #[test]
    fn test_table_full_name() {
        let table = make_test_table();
        assert_eq!(table.full_name(), "hr.employee");
        assert_eq!(Table::new("t").full_name(), "t");
    }

    #[test]
    fn test_column_lookup_case_insensitive() {
        let table = make_test_table();
        assert!(table.column("NAME").is_some());
        assert!(table.column("missing").is_none());
    }

    #[test]
    fn test_key_columns_fall_back_to_unique() {
        let mut table = make_test_table();
        assert_eq!(table.key_columns(), Some(&["id".to_string()][..]));
        assert!(table.is_key_column("ID"));

        table.primary_key = None;
        assert!(table.key_columns().is_none());

        let table = table.with_unique("uk_name", &["name"]);
        assert_eq!(table.key_columns(), Some(&["name".to_string()][..]));
    }

    #[test]
    fn test_cascade_rule_sql() {
        assert_eq!(CascadeRule::None.sql(), None);
        assert_eq!(CascadeRule::SetNull.sql(), Some("SET NULL"));
    }

    #[test]
    fn test_table_yaml_roundtrip_defaults() {
        let yaml = "name: t\ncolumns:\n  - name: c\n    data_type: INT\n";
        let table: Table = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(table.columns[0].data_type, Some(DataType::Int));
        assert!(!table.columns[0].not_null);
    }
}
