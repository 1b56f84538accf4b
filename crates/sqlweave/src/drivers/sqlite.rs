//! SQLite dialects.
//!
//! SQLite cannot alter a column or add a constraint to an existing table, so
//! those factories are removed and constraints are always declared inline.

use crate::core::{DataType, DefaultCase, ObjectKind, SqlType};
use crate::dialect::{
    DataTypeCatalog, DbDataType, Dialect, DialectVersion, IdentityStyle, LimitStyle, LockStyle,
    MergeStyle, Product, ProductLattice, SequenceStyle, ValueConverter,
};
use crate::error::Result;
use crate::sql::factories::DropColumn;
use crate::sql::registry::FactoryTable;

use super::without_sequences;

/// Default `SQLITE_MAX_LENGTH`.
const MAX_LENGTH: u64 = 1_000_000_000;

/// SQLite 3 before 3.24.
pub fn dialect() -> Dialect {
    let mut dialect = Dialect::new("sqlite", "SQLite 3", Product::Sqlite)
        .with_version(DialectVersion::new(3, 0))
        .with_layer(sqlite_layer);
    register_types(dialect.catalog_mut());

    let syntax = &mut dialect.syntax;
    syntax.default_case = DefaultCase::AsIs;
    syntax.limit = LimitStyle::LimitOffset;
    syntax.merge = MergeStyle::UpdateThenInsert;
    syntax.lock = LockStyle::Unsupported;
    syntax.identity = IdentityStyle::Autoincrement;
    syntax.sequence = SequenceStyle::Unsupported;
    syntax.current_timestamp = "CURRENT_TIMESTAMP".into();
    syntax.system_schemas = vec!["main".into(), "temp".into()];

    let features = &mut dialect.features;
    features.supports_limit = true;
    features.supports_limit_offset = true;
    features.supports_sequence = false;
    features.supports_merge = false;
    features.supports_schema = false;
    features.supports_catalog = false;
    features.supports_drop_cascade = false;
    features.supports_standard_offset_fetch = false;
    features.supports_alter_add_constraint = false;
    features.supports_if_exists = true;
    features.is_ddl_rollbackable = true;
    dialect
}

fn sqlite_layer(table: &mut FactoryTable) {
    without_sequences(table);
    table
        .remove(ObjectKind::Table, SqlType::Truncate)
        .remove(ObjectKind::Table, SqlType::Lock)
        .remove(ObjectKind::Column, SqlType::Alter)
        .remove(ObjectKind::Column, SqlType::Drop);
    for kind in [
        ObjectKind::PrimaryKey,
        ObjectKind::UniqueConstraint,
        ObjectKind::ForeignKey,
        ObjectKind::CheckConstraint,
    ] {
        table.remove(kind, SqlType::Create).remove(kind, SqlType::Drop);
    }
}

/// Type names SQLite maps onto its storage classes.
fn register_types(catalog: &mut DataTypeCatalog) {
    catalog
        .register(DbDataType::new(DataType::Int, "INTEGER").alias("INT"))
        .register(DbDataType::new(DataType::BigInt, "INTEGER"))
        .register(DbDataType::new(DataType::SmallInt, "INTEGER"))
        .register(DbDataType::new(DataType::TinyInt, "INTEGER"))
        .register(
            DbDataType::new(DataType::Boolean, "BOOLEAN").converter(ValueConverter::BooleanDigits),
        )
        .register(DbDataType::new(DataType::Real, "REAL"))
        .register(DbDataType::new(DataType::Double, "REAL").alias("DOUBLE"))
        .register(DbDataType::new(DataType::Float, "REAL").alias("FLOAT"))
        .register(DbDataType::scaled(DataType::Numeric, "NUMERIC", 1000, 1000))
        .register(DbDataType::scaled(DataType::Decimal, "NUMERIC", 1000, 1000).alias("DECIMAL"))
        .register(
            DbDataType::sized(DataType::Char, "CHAR", 1, MAX_LENGTH)
                .default_length(1)
                .literal("'", "'"),
        )
        .register(
            DbDataType::sized(DataType::Varchar, "VARCHAR", 1, MAX_LENGTH)
                .literal("'", "'")
                .surrogate("TEXT"),
        )
        .register(DbDataType::bounded(DataType::Clob, "TEXT", MAX_LENGTH).alias("CLOB").literal("'", "'"))
        .register(DbDataType::bounded(DataType::LongVarchar, "TEXT", MAX_LENGTH).literal("'", "'"))
        .register(DbDataType::sized(DataType::NChar, "NCHAR", 1, MAX_LENGTH).literal("'", "'"))
        .register(
            DbDataType::sized(DataType::NVarchar, "NVARCHAR", 1, MAX_LENGTH)
                .literal("'", "'")
                .surrogate("TEXT"),
        )
        .register(DbDataType::bounded(DataType::NClob, "TEXT", MAX_LENGTH).literal("'", "'"))
        .register(DbDataType::bounded(DataType::Blob, "BLOB", MAX_LENGTH).literal("X'", "'"))
        .register(DbDataType::bounded(DataType::Varbinary, "BLOB", MAX_LENGTH).literal("X'", "'"))
        .register(DbDataType::bounded(DataType::Binary, "BLOB", MAX_LENGTH).literal("X'", "'"))
        .register(DbDataType::new(DataType::Date, "DATE").literal("'", "'"))
        .register(DbDataType::new(DataType::Time, "TIME").literal("'", "'"))
        .register(DbDataType::new(DataType::DateTime, "DATETIME").literal("'", "'"))
        .register(DbDataType::new(DataType::Timestamp, "TIMESTAMP").literal("'", "'"));
}

/// 3.24: UPSERT.
fn sqlite3_24(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive(
        "sqlite3_24",
        "SQLite 3.24",
        DialectVersion::new(3, 24),
    );
    dialect.syntax.merge = MergeStyle::OnConflict;
    dialect
}

/// 3.35: `ALTER TABLE .. DROP COLUMN`.
fn sqlite3_35(parent: &Dialect) -> Dialect {
    parent
        .derive("sqlite3_35", "SQLite 3.35", DialectVersion::new(3, 35))
        .with_layer(drop_column_layer)
}

fn drop_column_layer(table: &mut FactoryTable) {
    table.register(ObjectKind::Column, SqlType::Drop, DropColumn);
}

pub fn lattice() -> Result<ProductLattice> {
    let base = dialect();
    let v3_24 = sqlite3_24(&base);
    let v3_35 = sqlite3_35(&v3_24);

    let mut lattice = ProductLattice::new(Product::Sqlite, "SQLite", base)?;
    lattice.add((3, 24, 0), v3_24)?.add((3, 35, 0), v3_35)?;
    Ok(lattice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DbObject, ForeignKey, Table};
    use crate::error::SqlWeaveError;

    fn orders() -> Table {
        Table::new("orders")
            .with_column(Column::new("id").with_type(DataType::Int).not_null())
            .with_column(Column::new("customer_id").with_type(DataType::Int))
            .with_primary_key(&["id"])
            .with_foreign_key(ForeignKey {
                name: "fk_orders_customer".into(),
                columns: vec!["customer_id".into()],
                ref_table: "customer".into(),
                ref_columns: vec!["id".into()],
                ..Default::default()
            })
    }

    #[test]
    fn test_version_bounds() {
        let lattice = lattice().unwrap();
        assert_eq!(lattice.resolve(3, 7, Some(17)).id(), "sqlite");
        assert_eq!(lattice.resolve(3, 31, None).id(), "sqlite3_24");
        assert_eq!(lattice.resolve(3, 45, Some(1)).id(), "sqlite3_35");
    }

    #[test]
    fn test_foreign_keys_inline() {
        let dialect = dialect();
        let table = orders();
        let ops = dialect
            .sql_factory_registry()
            .create_sql(SqlType::Create, &DbObject::Table(&table))
            .unwrap();
        assert_eq!(ops.len(), 1);
        assert!(ops[0].sql.contains("FOREIGN KEY (customer_id) REFERENCES customer"), "{}", ops[0].sql);
    }

    #[test]
    fn test_unsupported_alters() {
        let lattice = lattice().unwrap();
        let table = orders();
        let column = &table.columns[1];
        let object = DbObject::Column(&table, column);

        let old = lattice.resolve(3, 30, None).sql_factory_registry();
        assert!(matches!(
            old.create_sql(SqlType::Drop, &object),
            Err(SqlWeaveError::UnregisteredOperation { .. })
        ));
        assert!(old.create_sql(SqlType::Alter, &object).is_err());
        assert!(old.create_sql(SqlType::Create, &object).is_ok());

        let new = lattice.resolve(3, 35, None).sql_factory_registry();
        let ops = new.create_sql(SqlType::Drop, &object).unwrap();
        assert_eq!(ops[0].sql, "ALTER TABLE orders DROP COLUMN customer_id");
    }

    #[test]
    fn test_integer_affinity() {
        let dialect = dialect();
        let id = Column::new("id").with_type(DataType::BigInt);
        assert_eq!(dialect.column_type_sql(&id), "INTEGER");
        let body = Column::new("body").with_type(DataType::Clob);
        assert_eq!(dialect.column_type_sql(&body), "TEXT");
    }
}
