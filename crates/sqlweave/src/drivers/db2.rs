//! IBM Db2 for Linux, UNIX and Windows dialects.

use crate::core::{DataType, ObjectKind, SqlType};
use crate::dialect::catalog::LEN_2GB_MINUS_1;
use crate::dialect::{
    DataTypeCatalog, DbDataType, Dialect, DialectVersion, LimitStyle, Product, ProductLattice,
    ValueConverter,
};
use crate::error::Result;
use crate::sql::factories::TruncateTable;
use crate::sql::registry::FactoryTable;

const MAX_VARCHAR: u64 = 32_672;

/// Db2 9.1 and 9.5.
pub fn dialect() -> Dialect {
    let mut dialect = Dialect::new("db2", "Db2 9", Product::Db2)
        .with_version(DialectVersion::new(9, 1))
        .with_layer(db2_layer);
    register_types(dialect.catalog_mut());

    let syntax = &mut dialect.syntax;
    syntax.limit = LimitStyle::Unsupported;
    syntax.dual_table = Some("SYSIBM.SYSDUMMY1".into());
    syntax.current_date = "CURRENT DATE".into();
    syntax.current_time = "CURRENT TIME".into();
    syntax.current_timestamp = "CURRENT TIMESTAMP".into();
    syntax.system_schemas = ["SYSIBM", "SYSCAT", "SYSFUN", "SYSPROC", "SYSSTAT", "SYSTOOLS"]
        .into_iter()
        .map(String::from)
        .collect();

    let features = &mut dialect.features;
    features.supports_standard_offset_fetch = false;
    features.supports_drop_cascade = false;
    features.supports_cascade_update = false;
    features.supports_set_default = false;
    features.supports_if_exists = false;
    features.supports_comment_statement = true;
    features.is_ddl_rollbackable = true;
    dialect
}

/// No `TRUNCATE` before 9.7.
fn db2_layer(table: &mut FactoryTable) {
    table.remove(ObjectKind::Table, SqlType::Truncate);
}

fn register_types(catalog: &mut DataTypeCatalog) {
    catalog
        .register(DbDataType::new(DataType::SmallInt, "SMALLINT"))
        .register(DbDataType::new(DataType::TinyInt, "SMALLINT"))
        .register(DbDataType::new(DataType::Int, "INTEGER").alias("INT"))
        .register(DbDataType::new(DataType::BigInt, "BIGINT"))
        .register(DbDataType::new(DataType::Boolean, "SMALLINT").converter(ValueConverter::BooleanDigits))
        .register(DbDataType::new(DataType::Real, "REAL"))
        .register(DbDataType::new(DataType::Float, "FLOAT"))
        .register(DbDataType::new(DataType::Double, "DOUBLE"))
        .register(DbDataType::scaled(DataType::Decimal, "DECIMAL", 31, 31).alias("DEC"))
        .register(DbDataType::scaled(DataType::Numeric, "NUMERIC", 31, 31))
        .register(
            DbDataType::sized(DataType::Char, "CHAR", 1, 254)
                .default_length(1)
                .literal("'", "'"),
        )
        .register(
            DbDataType::sized(DataType::Varchar, "VARCHAR", 1, MAX_VARCHAR)
                .literal("'", "'")
                .surrogate("CLOB"),
        )
        .register(DbDataType::bounded(DataType::Clob, "CLOB", LEN_2GB_MINUS_1).literal("'", "'"))
        .register(DbDataType::bounded(DataType::LongVarchar, "CLOB", LEN_2GB_MINUS_1).literal("'", "'"))
        .register(
            DbDataType::sized(DataType::NChar, "GRAPHIC", 1, 127)
                .default_length(1)
                .literal("G'", "'"),
        )
        .register(
            DbDataType::sized(DataType::NVarchar, "VARGRAPHIC", 1, MAX_VARCHAR / 2)
                .literal("G'", "'")
                .surrogate("DBCLOB"),
        )
        .register(DbDataType::bounded(DataType::NClob, "DBCLOB", LEN_2GB_MINUS_1 / 2).literal("G'", "'"))
        .register(DbDataType::bounded(DataType::Blob, "BLOB", LEN_2GB_MINUS_1).literal("BLOB(X'", "')"))
        .register(DbDataType::bounded(DataType::Varbinary, "BLOB", LEN_2GB_MINUS_1).literal("BLOB(X'", "')"))
        .register(DbDataType::new(DataType::Date, "DATE").literal("DATE '", "'"))
        .register(DbDataType::new(DataType::Time, "TIME").literal("TIME '", "'"))
        .register(DbDataType::new(DataType::Timestamp, "TIMESTAMP").literal("TIMESTAMP '", "'"))
        .register(DbDataType::new(DataType::DateTime, "TIMESTAMP").literal("TIMESTAMP '", "'"))
        .register(DbDataType::new(DataType::Xml, "XML"));
}

/// 9.7: `TRUNCATE TABLE`.
fn db2_9_7(parent: &Dialect) -> Dialect {
    parent
        .derive("db2_9_7", "Db2 9.7", DialectVersion::new(9, 7))
        .with_layer(truncate_layer)
}

fn truncate_layer(table: &mut FactoryTable) {
    table.register(ObjectKind::Table, SqlType::Truncate, TruncateTable);
}

/// 10.5: covering unique indexes.
fn db2_10_5(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("db2_10_5", "Db2 10.5", DialectVersion::new(10, 5));
    dialect.features.supports_index_include = true;
    dialect
}

/// 11.1: `OFFSET .. FETCH` and BOOLEAN.
fn db2_11(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("db2_11", "Db2 11.1", DialectVersion::new(11, 1));
    dialect
        .catalog_mut()
        .retain(|e| e.data_type != DataType::Boolean)
        .register(DbDataType::new(DataType::Boolean, "BOOLEAN").converter(ValueConverter::BooleanWords));
    dialect.syntax.limit = LimitStyle::OffsetFetch;
    dialect.features.supports_standard_offset_fetch = true;
    dialect
}

pub fn lattice() -> Result<ProductLattice> {
    let base = dialect();
    let v9_7 = db2_9_7(&base);
    let v10_5 = db2_10_5(&v9_7);
    let v11 = db2_11(&v10_5);

    let mut lattice = ProductLattice::new(Product::Db2, "DB2", base)?;
    lattice
        .add((9, 7, 0), v9_7)?
        .alias((10, 1, 0), "db2_9_7")?
        .add((10, 5, 0), v10_5)?
        .add((11, 1, 0), v11)?
        .alias((11, 5, 0), "db2_11")?
        .alias((12, 1, 0), "db2_11")?;
    Ok(lattice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DbObject, Table};

    #[test]
    fn test_version_bounds() {
        let lattice = lattice().unwrap();
        assert!(lattice.matches("DB2/LINUXX8664"));
        assert_eq!(lattice.resolve(9, 5, None).id(), "db2");
        assert_eq!(lattice.resolve(9, 7, Some(11)).id(), "db2_9_7");
        assert_eq!(lattice.resolve(10, 1, None).id(), "db2_9_7");
        assert_eq!(lattice.resolve(10, 5, None).id(), "db2_10_5");
        assert_eq!(lattice.resolve(11, 5, Some(9)).id(), "db2_11");
    }

    #[test]
    fn test_truncate_by_version() {
        let lattice = lattice().unwrap();
        let table = Table::new("ORDERS");
        let object = DbObject::Table(&table);
        assert!(lattice.resolve(9, 5, None).sql_factory_registry().create_sql(SqlType::Truncate, &object).is_err());
        let ops = lattice
            .resolve(9, 7, None)
            .sql_factory_registry()
            .create_sql(SqlType::Truncate, &object)
            .unwrap();
        assert_eq!(ops[0].sql, "TRUNCATE TABLE ORDERS");
    }

    #[test]
    fn test_graphic_types() {
        let dialect = dialect();
        let name = Column::new("NAME").with_type(DataType::NVarchar).with_length(100);
        assert_eq!(dialect.column_type_sql(&name), "VARGRAPHIC(100)");
        let huge = Column::new("NOTE").with_type(DataType::NVarchar).with_length(20_000);
        assert_eq!(dialect.column_type_sql(&huge), "DBCLOB");
    }
}
