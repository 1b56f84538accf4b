//! HyperSQL (HSQLDB) dialects.

use crate::core::DataType;
use crate::dialect::{
    DbDataType, Dialect, DialectVersion, LimitStyle, LockStyle, MergeStyle, Product,
    ProductLattice,
};
use crate::error::Result;

use super::ansi;

/// Longest declared character or binary string.
const MAX_STRING: u64 = 16 * 1024 * 1024;

/// HSQLDB 1.8.
pub fn dialect() -> Dialect {
    let mut dialect = Dialect::new("hsqldb", "HSQLDB 1.8", Product::HsqlDb)
        .with_version(DialectVersion::new(1, 8));
    let catalog = dialect.catalog_mut();
    ansi::register_types(catalog);
    catalog
        .replace(
            DbDataType::sized(DataType::Varchar, "VARCHAR", 1, MAX_STRING)
                .alias("CHARACTER VARYING")
                .literal("'", "'")
                .surrogate("CLOB"),
        )
        .replace(
            DbDataType::sized(DataType::Varbinary, "VARBINARY", 1, MAX_STRING)
                .literal("X'", "'")
                .surrogate("BLOB"),
        )
        .register(DbDataType::new(DataType::TinyInt, "TINYINT"))
        .register(DbDataType::new(DataType::Bit, "BIT").literal("B'", "'"))
        .register(DbDataType::bounded(DataType::LongVarchar, "LONGVARCHAR", MAX_STRING).literal("'", "'"))
        .register(DbDataType::bounded(DataType::LongVarbinary, "LONGVARBINARY", MAX_STRING).literal("X'", "'"))
        .register(DbDataType::new(DataType::Uuid, "UUID").literal("'", "'"));

    let syntax = &mut dialect.syntax;
    syntax.limit = LimitStyle::LimitOffset;
    syntax.merge = MergeStyle::UpdateThenInsert;
    syntax.lock = LockStyle::Unsupported;
    syntax.dual_table = Some("(VALUES(0))".into());
    syntax.system_schemas = vec!["INFORMATION_SCHEMA".into(), "SYSTEM_LOBS".into()];

    let features = &mut dialect.features;
    features.supports_limit = true;
    features.supports_limit_offset = true;
    features.supports_merge = false;
    features.supports_with = false;
    features.supports_standard_offset_fetch = false;
    features.supports_catalog = true;
    features.supports_if_exists = true;
    dialect
}

/// 2.0: MERGE, `LOCK TABLE .. WRITE` and standard row limiting.
fn hsqldb2(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("hsqldb2", "HSQLDB 2.0", DialectVersion::new(2, 0));
    dialect.syntax.merge = MergeStyle::Merge;
    dialect.syntax.lock = LockStyle::LockTableWrite;
    dialect.features.supports_merge = true;
    dialect.features.supports_with = true;
    dialect.features.supports_standard_offset_fetch = true;
    dialect.features.supports_comment_statement = true;
    dialect
}

/// 2.3.4: `ON UPDATE CURRENT_TIMESTAMP` columns.
fn hsqldb2_3_4(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive(
        "hsqldb2_3_4",
        "HSQLDB 2.3.4",
        DialectVersion::new(2, 3).with_revision(4),
    );
    dialect.syntax.on_update_clause = true;
    dialect
}

pub fn lattice() -> Result<ProductLattice> {
    let base = dialect();
    let v2 = hsqldb2(&base);
    let v2_3_4 = hsqldb2_3_4(&v2);

    let mut lattice = ProductLattice::new(Product::HsqlDb, "HSQL", base)?;
    lattice.add((2, 0, 0), v2)?.add((2, 3, 4), v2_3_4)?;
    Ok(lattice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DbObject, SqlType, Table};

    #[test]
    fn test_version_bounds() {
        let lattice = lattice().unwrap();
        assert!(lattice.matches("HSQL Database Engine"));
        assert_eq!(lattice.resolve(1, 8, Some(1)).id(), "hsqldb");
        assert_eq!(lattice.resolve(2, 3, Some(3)).id(), "hsqldb2");
        assert_eq!(lattice.resolve(2, 7, None).id(), "hsqldb2_3_4");
    }

    #[test]
    fn test_lock_by_version() {
        let lattice = lattice().unwrap();
        let table = Table::new("ORDERS");
        let object = DbObject::Table(&table);
        assert!(lattice
            .resolve(1, 8, None)
            .sql_factory_registry()
            .create_sql(SqlType::Lock, &object)
            .is_err());
        let ops = lattice
            .resolve(2, 0, None)
            .sql_factory_registry()
            .create_sql(SqlType::Lock, &object)
            .unwrap();
        assert_eq!(ops[0].sql, "LOCK TABLE ORDERS WRITE");
    }

    #[test]
    fn test_merge_selects_from_values() {
        let dialect = hsqldb2(&dialect());
        let table = Table::new("item")
            .with_column(Column::new("id").with_type(DataType::Int).not_null())
            .with_column(Column::new("name").with_type(DataType::Varchar).with_length(20))
            .with_primary_key(&["id"]);
        let ops = dialect
            .sql_factory_registry()
            .create_sql(SqlType::MergeByPk, &DbObject::Table(&table))
            .unwrap();
        assert!(ops[0].sql.contains("FROM (VALUES(0))"), "{}", ops[0].sql);
    }
}
