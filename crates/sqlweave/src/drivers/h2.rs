//! H2 dialects.

use crate::core::DataType;
use crate::dialect::{
    DbDataType, Dialect, DialectVersion, IdentityStyle, LimitStyle, LockStyle, MergeStyle,
    Product, ProductLattice,
};
use crate::error::Result;

use super::ansi;

const MAX_STRING: u64 = i32::MAX as u64;

/// H2 1.3.
pub fn dialect() -> Dialect {
    let mut dialect = Dialect::new("h2", "H2 1.3", Product::H2).with_version(DialectVersion::new(1, 3));
    let catalog = dialect.catalog_mut();
    ansi::register_types(catalog);
    catalog
        .replace(
            DbDataType::sized(DataType::Varchar, "VARCHAR", 1, MAX_STRING)
                .alias("CHARACTER VARYING")
                .alias("VARCHAR2")
                .literal("'", "'")
                .surrogate("CLOB"),
        )
        .register(DbDataType::new(DataType::TinyInt, "TINYINT"))
        .register(DbDataType::new(DataType::Uuid, "UUID").literal("'", "'"))
        .register(DbDataType::new(DataType::Geometry, "GEOMETRY"));

    let syntax = &mut dialect.syntax;
    syntax.limit = LimitStyle::LimitOffset;
    syntax.merge = MergeStyle::MergeKey;
    syntax.lock = LockStyle::Unsupported;
    syntax.identity = IdentityStyle::AutoIncrement;

    let features = &mut dialect.features;
    features.supports_limit = true;
    features.supports_limit_offset = true;
    features.supports_standard_offset_fetch = false;
    features.supports_catalog = true;
    features.supports_if_exists = true;
    features.supports_comment_statement = true;
    features.is_ddl_rollbackable = false;
    dialect
}

/// 1.4: `OFFSET .. FETCH` row limiting.
fn h2_1_4(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("h2_1_4", "H2 1.4", DialectVersion::new(1, 4));
    dialect.features.supports_standard_offset_fetch = true;
    dialect
}

/// 1.4.200: JSON and standard MERGE.
fn h2_1_4_200(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive(
        "h2_1_4_200",
        "H2 1.4.200",
        DialectVersion::new(1, 4).with_revision(200),
    );
    dialect
        .catalog_mut()
        .register(DbDataType::new(DataType::Json, "JSON").literal("JSON '", "'"));
    dialect.syntax.merge = MergeStyle::Merge;
    dialect
}

/// 2.x: identity columns and standard spelling by default.
fn h2_2(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("h2_2", "H2 2", DialectVersion::new(2, 0));
    dialect.syntax.identity = IdentityStyle::GeneratedByDefault;
    dialect.syntax.limit = LimitStyle::OffsetFetch;
    dialect
}

pub fn lattice() -> Result<ProductLattice> {
    let base = dialect();
    let v1_4 = h2_1_4(&base);
    let v1_4_200 = h2_1_4_200(&v1_4);
    let v2 = h2_2(&v1_4_200);

    let mut lattice = ProductLattice::new(Product::H2, "^H2", base)?;
    lattice
        .add((1, 4, 0), v1_4)?
        .add((1, 4, 200), v1_4_200)?
        .add((2, 0, 0), v2)?;
    Ok(lattice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DbObject, SqlType, Table};

    fn item() -> Table {
        Table::new("ITEM")
            .with_column(Column::new("ID").with_type(DataType::Int).not_null())
            .with_column(Column::new("NAME").with_type(DataType::Varchar).with_length(20))
            .with_primary_key(&["ID"])
    }

    #[test]
    fn test_version_bounds() {
        let lattice = lattice().unwrap();
        assert!(lattice.matches("H2"));
        assert!(!lattice.matches("MyH2Fork"));
        assert_eq!(lattice.resolve(1, 3, Some(176)).id(), "h2");
        assert_eq!(lattice.resolve(1, 4, Some(199)).id(), "h2_1_4");
        assert_eq!(lattice.resolve(1, 4, Some(200)).id(), "h2_1_4_200");
        assert_eq!(lattice.resolve(2, 2, Some(224)).id(), "h2_2");
    }

    #[test]
    fn test_merge_key() {
        let dialect = dialect();
        let table = item();
        let ops = dialect
            .sql_factory_registry()
            .create_sql(SqlType::MergeByPk, &DbObject::Table(&table))
            .unwrap();
        assert_eq!(ops.len(), 1);
        assert!(ops[0].sql.starts_with("MERGE INTO ITEM"), "{}", ops[0].sql);
        assert!(ops[0].sql.contains("KEY"), "{}", ops[0].sql);
    }

    #[test]
    fn test_limit_by_version() {
        let lattice = lattice().unwrap();
        assert_eq!(lattice.resolve(1, 3, None).limit_clause(5, Some(10)).as_deref(), Some("LIMIT 5 OFFSET 10"));
        assert_eq!(
            lattice.resolve(2, 1, None).limit_clause(5, None).as_deref(),
            Some("OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY")
        );
    }
}
