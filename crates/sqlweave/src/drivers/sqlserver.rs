//! Microsoft SQL Server dialects.
//!
//! ```text
//! sqlserver (2000) ─► 2005 ─► 2008 ─► 2012 ─► 2016
//!                     │        │        │        └ DROP .. IF EXISTS
//!                     │        │        └ sequences, OFFSET/FETCH
//!                     │        └ MERGE, DATE/TIME/DATETIME2/DATETIMEOFFSET
//!                     └ (MAX) types, INCLUDE columns, CTEs
//! ```

use crate::core::{DataType, DefaultCase, ObjectKind, QuotePair, SqlType};
use crate::dialect::catalog::{LEN_1GB, LEN_2GB_MINUS_1};
use crate::dialect::{
    AlterColumnStyle, ComputedStyle, DataTypeCatalog, DbDataType, DefaultStyle, Dialect,
    DialectVersion, DropIndexStyle, IdentityStyle, LimitStyle, LockStyle, MergeStyle, ProceduralStyle, Product, ProductLattice,
    SequenceStyle, ValueConverter,
};
use crate::error::Result;
use crate::sql::factories::{CreateIndex, IndexTypePosition};
use crate::sql::registry::FactoryTable;

use super::{with_sequences, without_sequences};

/// SQL Server 2000.
pub fn dialect() -> Dialect {
    let mut dialect = Dialect::new("sqlserver", "SQL Server 2000", Product::SqlServer)
        .with_version(DialectVersion::new(8, 0))
        .with_layer(sqlserver_layer);
    let catalog = dialect.catalog_mut();
    register_transact_sql_types(catalog, 8000, 4000);
    catalog
        .register(DbDataType::new(DataType::BigInt, "BIGINT"))
        .register(
            DbDataType::bounded(DataType::LongNVarchar, "NTEXT", LEN_1GB).literal("N'", "'"),
        )
        .register(DbDataType::bounded(DataType::NClob, "NTEXT", LEN_1GB).literal("N'", "'"))
        .register(DbDataType::new(DataType::Uuid, "UNIQUEIDENTIFIER").literal("'", "'"));
    if let Some(nvarchar) = catalog.get("NVARCHAR").cloned() {
        catalog.replace(nvarchar.surrogate("NTEXT"));
    }

    let syntax = &mut dialect.syntax;
    syntax.quote = QuotePair::BRACKET;
    syntax.default_case = DefaultCase::AsIs;
    syntax.limit = LimitStyle::Top;
    syntax.merge = MergeStyle::UpdateThenInsert;
    syntax.lock = LockStyle::TableLockHint;
    syntax.identity = IdentityStyle::IdentitySeed;
    syntax.default = DefaultStyle::NamedConstraint;
    syntax.computed = ComputedStyle::As;
    syntax.sequence = SequenceStyle::Unsupported;
    syntax.alter_column = AlterColumnStyle::Redefine;
    syntax.drop_index = DropIndexStyle::TableDot;
    syntax.procedural = ProceduralStyle::LineTerminator("GO".into());
    syntax.add_column = "ADD";
    syntax.current_date = "GETDATE()".into();
    syntax.current_time = "GETDATE()".into();
    syntax.index_types = vec!["CLUSTERED".into(), "NONCLUSTERED".into()];
    syntax.system_schemas = vec!["INFORMATION_SCHEMA".into(), "sys".into(), "guest".into()];

    let features = &mut dialect.features;
    features.supports_top = true;
    features.supports_sequence = false;
    features.supports_merge = false;
    features.supports_with = false;
    features.supports_standard_offset_fetch = false;
    features.supports_drop_cascade = false;
    features.supports_catalog = true;
    features.is_ddl_rollbackable = true;
    features.recommends_n_type_char = true;
    dialect
}

fn sqlserver_layer(table: &mut FactoryTable) {
    without_sequences(table);
    table.register(
        ObjectKind::Index,
        SqlType::Create,
        CreateIndex::with_type_position(IndexTypePosition::BeforeIndex),
    );
}

/// Types shared by the Transact-SQL products (SQL Server and Sybase ASE).
pub(crate) fn register_transact_sql_types(catalog: &mut DataTypeCatalog, max_char: u64, max_nchar: u64) {
    catalog
        .register(DbDataType::new(DataType::Bit, "BIT").converter(ValueConverter::BooleanDigits))
        .register(DbDataType::new(DataType::Boolean, "BIT").converter(ValueConverter::BooleanDigits))
        .register(DbDataType::new(DataType::TinyInt, "TINYINT"))
        .register(DbDataType::new(DataType::UTinyInt, "TINYINT"))
        .register(DbDataType::new(DataType::SmallInt, "SMALLINT"))
        .register(DbDataType::new(DataType::Int, "INT").alias("INTEGER"))
        .register(DbDataType::new(DataType::Real, "REAL"))
        .register(DbDataType::new(DataType::Double, "FLOAT").alias("DOUBLE PRECISION"))
        .register(DbDataType::new(DataType::Float, "FLOAT"))
        .register(DbDataType::scaled(DataType::Decimal, "DECIMAL", 38, 38).alias("DEC"))
        .register(DbDataType::scaled(DataType::Numeric, "NUMERIC", 38, 38))
        .register(DbDataType::new(DataType::SmallMoney, "SMALLMONEY"))
        .register(DbDataType::new(DataType::Money, "MONEY"))
        .register(
            DbDataType::sized(DataType::Char, "CHAR", 1, max_char)
                .default_length(1)
                .literal("'", "'"),
        )
        .register(
            DbDataType::sized(DataType::Varchar, "VARCHAR", 1, max_char)
                .default_length(1)
                .literal("'", "'")
                .surrogate("TEXT"),
        )
        .register(DbDataType::bounded(DataType::LongVarchar, "TEXT", LEN_2GB_MINUS_1).literal("'", "'"))
        .register(DbDataType::bounded(DataType::Clob, "TEXT", LEN_2GB_MINUS_1).literal("'", "'"))
        .register(
            DbDataType::sized(DataType::NChar, "NCHAR", 1, max_nchar)
                .default_length(1)
                .literal("N'", "'"),
        )
        .register(
            DbDataType::sized(DataType::NVarchar, "NVARCHAR", 1, max_nchar)
                .default_length(1)
                .literal("N'", "'")
                .surrogate("TEXT"),
        )
        .register(
            DbDataType::sized(DataType::Binary, "BINARY", 1, max_char)
                .default_length(1)
                .literal("0x", ""),
        )
        .register(
            DbDataType::sized(DataType::Varbinary, "VARBINARY", 1, max_char)
                .default_length(1)
                .literal("0x", "")
                .surrogate("IMAGE"),
        )
        .register(DbDataType::bounded(DataType::LongVarbinary, "IMAGE", LEN_2GB_MINUS_1).literal("0x", ""))
        .register(DbDataType::bounded(DataType::Blob, "IMAGE", LEN_2GB_MINUS_1).literal("0x", ""))
        .register(DbDataType::new(DataType::SmallDateTime, "SMALLDATETIME").literal("'", "'"))
        .register(DbDataType::new(DataType::DateTime, "DATETIME").literal("'", "'"))
        .register(DbDataType::new(DataType::Timestamp, "DATETIME").literal("'", "'"));
}

/// An unsized entry spelled `NAME(MAX)` that plain (size-less) lookups pick.
fn max_type(data_type: DataType, name: &str, max: u64) -> DbDataType {
    let mut entry = DbDataType::max_of(data_type, name, &format!("{}(MAX)", name), max);
    entry.oversize = false;
    entry
}

/// 2005: `(MAX)` types, XML, INCLUDE columns and CTEs.
fn sqlserver2005(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("sqlserver2005", "SQL Server 2005", DialectVersion::new(9, 0));
    let legacy: Vec<DbDataType> = ["TEXT", "NTEXT", "IMAGE"]
        .iter()
        .flat_map(|name| dialect.catalog().by_name(name))
        .cloned()
        .collect();
    let catalog = dialect.catalog_mut();
    catalog.remove("TEXT").remove("NTEXT").remove("IMAGE");
    catalog
        .register(DbDataType::max_of(DataType::Varchar, "VARCHAR", "VARCHAR(MAX)", LEN_2GB_MINUS_1).literal("'", "'"))
        .register(max_type(DataType::LongVarchar, "VARCHAR", LEN_2GB_MINUS_1).literal("'", "'"))
        .register(max_type(DataType::Clob, "VARCHAR", LEN_2GB_MINUS_1).literal("'", "'"))
        .register(DbDataType::max_of(DataType::NVarchar, "NVARCHAR", "NVARCHAR(MAX)", LEN_1GB).literal("N'", "'"))
        .register(max_type(DataType::LongNVarchar, "NVARCHAR", LEN_1GB).literal("N'", "'"))
        .register(max_type(DataType::NClob, "NVARCHAR", LEN_1GB).literal("N'", "'"))
        .register(DbDataType::max_of(DataType::Varbinary, "VARBINARY", "VARBINARY(MAX)", LEN_2GB_MINUS_1).literal("0x", ""))
        .register(max_type(DataType::LongVarbinary, "VARBINARY", LEN_2GB_MINUS_1).literal("0x", ""))
        .register(max_type(DataType::Blob, "VARBINARY", LEN_2GB_MINUS_1).literal("0x", ""));
    for entry in legacy {
        catalog.register(entry);
    }
    catalog.register(DbDataType::new(DataType::Xml, "XML").literal("N'", "'"));

    dialect.syntax.drop_index = DropIndexStyle::OnTable;
    dialect.features.supports_with = true;
    dialect.features.supports_index_include = true;
    dialect
}

/// 2008: MERGE and the new temporal types.
fn sqlserver2008(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("sqlserver2008", "SQL Server 2008", DialectVersion::new(10, 0));
    dialect
        .catalog_mut()
        .retain(|e| !(e.data_type == DataType::Timestamp && e.name == "DATETIME"))
        .register(DbDataType::new(DataType::Date, "DATE").literal("'", "'"))
        .register(DbDataType::sized(DataType::Time, "TIME", 0, 7).literal("'", "'"))
        .register(DbDataType::sized(DataType::Timestamp, "DATETIME2", 0, 7).literal("'", "'"))
        .register(
            DbDataType::sized(DataType::TimestampWithTimeZone, "DATETIMEOFFSET", 0, 7).literal("'", "'"),
        )
        .register(DbDataType::new(DataType::Geometry, "GEOMETRY"));

    dialect.syntax.merge = MergeStyle::Merge;
    dialect.syntax.current_date = "CAST(GETDATE() AS DATE)".into();
    dialect.syntax.current_time = "CAST(GETDATE() AS TIME)".into();
    dialect.features.supports_merge = true;
    dialect
}

/// 2012: sequences and OFFSET/FETCH.
fn sqlserver2012(parent: &Dialect) -> Dialect {
    let mut dialect = parent
        .derive("sqlserver2012", "SQL Server 2012", DialectVersion::new(11, 0))
        .with_layer(with_sequences);
    dialect.syntax.sequence = SequenceStyle::NextValueFor;
    dialect.syntax.limit = LimitStyle::OffsetFetch;
    dialect.features.supports_sequence = true;
    dialect.features.supports_standard_offset_fetch = true;
    dialect
}

/// 2016: `DROP .. IF EXISTS`.
fn sqlserver2016(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("sqlserver2016", "SQL Server 2016", DialectVersion::new(13, 0));
    dialect.features.supports_if_exists = true;
    dialect
}

pub fn lattice() -> Result<ProductLattice> {
    let base = dialect();
    let v2005 = sqlserver2005(&base);
    let v2008 = sqlserver2008(&v2005);
    let v2012 = sqlserver2012(&v2008);
    let v2016 = sqlserver2016(&v2012);

    let mut lattice = ProductLattice::new(Product::SqlServer, "SQL ?Server", base)?;
    lattice
        .add((9, 0, 0), v2005)?
        .add((10, 0, 0), v2008)?
        .add((11, 0, 0), v2012)?
        .alias((12, 0, 0), "sqlserver2012")?
        .add((13, 0, 0), v2016)?
        .alias((14, 0, 0), "sqlserver2016")?
        .alias((15, 0, 0), "sqlserver2016")?
        .alias((16, 0, 0), "sqlserver2016")?;
    Ok(lattice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DbObject, Index, Table};
    use crate::dialect::{Resolution, SizeRequest};
    use pretty_assertions::assert_eq;

    fn type_sql(dialect: &Dialect, data_type: DataType, length: Option<u64>) -> String {
        let mut column = Column::new("c").with_type(data_type);
        column.length = length;
        dialect.column_type_sql(&column)
    }

    #[test]
    fn test_version_bounds() {
        let lattice = lattice().unwrap();
        assert_eq!(lattice.resolve(8, 0, Some(2039)).id(), "sqlserver");
        assert_eq!(lattice.resolve(9, 0, None).id(), "sqlserver2005");
        assert_eq!(lattice.resolve(10, 50, Some(1600)).id(), "sqlserver2008");
        assert_eq!(lattice.resolve(12, 0, None).id(), "sqlserver2012");
        assert_eq!(lattice.resolve(15, 0, Some(2000)).id(), "sqlserver2016");
        assert!(lattice.matches("Microsoft SQL Server"));
    }

    #[test]
    fn test_max_types() {
        let lattice = lattice().unwrap();
        let v2000 = lattice.resolve(8, 0, None);
        let v2005 = lattice.resolve(9, 0, None);
        assert_eq!(type_sql(v2000, DataType::Varchar, Some(10_000)), "TEXT");
        assert_eq!(type_sql(v2005, DataType::Varchar, Some(100)), "VARCHAR(100)");
        assert_eq!(type_sql(v2005, DataType::Varchar, Some(10_000)), "VARCHAR(MAX)");
        assert_eq!(type_sql(v2005, DataType::NVarchar, Some(4001)), "NVARCHAR(MAX)");
        assert_eq!(type_sql(v2005, DataType::LongVarchar, None), "VARCHAR(MAX)");
        assert_eq!(type_sql(v2005, DataType::NClob, None), "NVARCHAR(MAX)");
        match v2005.matcher().resolve(Some("NVARCHAR"), None, SizeRequest::Max) {
            Resolution::Found(entry) => assert_eq!(entry.max_length, Some(LEN_1GB)),
            other => panic!("unexpected {:?}", other),
        }
        assert!(v2005.catalog().get("NTEXT").is_some());
    }

    #[test]
    fn test_temporal_types_by_version() {
        let lattice = lattice().unwrap();
        let v2005 = lattice.resolve(9, 0, None);
        let v2008 = lattice.resolve(10, 0, None);
        assert_eq!(type_sql(v2005, DataType::Timestamp, None), "DATETIME");
        assert_eq!(type_sql(v2008, DataType::Timestamp, None), "DATETIME2");
        assert_eq!(type_sql(v2008, DataType::DateTime, None), "DATETIME");
        assert_eq!(type_sql(v2008, DataType::Date, None), "DATE");
    }

    #[test]
    fn test_clustered_index_with_include() {
        let lattice = lattice().unwrap();
        let table = Table::new("orders").with_schema("dbo");
        let index = Index {
            name: "ix_orders_date".into(),
            columns: vec!["order_date".into()],
            index_type: Some("NONCLUSTERED".into()),
            includes: vec!["total".into()],
            ..Default::default()
        };
        let object = DbObject::Index(&table, &index);

        let ops = lattice.resolve(8, 0, None).sql_factory_registry().create_sql(SqlType::Create, &object).unwrap();
        assert_eq!(ops[0].sql, "CREATE NONCLUSTERED INDEX ix_orders_date ON dbo.orders (order_date)");

        let ops = lattice.resolve(9, 0, None).sql_factory_registry().create_sql(SqlType::Create, &object).unwrap();
        assert_eq!(
            ops[0].sql,
            "CREATE NONCLUSTERED INDEX ix_orders_date ON dbo.orders (order_date) INCLUDE (total)"
        );
    }

    #[test]
    fn test_merge_and_sequences_by_version() {
        let lattice = lattice().unwrap();
        let table = Table::new("item")
            .with_column(Column::new("id").with_type(DataType::Int).not_null())
            .with_column(Column::new("qty").with_type(DataType::Int))
            .with_primary_key(&["id"]);
        let object = DbObject::Table(&table);
        let v2005 = lattice.resolve(9, 0, None).sql_factory_registry();
        assert_eq!(v2005.create_sql(SqlType::MergeByPk, &object).unwrap().len(), 2);
        let v2008 = lattice.resolve(10, 0, None).sql_factory_registry();
        let ops = v2008.create_sql(SqlType::MergeByPk, &object).unwrap();
        assert!(ops[0].sql.starts_with("MERGE INTO item"));

        assert!(!v2008.contains(ObjectKind::Sequence, SqlType::Create));
        let v2012 = lattice.resolve(11, 0, None).sql_factory_registry();
        assert!(v2012.contains(ObjectKind::Sequence, SqlType::Create));
    }
}
