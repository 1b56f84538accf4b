//! PostgreSQL dialects.

use crate::core::{DataType, DefaultCase, ObjectKind, SqlType};
use crate::dialect::catalog::LEN_1GB;
use crate::dialect::{
    AlterColumnStyle, ComputedStyle, DataTypeCatalog, DbDataType, Dialect, DialectVersion,
    IdentityStyle, LimitStyle, MergeStyle, Product, ProductLattice, SequenceStyle, ValueConverter,
};
use crate::error::Result;
use crate::sql::factories::{CreateIndex, IndexTypePosition};
use crate::sql::registry::FactoryTable;

/// Largest declared `VARCHAR`/`CHAR` length.
const MAX_VARCHAR: u64 = 10_485_760;

/// PostgreSQL before 9.5.
pub fn dialect() -> Dialect {
    let mut dialect = Dialect::new("postgres", "PostgreSQL", Product::PostgreSql)
        .with_version(DialectVersion::new(8, 0))
        .with_layer(postgres_layer);
    register_types(dialect.catalog_mut());

    let syntax = &mut dialect.syntax;
    syntax.default_case = DefaultCase::LowerCase;
    syntax.limit = LimitStyle::LimitOffset;
    syntax.merge = MergeStyle::UpdateThenInsert;
    syntax.identity = IdentityStyle::Unsupported;
    syntax.sequence = SequenceStyle::Nextval;
    syntax.alter_column = AlterColumnStyle::AlterType;
    syntax.computed = ComputedStyle::GeneratedStored;
    syntax.dollar_quotes = true;
    syntax.nested_comments = true;
    syntax.index_types = ["BTREE", "HASH", "GIST", "GIN", "SPGIST", "BRIN"]
        .into_iter()
        .map(String::from)
        .collect();
    syntax.system_schemas = vec!["information_schema".into(), "pg_catalog".into()];

    let features = &mut dialect.features;
    features.supports_limit = true;
    features.supports_limit_offset = true;
    features.supports_identity = false;
    features.supports_merge = false;
    features.supports_domain = true;
    features.supports_if_exists = true;
    features.supports_comment_statement = true;
    features.is_ddl_rollbackable = true;
    dialect
}

fn postgres_layer(table: &mut FactoryTable) {
    table.register(
        ObjectKind::Index,
        SqlType::Create,
        CreateIndex::with_type_position(IndexTypePosition::AfterTable),
    );
}

fn register_types(catalog: &mut DataTypeCatalog) {
    catalog
        .register(
            DbDataType::new(DataType::Boolean, "BOOLEAN")
                .alias("BOOL")
                .converter(ValueConverter::BooleanWords),
        )
        .register(DbDataType::new(DataType::SmallInt, "SMALLINT").alias("INT2"))
        .register(DbDataType::new(DataType::Int, "INTEGER").alias("INT").alias("INT4"))
        .register(DbDataType::new(DataType::BigInt, "BIGINT").alias("INT8"))
        .register(DbDataType::new(DataType::Real, "REAL").alias("FLOAT4"))
        .register(DbDataType::new(DataType::Double, "DOUBLE PRECISION").alias("FLOAT8"))
        .register(DbDataType::new(DataType::Float, "DOUBLE PRECISION").alias("FLOAT"))
        .register(DbDataType::scaled(DataType::Numeric, "NUMERIC", 1000, 1000))
        .register(DbDataType::scaled(DataType::Decimal, "DECIMAL", 1000, 1000))
        .register(DbDataType::new(DataType::Money, "MONEY"))
        .register(
            DbDataType::sized(DataType::Char, "CHAR", 1, MAX_VARCHAR)
                .alias("CHARACTER")
                .alias("BPCHAR")
                .default_length(1)
                .literal("'", "'"),
        )
        .register(
            DbDataType::sized(DataType::Varchar, "VARCHAR", 1, MAX_VARCHAR)
                .alias("CHARACTER VARYING")
                .literal("'", "'")
                .surrogate("TEXT"),
        )
        .register(DbDataType::bounded(DataType::LongVarchar, "TEXT", LEN_1GB).literal("'", "'"))
        .register(DbDataType::bounded(DataType::Clob, "TEXT", LEN_1GB).literal("'", "'"))
        .register(DbDataType::sized(DataType::NChar, "CHAR", 1, MAX_VARCHAR).literal("'", "'"))
        .register(
            DbDataType::sized(DataType::NVarchar, "VARCHAR", 1, MAX_VARCHAR)
                .literal("'", "'")
                .surrogate("TEXT"),
        )
        .register(DbDataType::bounded(DataType::NClob, "TEXT", LEN_1GB).literal("'", "'"))
        .register(DbDataType::bounded(DataType::Varbinary, "BYTEA", LEN_1GB).literal("'\\x", "'"))
        .register(DbDataType::bounded(DataType::Binary, "BYTEA", LEN_1GB).literal("'\\x", "'"))
        .register(DbDataType::bounded(DataType::Blob, "BYTEA", LEN_1GB).literal("'\\x", "'"))
        .register(DbDataType::new(DataType::Date, "DATE").literal("DATE '", "'"))
        .register(DbDataType::new(DataType::Time, "TIME").literal("TIME '", "'"))
        .register(
            DbDataType::new(DataType::TimeWithTimeZone, "TIME WITH TIME ZONE")
                .alias("TIMETZ")
                .literal("TIME WITH TIME ZONE '", "'"),
        )
        .register(DbDataType::new(DataType::Timestamp, "TIMESTAMP").literal("TIMESTAMP '", "'"))
        .register(
            DbDataType::new(DataType::TimestampWithTimeZone, "TIMESTAMP WITH TIME ZONE")
                .alias("TIMESTAMPTZ")
                .literal("TIMESTAMP WITH TIME ZONE '", "'"),
        )
        .register(DbDataType::new(DataType::IntervalYearToMonth, "INTERVAL YEAR TO MONTH"))
        .register(DbDataType::new(DataType::IntervalDayToSecond, "INTERVAL DAY TO SECOND"))
        .register(DbDataType::new(DataType::Uuid, "UUID").literal("'", "'::uuid"))
        .register(DbDataType::new(DataType::Json, "JSONB").literal("'", "'::jsonb"))
        .register(DbDataType::new(DataType::Json, "JSON").literal("'", "'::json"))
        .register(DbDataType::new(DataType::Xml, "XML").literal("XMLPARSE(DOCUMENT '", "')"))
        .register(DbDataType::new(DataType::Geometry, "GEOMETRY"));
}

/// 9.5: `INSERT .. ON CONFLICT`.
fn postgres9_5(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("postgres9_5", "PostgreSQL 9.5", DialectVersion::new(9, 5));
    dialect.syntax.merge = MergeStyle::OnConflict;
    dialect
}

/// 10: identity columns.
fn postgres10(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("postgres10", "PostgreSQL 10", DialectVersion::new(10, 0));
    dialect.syntax.identity = IdentityStyle::GeneratedByDefault;
    dialect.features.supports_identity = true;
    dialect
}

/// 11: covering indexes.
fn postgres11(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("postgres11", "PostgreSQL 11", DialectVersion::new(11, 0));
    dialect.features.supports_index_include = true;
    dialect
}

/// 15: the MERGE statement.
fn postgres15(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("postgres15", "PostgreSQL 15", DialectVersion::new(15, 0));
    dialect.features.supports_merge = true;
    dialect
}

pub fn lattice() -> Result<ProductLattice> {
    let base = dialect();
    let v9_5 = postgres9_5(&base);
    let v10 = postgres10(&v9_5);
    let v11 = postgres11(&v10);
    let v15 = postgres15(&v11);

    let mut lattice = ProductLattice::new(Product::PostgreSql, "PostgreSQL|Postgres", base)?;
    lattice
        .add((9, 5, 0), v9_5)?
        .add((10, 0, 0), v10)?
        .add((11, 0, 0), v11)?
        .alias((12, 0, 0), "postgres11")?
        .alias((13, 0, 0), "postgres11")?
        .alias((14, 0, 0), "postgres11")?
        .add((15, 0, 0), v15)?
        .alias((16, 0, 0), "postgres15")?
        .alias((17, 0, 0), "postgres15")?;
    Ok(lattice)
}
