//! SAP HANA dialects.

use crate::core::DataType;
use crate::dialect::catalog::LEN_2GB_MINUS_1;
use crate::dialect::{
    AlterColumnStyle, DataTypeCatalog, DbDataType, Dialect, DialectVersion, LimitStyle,
    MergeStyle, Product, ProductLattice, SequenceStyle, ValueConverter,
};
use crate::error::Result;

const MAX_STRING: u64 = 5000;

/// HANA 1.0.
pub fn dialect() -> Dialect {
    let mut dialect = Dialect::new("hana", "SAP HANA", Product::Hana).with_version(DialectVersion::new(1, 0));
    register_types(dialect.catalog_mut());

    let syntax = &mut dialect.syntax;
    syntax.limit = LimitStyle::LimitOffset;
    syntax.merge = MergeStyle::UpdateThenInsert;
    syntax.sequence = SequenceStyle::DotNextval;
    syntax.alter_column = AlterColumnStyle::ModifyParen;
    syntax.add_column = "ADD";
    syntax.dual_table = Some("DUMMY".into());
    syntax.system_schemas = vec!["SYS".into(), "_SYS_BIC".into(), "_SYS_REPO".into()];

    let features = &mut dialect.features;
    features.supports_limit = true;
    features.supports_limit_offset = true;
    features.supports_merge = false;
    features.supports_standard_offset_fetch = false;
    features.supports_cascade_update = true;
    features.supports_comment_statement = true;
    features.recommends_n_type_char = true;
    dialect
}

fn register_types(catalog: &mut DataTypeCatalog) {
    catalog
        .register(DbDataType::new(DataType::Boolean, "BOOLEAN").converter(ValueConverter::BooleanWords))
        .register(DbDataType::new(DataType::TinyInt, "TINYINT"))
        .register(DbDataType::new(DataType::SmallInt, "SMALLINT"))
        .register(DbDataType::new(DataType::Int, "INTEGER").alias("INT"))
        .register(DbDataType::new(DataType::BigInt, "BIGINT"))
        .register(DbDataType::new(DataType::Real, "REAL"))
        .register(DbDataType::new(DataType::Double, "DOUBLE"))
        .register(DbDataType::new(DataType::Float, "DOUBLE"))
        .register(DbDataType::scaled(DataType::Decimal, "DECIMAL", 38, 38).alias("DEC"))
        .register(DbDataType::scaled(DataType::Numeric, "DECIMAL", 38, 38))
        .register(DbDataType::new(DataType::SmallMoney, "SMALLDECIMAL"))
        .register(
            DbDataType::sized(DataType::Varchar, "VARCHAR", 1, MAX_STRING)
                .literal("'", "'")
                .surrogate("CLOB"),
        )
        .register(
            DbDataType::sized(DataType::Char, "CHAR", 1, 2000)
                .default_length(1)
                .literal("'", "'"),
        )
        .register(DbDataType::bounded(DataType::Clob, "CLOB", LEN_2GB_MINUS_1).literal("'", "'"))
        .register(DbDataType::bounded(DataType::LongVarchar, "CLOB", LEN_2GB_MINUS_1).literal("'", "'"))
        .register(
            DbDataType::sized(DataType::NVarchar, "NVARCHAR", 1, MAX_STRING)
                .literal("N'", "'")
                .surrogate("NCLOB"),
        )
        .register(
            DbDataType::sized(DataType::NChar, "NCHAR", 1, 2000)
                .default_length(1)
                .literal("N'", "'"),
        )
        .register(DbDataType::bounded(DataType::NClob, "NCLOB", LEN_2GB_MINUS_1).literal("N'", "'"))
        .register(DbDataType::bounded(DataType::LongNVarchar, "NCLOB", LEN_2GB_MINUS_1).literal("N'", "'"))
        .register(
            DbDataType::sized(DataType::Varbinary, "VARBINARY", 1, MAX_STRING)
                .literal("X'", "'")
                .surrogate("BLOB"),
        )
        .register(DbDataType::sized(DataType::Binary, "VARBINARY", 1, MAX_STRING).literal("X'", "'"))
        .register(DbDataType::bounded(DataType::Blob, "BLOB", LEN_2GB_MINUS_1).literal("X'", "'"))
        .register(DbDataType::new(DataType::Date, "DATE").literal("DATE '", "'"))
        .register(DbDataType::new(DataType::Time, "TIME").literal("TIME '", "'"))
        .register(DbDataType::new(DataType::DateTime, "SECONDDATE").literal("TIMESTAMP '", "'"))
        .register(DbDataType::new(DataType::Timestamp, "TIMESTAMP").literal("TIMESTAMP '", "'"))
        .register(DbDataType::new(DataType::Geometry, "ST_GEOMETRY"));
}

/// HANA 2.0: MERGE INTO.
fn hana2(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("hana2", "SAP HANA 2.0", DialectVersion::new(2, 0));
    dialect.syntax.merge = MergeStyle::Merge;
    dialect.features.supports_merge = true;
    dialect
}

pub fn lattice() -> Result<ProductLattice> {
    let base = dialect();
    let v2 = hana2(&base);

    let mut lattice = ProductLattice::new(Product::Hana, "HDB|HANA", base)?;
    lattice.add((2, 0, 0), v2)?;
    Ok(lattice)
}
