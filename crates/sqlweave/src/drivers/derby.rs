//! Apache Derby dialects.

use crate::core::DataType;
use crate::dialect::catalog::LEN_2GB_MINUS_1;
use crate::dialect::{
    DataTypeCatalog, DbDataType, Dialect, DialectVersion, LimitStyle, MergeStyle, Product,
    ProductLattice, SequenceStyle, ValueConverter,
};
use crate::error::Result;

use super::{with_sequences, without_sequences};

const MAX_STRING: u64 = 32_672;

/// Derby 10.0 to 10.4.
pub fn dialect() -> Dialect {
    let mut dialect = Dialect::new("derby", "Apache Derby", Product::Derby)
        .with_version(DialectVersion::new(10, 0))
        .with_layer(without_sequences);
    register_types(dialect.catalog_mut());

    let syntax = &mut dialect.syntax;
    syntax.limit = LimitStyle::Unsupported;
    syntax.merge = MergeStyle::UpdateThenInsert;
    syntax.sequence = SequenceStyle::Unsupported;
    syntax.dual_table = Some("SYSIBM.SYSDUMMY1".into());
    syntax.system_schemas = ["SYS", "SYSIBM", "SYSCS_DIAG", "SYSCS_UTIL", "SYSFUN", "SYSPROC", "SYSSTAT"]
        .into_iter()
        .map(String::from)
        .collect();

    let features = &mut dialect.features;
    features.supports_sequence = false;
    features.supports_merge = false;
    features.supports_with = false;
    features.supports_standard_offset_fetch = false;
    features.supports_drop_cascade = false;
    features.supports_cascade_update = false;
    features.supports_set_default = false;
    features.supports_if_exists = false;
    features.is_ddl_rollbackable = true;
    dialect
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
        .register(DbDataType::new(DataType::Double, "DOUBLE").alias("DOUBLE PRECISION"))
        .register(DbDataType::scaled(DataType::Decimal, "DECIMAL", 31, 31).alias("DEC"))
        .register(DbDataType::scaled(DataType::Numeric, "NUMERIC", 31, 31))
        .register(
            DbDataType::sized(DataType::Char, "CHAR", 1, 254)
                .default_length(1)
                .literal("'", "'"),
        )
        .register(
            DbDataType::sized(DataType::Varchar, "VARCHAR", 1, MAX_STRING)
                .literal("'", "'")
                .surrogate("CLOB"),
        )
        .register(DbDataType::bounded(DataType::LongVarchar, "LONG VARCHAR", MAX_STRING).literal("'", "'"))
        .register(DbDataType::bounded(DataType::Clob, "CLOB", LEN_2GB_MINUS_1).literal("'", "'"))
        .register(DbDataType::sized(DataType::NChar, "CHAR", 1, 254).literal("'", "'"))
        .register(
            DbDataType::sized(DataType::NVarchar, "VARCHAR", 1, MAX_STRING)
                .literal("'", "'")
                .surrogate("CLOB"),
        )
        .register(DbDataType::bounded(DataType::NClob, "CLOB", LEN_2GB_MINUS_1).literal("'", "'"))
        .register(DbDataType::bounded(DataType::Blob, "BLOB", LEN_2GB_MINUS_1).literal("X'", "'"))
        .register(DbDataType::bounded(DataType::Varbinary, "BLOB", LEN_2GB_MINUS_1).literal("X'", "'"))
        .register(DbDataType::bounded(DataType::Binary, "BLOB", LEN_2GB_MINUS_1).literal("X'", "'"))
        .register(DbDataType::new(DataType::Date, "DATE").literal("DATE('", "')"))
        .register(DbDataType::new(DataType::Time, "TIME").literal("TIME('", "')"))
        .register(DbDataType::new(DataType::Timestamp, "TIMESTAMP").literal("TIMESTAMP('", "')"))
        .register(DbDataType::new(DataType::DateTime, "TIMESTAMP").literal("TIMESTAMP('", "')"))
        .register(DbDataType::new(DataType::Xml, "XML"));
}

/// 10.5: `OFFSET .. FETCH`.
fn derby10_5(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("derby10_5", "Apache Derby 10.5", DialectVersion::new(10, 5));
    dialect.syntax.limit = LimitStyle::OffsetFetch;
    dialect.features.supports_standard_offset_fetch = true;
    dialect
}

/// 10.6: sequences.
fn derby10_6(parent: &Dialect) -> Dialect {
    let mut dialect = parent
        .derive("derby10_6", "Apache Derby 10.6", DialectVersion::new(10, 6))
        .with_layer(with_sequences);
    dialect.syntax.sequence = SequenceStyle::NextValueFor;
    dialect.features.supports_sequence = true;
    dialect
}

/// 10.7: BOOLEAN.
fn derby10_7(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("derby10_7", "Apache Derby 10.7", DialectVersion::new(10, 7));
    dialect
        .catalog_mut()
        .retain(|e| e.data_type != DataType::Boolean)
        .register(DbDataType::new(DataType::Boolean, "BOOLEAN").converter(ValueConverter::BooleanWords));
    dialect
}

/// 10.11: MERGE.
fn derby10_11(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("derby10_11", "Apache Derby 10.11", DialectVersion::new(10, 11));
    dialect.syntax.merge = MergeStyle::Merge;
    dialect.features.supports_merge = true;
    dialect
}

pub fn lattice() -> Result<ProductLattice> {
    let base = dialect();
    let v10_5 = derby10_5(&base);
    let v10_6 = derby10_6(&v10_5);
    let v10_7 = derby10_7(&v10_6);
    let v10_11 = derby10_11(&v10_7);

    let mut lattice = ProductLattice::new(Product::Derby, "Derby", base)?;
    lattice
        .add((10, 5, 0), v10_5)?
        .add((10, 6, 0), v10_6)?
        .add((10, 7, 0), v10_7)?
        .add((10, 11, 0), v10_11)?;
    Ok(lattice)
}
