//! Generic SQL:2003 dialect, answered for products no lattice claims.

use crate::core::DataType;
use crate::dialect::catalog::LEN_2GB_MINUS_1;
use crate::dialect::{DataTypeCatalog, DbDataType, Dialect, Product, ValueConverter};

/// Longest standard character/binary string most products accept.
const MAX_STRING: u64 = 32_672;

pub fn dialect() -> Dialect {
    let mut dialect = Dialect::new("ansi", "SQL:2003", Product::Ansi);
    register_types(dialect.catalog_mut());
    dialect
}

/// Standard SQL type names.
pub(crate) fn register_types(catalog: &mut DataTypeCatalog) {
    catalog
        .register(DbDataType::new(DataType::Boolean, "BOOLEAN").converter(ValueConverter::BooleanWords))
        .register(DbDataType::new(DataType::SmallInt, "SMALLINT"))
        .register(DbDataType::new(DataType::Int, "INTEGER").alias("INT"))
        .register(DbDataType::new(DataType::BigInt, "BIGINT"))
        .register(DbDataType::new(DataType::Real, "REAL"))
        .register(DbDataType::new(DataType::Float, "FLOAT"))
        .register(DbDataType::new(DataType::Double, "DOUBLE PRECISION").alias("DOUBLE"))
        .register(DbDataType::scaled(DataType::Decimal, "DECIMAL", 38, 38).alias("DEC"))
        .register(DbDataType::scaled(DataType::Numeric, "NUMERIC", 38, 38))
        .register(
            DbDataType::sized(DataType::Char, "CHAR", 1, MAX_STRING)
                .alias("CHARACTER")
                .default_length(1)
                .literal("'", "'"),
        )
        .register(
            DbDataType::sized(DataType::Varchar, "VARCHAR", 1, MAX_STRING)
                .alias("CHARACTER VARYING")
                .literal("'", "'")
                .surrogate("CLOB"),
        )
        .register(DbDataType::bounded(DataType::Clob, "CLOB", LEN_2GB_MINUS_1).literal("'", "'"))
        .register(
            DbDataType::sized(DataType::NChar, "NCHAR", 1, MAX_STRING)
                .default_length(1)
                .literal("N'", "'"),
        )
        .register(
            DbDataType::sized(DataType::NVarchar, "NVARCHAR", 1, MAX_STRING)
                .alias("NATIONAL CHARACTER VARYING")
                .literal("N'", "'")
                .surrogate("NCLOB"),
        )
        .register(DbDataType::bounded(DataType::NClob, "NCLOB", LEN_2GB_MINUS_1).literal("N'", "'"))
        .register(DbDataType::sized(DataType::Binary, "BINARY", 1, MAX_STRING).literal("X'", "'"))
        .register(
            DbDataType::sized(DataType::Varbinary, "VARBINARY", 1, MAX_STRING)
                .literal("X'", "'")
                .surrogate("BLOB"),
        )
        .register(DbDataType::bounded(DataType::Blob, "BLOB", LEN_2GB_MINUS_1).literal("X'", "'"))
        .register(DbDataType::new(DataType::Date, "DATE").literal("DATE '", "'"))
        .register(DbDataType::new(DataType::Time, "TIME").literal("TIME '", "'"))
        .register(DbDataType::new(DataType::TimeWithTimeZone, "TIME WITH TIME ZONE").literal("TIME '", "'"))
        .register(DbDataType::new(DataType::Timestamp, "TIMESTAMP").literal("TIMESTAMP '", "'"))
        .register(
            DbDataType::new(DataType::TimestampWithTimeZone, "TIMESTAMP WITH TIME ZONE")
                .literal("TIMESTAMP '", "'"),
        )
        .register(DbDataType::new(DataType::IntervalYearToMonth, "INTERVAL YEAR TO MONTH"))
        .register(DbDataType::new(DataType::IntervalDayToSecond, "INTERVAL DAY TO SECOND"))
        .register(DbDataType::new(DataType::Xml, "XML").literal("'", "'"));
}
