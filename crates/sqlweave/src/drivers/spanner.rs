//! Cloud Spanner (GoogleSQL) dialect.

use crate::core::{DataType, DefaultCase, QuotePair};
use crate::dialect::{
    AlterColumnStyle, DataTypeCatalog, DbDataType, Dialect, IdentityStyle, LimitStyle, LockStyle,
    MergeStyle, Product, ProductLattice, SequenceStyle, ValueConverter,
};
use crate::error::Result;

use super::without_sequences;

/// Characters in a sized `STRING`.
const MAX_STRING: u64 = 2_621_440;
/// Bytes in one cell.
const MAX_CELL: u64 = 10 * 1024 * 1024;

pub fn dialect() -> Dialect {
    let mut dialect = Dialect::new("spanner", "Cloud Spanner", Product::Spanner).with_layer(without_sequences);
    register_types(dialect.catalog_mut());

    let syntax = &mut dialect.syntax;
    syntax.quote = QuotePair::BACKTICK;
    syntax.default_case = DefaultCase::AsIs;
    syntax.limit = LimitStyle::LimitOffset;
    syntax.merge = MergeStyle::UpdateThenInsert;
    syntax.lock = LockStyle::Unsupported;
    syntax.identity = IdentityStyle::Unsupported;
    syntax.sequence = SequenceStyle::Unsupported;
    syntax.alter_column = AlterColumnStyle::Redefine;
    syntax.backslash_escapes = true;
    syntax.system_schemas = vec!["INFORMATION_SCHEMA".into(), "SPANNER_SYS".into()];

    let features = &mut dialect.features;
    features.supports_limit = true;
    features.supports_limit_offset = true;
    features.supports_identity = false;
    features.supports_sequence = false;
    features.supports_merge = false;
    features.supports_standard_offset_fetch = false;
    features.supports_schema = false;
    features.supports_drop_cascade = false;
    features.supports_cascade_update = false;
    features.supports_set_null = false;
    features.supports_set_default = false;
    features.is_ddl_rollbackable = false;
    dialect
}

/// A `NAME(MAX)` entry plain lookups pick.
fn max_type(data_type: DataType, name: &str, max: u64) -> DbDataType {
    let mut entry = DbDataType::max_of(data_type, name, &format!("{}(MAX)", name), max);
    entry.oversize = false;
    entry
}

fn register_types(catalog: &mut DataTypeCatalog) {
    catalog
        .register(DbDataType::new(DataType::Boolean, "BOOL").converter(ValueConverter::BooleanWords))
        .register(DbDataType::new(DataType::BigInt, "INT64"))
        .register(DbDataType::new(DataType::Int, "INT64"))
        .register(DbDataType::new(DataType::SmallInt, "INT64"))
        .register(DbDataType::new(DataType::TinyInt, "INT64"))
        .register(DbDataType::new(DataType::Double, "FLOAT64"))
        .register(DbDataType::new(DataType::Float, "FLOAT64"))
        .register(DbDataType::new(DataType::Real, "FLOAT32"))
        .register(DbDataType::new(DataType::Numeric, "NUMERIC"))
        .register(DbDataType::new(DataType::Decimal, "NUMERIC"))
        .register(
            DbDataType::sized(DataType::Varchar, "STRING", 1, MAX_STRING)
                .default_length(MAX_STRING)
                .literal("'", "'"),
        )
        .register(DbDataType::max_of(DataType::Varchar, "STRING", "STRING(MAX)", MAX_CELL).literal("'", "'"))
        .register(DbDataType::sized(DataType::Char, "STRING", 1, MAX_STRING).literal("'", "'"))
        .register(DbDataType::sized(DataType::NVarchar, "STRING", 1, MAX_STRING).literal("'", "'"))
        .register(DbDataType::max_of(DataType::NVarchar, "STRING", "STRING(MAX)", MAX_CELL).literal("'", "'"))
        .register(max_type(DataType::Clob, "STRING", MAX_CELL).literal("'", "'"))
        .register(max_type(DataType::LongVarchar, "STRING", MAX_CELL).literal("'", "'"))
        .register(max_type(DataType::NClob, "STRING", MAX_CELL).literal("'", "'"))
        .register(
            DbDataType::sized(DataType::Varbinary, "BYTES", 1, MAX_CELL)
                .default_length(MAX_CELL)
                .literal("B'", "'"),
        )
        .register(DbDataType::max_of(DataType::Varbinary, "BYTES", "BYTES(MAX)", MAX_CELL).literal("B'", "'"))
        .register(max_type(DataType::Blob, "BYTES", MAX_CELL).literal("B'", "'"))
        .register(DbDataType::new(DataType::Date, "DATE").literal("DATE '", "'"))
        .register(DbDataType::new(DataType::Timestamp, "TIMESTAMP").literal("TIMESTAMP '", "'"))
        .register(DbDataType::new(DataType::DateTime, "TIMESTAMP").literal("TIMESTAMP '", "'"))
        .register(DbDataType::new(DataType::Json, "JSON").literal("JSON '", "'"));
}

pub fn lattice() -> Result<ProductLattice> {
    ProductLattice::new(Product::Spanner, "Spanner", dialect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Column;
    use crate::dialect::SizeRequest;

    #[test]
    fn test_string_sizes() {
        let dialect = dialect();
        let short = Column::new("name").with_type(DataType::Varchar).with_length(64);
        assert_eq!(dialect.column_type_sql(&short), "STRING(64)");
        let long = Column::new("body").with_type(DataType::Varchar).with_length(MAX_STRING + 1);
        assert_eq!(dialect.column_type_sql(&long), "STRING(MAX)");
        let clob = Column::new("doc").with_type(DataType::Clob);
        assert_eq!(dialect.column_type_sql(&clob), "STRING(MAX)");
        let resolved = dialect.matcher().resolve(Some("STRING"), None, SizeRequest::Max);
        assert!(matches!(resolved, crate::dialect::Resolution::Found(e) if e.oversize));
    }

    #[test]
    fn test_backtick_quoting() {
        let dialect = dialect();
        assert_eq!(dialect.quote("order"), "`order`");
        assert_eq!(dialect.sequence_next_value("s"), None);
        assert!(lattice().unwrap().matches("Google Cloud Spanner"));
    }
}
