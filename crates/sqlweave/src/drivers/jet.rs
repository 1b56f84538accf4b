//! Microsoft Jet (Access) dialect.

use crate::core::{DataType, DefaultCase, QuotePair};
use crate::dialect::{
    AlterColumnStyle, DataTypeCatalog, DbDataType, Dialect, DropIndexStyle, IdentityStyle,
    LimitStyle, LockStyle, MergeStyle, Product, ProductLattice, SequenceStyle, TypeSyntax,
    ValueConverter,
};
use crate::error::Result;

use super::without_sequences;

/// Longest Jet `MEMO`.
const MAX_MEMO: u64 = 1 << 30;

pub fn dialect() -> Dialect {
    let mut dialect =
        Dialect::new("jet", Product::MsJet.display_name(), Product::MsJet).with_layer(without_sequences);
    register_types(dialect.catalog_mut());

    let syntax = &mut dialect.syntax;
    syntax.quote = QuotePair::BRACKET;
    syntax.default_case = DefaultCase::AsIs;
    syntax.limit = LimitStyle::Top;
    syntax.merge = MergeStyle::UpdateThenInsert;
    syntax.lock = LockStyle::Unsupported;
    syntax.identity = IdentityStyle::Autoincrement;
    syntax.sequence = SequenceStyle::Unsupported;
    syntax.alter_column = AlterColumnStyle::Redefine;
    syntax.drop_index = DropIndexStyle::OnTable;
    syntax.add_column = "ADD COLUMN";
    syntax.current_date = "Date()".into();
    syntax.current_time = "Time()".into();
    syntax.current_timestamp = "Now()".into();
    syntax.system_schemas = Vec::new();

    let features = &mut dialect.features;
    features.supports_top = true;
    features.supports_sequence = false;
    features.supports_merge = false;
    features.supports_with = false;
    features.supports_standard_offset_fetch = false;
    features.supports_schema = false;
    features.supports_catalog = false;
    features.supports_drop_cascade = false;
    features.supports_set_null = false;
    features.supports_set_default = false;
    features.supports_check_constraint = false;
    dialect
}

/// Jet has no 64-bit integer.
fn big_int() -> DbDataType {
    let mut entry = DbDataType::new(DataType::BigInt, "DECIMAL");
    entry.syntax = TypeSyntax::Fixed("DECIMAL(19, 0)".into());
    entry
}

fn register_types(catalog: &mut DataTypeCatalog) {
    catalog
        .register(
            DbDataType::new(DataType::Boolean, "YESNO")
                .alias("BIT")
                .converter(ValueConverter::BooleanWords),
        )
        .register(DbDataType::new(DataType::Bit, "YESNO").converter(ValueConverter::BooleanWords))
        .register(DbDataType::new(DataType::TinyInt, "BYTE"))
        .register(DbDataType::new(DataType::SmallInt, "SHORT").alias("SMALLINT"))
        .register(DbDataType::new(DataType::Int, "LONG").alias("INTEGER"))
        .register(DbDataType::new(DataType::Real, "SINGLE").alias("REAL"))
        .register(DbDataType::new(DataType::Double, "DOUBLE").alias("FLOAT"))
        .register(DbDataType::new(DataType::Float, "DOUBLE"))
        .register(DbDataType::new(DataType::Money, "CURRENCY").alias("MONEY"))
        .register(DbDataType::scaled(DataType::Decimal, "DECIMAL", 28, 28).alias("NUMERIC"))
        .register(DbDataType::scaled(DataType::Numeric, "DECIMAL", 28, 28))
        .register(big_int())
        .register(
            DbDataType::sized(DataType::Varchar, "TEXT", 1, 255)
                .alias("VARCHAR")
                .default_length(255)
                .literal("'", "'")
                .surrogate("MEMO"),
        )
        .register(
            DbDataType::sized(DataType::Char, "TEXT", 1, 255)
                .default_length(1)
                .literal("'", "'"),
        )
        .register(
            DbDataType::sized(DataType::NVarchar, "TEXT", 1, 255)
                .default_length(255)
                .literal("'", "'")
                .surrogate("MEMO"),
        )
        .register(DbDataType::bounded(DataType::LongVarchar, "MEMO", MAX_MEMO).literal("'", "'"))
        .register(DbDataType::bounded(DataType::Clob, "MEMO", MAX_MEMO).literal("'", "'"))
        .register(DbDataType::bounded(DataType::NClob, "MEMO", MAX_MEMO).literal("'", "'"))
        .register(
            DbDataType::sized(DataType::Varbinary, "BINARY", 1, 510)
                .literal("0x", "")
                .surrogate("LONGBINARY"),
        )
        .register(DbDataType::bounded(DataType::Blob, "LONGBINARY", MAX_MEMO).alias("IMAGE"))
        .register(DbDataType::new(DataType::DateTime, "DATETIME").literal("#", "#"))
        .register(DbDataType::new(DataType::Timestamp, "DATETIME").literal("#", "#"))
        .register(DbDataType::new(DataType::Date, "DATETIME").literal("#", "#"))
        .register(DbDataType::new(DataType::Uuid, "GUID").literal("{guid {", "}}"));
}

pub fn lattice() -> Result<ProductLattice> {
    ProductLattice::new(Product::MsJet, "Jet|ACCESS", dialect())
}
