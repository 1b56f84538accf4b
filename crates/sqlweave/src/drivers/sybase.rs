//! Sybase Adaptive Server Enterprise dialects.

use crate::core::{DataType, DefaultCase, ObjectKind, QuotePair, SqlType};
use crate::dialect::catalog::LEN_1GB;
use crate::dialect::{
    AlterColumnStyle, ComputedStyle, DbDataType, Dialect, DialectVersion, DropIndexStyle,
    IdentityStyle, LimitStyle, LockStyle, MergeStyle, ProceduralStyle, Product, ProductLattice,
    SequenceStyle,
};
use crate::error::Result;
use crate::sql::factories::{CreateIndex, IndexTypePosition};
use crate::sql::registry::FactoryTable;

use super::sqlserver::register_transact_sql_types;
use super::without_sequences;

/// Column width on a 16K page server.
const MAX_CHAR: u64 = 16_296;

/// ASE 12.5.
pub fn dialect() -> Dialect {
    let mut dialect = Dialect::new("sybase", "Sybase ASE 12.5", Product::Sybase)
        .with_version(DialectVersion::new(12, 5))
        .with_layer(sybase_layer);
    let catalog = dialect.catalog_mut();
    register_transact_sql_types(catalog, MAX_CHAR, MAX_CHAR / 2);
    catalog
        .register(
            DbDataType::sized(DataType::NChar, "UNICHAR", 1, MAX_CHAR / 2)
                .default_length(1)
                .literal("'", "'"),
        )
        .register(
            DbDataType::sized(DataType::NVarchar, "UNIVARCHAR", 1, MAX_CHAR / 2)
                .default_length(1)
                .literal("'", "'")
                .surrogate("TEXT"),
        );

    let syntax = &mut dialect.syntax;
    syntax.quote = QuotePair::BRACKET;
    syntax.default_case = DefaultCase::AsIs;
    syntax.limit = LimitStyle::Top;
    syntax.merge = MergeStyle::UpdateThenInsert;
    syntax.lock = LockStyle::InMode;
    syntax.identity = IdentityStyle::Identity;
    syntax.computed = ComputedStyle::As;
    syntax.sequence = SequenceStyle::Unsupported;
    syntax.alter_column = AlterColumnStyle::ModifyColumn;
    syntax.drop_index = DropIndexStyle::TableDot;
    syntax.procedural = ProceduralStyle::LineTerminator("GO".into());
    syntax.add_column = "ADD";
    syntax.current_date = "GETDATE()".into();
    syntax.current_time = "GETDATE()".into();
    syntax.current_timestamp = "GETDATE()".into();
    syntax.index_types = vec!["CLUSTERED".into(), "NONCLUSTERED".into()];
    syntax.system_schemas = vec!["dbo".into(), "sys".into()];

    let features = &mut dialect.features;
    features.supports_top = true;
    features.supports_sequence = false;
    features.supports_merge = false;
    features.supports_with = false;
    features.supports_standard_offset_fetch = false;
    features.supports_drop_cascade = false;
    features.supports_cascade_delete = false;
    features.supports_cascade_update = false;
    features.supports_set_null = false;
    features.supports_set_default = false;
    features.supports_catalog = true;
    features.recommends_n_type_char = true;
    dialect
}

fn sybase_layer(table: &mut FactoryTable) {
    without_sequences(table);
    table.register(
        ObjectKind::Index,
        SqlType::Create,
        CreateIndex::with_type_position(IndexTypePosition::BeforeIndex),
    );
}

/// 12.5.1: DATE and TIME.
fn sybase12_5_1(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive(
        "sybase12_5_1",
        "Sybase ASE 12.5.1",
        DialectVersion::new(12, 5).with_revision(1),
    );
    dialect
        .catalog_mut()
        .register(DbDataType::new(DataType::Date, "DATE").literal("'", "'"))
        .register(DbDataType::new(DataType::Time, "TIME").literal("'", "'"));
    dialect
}

/// 15.0: BIGINT, unsigned integers and UNITEXT.
fn sybase15(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("sybase15", "Sybase ASE 15.0", DialectVersion::new(15, 0));
    dialect
        .catalog_mut()
        .register(DbDataType::new(DataType::BigInt, "BIGINT"))
        .register(DbDataType::new(DataType::USmallInt, "UNSIGNED SMALLINT"))
        .register(DbDataType::new(DataType::UInt, "UNSIGNED INT"))
        .register(DbDataType::new(DataType::UBigInt, "UNSIGNED BIGINT"))
        .register(DbDataType::bounded(DataType::LongNVarchar, "UNITEXT", LEN_1GB).literal("'", "'"))
        .register(DbDataType::bounded(DataType::NClob, "UNITEXT", LEN_1GB).literal("'", "'"));
    dialect
}

/// 15.7: MERGE.
fn sybase15_7(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("sybase15_7", "Sybase ASE 15.7", DialectVersion::new(15, 7));
    dialect.syntax.merge = MergeStyle::Merge;
    dialect.features.supports_merge = true;
    dialect
}

pub fn lattice() -> Result<ProductLattice> {
    let base = dialect();
    let v12_5_1 = sybase12_5_1(&base);
    let v15 = sybase15(&v12_5_1);
    let v15_7 = sybase15_7(&v15);

    let mut lattice = ProductLattice::new(Product::Sybase, "Adaptive Server|Sybase|^ASE", base)?;
    lattice
        .add((12, 5, 1), v12_5_1)?
        .add((15, 0, 0), v15)?
        .add((15, 7, 0), v15_7)?
        .alias((16, 0, 0), "sybase15_7")?;
    Ok(lattice)
}
