//! MySQL dialects.

use crate::core::{DataType, DefaultCase, ObjectKind, QuotePair, SqlType};
use crate::dialect::catalog::LEN_4GB_MINUS_1;
use crate::dialect::{
    AlterColumnStyle, DataTypeCatalog, DbDataType, Dialect, DialectVersion, DropConstraintStyle,
    DropIndexStyle, IdentityStyle, LimitStyle, LockStyle, MergeStyle, ProceduralStyle, Product,
    ProductLattice, SequenceStyle, ValueConverter,
};
use crate::error::Result;
use crate::sql::factories::{CreateIndex, IndexTypePosition};
use crate::sql::registry::FactoryTable;

use super::without_sequences;

/// MySQL 5.0 to 5.6.3.
pub fn dialect() -> Dialect {
    let mut dialect = Dialect::new("mysql", "MySQL", Product::MySql)
        .with_version(DialectVersion::new(5, 0))
        .with_layer(mysql_layer);
    register_types(dialect.catalog_mut());

    let syntax = &mut dialect.syntax;
    syntax.quote = QuotePair::BACKTICK;
    syntax.default_case = DefaultCase::AsIs;
    syntax.limit = LimitStyle::LimitOffset;
    syntax.merge = MergeStyle::OnDuplicateKey;
    syntax.lock = LockStyle::LockTables;
    syntax.identity = IdentityStyle::AutoIncrement;
    syntax.sequence = SequenceStyle::Unsupported;
    syntax.alter_column = AlterColumnStyle::ModifyColumn;
    syntax.drop_constraint = DropConstraintStyle::MySql;
    syntax.drop_index = DropIndexStyle::OnTable;
    syntax.procedural = ProceduralStyle::DelimiterCommand;
    syntax.on_update_clause = true;
    syntax.hash_comments = true;
    syntax.backslash_escapes = true;
    syntax.index_types = vec!["BTREE".into(), "HASH".into()];
    syntax.system_schemas = vec![
        "information_schema".into(),
        "mysql".into(),
        "performance_schema".into(),
    ];

    let features = &mut dialect.features;
    features.supports_limit = true;
    features.supports_limit_offset = true;
    features.supports_sequence = false;
    features.supports_merge = false;
    features.supports_with = false;
    features.supports_standard_offset_fetch = false;
    features.supports_set_default = false;
    features.supports_drop_cascade = false;
    features.supports_check_constraint = false;
    features.supports_catalog = true;
    features.supports_schema = false;
    features.supports_if_exists = true;
    dialect
}

fn mysql_layer(table: &mut FactoryTable) {
    without_sequences(table);
    table.register(
        ObjectKind::Index,
        SqlType::Create,
        CreateIndex::with_type_position(IndexTypePosition::AfterName),
    );
}

fn register_types(catalog: &mut DataTypeCatalog) {
    catalog
        .register(DbDataType::sized(DataType::Bit, "BIT", 1, 64).converter(ValueConverter::BooleanDigits))
        .register(
            DbDataType::new(DataType::Boolean, "BOOLEAN")
                .alias("BOOL")
                .converter(ValueConverter::BooleanDigits),
        )
        .register(DbDataType::new(DataType::TinyInt, "TINYINT"))
        .register(DbDataType::new(DataType::UTinyInt, "TINYINT UNSIGNED"))
        .register(DbDataType::new(DataType::SmallInt, "SMALLINT"))
        .register(DbDataType::new(DataType::USmallInt, "SMALLINT UNSIGNED"))
        .register(DbDataType::new(DataType::MediumInt, "MEDIUMINT"))
        .register(DbDataType::new(DataType::Int, "INT").alias("INTEGER"))
        .register(DbDataType::new(DataType::UInt, "INT UNSIGNED").alias("INTEGER UNSIGNED"))
        .register(DbDataType::new(DataType::BigInt, "BIGINT"))
        .register(DbDataType::new(DataType::UBigInt, "BIGINT UNSIGNED"))
        .register(DbDataType::new(DataType::Real, "FLOAT"))
        .register(DbDataType::new(DataType::Float, "FLOAT"))
        .register(DbDataType::new(DataType::Double, "DOUBLE").alias("DOUBLE PRECISION").alias("REAL"))
        .register(DbDataType::scaled(DataType::Decimal, "DECIMAL", 65, 30).alias("DEC").alias("FIXED"))
        .register(DbDataType::scaled(DataType::Numeric, "NUMERIC", 65, 30))
        .register(DbDataType::scaled(DataType::Money, "DECIMAL", 19, 4).default_length(19).default_scale(4))
        .register(
            DbDataType::sized(DataType::Char, "CHAR", 0, 255)
                .default_length(1)
                .literal("'", "'"),
        )
        .register(
            DbDataType::sized(DataType::Varchar, "VARCHAR", 0, 65_535)
                .literal("'", "'")
                .surrogate("LONGTEXT"),
        )
        .register(DbDataType::bounded(DataType::LongVarchar, "TINYTEXT", 255).literal("'", "'"))
        .register(DbDataType::bounded(DataType::LongVarchar, "TEXT", 65_535).literal("'", "'"))
        .register(DbDataType::bounded(DataType::LongVarchar, "MEDIUMTEXT", 16_777_215).literal("'", "'"))
        .register(DbDataType::bounded(DataType::LongVarchar, "LONGTEXT", LEN_4GB_MINUS_1).literal("'", "'"))
        .register(DbDataType::bounded(DataType::Clob, "LONGTEXT", LEN_4GB_MINUS_1).literal("'", "'"))
        .register(
            DbDataType::sized(DataType::NChar, "NCHAR", 0, 255)
                .default_length(1)
                .literal("N'", "'"),
        )
        .register(
            DbDataType::sized(DataType::NVarchar, "NVARCHAR", 0, 21_845)
                .literal("N'", "'")
                .surrogate("LONGTEXT"),
        )
        .register(DbDataType::bounded(DataType::LongNVarchar, "LONGTEXT", LEN_4GB_MINUS_1).literal("'", "'"))
        .register(DbDataType::bounded(DataType::NClob, "LONGTEXT", LEN_4GB_MINUS_1).literal("'", "'"))
        .register(
            DbDataType::sized(DataType::Binary, "BINARY", 0, 255)
                .default_length(1)
                .literal("X'", "'"),
        )
        .register(
            DbDataType::sized(DataType::Varbinary, "VARBINARY", 0, 65_535)
                .literal("X'", "'")
                .surrogate("LONGBLOB"),
        )
        .register(DbDataType::bounded(DataType::LongVarbinary, "TINYBLOB", 255).literal("X'", "'"))
        .register(DbDataType::bounded(DataType::LongVarbinary, "BLOB", 65_535).literal("X'", "'"))
        .register(DbDataType::bounded(DataType::LongVarbinary, "MEDIUMBLOB", 16_777_215).literal("X'", "'"))
        .register(DbDataType::bounded(DataType::LongVarbinary, "LONGBLOB", LEN_4GB_MINUS_1).literal("X'", "'"))
        .register(DbDataType::bounded(DataType::Blob, "LONGBLOB", LEN_4GB_MINUS_1).literal("X'", "'"))
        .register(DbDataType::new(DataType::Date, "DATE").literal("'", "'"))
        .register(DbDataType::new(DataType::Time, "TIME").literal("'", "'"))
        .register(DbDataType::new(DataType::DateTime, "DATETIME").literal("'", "'"))
        .register(DbDataType::new(DataType::Timestamp, "TIMESTAMP").literal("'", "'"))
        .register(DbDataType::new(DataType::Enum, "ENUM").literal("'", "'"))
        .register(DbDataType::new(DataType::Set, "SET").literal("'", "'"))
        .register(DbDataType::new(DataType::Geometry, "GEOMETRY"));
}

/// 5.6.4: fractional seconds on temporal types.
pub(crate) fn mysql5_6(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive(
        "mysql5_6",
        "MySQL 5.6.4",
        DialectVersion::new(5, 6).with_revision(4),
    );
    let catalog = dialect.catalog_mut();
    catalog
        .replace(DbDataType::sized(DataType::Time, "TIME", 0, 6).literal("'", "'"))
        .replace(DbDataType::sized(DataType::DateTime, "DATETIME", 0, 6).literal("'", "'"))
        .replace(DbDataType::sized(DataType::Timestamp, "TIMESTAMP", 0, 6).literal("'", "'"));
    dialect
}

/// 5.7: native JSON.
fn mysql5_7(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("mysql5_7", "MySQL 5.7", DialectVersion::new(5, 7));
    dialect
        .catalog_mut()
        .register(DbDataType::new(DataType::Json, "JSON").literal("'", "'"));
    dialect
}

/// 8.0: common table expressions.
fn mysql8(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("mysql8", "MySQL 8.0", DialectVersion::new(8, 0));
    dialect.features.supports_with = true;
    dialect
        .syntax
        .system_schemas
        .push("sys".into());
    dialect
}

/// 8.0.16: CHECK constraints are enforced.
fn mysql8_0_16(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive(
        "mysql8_0_16",
        "MySQL 8.0.16",
        DialectVersion::new(8, 0).with_revision(16),
    );
    dialect.features.supports_check_constraint = true;
    dialect
}

pub fn lattice() -> Result<ProductLattice> {
    let base = dialect();
    let v5_6 = mysql5_6(&base);
    let v5_7 = mysql5_7(&v5_6);
    let v8 = mysql8(&v5_7);
    let v8_0_16 = mysql8_0_16(&v8);

    let mut lattice = ProductLattice::new(Product::MySql, "MySQL", base)?;
    lattice
        .add((5, 6, 4), v5_6)?
        .add((5, 7, 0), v5_7)?
        .add((8, 0, 0), v8)?
        .add((8, 0, 16), v8_0_16)?
        .alias((9, 0, 0), "mysql8_0_16")?;
    Ok(lattice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DbObject, Index, Sequence, SqlOperation, Table};
    use crate::error::SqlWeaveError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_version_bounds() {
        let lattice = lattice().unwrap();
        assert_eq!(lattice.resolve(5, 5, None).id(), "mysql");
        assert_eq!(lattice.resolve(5, 6, Some(3)).id(), "mysql");
        assert_eq!(lattice.resolve(5, 6, Some(4)).id(), "mysql5_6");
        assert_eq!(lattice.resolve(5, 7, Some(44)).id(), "mysql5_7");
        assert_eq!(lattice.resolve(8, 0, Some(15)).id(), "mysql8");
        assert_eq!(lattice.resolve(8, 0, None).id(), "mysql8_0_16");
        assert_eq!(lattice.resolve(8, 4, Some(0)).id(), "mysql8_0_16");
        assert_eq!(lattice.resolve(9, 1, None).id(), "mysql8_0_16");
    }

    #[test]
    fn test_text_width_classes() {
        let dialect = dialect();
        let text = |len| {
            dialect.column_type_sql(&Column::new("c").with_type(DataType::LongVarchar).with_length(len))
        };
        assert_eq!(text(200), "TINYTEXT");
        assert_eq!(text(60_000), "TEXT");
        assert_eq!(text(1_000_000), "MEDIUMTEXT");
        assert_eq!(text(100_000_000), "LONGTEXT");
        let wide = Column::new("c").with_type(DataType::Varchar).with_length(70_000);
        assert_eq!(dialect.column_type_sql(&wide), "LONGTEXT");
    }

    #[test]
    fn test_sequences_are_unregistered() {
        let dialect = dialect();
        let registry = dialect.sql_factory_registry();
        let seq = Sequence::new("s");
        let err = registry.create_sql(SqlType::Create, &DbObject::Sequence(&seq)).unwrap_err();
        assert!(matches!(err, SqlWeaveError::UnregisteredOperation { .. }));
    }

    #[test]
    fn test_index_and_quote() {
        let dialect = dialect();
        let registry = dialect.sql_factory_registry();
        let table = Table::new("orders");
        let index = Index {
            name: "ix_orders_total".into(),
            columns: vec!["total".into()],
            index_type: Some("btree".into()),
            ..Default::default()
        };
        let ops = registry.create_sql(SqlType::Create, &DbObject::Index(&table, &index)).unwrap();
        assert_eq!(ops[0].sql, "CREATE INDEX ix_orders_total USING BTREE ON orders (total)");
        assert_eq!(dialect.quote("a`b"), "`a``b`");
    }

    #[test]
    fn test_procedure_wrapped_in_delimiters() {
        let dialect = dialect();
        let table = Table::new("t");
        let body = "CREATE PROCEDURE p() BEGIN SELECT 1; END";
        let op = SqlOperation::new(body, SqlType::Create, &DbObject::Table(&table));
        let ops = dialect.set_change_and_reset_delimiter(op);
        let sql: Vec<&str> = ops.iter().map(|o| o.sql.as_str()).collect();
        assert_eq!(sql, vec!["DELIMITER $$", body, "DELIMITER ;"]);

        let script = dialect.render_script(&ops);
        let statements = dialect.splitter().split(&script);
        let texts: Vec<&str> = statements
            .iter()
            .filter(|s| !s.comment_only)
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(texts, vec![body]);
    }
}
