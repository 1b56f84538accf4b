//! Oracle dialects.

use crate::core::{DataType, DefaultCase, ObjectKind, SqlType};
use crate::dialect::catalog::LEN_4GB_MINUS_1;
use crate::dialect::{
    AlterColumnStyle, DataTypeCatalog, DbDataType, Dialect, DialectVersion, IdentityStyle,
    LimitStyle, LockStyle, MergeStyle, ProceduralStyle, Product, ProductLattice, SequenceStyle,
    TypeSyntax, ValueConverter,
};
use crate::error::Result;
use crate::sql::factories::{CreateIndex, IndexTypePosition};
use crate::sql::registry::FactoryTable;

/// Byte limit of `VARCHAR2` before 12c extended strings.
const MAX_VARCHAR2: u64 = 4000;

/// Oracle 8, and any release without its own bound.
pub fn dialect() -> Dialect {
    let mut dialect = Dialect::new("oracle", "Oracle", Product::Oracle)
        .with_version(DialectVersion::new(8, 0))
        .with_layer(oracle_layer);
    register_types(dialect.catalog_mut());

    let syntax = &mut dialect.syntax;
    syntax.default_case = DefaultCase::UpperCase;
    syntax.limit = LimitStyle::Rownum;
    syntax.merge = MergeStyle::UpdateThenInsert;
    syntax.lock = LockStyle::InMode;
    syntax.identity = IdentityStyle::Unsupported;
    syntax.sequence = SequenceStyle::DotNextval;
    syntax.alter_column = AlterColumnStyle::ModifyParen;
    syntax.procedural = ProceduralStyle::LineTerminator("/".into());
    syntax.add_column = "ADD";
    syntax.current_date = "SYSDATE".into();
    syntax.current_time = "SYSTIMESTAMP".into();
    syntax.current_timestamp = "SYSTIMESTAMP".into();
    syntax.dual_table = Some("DUAL".into());
    syntax.index_types = vec!["BITMAP".into()];
    syntax.system_schemas = ["SYS", "SYSTEM", "OUTLN", "XDB", "MDSYS", "CTXSYS"]
        .into_iter()
        .map(String::from)
        .collect();

    let features = &mut dialect.features;
    features.supports_limit = false;
    features.supports_limit_offset = false;
    features.supports_rownum = true;
    features.supports_identity = false;
    features.supports_merge = false;
    features.supports_with = false;
    features.supports_standard_offset_fetch = false;
    features.supports_cascade_update = false;
    features.supports_set_default = false;
    features.supports_if_exists = false;
    features.supports_catalog = false;
    features.supports_comment_statement = true;
    features.is_ddl_rollbackable = false;
    dialect
}

/// `BITMAP` goes before `INDEX`.
fn oracle_layer(table: &mut FactoryTable) {
    table.register(
        ObjectKind::Index,
        SqlType::Create,
        CreateIndex::with_type_position(IndexTypePosition::BeforeIndex),
    );
}

/// A named integer entry spelled as a `NUMBER` of fixed precision.
fn number(data_type: DataType, name: &str, precision: u32) -> DbDataType {
    let mut entry = DbDataType::new(data_type, name);
    entry.syntax = TypeSyntax::Fixed(format!("NUMBER({})", precision));
    entry
}

fn register_types(catalog: &mut DataTypeCatalog) {
    catalog
        .register(DbDataType::scaled(DataType::Numeric, "NUMBER", 38, 127))
        .register(DbDataType::scaled(DataType::Decimal, "NUMBER", 38, 127).alias("DECIMAL"))
        .register(number(DataType::Boolean, "BOOLEAN", 1).converter(ValueConverter::BooleanDigits))
        .register(number(DataType::Bit, "BIT", 1).converter(ValueConverter::BooleanDigits))
        .register(number(DataType::TinyInt, "TINYINT", 3))
        .register(number(DataType::SmallInt, "SMALLINT", 5))
        .register(number(DataType::Int, "INTEGER", 10).alias("INT"))
        .register(number(DataType::BigInt, "BIGINT", 19))
        .register(DbDataType::new(DataType::Real, "BINARY_FLOAT"))
        .register(DbDataType::new(DataType::Float, "FLOAT"))
        .register(DbDataType::new(DataType::Double, "BINARY_DOUBLE").alias("DOUBLE PRECISION"))
        .register(
            DbDataType::sized(DataType::Char, "CHAR", 1, 2000)
                .default_length(1)
                .literal("'", "'"),
        )
        .register(
            DbDataType::sized(DataType::Varchar, "VARCHAR2", 1, MAX_VARCHAR2)
                .alias("VARCHAR")
                .default_length(1)
                .literal("'", "'")
                .surrogate("CLOB"),
        )
        .register(DbDataType::bounded(DataType::Clob, "CLOB", LEN_4GB_MINUS_1).literal("'", "'"))
        .register(DbDataType::bounded(DataType::LongVarchar, "CLOB", LEN_4GB_MINUS_1).literal("'", "'"))
        .register(
            DbDataType::sized(DataType::NChar, "NCHAR", 1, 1000)
                .default_length(1)
                .literal("N'", "'"),
        )
        .register(
            DbDataType::sized(DataType::NVarchar, "NVARCHAR2", 1, MAX_VARCHAR2 / 2)
                .default_length(1)
                .literal("N'", "'")
                .surrogate("NCLOB"),
        )
        .register(DbDataType::bounded(DataType::NClob, "NCLOB", LEN_4GB_MINUS_1).literal("N'", "'"))
        .register(
            DbDataType::bounded(DataType::LongNVarchar, "NCLOB", LEN_4GB_MINUS_1).literal("N'", "'"),
        )
        .register(
            DbDataType::sized(DataType::Binary, "RAW", 1, 2000)
                .default_length(1)
                .literal("HEXTORAW('", "')"),
        )
        .register(
            DbDataType::sized(DataType::Varbinary, "RAW", 1, 2000)
                .default_length(1)
                .literal("HEXTORAW('", "')")
                .surrogate("BLOB"),
        )
        .register(DbDataType::bounded(DataType::Blob, "BLOB", LEN_4GB_MINUS_1))
        .register(DbDataType::bounded(DataType::LongVarbinary, "BLOB", LEN_4GB_MINUS_1))
        .register(DbDataType::new(DataType::Date, "DATE").literal("DATE '", "'"))
        .register(DbDataType::new(DataType::DateTime, "DATE").literal("TIMESTAMP '", "'"))
        .register(DbDataType::new(DataType::Time, "DATE").literal("TIMESTAMP '", "'"))
        .register(DbDataType::new(DataType::RowId, "ROWID"));
}

/// 9i: TIMESTAMP, INTERVAL types, MERGE and WITH.
fn oracle9i(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("oracle9i", "Oracle 9i", DialectVersion::new(9, 0));
    dialect
        .catalog_mut()
        .register(
            DbDataType::sized(DataType::Timestamp, "TIMESTAMP", 0, 9)
                .default_length(6)
                .literal("TIMESTAMP '", "'"),
        )
        .register(
            DbDataType::sized(DataType::TimestampWithTimeZone, "TIMESTAMP WITH TIME ZONE", 0, 9)
                .literal("TIMESTAMP '", "'"),
        )
        .register(DbDataType::new(DataType::IntervalYearToMonth, "INTERVAL YEAR TO MONTH"))
        .register(DbDataType::new(DataType::IntervalDayToSecond, "INTERVAL DAY TO SECOND"))
        .register(DbDataType::new(DataType::Xml, "XMLTYPE"));
    dialect.syntax.merge = MergeStyle::Merge;
    dialect.features.supports_merge = true;
    dialect.features.supports_with = true;
    dialect
}

/// 10g: BINARY_FLOAT and BINARY_DOUBLE become the float types of record.
fn oracle10g(parent: &Dialect) -> Dialect {
    parent.derive("oracle10g", "Oracle 10g", DialectVersion::new(10, 0))
}

/// 11g.
fn oracle11g(parent: &Dialect) -> Dialect {
    parent.derive("oracle11g", "Oracle 11g", DialectVersion::new(11, 0))
}

/// 11g Release 2: `LISTAGG` and recursive subquery factoring.
fn oracle11g_r2(parent: &Dialect) -> Dialect {
    parent.derive("oracle11gR2", "Oracle 11g Release 2", DialectVersion::new(11, 2))
}

/// 12c: identity columns and `OFFSET .. FETCH`.
fn oracle12c(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("oracle12c", "Oracle 12c", DialectVersion::new(12, 0));
    dialect.syntax.identity = IdentityStyle::GeneratedByDefault;
    dialect.syntax.limit = LimitStyle::OffsetFetch;
    dialect.features.supports_identity = true;
    dialect.features.supports_standard_offset_fetch = true;
    dialect
}

/// 23ai: `IF [NOT] EXISTS` and a native BOOLEAN.
fn oracle23(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("oracle23", "Oracle 23ai", DialectVersion::new(23, 0));
    dialect
        .catalog_mut()
        .retain(|e| e.data_type != DataType::Boolean)
        .register(DbDataType::new(DataType::Boolean, "BOOLEAN").converter(ValueConverter::BooleanWords));
    dialect.features.supports_if_exists = true;
    dialect
}

pub fn lattice() -> Result<ProductLattice> {
    let base = dialect();
    let v9 = oracle9i(&base);
    let v10 = oracle10g(&v9);
    let v11 = oracle11g(&v10);
    let v11_2 = oracle11g_r2(&v11);
    let v12 = oracle12c(&v11_2);
    let v23 = oracle23(&v12);

    let mut lattice = ProductLattice::new(Product::Oracle, "Oracle", base)?;
    lattice
        .add((9, 0, 0), v9)?
        .add((10, 0, 0), v10)?
        .add((11, 0, 0), v11)?
        .add((11, 2, 0), v11_2)?
        .add((12, 0, 0), v12)?
        .alias((18, 0, 0), "oracle12c")?
        .alias((19, 0, 0), "oracle12c")?
        .alias((21, 0, 0), "oracle12c")?
        .add((23, 0, 0), v23)?;
    Ok(lattice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DbObject, Sequence, SqlValue, Table};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_version_bounds() {
        let lattice = lattice().unwrap();
        assert!(lattice.matches("Oracle Database 19c Enterprise Edition"));
        assert_eq!(lattice.resolve(8, 1, Some(7)).id(), "oracle");
        assert_eq!(lattice.resolve(9, 2, None).id(), "oracle9i");
        assert_eq!(lattice.resolve(11, 1, None).id(), "oracle11g");
        assert_eq!(lattice.resolve(11, 2, Some(4)).id(), "oracle11gR2");
        assert_eq!(lattice.resolve(19, 3, None).id(), "oracle12c");
        assert_eq!(lattice.resolve(23, 4, None).id(), "oracle23");
    }

    #[test]
    fn test_types() {
        let dialect = dialect();
        let int = Column::new("id").with_type(DataType::Int);
        assert_eq!(dialect.column_type_sql(&int), "NUMBER(10)");
        let amount = Column::new("amount")
            .with_type(DataType::Decimal)
            .with_length(12)
            .with_scale(2);
        assert_eq!(dialect.column_type_sql(&amount), "NUMBER(12, 2)");
        let text = Column::new("body").with_type(DataType::Varchar).with_length(5000);
        assert_eq!(dialect.column_type_sql(&text), "CLOB");
        let name = Column::new("name").with_type(DataType::Varchar).with_length(40);
        assert_eq!(dialect.column_type_sql(&name), "VARCHAR2(40)");
    }

    #[test]
    fn test_boolean_by_version() {
        let lattice = lattice().unwrap();
        let flag = Column::new("flag").with_type(DataType::Boolean);
        let v19 = lattice.resolve(19, 0, None);
        assert_eq!(v19.column_type_sql(&flag), "NUMBER(1)");
        assert_eq!(v19.sql_value_literal(&flag, &SqlValue::Bool(true)), "1");
        let v23 = lattice.resolve(23, 0, None);
        assert_eq!(v23.column_type_sql(&flag), "BOOLEAN");
        assert_eq!(v23.sql_value_literal(&flag, &SqlValue::Bool(true)), "TRUE");
    }

    #[test]
    fn test_sequences_and_rownum() {
        let dialect = dialect();
        assert_eq!(dialect.sequence_next_value("SEQ_A").as_deref(), Some("SEQ_A.NEXTVAL"));
        assert_eq!(dialect.limit_clause(10, None), None);
        let seq = Sequence::new("seq_a");
        let ops = dialect
            .sql_factory_registry()
            .create_sql(SqlType::Create, &DbObject::Sequence(&seq))
            .unwrap();
        assert!(ops[0].sql.starts_with("CREATE SEQUENCE"));
    }

    #[test]
    fn test_merge_by_version() {
        let lattice = lattice().unwrap();
        let table = Table::new("item")
            .with_column(Column::new("id").with_type(DataType::Int).not_null())
            .with_column(Column::new("name").with_type(DataType::Varchar).with_length(20))
            .with_primary_key(&["id"]);
        let object = DbObject::Table(&table);
        let v8 = lattice.resolve(8, 0, None).sql_factory_registry();
        assert_eq!(v8.create_sql(SqlType::MergeByPk, &object).unwrap().len(), 2);
        let v9 = lattice.resolve(9, 0, None).sql_factory_registry();
        let ops = v9.create_sql(SqlType::MergeByPk, &object).unwrap();
        assert!(ops[0].sql.starts_with("MERGE INTO"));
    }
}
