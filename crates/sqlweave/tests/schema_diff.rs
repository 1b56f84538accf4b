//! Snapshot comparison turned into DDL through a resolved dialect.

use sqlweave::core::{Column, DataType, DbObject, ForeignKey, Sequence, SqlType};
use sqlweave::diff::DiffState;
use sqlweave::{DialectResolver, ObjectKind, Schema, SchemaComparer, Table};

fn orders() -> Table {
    Table::new("orders")
        .with_column(Column::new("id").with_type(DataType::Int).not_null())
        .with_column(Column::new("qty").with_type(DataType::Int))
        .with_column(Column::new("placed_on").with_type(DataType::Date))
        .with_primary_key(&["id"])
}

#[test]
fn test_identical_snapshots_yield_nothing_on_every_dialect() {
    let resolver = DialectResolver::with_builtins().unwrap();
    let original = orders();
    let target = original.clone();
    for dialect in resolver.dialects() {
        let diff = SchemaComparer::new(dialect).compare_tables(&original, &target);
        assert!(diff.is_empty(), "{}", dialect.id());
        let ops = dialect.sql_factory_registry().diff_sql(&diff).unwrap();
        assert!(ops.is_empty(), "{}: {:?}", dialect.id(), ops);
    }
}

#[test]
fn test_column_changes_become_alters() {
    let resolver = DialectResolver::with_builtins().unwrap();
    let dialect = resolver.resolve("PostgreSQL", 15, 0, None);
    let original = orders();
    let mut target = orders();
    target.columns[1].data_type = Some(DataType::BigInt);
    target
        .columns
        .push(Column::new("note").with_type(DataType::Varchar).with_length(200));

    let diff = SchemaComparer::new(dialect).compare_tables(&original, &target);
    assert_eq!(diff.state, DiffState::Modified);
    assert_eq!(diff.child(ObjectKind::Column, "qty").unwrap().state, DiffState::Modified);
    assert_eq!(diff.child(ObjectKind::Column, "note").unwrap().state, DiffState::Added);

    let sql: Vec<String> = dialect
        .sql_factory_registry()
        .diff_sql(&diff)
        .unwrap()
        .into_iter()
        .map(|o| o.sql)
        .collect();
    assert_eq!(sql.len(), 2, "{:?}", sql);
    assert_eq!(sql[0], "ALTER TABLE orders ALTER COLUMN qty TYPE BIGINT");
    assert!(sql[1].starts_with("ALTER TABLE orders ADD"), "{}", sql[1]);
    assert!(sql[1].ends_with("note VARCHAR(200)"), "{}", sql[1]);
}

#[test]
fn test_schema_diff_drops_tables_before_creating_sequences() {
    let resolver = DialectResolver::with_builtins().unwrap();
    let dialect = resolver.resolve("PostgreSQL", 15, 0, None);
    let original = Schema {
        tables: vec![orders(), Table::new("legacy")],
        ..Default::default()
    };
    let mut target = original.clone();
    target.tables.remove(1);
    target.sequences.push(Sequence::new("seq_orders"));

    let diffs = SchemaComparer::new(dialect).compare_schemas(&original, &target);
    assert_eq!(diffs.len(), 2);

    let sql: Vec<String> = dialect
        .sql_factory_registry()
        .schema_diff_sql(&original, &target, &diffs)
        .unwrap()
        .into_iter()
        .map(|o| o.sql)
        .collect();
    let drop = sql.iter().position(|s| s.starts_with("DROP TABLE")).unwrap();
    let create = sql.iter().position(|s| s.starts_with("CREATE SEQUENCE seq_orders")).unwrap();
    assert!(drop < create, "{:?}", sql);
    assert!(sql[drop].ends_with("legacy"));
}

#[test]
fn test_widened_type_is_not_a_difference() {
    let resolver = DialectResolver::with_builtins().unwrap();
    let dialect = resolver.resolve("Oracle", 12, 0, None);
    let original = Table::new("DOC").with_column(
        Column::new("BODY")
            .with_type(DataType::Varchar)
            .with_length(10_000),
    );
    let target = Table::new("DOC").with_column(Column::new("BODY").with_type(DataType::Clob));
    assert_eq!(
        dialect.column_type_sql(&original.columns[0]),
        dialect.column_type_sql(&target.columns[0])
    );
    let diff = SchemaComparer::new(dialect).compare_tables(&original, &target);
    assert!(diff.child(ObjectKind::Column, "BODY").is_none());
}

fn departments() -> Schema {
    Schema {
        tables: vec![
            Table::new("dept")
                .with_column(Column::new("id").with_type(DataType::Int).not_null())
                .with_primary_key(&["id"]),
            Table::new("employee")
                .with_column(Column::new("id").with_type(DataType::Int).not_null())
                .with_column(Column::new("dept_id").with_type(DataType::Int))
                .with_foreign_key(ForeignKey {
                    name: "fk_employee_dept".into(),
                    columns: vec!["dept_id".into()],
                    ref_table: "dept".into(),
                    ref_columns: vec!["id".into()],
                    ..Default::default()
                }),
        ],
        ..Default::default()
    }
}

fn schema_sql(product: &str, major: u32, original: &Schema, target: &Schema) -> Vec<String> {
    let resolver = DialectResolver::with_builtins().unwrap();
    let dialect = resolver.resolve(product, major, 0, None);
    let diffs = SchemaComparer::new(dialect).compare_schemas(original, target);
    dialect
        .sql_factory_registry()
        .schema_diff_sql(original, target, &diffs)
        .unwrap()
        .into_iter()
        .map(|o| o.sql)
        .collect()
}

#[test]
fn test_inbound_foreign_key_wraps_referenced_column_change() {
    let original = departments();
    let mut target = original.clone();
    target.tables[0].columns[0].data_type = Some(DataType::BigInt);

    let sql = schema_sql("PostgreSQL", 15, &original, &target);
    assert_eq!(sql[0], "ALTER TABLE employee DROP CONSTRAINT fk_employee_dept", "{:?}", sql);
    let alter = sql
        .iter()
        .position(|s| s == "ALTER TABLE dept ALTER COLUMN id TYPE BIGINT")
        .unwrap();
    let last = sql.last().unwrap();
    assert!(alter > 0 && alter < sql.len() - 1, "{:?}", sql);
    assert!(
        last.starts_with("ALTER TABLE employee ADD CONSTRAINT fk_employee_dept FOREIGN KEY"),
        "{}",
        last
    );
    assert_eq!(sql.iter().filter(|s| s.contains("fk_employee_dept")).count(), 2);
}

#[test]
fn test_inbound_foreign_key_dropped_before_its_table() {
    let original = departments();
    let mut target = original.clone();
    target.tables.remove(0);
    target.tables[0].foreign_keys.clear();

    let sql = schema_sql("PostgreSQL", 15, &original, &target);
    let drop_fk = sql
        .iter()
        .position(|s| s == "ALTER TABLE employee DROP CONSTRAINT fk_employee_dept")
        .unwrap();
    let drop_table = sql.iter().position(|s| s.starts_with("DROP TABLE")).unwrap();
    assert!(drop_fk < drop_table, "{:?}", sql);
    assert_eq!(sql.iter().filter(|s| s.contains("fk_employee_dept")).count(), 1, "{:?}", sql);
}

#[test]
fn test_unrelated_column_change_keeps_inbound_foreign_key() {
    let original = departments();
    let mut target = original.clone();
    target.tables[0]
        .columns
        .push(Column::new("name").with_type(DataType::Varchar).with_length(40));

    let sql = schema_sql("PostgreSQL", 15, &original, &target);
    assert!(sql.iter().all(|s| !s.contains("fk_employee_dept")), "{:?}", sql);
}

// =============================================================================
// Vendor column forms
// =============================================================================

#[test]
fn test_sqlserver_default_constraint_names_agree() {
    let resolver = DialectResolver::with_builtins().unwrap();
    let dialect = resolver.resolve("Microsoft SQL Server", 13, 0, None);
    let registry = dialect.sql_factory_registry();
    let original = Table::new("t").with_column(Column::new("a").with_type(DataType::Int).with_default("0"));

    let created = registry
        .create_sql(SqlType::Create, &DbObject::Table(&original))
        .unwrap();
    assert!(created[0].sql.contains("a INT CONSTRAINT df_t_a DEFAULT 0"), "{}", created[0].sql);

    let mut target = original.clone();
    target.columns[0].default_value = Some("1".into());
    let diff = SchemaComparer::new(dialect).compare_tables(&original, &target);
    let sql: Vec<String> = registry.diff_sql(&diff).unwrap().into_iter().map(|o| o.sql).collect();
    assert_eq!(
        sql,
        vec![
            "ALTER TABLE t DROP CONSTRAINT df_t_a",
            "ALTER TABLE t ADD CONSTRAINT df_t_a DEFAULT 1 FOR a",
        ]
    );
}

#[test]
fn test_computed_columns_follow_the_vendor() {
    let resolver = DialectResolver::with_builtins().unwrap();
    let table = Table::new("t")
        .with_column(Column::new("a").with_type(DataType::Int))
        .with_column(Column {
            formula: Some("a * 2".into()),
            ..Column::new("b").with_type(DataType::Int)
        });
    let expected = [
        ("Microsoft SQL Server", 13, "b AS (a * 2)"),
        ("PostgreSQL", 15, "b INTEGER GENERATED ALWAYS AS (a * 2) STORED"),
        ("MySQL", 8, "b INT GENERATED ALWAYS AS (a * 2)"),
    ];
    for (product, major, definition) in expected {
        let dialect = resolver.resolve(product, major, 0, None);
        let ops = dialect
            .sql_factory_registry()
            .create_sql(SqlType::Create, &DbObject::Table(&table))
            .unwrap();
        assert!(ops[0].sql.contains(definition), "{}: {}", product, ops[0].sql);
    }
}
