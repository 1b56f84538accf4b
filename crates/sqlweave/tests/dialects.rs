//! Dialect resolution and type coercion across the built-in products.
//!
//! These tests go through the public resolver only, the way a caller holding
//! a driver's product name and server version would.

use sqlweave::core::Column;
use sqlweave::dialect::{MatchOutcome, Product};
use sqlweave::{DataType, DialectResolver};

fn resolver() -> DialectResolver {
    DialectResolver::with_builtins().unwrap()
}

fn type_sql(resolver: &DialectResolver, product: &str, major: u32, minor: u32, column: &Column) -> String {
    resolver.resolve(product, major, minor, None).column_type_sql(column)
}

// =============================================================================
// Resolution
// =============================================================================

#[test]
fn test_driver_product_names_resolve() {
    let resolver = resolver();
    let cases = [
        ("PostgreSQL", 16, 1, "postgres15"),
        ("MySQL", 5, 7, "mysql5_7"),
        ("MariaDB", 10, 4, "mariadb10_3"),
        ("Microsoft SQL Server", 12, 0, "sqlserver2012"),
        ("Oracle", 19, 0, "oracle12c"),
        ("DB2/LINUXX8664", 11, 5, "db2_11"),
        ("Apache Derby", 10, 14, "derby10_11"),
        ("HDB", 2, 0, "hana2"),
        ("Google Cloud Spanner", 1, 0, "spanner"),
        ("ACCESS", 4, 0, "jet"),
    ];
    for (product, major, minor, expected) in cases {
        assert_eq!(
            resolver.resolve(product, major, minor, None).id(),
            expected,
            "{} {}.{}",
            product,
            major,
            minor
        );
    }
}

#[test]
fn test_unknown_product_and_version_fall_back() {
    let resolver = resolver();
    assert_eq!(resolver.resolve("Teradata", 17, 0, None).id(), "ansi");
    assert_eq!(resolver.resolve("PostgreSQL", 99, 0, None).id(), "postgres");
    assert_eq!(resolver.resolve("Oracle", 7, 3, None).id(), "oracle");
}

#[test]
fn test_revision_selects_within_minor() {
    let resolver = resolver();
    assert_eq!(resolver.resolve("MySQL", 8, 0, Some(15)).id(), "mysql8");
    assert_eq!(resolver.resolve("MySQL", 8, 0, Some(16)).id(), "mysql8_0_16");
    assert_eq!(resolver.resolve("MySQL", 8, 0, None).id(), "mysql8_0_16");
}

#[test]
fn test_version_chain_is_partially_ordered() {
    let resolver = resolver();
    let pg = resolver.resolve("PostgreSQL", 9, 4, None);
    let pg15 = resolver.resolve("PostgreSQL", 15, 0, None);
    assert!(pg15 > pg);
    assert!(pg < pg15);

    let my8 = resolver.resolve("MySQL", 8, 0, None);
    let maria = resolver.resolve("MariaDB", 10, 3, None);
    assert_eq!(maria.product(), Product::MariaDb);
    assert_eq!(maria.partial_cmp(my8), None);
    assert_eq!(pg.partial_cmp(my8), None);
}

#[test]
fn test_every_dialect_is_reachable_by_id() {
    let resolver = resolver();
    let ids: Vec<String> = resolver.dialects().map(|d| d.id().to_string()).collect();
    assert!(ids.len() > 40);
    for id in &ids {
        assert_eq!(resolver.dialect(id).map(|d| d.id()), Some(id.as_str()));
    }
}

// =============================================================================
// Identifiers
// =============================================================================

#[test]
fn test_quote_is_stable_for_every_dialect() {
    let resolver = resolver();
    let names = ["order", "a b", "we\"ird", "x]y", "b`t", "MixedCase"];
    for dialect in resolver.dialects() {
        for name in names {
            let quoted = dialect.quote(name);
            assert_eq!(dialect.unquote(&quoted), name, "{}: {}", dialect.id(), name);
            assert_eq!(dialect.quote(&dialect.unquote(&quoted)), quoted, "{}: {}", dialect.id(), name);
        }
    }
}

#[test]
fn test_quote_pairs_differ_by_product() {
    let resolver = resolver();
    assert_eq!(resolver.resolve("PostgreSQL", 15, 0, None).quote("order"), "\"order\"");
    assert_eq!(resolver.resolve("MySQL", 8, 0, None).quote("order"), "`order`");
    assert_eq!(resolver.resolve("Microsoft SQL Server", 10, 0, None).quote("order"), "[order]");
}

// =============================================================================
// Type coercion
// =============================================================================

#[test]
fn test_oversized_varchar_widens_to_surrogate() {
    let resolver = resolver();
    let varchar = |len| Column::new("notes").with_type(DataType::Varchar).with_length(len);
    let cases = [
        ("Microsoft SQL Server", 8, 0, 10_000, "TEXT"),
        ("Microsoft SQL Server", 9, 0, 10_000, "VARCHAR(MAX)"),
        ("Oracle", 12, 1, 5000, "CLOB"),
        ("DB2/NT64", 11, 1, 40_000, "CLOB"),
        ("MS Jet", 4, 0, 4000, "MEMO"),
    ];
    for (product, major, minor, len, expected) in cases {
        assert_eq!(type_sql(&resolver, product, major, minor, &varchar(len)), expected, "{}", product);
    }
}

#[test]
fn test_fitting_varchar_keeps_length() {
    let resolver = resolver();
    let column = Column::new("name").with_type(DataType::Varchar).with_length(40);
    assert_eq!(type_sql(&resolver, "Oracle", 11, 2, &column), "VARCHAR2(40)");
    assert_eq!(type_sql(&resolver, "Microsoft SQL Server", 9, 0, &column), "VARCHAR(40)");
    assert_eq!(type_sql(&resolver, "Cloud Spanner", 1, 0, &column), "STRING(40)");
}

#[test]
fn test_vendor_type_names_are_honored() {
    let resolver = resolver();
    let int4 = Column::new("id").with_type_name("int4").with_type(DataType::Int);
    assert_eq!(type_sql(&resolver, "PostgreSQL", 15, 0, &int4), "INTEGER");
    let int = Column::new("id").with_type(DataType::Int);
    assert_eq!(type_sql(&resolver, "Oracle", 12, 0, &int), "NUMBER(10)");
}

#[test]
fn test_temporal_types_follow_server_version() {
    let resolver = resolver();
    let ts = Column::new("created_at").with_type(DataType::Timestamp);
    assert_eq!(type_sql(&resolver, "Microsoft SQL Server", 9, 0, &ts), "DATETIME");
    assert_eq!(type_sql(&resolver, "Microsoft SQL Server", 10, 50, &ts), "DATETIME2");
}

#[test]
fn test_rematching_matched_columns_changes_nothing() {
    let resolver = resolver();
    let mut checked = 0;
    for dialect in resolver.dialects() {
        let matcher = dialect.matcher();
        for entry in dialect.catalog().entries() {
            let lengths = [
                None,
                Some(entry.min_length.max(1)),
                entry.default_length,
                entry.max_length,
            ];
            for name in std::iter::once(&entry.name).chain(&entry.aliases) {
                for length in lengths {
                    let mut column = Column::new("c");
                    match matcher.apply(&mut column, Some(name), length, None) {
                        Ok(MatchOutcome::NoMatch) | Err(_) => continue,
                        Ok(_) => {}
                    }
                    let matched = column.clone();
                    matcher.rematch(&mut column).unwrap();
                    assert_eq!(column, matched, "{} {} {:?}", dialect.id(), name, length);
                    checked += 1;
                }
            }
        }
    }
    assert!(checked > 1000, "only {} matches checked", checked);
}

#[test]
fn test_shared_spelling_keeps_its_canonical_type() {
    let resolver = resolver();
    let cases = [
        ("PostgreSQL", 15, "FLOAT", DataType::Float),
        ("PostgreSQL", 15, "JSON", DataType::Json),
        ("Oracle", 12, "DECIMAL", DataType::Decimal),
        ("SQLite", 3, "DECIMAL", DataType::Decimal),
    ];
    for (product, major, type_name, expected) in cases {
        let dialect = resolver.resolve(product, major, 0, None);
        let mut column = Column::new("c");
        dialect.matcher().apply(&mut column, Some(type_name), Some(10), None).unwrap();
        assert_eq!(column.data_type, Some(expected), "{} {}", product, type_name);
        let rendered = dialect.column_type_sql(&column);
        dialect.matcher().rematch(&mut column).unwrap();
        assert_eq!(column.data_type, Some(expected), "{} {}", product, type_name);
        assert_eq!(dialect.column_type_sql(&column), rendered);
    }
}
