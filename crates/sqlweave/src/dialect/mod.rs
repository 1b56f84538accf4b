//! Dialect capability objects.
//!
//! A [`Dialect`] describes one database product at one version: its feature
//! flags, its syntax strategies, its data type catalog and the factory layers
//! it stacks on top of the shared default factories.
//!
//! Dialects are plain owned values. A newer version is built by cloning its
//! parent and overriding fields, and remembers the ids of every dialect it
//! was derived from. That lineage is what orders dialects:
//!
//! ```text
//! sqlserver ─► sqlserver2005 ─► sqlserver2008 ─► sqlserver2012
//!                                      │
//!                                      └─► sqlserver2008  <  sqlserver2012
//! mysql8 vs mariadb10_2_7  → incomparable (different branches)
//! ```

pub mod catalog;
pub mod matcher;
pub mod resolver;
pub mod syntax;

use std::cmp::Ordering;
use std::fmt;

use tracing::debug;

use crate::core::{CascadeRule, Column, DataType, DefaultCase, SqlOperation, SqlType, SqlValue};
use crate::splitter::{safe_delimiter, SplitterRules, SqlSplitter};
use crate::sql::registry::{FactoryLayer, SqlFactoryRegistry};

pub use catalog::{DataTypeCatalog, DbDataType, TypeSyntax, ValueConverter};
pub use matcher::{MatchOutcome, Resolution, SizeRequest, TypeMatcher};
pub use resolver::{DialectResolver, ProductLattice};
pub use syntax::{
    AlterColumnStyle, ComputedStyle, DefaultStyle, DropConstraintStyle, DropIndexStyle, Features,
    IdentityStyle, LimitStyle, LockStyle, MergeStyle, ProceduralStyle, SequenceStyle, Syntax,
};

/// Database products with a built-in dialect chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Product {
    /// Generic SQL:2003, used for products nothing else claims.
    Ansi,
    MySql,
    MariaDb,
    PostgreSql,
    SqlServer,
    Sybase,
    Oracle,
    HsqlDb,
    H2,
    Sqlite,
    Derby,
    Db2,
    Hana,
    Spanner,
    MsJet,
}

impl Product {
    pub fn display_name(&self) -> &'static str {
        match self {
            Product::Ansi => "SQL",
            Product::MySql => "MySQL",
            Product::MariaDb => "MariaDB",
            Product::PostgreSql => "PostgreSQL",
            Product::SqlServer => "Microsoft SQL Server",
            Product::Sybase => "Sybase ASE",
            Product::Oracle => "Oracle",
            Product::HsqlDb => "HSQL Database Engine",
            Product::H2 => "H2",
            Product::Sqlite => "SQLite",
            Product::Derby => "Apache Derby",
            Product::Db2 => "DB2",
            Product::Hana => "SAP HANA",
            Product::Spanner => "Google Cloud Spanner",
            Product::MsJet => "MS Jet",
        }
    }
}

/// Lower bound of the product versions a dialect covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct DialectVersion {
    pub major: u32,
    pub minor: u32,
    pub revision: Option<u32>,
}

impl DialectVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            revision: None,
        }
    }

    pub fn with_revision(mut self, revision: u32) -> Self {
        self.revision = Some(revision);
        self
    }
}

impl fmt::Display for DialectVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.revision {
            Some(rev) => write!(f, "{}.{}.{}", self.major, self.minor, rev),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

/// Syntax, feature and type behavior of one product version.
#[derive(Clone)]
pub struct Dialect {
    id: String,
    name: String,
    product: Product,
    version: DialectVersion,
    /// Ids of the dialects this one was derived from, nearest first.
    lineage: Vec<String>,
    pub features: Features,
    pub syntax: Syntax,
    catalog: DataTypeCatalog,
    layers: Vec<FactoryLayer>,
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("version", &self.version)
            .field("lineage", &self.lineage)
            .field("layers", &self.layers.len())
            .finish()
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Dialect {
    /// Root dialect of a product chain.
    pub fn new(id: impl Into<String>, name: impl Into<String>, product: Product) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            product,
            version: DialectVersion::default(),
            lineage: Vec::new(),
            features: Features::default(),
            syntax: Syntax::default(),
            catalog: DataTypeCatalog::new(),
            layers: Vec::new(),
        }
    }

    /// A dialect built on this one: same flags, syntax, catalog and layers.
    pub fn derive(&self, id: impl Into<String>, name: impl Into<String>, version: DialectVersion) -> Self {
        let mut child = self.clone();
        child.id = id.into();
        child.name = name.into();
        child.version = version;
        child.lineage.insert(0, self.id.clone());
        child
    }

    /// Re-home a derived dialect under another product (MariaDB from MySQL).
    pub fn for_product(mut self, product: Product) -> Self {
        self.product = product;
        self
    }

    pub fn with_version(mut self, version: DialectVersion) -> Self {
        self.version = version;
        self
    }

    /// Stack a factory layer on top of the inherited ones.
    pub fn with_layer(mut self, layer: FactoryLayer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn product(&self) -> Product {
        self.product
    }

    pub fn version(&self) -> DialectVersion {
        self.version
    }

    /// The dialect this one falls back to.
    pub fn fallback(&self) -> Option<&str> {
        self.lineage.first().map(String::as_str)
    }

    pub fn lineage(&self) -> &[String] {
        &self.lineage
    }

    pub fn catalog(&self) -> &DataTypeCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut DataTypeCatalog {
        &mut self.catalog
    }

    pub fn matcher(&self) -> TypeMatcher<'_> {
        TypeMatcher::new(&self.catalog)
    }

    /// A fresh factory registry: shared defaults, then this dialect's layers
    /// in inheritance order.
    pub fn sql_factory_registry(&self) -> SqlFactoryRegistry<'_> {
        let registry = SqlFactoryRegistry::with_layers(self, &self.layers);
        debug!(
            "Built SQL factory registry for {} ({} layers, {} factories)",
            self.name,
            self.layers.len(),
            registry.len()
        );
        registry
    }

    /// Total comparison: incomparable dialects rank equal.
    pub fn compare(&self, other: &Dialect) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }

    // =========================================================================
    // Identifiers
    // =========================================================================

    pub fn is_quoted(&self, target: &str) -> bool {
        self.syntax.quote.is_quoted(target)
    }

    pub fn needs_quote(&self, target: &str) -> bool {
        self.syntax.quote.needs_quote(target, self.syntax.default_case)
    }

    /// Always quote, doubling embedded closing quotes.
    pub fn quote(&self, target: &str) -> String {
        self.syntax.quote.quote(target)
    }

    pub fn quote_if_needed(&self, target: &str) -> String {
        self.syntax.quote.quote_if_needed(target, self.syntax.default_case)
    }

    pub fn unquote(&self, target: &str) -> String {
        self.syntax.quote.unquote(target)
    }

    /// Fold an unquoted identifier the way the database stores it.
    pub fn native_case(&self, target: &str) -> String {
        if self.is_quoted(target) {
            return self.unquote(target);
        }
        match self.syntax.default_case {
            DefaultCase::UpperCase => target.to_uppercase(),
            DefaultCase::LowerCase => target.to_lowercase(),
            DefaultCase::AsIs => target.to_string(),
        }
    }

    /// `catalog.schema.name`, skipping parts the dialect does not support.
    pub fn object_full_name(
        &self,
        catalog: Option<&str>,
        schema: Option<&str>,
        name: &str,
        quote: bool,
    ) -> String {
        let render = |part: &str| {
            if quote {
                self.quote(part)
            } else {
                self.quote_if_needed(part)
            }
        };
        let mut parts = Vec::with_capacity(3);
        if let Some(c) = catalog.filter(|_| self.features.supports_catalog) {
            parts.push(render(c));
        }
        if let Some(s) = schema.filter(|_| self.features.supports_schema) {
            parts.push(render(s));
        }
        parts.push(render(name));
        parts.join(".")
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// DDL spelling of a column's type.
    pub fn column_type_sql(&self, column: &Column) -> String {
        let size = SizeRequest::from_length(column.length);
        let matcher = self.matcher();
        let resolution = match column.data_type_name.as_deref() {
            Some(name) => match matcher.resolve(Some(name), column.data_type, size) {
                Resolution::Unknown => matcher.resolve(None, column.data_type, size),
                found => found,
            },
            None => matcher.resolve(None, column.data_type, size),
        };
        match resolution {
            Resolution::Found(entry) | Resolution::Unfit(entry) => {
                entry.render(column.length, column.scale)
            }
            Resolution::Widened { surrogate, .. } => surrogate.render(column.length, column.scale),
            Resolution::Unknown => {
                let dt = column.data_type_or_other();
                let name = column
                    .data_type_name
                    .clone()
                    .unwrap_or_else(|| dt.type_name().to_string());
                match (column.length.filter(|_| dt.is_fixed_size()), column.scale) {
                    (Some(len), Some(scale)) if dt.is_fixed_scale() => {
                        format!("{}({}, {})", name, len, scale)
                    }
                    (Some(len), _) => format!("{}({})", name, len),
                    _ => name,
                }
            }
        }
    }

    /// Scale-0 DECIMAL/NUMERIC columns become the narrowest integer type that
    /// holds their precision.
    pub fn narrow_decimal(&self, column: &mut Column) {
        let Some(dt @ (DataType::Decimal | DataType::Numeric)) = column.data_type else {
            return;
        };
        if column.scale.unwrap_or(0) != 0 {
            return;
        }
        let Some(precision) = column.length else {
            return;
        };
        let narrowed = match precision {
            1 => DataType::Bit,
            p if p < 3 => DataType::TinyInt,
            p if p < 5 => DataType::SmallInt,
            p if p < 10 => DataType::Int,
            p if p < 20 => DataType::BigInt,
            _ => return,
        };
        debug!(
            "Column '{}': {}({}) narrowed to {}",
            column.name, dt, precision, narrowed
        );
        column.data_type = Some(narrowed);
        column.data_type_name = None;
        column.length = None;
        column.scale = None;
    }

    /// Render a value as a literal for `column`.
    ///
    /// NULL for a NOT NULL column with a default renders the default.
    pub fn sql_value_literal(&self, column: &Column, value: &SqlValue) -> String {
        if value.is_null() {
            return match (&column.default_value, column.not_null) {
                (Some(default), true) => default.clone(),
                _ => "NULL".to_string(),
            };
        }
        let size = SizeRequest::from_length(column.length);
        let matcher = self.matcher();
        let resolution = match column.data_type_name.as_deref() {
            Some(name) => matcher.resolve(Some(name), column.data_type, size),
            None => matcher.resolve(None, column.data_type, size),
        };
        match resolution {
            Resolution::Found(entry) | Resolution::Unfit(entry) => entry.literal_of(value),
            Resolution::Widened { surrogate, .. } => surrogate.literal_of(value),
            Resolution::Unknown => generic_literal(value),
        }
    }

    /// Numeric columns named like an optimistic lock counter.
    pub fn is_optimistic_lock_column(&self, column: &Column) -> bool {
        column.data_type.map_or(false, |dt| dt.is_numeric())
            && (column.name.eq_ignore_ascii_case("lock_version")
                || column.name == "LockVersion")
    }

    pub fn supports_rule_on_delete(&self, rule: CascadeRule) -> bool {
        match rule {
            CascadeRule::None | CascadeRule::Restrict => true,
            CascadeRule::Cascade => self.features.supports_cascade_delete,
            CascadeRule::SetNull => self.features.supports_set_null,
            CascadeRule::SetDefault => self.features.supports_set_default,
        }
    }

    pub fn supports_rule_on_update(&self, rule: CascadeRule) -> bool {
        match rule {
            CascadeRule::None | CascadeRule::Restrict => true,
            CascadeRule::Cascade => self.features.supports_cascade_update,
            CascadeRule::SetNull => self.features.supports_set_null && self.features.supports_cascade_update,
            CascadeRule::SetDefault => {
                self.features.supports_set_default && self.features.supports_cascade_update
            }
        }
    }

    /// Next value of a sequence, `None` when the dialect has no sequences.
    pub fn sequence_next_value(&self, sequence: &str) -> Option<String> {
        match self.syntax.sequence {
            SequenceStyle::NextValueFor => Some(format!("NEXT VALUE FOR {}", sequence)),
            SequenceStyle::Nextval => Some(format!("nextval('{}')", sequence.replace('\'', "''"))),
            SequenceStyle::DotNextval => Some(format!("{}.NEXTVAL", sequence)),
            SequenceStyle::Unsupported => None,
        }
    }

    /// `LIMIT`-style clause appended to a SELECT, `None` for styles that
    /// change the select list or the WHERE clause instead.
    pub fn limit_clause(&self, limit: u64, offset: Option<u64>) -> Option<String> {
        match (self.syntax.limit, offset) {
            (LimitStyle::LimitOffset, Some(off)) => Some(format!("LIMIT {} OFFSET {}", limit, off)),
            (LimitStyle::LimitOffset, None) => Some(format!("LIMIT {}", limit)),
            (LimitStyle::OffsetFetch, off) => Some(format!(
                "OFFSET {} ROWS FETCH NEXT {} ROWS ONLY",
                off.unwrap_or(0),
                limit
            )),
            _ => None,
        }
    }

    // =========================================================================
    // Scripts
    // =========================================================================

    /// Splitter configured for this dialect's lexical rules.
    pub fn splitter(&self) -> SqlSplitter {
        let mut rules = SplitterRules::new(self.syntax.delimiter.clone());
        rules.hash_comments = self.syntax.hash_comments;
        rules.backslash_escapes = self.syntax.backslash_escapes;
        rules.dollar_quotes = self.syntax.dollar_quotes;
        rules.nested_comments = self.syntax.nested_comments;
        if self.syntax.quote != crate::core::QuotePair::DOUBLE {
            rules.identifier_quote = Some(self.syntax.quote);
        }
        match &self.syntax.procedural {
            ProceduralStyle::DelimiterCommand => rules.delimiter_command = true,
            ProceduralStyle::LineTerminator(token) => {
                rules.line_terminators.push(token.clone());
                rules.procedural_blocks = true;
            }
            ProceduralStyle::Plain => {}
        }
        SqlSplitter::new(rules)
    }

    /// Wrap a procedural statement in delimiter switches when the dialect
    /// marks block ends with a delimiter command.
    ///
    /// The temporary delimiter is chosen so that it does not occur in the
    /// statement text.
    pub fn set_change_and_reset_delimiter(&self, operation: SqlOperation) -> Vec<SqlOperation> {
        match self.syntax.procedural {
            ProceduralStyle::DelimiterCommand => {
                let temporary = safe_delimiter(&operation.sql, &["$$", "//"]);
                let switch = |delimiter: &str| SqlOperation {
                    sql: format!("DELIMITER {}", delimiter),
                    sql_type: SqlType::SetDelimiter,
                    object_kind: operation.object_kind,
                    object_name: operation.object_name.clone(),
                };
                let change = switch(&temporary);
                let reset = switch(&self.syntax.delimiter);
                vec![change, operation, reset]
            }
            _ => vec![operation],
        }
    }

    /// Join operations into a script the dialect's splitter reads back.
    pub fn render_script(&self, operations: &[SqlOperation]) -> String {
        let mut script = String::new();
        let mut delimiter = self.syntax.delimiter.clone();
        for op in operations {
            if op.sql_type == SqlType::SetDelimiter {
                script.push_str(&op.sql);
                script.push('\n');
                if let Some(next) = op.sql.split_whitespace().nth(1) {
                    delimiter = next.to_string();
                }
                continue;
            }
            script.push_str(&op.sql);
            match &self.syntax.procedural {
                ProceduralStyle::LineTerminator(token) if crate::splitter::is_procedural(&op.sql) => {
                    script.push('\n');
                    script.push_str(token);
                }
                _ => script.push_str(&delimiter),
            }
            script.push('\n');
        }
        script
    }
}

fn generic_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Bool(v) => if *v { "TRUE" } else { "FALSE" }.to_string(),
        SqlValue::Int(_) | SqlValue::Float(_) | SqlValue::Decimal(_) => {
            value.raw_text().unwrap_or_default()
        }
        other => format!("'{}'", other.raw_text().unwrap_or_default().replace('\'', "''")),
    }
}

impl PartialEq for Dialect {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl PartialOrd for Dialect {
    /// Ordered only along a derivation path; `None` across branches.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.id == other.id {
            Some(Ordering::Equal)
        } else if self.lineage.iter().any(|id| *id == other.id) {
            Some(Ordering::Greater)
        } else if other.lineage.iter().any(|id| *id == self.id) {
            Some(Ordering::Less)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::QuotePair;

    fn chain() -> (Dialect, Dialect, Dialect, Dialect) {
        let root = Dialect::new("base", "Base", Product::Ansi);
        let v2 = root.derive("base2", "Base 2", DialectVersion::new(2, 0));
        let v3 = v2.derive("base3", "Base 3", DialectVersion::new(3, 0));
        let branch = root.derive("fork", "Fork", DialectVersion::new(2, 5));
        (root, v2, v3, branch)
    }

    #[test]
    fn test_partial_order_along_lineage() {
        let (root, v2, v3, branch) = chain();
        assert_eq!(v3.partial_cmp(&v3), Some(Ordering::Equal));
        assert_eq!(v3.partial_cmp(&root), Some(Ordering::Greater));
        assert_eq!(root.partial_cmp(&v3), Some(Ordering::Less));
        assert_eq!(v2.partial_cmp(&v3), Some(Ordering::Less));
        assert_eq!(branch.partial_cmp(&v3), None);
        assert_eq!(v3.partial_cmp(&branch), None);
        assert_eq!(branch.compare(&v2), Ordering::Equal);
        assert_eq!(v3.fallback(), Some("base2"));
        assert_eq!(root.fallback(), None);
    }

    #[test]
    fn test_quote_helpers() {
        let mut dialect = Dialect::new("d", "D", Product::Ansi);
        assert_eq!(dialect.quote_if_needed("EMP"), "EMP");
        assert_eq!(dialect.quote_if_needed("emp"), "\"emp\"");
        assert_eq!(dialect.native_case("emp"), "EMP");
        assert_eq!(dialect.native_case("\"emp\""), "emp");

        dialect.syntax.quote = QuotePair::BRACKET;
        dialect.syntax.default_case = DefaultCase::AsIs;
        assert_eq!(dialect.quote("a]b"), "[a]]b]");
        assert_eq!(dialect.unquote("[a]]b]"), "a]b");
        assert_eq!(
            dialect.object_full_name(Some("db"), Some("dbo"), "Emp", false),
            "dbo.Emp"
        );
        dialect.features.supports_catalog = true;
        assert_eq!(
            dialect.object_full_name(Some("db"), Some("dbo"), "Emp", true),
            "[db].[dbo].[Emp]"
        );
    }

    #[test]
    fn test_narrow_decimal() {
        let dialect = Dialect::new("d", "D", Product::Ansi);
        let cases = [
            (1, DataType::Bit),
            (2, DataType::TinyInt),
            (4, DataType::SmallInt),
            (9, DataType::Int),
            (19, DataType::BigInt),
        ];
        for (precision, expected) in cases {
            let mut column = Column::new("n").with_type(DataType::Decimal).with_length(precision);
            dialect.narrow_decimal(&mut column);
            assert_eq!(column.data_type, Some(expected));
            assert_eq!(column.length, None);
        }

        let mut wide = Column::new("n").with_type(DataType::Decimal).with_length(25);
        dialect.narrow_decimal(&mut wide);
        assert_eq!(wide.data_type, Some(DataType::Decimal));

        let mut scaled = Column::new("n").with_type(DataType::Numeric).with_length(9).with_scale(2);
        dialect.narrow_decimal(&mut scaled);
        assert_eq!(scaled.data_type, Some(DataType::Numeric));
    }

    #[test]
    fn test_optimistic_lock_column() {
        let dialect = Dialect::new("d", "D", Product::Ansi);
        assert!(dialect.is_optimistic_lock_column(&Column::new("LOCK_VERSION").with_type(DataType::Int)));
        assert!(dialect.is_optimistic_lock_column(&Column::new("LockVersion").with_type(DataType::BigInt)));
        assert!(!dialect.is_optimistic_lock_column(&Column::new("lock_version").with_type(DataType::Varchar)));
    }

    #[test]
    fn test_sql_value_literal_fallbacks() {
        let dialect = Dialect::new("d", "D", Product::Ansi);
        let column = Column::new("status").with_type(DataType::Varchar).not_null().with_default("'N'");
        assert_eq!(dialect.sql_value_literal(&column, &SqlValue::Null), "'N'");
        assert_eq!(dialect.sql_value_literal(&column, &SqlValue::from("it's")), "'it''s'");
        let nullable = Column::new("n").with_type(DataType::Int);
        assert_eq!(dialect.sql_value_literal(&nullable, &SqlValue::Null), "NULL");
        assert_eq!(dialect.sql_value_literal(&nullable, &SqlValue::Int(7)), "7");
    }

    #[test]
    fn test_sequence_and_limit() {
        let mut dialect = Dialect::new("d", "D", Product::Ansi);
        assert_eq!(dialect.sequence_next_value("s").as_deref(), Some("NEXT VALUE FOR s"));
        dialect.syntax.sequence = SequenceStyle::Nextval;
        assert_eq!(dialect.sequence_next_value("s").as_deref(), Some("nextval('s')"));
        assert_eq!(
            dialect.limit_clause(10, None).as_deref(),
            Some("OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY")
        );
        dialect.syntax.limit = LimitStyle::Top;
        assert_eq!(dialect.limit_clause(10, None), None);
    }
}
