//! Dialect-bound SQL text accumulator.
//!
//! Every factory writes through a [`SqlBuilder`], so spacing, identifier
//! quoting and column definitions come out the same way everywhere. Words are
//! separated by a single space unless the previous character already
//! separates them (whitespace, `(` or `.`).

use crate::core::{Column, Table};
use crate::dialect::{DefaultStyle, Dialect};

use super::options::SqlFactoryOptions;

const INDENT: &str = "    ";

/// Fluent builder for one statement.
#[derive(Debug, Clone)]
pub struct SqlBuilder<'a> {
    dialect: &'a Dialect,
    options: &'a SqlFactoryOptions,
    sql: String,
    indent: usize,
}

impl<'a> SqlBuilder<'a> {
    pub fn new(dialect: &'a Dialect, options: &'a SqlFactoryOptions) -> Self {
        Self {
            dialect,
            options,
            sql: String::new(),
            indent: 0,
        }
    }

    pub fn dialect(&self) -> &'a Dialect {
        self.dialect
    }

    pub fn options(&self) -> &'a SqlFactoryOptions {
        self.options
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    fn needs_space(&self) -> bool {
        match self.sql.chars().last() {
            None => false,
            Some(c) => !(c.is_whitespace() || c == '(' || c == '.'),
        }
    }

    /// Append text verbatim.
    pub fn append(&mut self, text: &str) -> &mut Self {
        self.sql.push_str(text);
        self
    }

    /// Append a keyword or expression, space separated.
    pub fn keyword(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        if self.needs_space() {
            self.sql.push(' ');
        }
        self.sql.push_str(text);
        self
    }

    /// Append a column name, quoted per the options.
    pub fn name(&mut self, column: &str) -> &mut Self {
        let quoted = self.column_name(column);
        self.keyword(&quoted)
    }

    /// Append comma-separated column names.
    pub fn names<S: AsRef<str>>(&mut self, names: &[S]) -> &mut Self {
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                self.sql.push(',');
            }
            self.name(name.as_ref());
        }
        self
    }

    /// Append a schema-scoped object name.
    pub fn object_name(&mut self, schema: Option<&str>, name: &str) -> &mut Self {
        let full = self.qualified_name(schema, name);
        self.keyword(&full)
    }

    pub fn table_name(&mut self, table: &Table) -> &mut Self {
        self.object_name(table.schema_name.as_deref(), &table.name)
    }

    /// Append an unqualified constraint or index name.
    pub fn constraint_name(&mut self, name: &str) -> &mut Self {
        let quoted = self.object_part(name);
        self.keyword(&quoted)
    }

    /// Quoted column name without appending it.
    pub fn column_name(&self, column: &str) -> String {
        if self.options.quote_column_name {
            self.dialect.quote(column)
        } else {
            self.dialect.quote_if_needed(column)
        }
    }

    /// Quoted, optionally schema-decorated object name without appending it.
    pub fn qualified_name(&self, schema: Option<&str>, name: &str) -> String {
        let schema = schema.filter(|_| {
            self.options.decorate_schema_name && self.dialect.features.supports_schema
        });
        match schema {
            Some(s) => format!("{}.{}", self.object_part(s), self.object_part(name)),
            None => self.object_part(name),
        }
    }

    fn object_part(&self, name: &str) -> String {
        if self.options.quote_object_name {
            self.dialect.quote(name)
        } else {
            self.dialect.quote_if_needed(name)
        }
    }

    pub fn lparen(&mut self) -> &mut Self {
        self.keyword("(")
    }

    pub fn rparen(&mut self) -> &mut Self {
        self.append(")")
    }

    pub fn comma(&mut self) -> &mut Self {
        self.append(",")
    }

    /// Newline followed by the current indentation.
    pub fn line_break(&mut self) -> &mut Self {
        self.sql.push('\n');
        for _ in 0..self.indent {
            self.sql.push_str(INDENT);
        }
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.indent += 1;
        self
    }

    pub fn unindent(&mut self) -> &mut Self {
        self.indent = self.indent.saturating_sub(1);
        self
    }

    /// Run `f` only when `condition` holds.
    pub fn if_(&mut self, condition: bool, f: impl FnOnce(&mut Self)) -> &mut Self {
        if condition {
            f(self);
        }
        self
    }

    /// Append `keyword` before every item but the first.
    pub fn separator(&mut self, first: bool, keyword: &str) -> &mut Self {
        if !first {
            if keyword == "," {
                self.comma();
            } else {
                self.keyword(keyword);
            }
        }
        self
    }

    // =========================================================================
    // Vocabulary
    // =========================================================================

    pub fn select(&mut self) -> &mut Self {
        self.keyword("SELECT")
    }

    pub fn from(&mut self) -> &mut Self {
        self.keyword("FROM")
    }

    pub fn insert_into(&mut self, table: &Table) -> &mut Self {
        self.keyword("INSERT INTO").table_name(table)
    }

    pub fn update(&mut self, table: &Table) -> &mut Self {
        self.keyword("UPDATE").table_name(table)
    }

    pub fn delete_from(&mut self, table: &Table) -> &mut Self {
        self.keyword("DELETE FROM").table_name(table)
    }

    pub fn merge_into(&mut self, table: &Table) -> &mut Self {
        self.keyword("MERGE INTO").table_name(table)
    }

    pub fn create(&mut self) -> &mut Self {
        self.keyword("CREATE")
    }

    pub fn drop(&mut self) -> &mut Self {
        self.keyword("DROP")
    }

    pub fn alter_table(&mut self, table: &Table) -> &mut Self {
        self.keyword("ALTER TABLE").table_name(table)
    }

    pub fn values(&mut self) -> &mut Self {
        self.keyword("VALUES")
    }

    pub fn set(&mut self) -> &mut Self {
        self.keyword("SET")
    }

    pub fn where_(&mut self) -> &mut Self {
        self.keyword("WHERE")
    }

    pub fn and(&mut self) -> &mut Self {
        self.keyword("AND")
    }

    pub fn on(&mut self) -> &mut Self {
        self.keyword("ON")
    }

    /// `IF EXISTS` when the dialect supports it.
    pub fn if_exists(&mut self) -> &mut Self {
        let supported = self.dialect.features.supports_if_exists;
        self.if_(supported, |b| {
            b.keyword("IF EXISTS");
        })
    }

    /// Named parameter placeholder for a column: `:name`.
    pub fn parameter(&mut self, column: &str) -> &mut Self {
        self.keyword(&format!(":{}", column))
    }

    /// `name TYPE [identity] [DEFAULT x] [NOT NULL] [ON UPDATE x]`, or the
    /// dialect's computed form when the column has a formula.
    ///
    /// Under [`DefaultStyle::NamedConstraint`] the default is written as
    /// `CONSTRAINT df_<table>_<column> DEFAULT x`.
    pub fn column_definition(&mut self, table: &Table, column: &Column) -> &mut Self {
        let dialect = self.dialect;
        let syntax = &dialect.syntax;
        self.name(&column.name);
        if let Some(formula) = &column.formula {
            if syntax.computed.states_type() {
                self.keyword(&dialect.column_type_sql(column));
            }
            self.keyword(syntax.computed.prefix()).lparen().append(formula).rparen();
            if let Some(suffix) = syntax.computed.suffix() {
                self.keyword(suffix);
            }
            return self;
        }
        self.keyword(&dialect.column_type_sql(column));
        let identity = column
            .identity
            .then(|| syntax.identity.clause())
            .flatten()
            .filter(|_| dialect.features.supports_identity);
        match (identity, &column.default_value) {
            (Some(clause), _) => {
                self.keyword(clause);
            }
            (None, Some(default)) => {
                if syntax.default == DefaultStyle::NamedConstraint {
                    self.keyword("CONSTRAINT")
                        .constraint_name(&DefaultStyle::constraint_name(&table.name, &column.name));
                }
                self.keyword("DEFAULT").keyword(default);
            }
            (None, None) => {}
        }
        if column.not_null {
            self.keyword("NOT NULL");
        }
        if let Some(expr) = column.on_update.as_deref().filter(|_| syntax.on_update_clause) {
            self.keyword("ON UPDATE").keyword(expr);
        }
        self
    }

    /// The accumulated text.
    pub fn build(&self) -> String {
        self.sql.clone()
    }

    pub fn into_sql(self) -> String {
        self.sql
    }
}
