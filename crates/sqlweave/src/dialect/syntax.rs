//! Syntax strategy tables.
//!
//! A dialect does not subclass anything to change a fragment of SQL. It holds
//! one strategy value per fragment and a product or version overrides just
//! the fields it needs after cloning its parent.

use crate::core::identifier::{DefaultCase, QuotePair};

/// Row-limiting clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitStyle {
    /// `LIMIT n OFFSET m`
    LimitOffset,
    /// `SELECT TOP n`
    Top,
    /// `OFFSET m ROWS FETCH NEXT n ROWS ONLY`
    OffsetFetch,
    /// `WHERE ROWNUM <= n`
    Rownum,
    Unsupported,
}

/// How MERGE-by-PK is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStyle {
    /// `MERGE INTO t USING (SELECT ...) ON ... WHEN MATCHED ... WHEN NOT MATCHED ...`
    Merge,
    /// `INSERT ... ON CONFLICT (pk) DO UPDATE SET ...`
    OnConflict,
    /// `INSERT ... ON DUPLICATE KEY UPDATE ...`
    OnDuplicateKey,
    /// `MERGE INTO t KEY (pk) VALUES (...)`
    MergeKey,
    /// An UPDATE by PK followed by an INSERT guarded by NOT EXISTS.
    UpdateThenInsert,
}

/// How LOCK TABLE is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStyle {
    /// `LOCK TABLE t IN EXCLUSIVE MODE`
    InMode,
    /// `LOCK TABLES t WRITE`
    LockTables,
    /// `LOCK TABLE t WRITE`
    LockTableWrite,
    /// `SELECT COUNT(*) FROM t WITH (TABLOCKX)`
    TableLockHint,
    Unsupported,
}

/// Identity (auto-increment) column clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityStyle {
    /// `IDENTITY`
    Identity,
    /// `IDENTITY(1,1)`
    IdentitySeed,
    /// `AUTO_INCREMENT`
    AutoIncrement,
    /// `AUTOINCREMENT`
    Autoincrement,
    /// `GENERATED BY DEFAULT AS IDENTITY`
    GeneratedByDefault,
    Unsupported,
}

impl IdentityStyle {
    pub fn clause(&self) -> Option<&'static str> {
        match self {
            IdentityStyle::Identity => Some("IDENTITY"),
            IdentityStyle::IdentitySeed => Some("IDENTITY(1,1)"),
            IdentityStyle::AutoIncrement => Some("AUTO_INCREMENT"),
            IdentityStyle::Autoincrement => Some("AUTOINCREMENT"),
            IdentityStyle::GeneratedByDefault => Some("GENERATED BY DEFAULT AS IDENTITY"),
            IdentityStyle::Unsupported => None,
        }
    }
}

/// How a column default is attached in a column definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultStyle {
    /// `DEFAULT x`
    Inline,
    /// `CONSTRAINT df_<table>_<column> DEFAULT x`, dropped by that name.
    NamedConstraint,
}

impl DefaultStyle {
    /// Name of the default constraint of `table.column`.
    pub fn constraint_name(table: &str, column: &str) -> String {
        format!("df_{}_{}", table, column)
    }
}

/// Computed (generated) column clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputedStyle {
    /// `c TYPE GENERATED ALWAYS AS (expr)`
    GeneratedAlways,
    /// `c TYPE GENERATED ALWAYS AS (expr) STORED`
    GeneratedStored,
    /// `c AS (expr)`, the type is derived from the expression.
    As,
}

impl ComputedStyle {
    /// Whether the column type is written before the expression.
    pub fn states_type(&self) -> bool {
        !matches!(self, ComputedStyle::As)
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            ComputedStyle::GeneratedAlways | ComputedStyle::GeneratedStored => "GENERATED ALWAYS AS",
            ComputedStyle::As => "AS",
        }
    }

    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            ComputedStyle::GeneratedStored => Some("STORED"),
            _ => None,
        }
    }
}

/// Sequence next-value expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStyle {
    /// `NEXT VALUE FOR s`
    NextValueFor,
    /// `nextval('s')`
    Nextval,
    /// `s.NEXTVAL`
    DotNextval,
    Unsupported,
}

/// How a column definition is changed in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlterColumnStyle {
    /// `ALTER COLUMN c TYPE x`, `SET/DROP NOT NULL`, `SET/DROP DEFAULT`
    AlterType,
    /// `ALTER COLUMN c SET DATA TYPE x`, `SET/DROP NOT NULL`, `SET/DROP DEFAULT`
    SetDataType,
    /// `ALTER COLUMN c x [NOT] NULL`
    Redefine,
    /// `MODIFY COLUMN c <definition>`
    ModifyColumn,
    /// `MODIFY (c <definition>)`
    ModifyParen,
}

/// How constraints are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropConstraintStyle {
    /// `DROP CONSTRAINT name`
    Standard,
    /// `DROP PRIMARY KEY`, `DROP FOREIGN KEY name`, `DROP INDEX name`, `DROP CHECK name`
    MySql,
}

/// How an index is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropIndexStyle {
    /// `DROP INDEX schema.ix`
    Qualified,
    /// `DROP INDEX ix ON schema.t`
    OnTable,
    /// `DROP INDEX t.ix`
    TableDot,
}

/// How a script switches delimiters around procedural statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProceduralStyle {
    /// `DELIMITER $$` ... `DELIMITER ;`
    DelimiterCommand,
    /// The block ends at a line holding only this token (`/`, `GO`).
    LineTerminator(String),
    Plain,
}

/// Syntax fragments of one dialect.
#[derive(Debug, Clone, PartialEq)]
pub struct Syntax {
    pub quote: QuotePair,
    pub default_case: DefaultCase,
    /// Statement delimiter used in scripts.
    pub delimiter: String,
    pub limit: LimitStyle,
    pub merge: MergeStyle,
    pub lock: LockStyle,
    pub identity: IdentityStyle,
    pub default: DefaultStyle,
    pub computed: ComputedStyle,
    pub sequence: SequenceStyle,
    pub alter_column: AlterColumnStyle,
    pub drop_constraint: DropConstraintStyle,
    pub drop_index: DropIndexStyle,
    pub procedural: ProceduralStyle,
    /// `ADD COLUMN` or plain `ADD`.
    pub add_column: &'static str,
    /// Whether `ON UPDATE <expr>` can follow a column definition.
    pub on_update_clause: bool,
    pub current_date: String,
    pub current_time: String,
    pub current_timestamp: String,
    /// Table a FROM-less SELECT must name (`DUAL`).
    pub dual_table: Option<String>,
    /// `#` starts a line comment.
    pub hash_comments: bool,
    /// Backslash escapes inside string literals.
    pub backslash_escapes: bool,
    /// `$tag$ ... $tag$` string quoting.
    pub dollar_quotes: bool,
    pub nested_comments: bool,
    /// Vendor index types accepted in `CREATE INDEX`.
    pub index_types: Vec<String>,
    pub system_schemas: Vec<String>,
}

impl Default for Syntax {
    /// SQL:2003 spelling.
    fn default() -> Self {
        Self {
            quote: QuotePair::DOUBLE,
            default_case: DefaultCase::UpperCase,
            delimiter: ";".to_string(),
            limit: LimitStyle::OffsetFetch,
            merge: MergeStyle::Merge,
            lock: LockStyle::InMode,
            identity: IdentityStyle::GeneratedByDefault,
            default: DefaultStyle::Inline,
            computed: ComputedStyle::GeneratedAlways,
            sequence: SequenceStyle::NextValueFor,
            alter_column: AlterColumnStyle::SetDataType,
            drop_constraint: DropConstraintStyle::Standard,
            drop_index: DropIndexStyle::Qualified,
            procedural: ProceduralStyle::Plain,
            add_column: "ADD COLUMN",
            on_update_clause: false,
            current_date: "CURRENT_DATE".to_string(),
            current_time: "CURRENT_TIME".to_string(),
            current_timestamp: "CURRENT_TIMESTAMP".to_string(),
            dual_table: None,
            hash_comments: false,
            backslash_escapes: false,
            dollar_quotes: false,
            nested_comments: false,
            index_types: Vec::new(),
            system_schemas: vec!["INFORMATION_SCHEMA".to_string()],
        }
    }
}

/// Feature flags of one dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Features {
    pub supports_limit: bool,
    pub supports_limit_offset: bool,
    pub supports_identity: bool,
    pub supports_sequence: bool,
    pub supports_merge: bool,
    pub supports_with: bool,
    pub supports_top: bool,
    pub supports_rownum: bool,
    pub supports_domain: bool,
    pub supports_drop_cascade: bool,
    pub supports_cascade_delete: bool,
    pub supports_cascade_update: bool,
    pub supports_set_null: bool,
    pub supports_set_default: bool,
    pub supports_catalog: bool,
    pub supports_schema: bool,
    pub supports_if_exists: bool,
    pub supports_standard_offset_fetch: bool,
    pub supports_comment_statement: bool,
    pub supports_check_constraint: bool,
    pub supports_index_include: bool,
    pub supports_alter_add_constraint: bool,
    pub is_ddl_rollbackable: bool,
    pub recommends_n_type_char: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            supports_limit: false,
            supports_limit_offset: false,
            supports_identity: true,
            supports_sequence: true,
            supports_merge: true,
            supports_with: true,
            supports_top: false,
            supports_rownum: false,
            supports_domain: false,
            supports_drop_cascade: true,
            supports_cascade_delete: true,
            supports_cascade_update: true,
            supports_set_null: true,
            supports_set_default: true,
            supports_catalog: false,
            supports_schema: true,
            supports_if_exists: false,
            supports_standard_offset_fetch: true,
            supports_comment_statement: false,
            supports_check_constraint: true,
            supports_index_include: false,
            supports_alter_add_constraint: true,
            is_ddl_rollbackable: false,
            recommends_n_type_char: false,
        }
    }
}
