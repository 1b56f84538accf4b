//! The persisted version ledger.
//!
//! One row per applied version. The id column carries a primary key so two
//! processes recording the same version cannot both succeed; the applier's
//! existence check relies on that.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::{LedgerColumns, VersioningConfig};
use crate::core::{Column, DataType, DbObject, SqlOperation, SqlType, SqlValue, Table};
use crate::dialect::Dialect;
use crate::error::Result;
use crate::sql::{SqlBuilder, SqlFactoryOptions};

/// Width of a hex-encoded SHA-256 digest.
const CHECKSUM_LENGTH: u64 = 64;

/// Ledger entry of one applied version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRow {
    pub id: i64,
    /// SHA-256 of the up script, hex encoded.
    pub checksum: String,
    pub applied_at: DateTime<Utc>,
}

impl VersionRow {
    /// A row stamped with the current time.
    pub fn new(id: i64, checksum: impl Into<String>) -> Self {
        Self {
            id,
            checksum: checksum.into(),
            applied_at: Utc::now(),
        }
    }
}

/// SHA-256 of a script body, hex encoded.
pub fn checksum(script: &str) -> String {
    hex::encode(Sha256::digest(script.as_bytes()))
}

/// Ledger table definition and the statements that read and write it,
/// rendered for one dialect.
#[derive(Debug, Clone)]
pub struct VersionLedger {
    dialect: Dialect,
    options: SqlFactoryOptions,
    table: Table,
    columns: LedgerColumns,
}

impl VersionLedger {
    pub fn new(dialect: &Dialect, config: &VersioningConfig) -> Self {
        let columns = config.columns.clone();
        let mut table = Table::new(config.table.clone())
            .with_column(Column::new(columns.id.clone()).with_type(DataType::BigInt).not_null())
            .with_column(
                Column::new(columns.checksum.clone())
                    .with_type(DataType::Varchar)
                    .with_length(CHECKSUM_LENGTH)
                    .not_null(),
            )
            .with_column(
                Column::new(columns.applied_at.clone())
                    .with_type(DataType::Timestamp)
                    .not_null(),
            )
            .with_primary_key(&[columns.id.as_str()]);
        table.schema_name = config.schema.clone();
        Self {
            dialect: dialect.clone(),
            options: SqlFactoryOptions::default(),
            table,
            columns,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn columns(&self) -> &LedgerColumns {
        &self.columns
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    fn builder(&self) -> SqlBuilder<'_> {
        SqlBuilder::new(&self.dialect, &self.options)
    }

    fn literal(&self, column: &str, value: &SqlValue) -> String {
        match self.table.column(column) {
            Some(c) => self.dialect.sql_value_literal(c, value),
            None => "NULL".to_string(),
        }
    }

    fn id_literal(&self, id: i64) -> String {
        self.literal(&self.columns.id, &SqlValue::Int(id))
    }

    /// `CREATE TABLE` of the ledger, through the dialect's factories.
    pub fn create_sql(&self) -> Result<Vec<SqlOperation>> {
        let registry = self.dialect.sql_factory_registry();
        registry.create_sql(SqlType::Create, &DbObject::Table(&self.table))
    }

    /// `SELECT COUNT(*) FROM ledger WHERE id = n`
    pub fn exists_sql(&self, id: i64) -> String {
        let mut b = self.builder();
        b.select()
            .keyword("COUNT(*)")
            .from()
            .table_name(&self.table)
            .where_()
            .name(&self.columns.id)
            .keyword("=")
            .keyword(&self.id_literal(id));
        b.into_sql()
    }

    /// `INSERT INTO ledger (id, checksum, applied_at) VALUES (..)`
    pub fn insert_sql(&self, row: &VersionRow) -> String {
        let values = [
            self.id_literal(row.id),
            self.literal(&self.columns.checksum, &SqlValue::Text(row.checksum.clone())),
            self.literal(
                &self.columns.applied_at,
                &SqlValue::DateTime(row.applied_at.naive_utc()),
            ),
        ];
        let mut b = self.builder();
        b.insert_into(&self.table)
            .lparen()
            .names(&[&self.columns.id, &self.columns.checksum, &self.columns.applied_at])
            .rparen()
            .values()
            .lparen();
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                b.comma();
            }
            b.keyword(value);
        }
        b.rparen();
        b.into_sql()
    }

    /// `DELETE FROM ledger WHERE id = n`
    pub fn delete_sql(&self, id: i64) -> String {
        let mut b = self.builder();
        b.delete_from(&self.table)
            .where_()
            .name(&self.columns.id)
            .keyword("=")
            .keyword(&self.id_literal(id));
        b.into_sql()
    }

    /// Every ledger row, ascending by id.
    pub fn select_sql(&self) -> String {
        let mut b = self.builder();
        b.select()
            .names(&[&self.columns.id, &self.columns.checksum, &self.columns.applied_at])
            .from()
            .table_name(&self.table)
            .keyword("ORDER BY")
            .name(&self.columns.id);
        b.into_sql()
    }
}
