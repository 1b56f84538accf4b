//! Connection seam used by the version applier.
//!
//! The applier never talks to a database directly. It runs split statements
//! and touches the ledger through [`Connection`], which a driver crate
//! implements on top of its client. [`InMemoryConnection`] keeps the ledger
//! in memory and records what it was asked to execute.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;

use super::ledger::{VersionLedger, VersionRow};
use crate::error::{Result, SqlWeaveError};

/// Transaction, statement and ledger access for one target database.
///
/// Implementations hold at most one open transaction; the applier pairs
/// every `begin` with one `commit` or `rollback` within a single version.
#[async_trait]
pub trait Connection: Send {
    async fn begin(&mut self) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;

    /// Execute one statement, returning the affected row count.
    async fn execute(&mut self, sql: &str) -> Result<u64>;

    /// Whether the ledger holds a row for `id`.
    ///
    /// SQL implementations run [`VersionLedger::exists_sql`].
    async fn version_exists(&mut self, ledger: &VersionLedger, id: i64) -> Result<bool>;

    /// Record a version. Must fail when the id is already recorded.
    async fn insert_version(&mut self, ledger: &VersionLedger, row: &VersionRow) -> Result<()>;

    /// Remove a version, returning whether a row was deleted.
    async fn delete_version(&mut self, ledger: &VersionLedger, id: i64) -> Result<bool>;

    /// Every recorded version, ascending by id.
    async fn applied_versions(&mut self, ledger: &VersionLedger) -> Result<Vec<VersionRow>>;

    /// Connection type name for logging.
    fn connection_type(&self) -> &'static str;
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    rows: BTreeMap<i64, VersionRow>,
    executed: usize,
}

/// Connection keeping the ledger in a map.
///
/// Transactions snapshot the ledger and the executed-statement log, so a
/// rollback forgets both. Statements containing a registered failure marker
/// fail with [`SqlWeaveError::Connection`].
#[derive(Debug, Default)]
pub struct InMemoryConnection {
    rows: BTreeMap<i64, VersionRow>,
    executed: Vec<String>,
    fail_markers: Vec<String>,
    transaction: Option<Snapshot>,
    commits: usize,
    rollbacks: usize,
}

impl InMemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every statement that contains `marker`.
    pub fn fail_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_markers.push(marker.into());
        self
    }

    /// Pre-populate the ledger, as another process would.
    pub fn with_row(mut self, row: VersionRow) -> Self {
        self.rows.insert(row.id, row);
        self
    }

    /// Statements executed and not rolled back, in order.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    pub fn rows(&self) -> impl Iterator<Item = &VersionRow> {
        self.rows.values()
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks
    }
}

#[async_trait]
impl Connection for InMemoryConnection {
    async fn begin(&mut self) -> Result<()> {
        if self.transaction.is_some() {
            return Err(SqlWeaveError::Connection(
                "transaction already open".to_string(),
            ));
        }
        self.transaction = Some(Snapshot {
            rows: self.rows.clone(),
            executed: self.executed.len(),
        });
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.transaction
            .take()
            .ok_or_else(|| SqlWeaveError::Connection("no open transaction to commit".to_string()))?;
        self.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        let snapshot = self.transaction.take().ok_or_else(|| {
            SqlWeaveError::Connection("no open transaction to roll back".to_string())
        })?;
        self.rows = snapshot.rows;
        self.executed.truncate(snapshot.executed);
        self.rollbacks += 1;
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<u64> {
        if let Some(marker) = self.fail_markers.iter().find(|m| sql.contains(m.as_str())) {
            return Err(SqlWeaveError::Connection(format!(
                "statement rejected (matched '{}')",
                marker
            )));
        }
        debug!("in-memory execute: {}", sql);
        self.executed.push(sql.to_string());
        Ok(0)
    }

    async fn version_exists(&mut self, _ledger: &VersionLedger, id: i64) -> Result<bool> {
        Ok(self.rows.contains_key(&id))
    }

    async fn insert_version(&mut self, ledger: &VersionLedger, row: &VersionRow) -> Result<()> {
        if self.rows.contains_key(&row.id) {
            return Err(SqlWeaveError::Connection(format!(
                "duplicate key {} in {}",
                row.id,
                ledger.table().full_name()
            )));
        }
        self.rows.insert(row.id, row.clone());
        Ok(())
    }

    async fn delete_version(&mut self, _ledger: &VersionLedger, id: i64) -> Result<bool> {
        Ok(self.rows.remove(&id).is_some())
    }

    async fn applied_versions(&mut self, _ledger: &VersionLedger) -> Result<Vec<VersionRow>> {
        Ok(self.rows.values().cloned().collect())
    }

    fn connection_type(&self) -> &'static str {
        "in-memory"
    }
}
