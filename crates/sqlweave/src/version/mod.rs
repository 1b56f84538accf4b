//! Versioned script apply.
//!
//! Every version walks the same state machine in either direction:
//!
//! ```text
//! PENDING ──check──► CHECKED ──run body──► APPLIED ──record──► RECORDED
//!    │                  │                     │                   │
//!    └──────────────────┴─────────► ERROR ◄───┴───────────────────┘
//! ```
//!
//! | step     | up                               | down                          |
//! |----------|----------------------------------|-------------------------------|
//! | check    | ledger row must be absent        | ledger row must be present    |
//! | run body | up script, split per dialect     | down script, split per dialect|
//! | record   | insert ledger row                | delete ledger row             |
//! | on error | remove a row this run inserted   | nothing                       |
//!
//! A failed check is a [`ConcurrencyFault`](SqlWeaveError::ConcurrencyFault):
//! another process got there first. Versions run one at a time, ascending
//! going up and descending going down, and the batch stops at the first
//! version that reaches ERROR. Nothing is retried.

pub mod connection;
pub mod ledger;
pub mod source;

pub use connection::{Connection, InMemoryConnection};
pub use ledger::{checksum, VersionLedger, VersionRow};
pub use source::{DirectoryScriptSource, InMemoryScriptSource, ScriptSource, VersionScript};

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::VersioningConfig;
use crate::dialect::Dialect;
use crate::error::{Result, SqlWeaveError};

/// Which way versions are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Up => "up",
            Direction::Down => "down",
        })
    }
}

/// Where one version is in its apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VersionState {
    Pending,
    Checked,
    Applied,
    Recorded,
    Error,
}

impl VersionState {
    /// State reached when the current step succeeds.
    pub fn next(self) -> Option<VersionState> {
        match self {
            VersionState::Pending => Some(VersionState::Checked),
            VersionState::Checked => Some(VersionState::Applied),
            VersionState::Applied => Some(VersionState::Recorded),
            VersionState::Recorded | VersionState::Error => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for VersionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VersionState::Pending => "PENDING",
            VersionState::Checked => "CHECKED",
            VersionState::Applied => "APPLIED",
            VersionState::Recorded => "RECORDED",
            VersionState::Error => "ERROR",
        })
    }
}

/// Apply behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Highest id applied going up; lowest id reverted going down. Without
    /// it, up applies every pending version and down reverts the latest one.
    pub last_change_to_apply: Option<i64>,

    /// Wrap each version (check, body and record) in its own transaction.
    pub transactional: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            last_change_to_apply: None,
            transactional: true,
        }
    }
}

impl From<&VersioningConfig> for ApplyOptions {
    fn from(config: &VersioningConfig) -> Self {
        Self {
            last_change_to_apply: config.last_change_to_apply,
            transactional: config.transactional,
        }
    }
}

/// The version that stopped a batch.
#[derive(Debug)]
pub struct VersionFailure {
    pub id: i64,
    /// Last state reached before ERROR.
    pub reached: VersionState,
    pub error: SqlWeaveError,
}

/// Outcome of one batch.
#[derive(Debug)]
pub struct VersionReport {
    pub direction: Direction,
    /// Versions that reached RECORDED, in apply order.
    pub applied: Vec<i64>,
    /// Statements executed across the applied versions.
    pub statements: usize,
    pub failure: Option<VersionFailure>,
}

impl VersionReport {
    fn new(direction: Direction) -> Self {
        Self {
            direction,
            applied: Vec::new(),
            statements: 0,
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// The applied ids, or the error that stopped the batch.
    pub fn into_result(self) -> Result<Vec<i64>> {
        match self.failure {
            Some(failure) => Err(failure.error),
            None => Ok(self.applied),
        }
    }
}

/// Runs version scripts against one connection.
#[derive(Debug, Clone, Copy)]
pub struct VersionApplier<'a> {
    dialect: &'a Dialect,
    ledger: &'a VersionLedger,
    options: ApplyOptions,
}

impl<'a> VersionApplier<'a> {
    pub fn new(dialect: &'a Dialect, ledger: &'a VersionLedger) -> Self {
        Self {
            dialect,
            ledger,
            options: ApplyOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ApplyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ApplyOptions {
        &self.options
    }

    /// Create the ledger table.
    pub async fn init_ledger<C>(&self, conn: &mut C) -> Result<()>
    where
        C: Connection + ?Sized,
    {
        for operation in self.ledger.create_sql()? {
            conn.execute(&operation.sql).await?;
        }
        info!("Created version ledger {}", self.ledger.table().full_name());
        Ok(())
    }

    /// Versions a batch in `direction` would run, in apply order.
    pub async fn plan<C>(
        &self,
        conn: &mut C,
        source: &dyn ScriptSource,
        direction: Direction,
    ) -> Result<Vec<VersionScript>>
    where
        C: Connection + ?Sized,
    {
        let recorded = conn.applied_versions(self.ledger).await?;
        let bound = self.options.last_change_to_apply;

        let plan = match direction {
            Direction::Up => {
                let done: BTreeSet<i64> = recorded.iter().map(|r| r.id).collect();
                source
                    .scripts()
                    .await?
                    .into_iter()
                    .filter(|s| !done.contains(&s.id))
                    .filter(|s| bound.map_or(true, |b| s.id <= b))
                    .collect()
            }
            Direction::Down => {
                let mut rows: Vec<_> = recorded
                    .into_iter()
                    .rev()
                    .filter(|r| bound.map_or(true, |b| r.id >= b))
                    .collect();
                if bound.is_none() {
                    rows.truncate(1);
                }
                let mut scripts = Vec::with_capacity(rows.len());
                for row in rows {
                    let script = source.script(row.id).await?.ok_or_else(|| {
                        SqlWeaveError::Config(format!(
                            "Version {} is recorded but {} has no script for it",
                            row.id,
                            source.source_type()
                        ))
                    })?;
                    if script.down.is_none() {
                        return Err(SqlWeaveError::Config(format!(
                            "Version {} ({}) has no down script",
                            script.id, script.name
                        )));
                    }
                    if script.checksum() != row.checksum {
                        warn!(
                            "Version {} changed since it was applied (checksum {} recorded)",
                            script.id, row.checksum
                        );
                    }
                    scripts.push(script);
                }
                scripts
            }
        };
        debug!("Planned {} {} versions", plan.len(), direction);
        Ok(plan)
    }

    /// Plan and apply a batch.
    pub async fn apply<C>(
        &self,
        conn: &mut C,
        source: &dyn ScriptSource,
        direction: Direction,
    ) -> Result<VersionReport>
    where
        C: Connection + ?Sized,
    {
        let plan = self.plan(conn, source, direction).await?;
        Ok(self.apply_versions(conn, &plan, direction).await)
    }

    /// Apply `scripts` in direction order, stopping at the first failure.
    ///
    /// Scripts are not filtered against the ledger first; a version whose
    /// ledger state does not match `direction` fails its check.
    pub async fn apply_versions<C>(
        &self,
        conn: &mut C,
        scripts: &[VersionScript],
        direction: Direction,
    ) -> VersionReport
    where
        C: Connection + ?Sized,
    {
        let mut ordered: Vec<&VersionScript> = scripts.iter().collect();
        match direction {
            Direction::Up => ordered.sort_by_key(|s| s.id),
            Direction::Down => ordered.sort_by_key(|s| std::cmp::Reverse(s.id)),
        }

        let mut report = VersionReport::new(direction);
        for script in ordered {
            match self.apply_version(conn, script, direction).await {
                Ok(statements) => {
                    report.applied.push(script.id);
                    report.statements += statements;
                }
                Err(failure) => {
                    report.failure = Some(failure);
                    break;
                }
            }
        }

        match &report.failure {
            None => info!(
                "Applied {} {} versions ({} statements) via {}",
                report.applied.len(),
                direction,
                report.statements,
                conn.connection_type()
            ),
            Some(failure) => error!(
                "Batch {} stopped at version {} after {} versions: {}",
                direction,
                failure.id,
                report.applied.len(),
                failure.error
            ),
        }
        report
    }

    /// Walk one version to RECORDED, returning the statements executed.
    async fn apply_version<C>(
        &self,
        conn: &mut C,
        script: &VersionScript,
        direction: Direction,
    ) -> std::result::Result<usize, VersionFailure>
    where
        C: Connection + ?Sized,
    {
        let mut state = VersionState::Pending;
        let mut statements = 0;
        let mut in_transaction = false;

        if self.options.transactional {
            if let Err(e) = conn.begin().await {
                return Err(self.fail(conn, script, direction, state, false, e).await);
            }
            in_transaction = true;
        }

        while let Some(next) = state.next() {
            let outcome = match next {
                VersionState::Checked => self.check(conn, script.id, direction).await,
                VersionState::Applied => self
                    .run_body(conn, script, direction)
                    .await
                    .map(|n| statements = n),
                VersionState::Recorded => self.record(conn, script, direction).await,
                VersionState::Pending | VersionState::Error => Ok(()),
            };
            if let Err(e) = outcome {
                return Err(self.fail(conn, script, direction, state, in_transaction, e).await);
            }
            state = next;
            info!("Version {} ({}) {} [{}]", script.id, script.name, state, direction);
        }

        if in_transaction {
            if let Err(e) = conn.commit().await {
                return Err(self.fail(conn, script, direction, state, true, e).await);
            }
        }
        Ok(statements)
    }

    async fn check<C>(&self, conn: &mut C, id: i64, direction: Direction) -> Result<()>
    where
        C: Connection + ?Sized,
    {
        let exists = conn.version_exists(self.ledger, id).await?;
        match (direction, exists) {
            (Direction::Up, true) => Err(SqlWeaveError::concurrency(
                id,
                direction,
                "version is already recorded in the ledger",
            )),
            (Direction::Down, false) => Err(SqlWeaveError::concurrency(
                id,
                direction,
                "version is not recorded in the ledger",
            )),
            _ => Ok(()),
        }
    }

    async fn run_body<C>(&self, conn: &mut C, script: &VersionScript, direction: Direction) -> Result<usize>
    where
        C: Connection + ?Sized,
    {
        let body = script.body(direction).ok_or_else(|| {
            SqlWeaveError::Config(format!("Version {} has no {} script", script.id, direction))
        })?;
        let splits = self.dialect.splitter().split(body);
        let mut executed = 0;
        for split in splits.iter().filter(|s| !s.comment_only) {
            conn.execute(&split.text)
                .await
                .map_err(|e| SqlWeaveError::script(script.id, split.span, &split.text, e.to_string()))?;
            executed += 1;
        }
        debug!(
            "Version {} ({}) executed {} statements",
            script.id, direction, executed
        );
        Ok(executed)
    }

    async fn record<C>(&self, conn: &mut C, script: &VersionScript, direction: Direction) -> Result<()>
    where
        C: Connection + ?Sized,
    {
        match direction {
            Direction::Up => {
                let row = VersionRow::new(script.id, script.checksum());
                conn.insert_version(self.ledger, &row).await
            }
            Direction::Down => {
                if conn.delete_version(self.ledger, script.id).await? {
                    Ok(())
                } else {
                    Err(SqlWeaveError::concurrency(
                        script.id,
                        direction,
                        "ledger row disappeared before it could be deleted",
                    ))
                }
            }
        }
    }

    /// Move a version to ERROR: close its transaction and run the error hook.
    async fn fail<C>(
        &self,
        conn: &mut C,
        script: &VersionScript,
        direction: Direction,
        reached: VersionState,
        in_transaction: bool,
        error: SqlWeaveError,
    ) -> VersionFailure
    where
        C: Connection + ?Sized,
    {
        error!(
            "Version {} ({}) {} after {} [{}]: {}",
            script.id,
            script.name,
            VersionState::Error,
            reached,
            direction,
            error
        );
        if in_transaction {
            if let Err(e) = conn.rollback().await {
                warn!("Rollback of version {} failed: {}", script.id, e);
            }
        }
        match direction {
            // The row was inserted by this run but the commit failed.
            Direction::Up if reached == VersionState::Recorded => {
                match conn.delete_version(self.ledger, script.id).await {
                    Ok(true) => warn!("Removed ledger row of failed version {}", script.id),
                    Ok(false) => {}
                    Err(e) => warn!("Cleanup of version {} failed: {}", script.id, e),
                }
            }
            Direction::Up | Direction::Down => {}
        }
        VersionFailure {
            id: script.id,
            reached,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VersioningConfig;

    fn setup() -> (Dialect, VersionLedger) {
        let dialect = crate::drivers::ansi::dialect();
        let ledger = VersionLedger::new(&dialect, &VersioningConfig::default());
        (dialect, ledger)
    }

    fn scripts() -> InMemoryScriptSource {
        InMemoryScriptSource::new()
            .with_script(
                VersionScript::new(1, "users", "CREATE TABLE users (id INT);\nCREATE INDEX ix_users ON users (id);")
                    .with_down("DROP TABLE users;"),
            )
            .with_script(
                VersionScript::new(2, "orders", "-- orders\nCREATE TABLE orders (id INT);")
                    .with_down("DROP TABLE orders;"),
            )
            .with_script(
                VersionScript::new(3, "audit", "CREATE TABLE audit (id INT);")
                    .with_down("DROP TABLE audit;"),
            )
    }

    #[test]
    fn test_state_transitions() {
        assert_eq!(VersionState::Pending.next(), Some(VersionState::Checked));
        assert_eq!(VersionState::Checked.next(), Some(VersionState::Applied));
        assert_eq!(VersionState::Applied.next(), Some(VersionState::Recorded));
        assert!(VersionState::Recorded.is_terminal());
        assert!(VersionState::Error.is_terminal());
        assert_eq!(Direction::Down.to_string(), "down");
        assert_eq!(VersionState::Applied.to_string(), "APPLIED");
    }

    #[tokio::test]
    async fn test_apply_up_all_pending() {
        let (dialect, ledger) = setup();
        let applier = VersionApplier::new(&dialect, &ledger);
        let mut conn = InMemoryConnection::new();

        let report = applier.apply(&mut conn, &scripts(), Direction::Up).await.unwrap();
        assert!(report.is_success());
        assert_eq!(report.applied, vec![1, 2, 3]);
        assert_eq!(report.statements, 4);
        assert_eq!(conn.commits(), 3);
        assert_eq!(
            conn.executed()[0..2],
            ["CREATE TABLE users (id INT)".to_string(), "CREATE INDEX ix_users ON users (id)".to_string()]
        );
        let row = conn.rows().next().unwrap();
        assert_eq!(row.checksum, checksum("CREATE TABLE users (id INT);\nCREATE INDEX ix_users ON users (id);"));

        let again = applier.apply(&mut conn, &scripts(), Direction::Up).await.unwrap();
        assert!(again.applied.is_empty());
        assert!(again.is_success());
    }

    #[tokio::test]
    async fn test_bounds_per_direction() {
        let (dialect, ledger) = setup();
        let mut conn = InMemoryConnection::new();
        let bounded = |bound| {
            VersionApplier::new(&dialect, &ledger).with_options(ApplyOptions {
                last_change_to_apply: bound,
                transactional: true,
            })
        };

        let up = bounded(Some(2)).apply(&mut conn, &scripts(), Direction::Up).await.unwrap();
        assert_eq!(up.applied, vec![1, 2]);

        let down = bounded(None).apply(&mut conn, &scripts(), Direction::Down).await.unwrap();
        assert_eq!(down.applied, vec![2]);

        bounded(None).apply(&mut conn, &scripts(), Direction::Up).await.unwrap();
        let down = bounded(Some(2)).apply(&mut conn, &scripts(), Direction::Down).await.unwrap();
        assert_eq!(down.applied, vec![3, 2]);
        assert_eq!(conn.rows().map(|r| r.id).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn test_concurrency_fault_both_directions() {
        let (dialect, ledger) = setup();
        let applier = VersionApplier::new(&dialect, &ledger);
        let source = scripts();
        let v1 = vec![source.script(1).await.unwrap().unwrap()];
        let mut conn = InMemoryConnection::new();

        assert_eq!(applier.apply_versions(&mut conn, &v1, Direction::Up).await.into_result().unwrap(), vec![1]);
        let second = applier.apply_versions(&mut conn, &v1, Direction::Up).await;
        let failure = second.failure.unwrap();
        assert_eq!(failure.id, 1);
        assert_eq!(failure.reached, VersionState::Pending);
        assert!(failure.error.is_concurrency_fault());

        assert!(applier.apply_versions(&mut conn, &v1, Direction::Down).await.is_success());
        assert_eq!(conn.rows().count(), 0);
        let err = applier
            .apply_versions(&mut conn, &v1, Direction::Down)
            .await
            .into_result()
            .unwrap_err();
        assert!(err.is_concurrency_fault());
    }

    #[tokio::test]
    async fn test_script_failure_rolls_back_and_stops_batch() {
        let (dialect, ledger) = setup();
        let applier = VersionApplier::new(&dialect, &ledger);
        let mut conn = InMemoryConnection::new().fail_on("orders");

        let report = applier.apply(&mut conn, &scripts(), Direction::Up).await.unwrap();
        assert_eq!(report.applied, vec![1]);
        let failure = report.failure.unwrap();
        assert_eq!(failure.id, 2);
        assert_eq!(failure.reached, VersionState::Checked);
        match failure.error {
            SqlWeaveError::ScriptExecution { version_id, span, statement, .. } => {
                assert_eq!(version_id, 2);
                assert_eq!(statement, "CREATE TABLE orders (id INT)");
                assert_eq!(span.start, "-- orders\n".len());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(conn.rollbacks(), 1);
        assert!(!conn.in_transaction());
        assert_eq!(conn.rows().map(|r| r.id).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn test_non_transactional_keeps_partial_work() {
        let (dialect, ledger) = setup();
        let applier = VersionApplier::new(&dialect, &ledger).with_options(ApplyOptions {
            last_change_to_apply: None,
            transactional: false,
        });
        let source = InMemoryScriptSource::new().with_script(VersionScript::new(
            5,
            "two_steps",
            "CREATE TABLE a (id INT);\nCREATE TABLE broken (id INT);",
        ));
        let mut conn = InMemoryConnection::new().fail_on("broken");

        let report = applier.apply(&mut conn, &source, Direction::Up).await.unwrap();
        assert!(!report.is_success());
        assert_eq!(conn.executed(), ["CREATE TABLE a (id INT)".to_string()]);
        assert_eq!(conn.commits() + conn.rollbacks(), 0);
        assert_eq!(conn.rows().count(), 0);
    }

    #[tokio::test]
    async fn test_down_plan_requires_scripts() {
        let (dialect, ledger) = setup();
        let applier = VersionApplier::new(&dialect, &ledger);
        let mut conn = InMemoryConnection::new().with_row(VersionRow::new(9, "x"));
        let source = scripts();
        assert!(applier.plan(&mut conn, &source, Direction::Down).await.is_err());

        let no_down = InMemoryScriptSource::new().with_script(VersionScript::new(9, "x", "SELECT 1;"));
        assert!(applier.plan(&mut conn, &no_down, Direction::Down).await.is_err());
    }

    #[tokio::test]
    async fn test_init_ledger() {
        let (dialect, ledger) = setup();
        let mut conn = InMemoryConnection::new();
        VersionApplier::new(&dialect, &ledger).init_ledger(&mut conn).await.unwrap();
        assert_eq!(conn.executed().len(), 1);
        assert!(conn.executed()[0].starts_with("CREATE TABLE"));
    }
}
