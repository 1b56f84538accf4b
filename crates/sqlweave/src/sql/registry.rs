//! SQL factory registry.
//!
//! Factories are looked up by `(ObjectKind, SqlType)`. A registry starts from
//! the shared default factories, then applies the dialect's factory layers in
//! inheritance order; each layer registers only what its dialect overrides.
//! Asking for a pair nothing registered is a configuration bug and fails with
//! [`SqlWeaveError::UnregisteredOperation`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::core::{DbObject, ObjectKind, Schema, SqlOperation, SqlType, Table};
use crate::diff::{inbound_foreign_keys, DiffState, SchemaDifference};
use crate::dialect::Dialect;
use crate::error::{Result, SqlWeaveError};

use super::builder::SqlBuilder;
use super::factories;
use super::options::SqlFactoryOptions;

/// Produces statements for one `(ObjectKind, SqlType)` pair.
///
/// Factories hold no per-call state; everything they need comes from the
/// registry (dialect and options) and the object.
pub trait SqlFactory: Send + Sync {
    /// Statements for a concrete object.
    fn create_sql(
        &self,
        registry: &SqlFactoryRegistry<'_>,
        object: &DbObject<'_>,
    ) -> Result<Vec<SqlOperation>>;

    /// Statements turning `diff.original` into `diff.target`.
    fn create_diff_sql(
        &self,
        registry: &SqlFactoryRegistry<'_>,
        diff: &SchemaDifference<'_>,
    ) -> Result<Vec<SqlOperation>> {
        Err(SqlWeaveError::unregistered(
            diff.kind,
            SqlType::Alter,
            registry.dialect().id(),
        ))
    }
}

/// Factories keyed by object kind and operation.
#[derive(Clone, Default)]
pub struct FactoryTable {
    factories: HashMap<(ObjectKind, SqlType), Arc<dyn SqlFactory>>,
}

impl fmt::Debug for FactoryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.factories.keys().collect();
        keys.sort();
        f.debug_struct("FactoryTable").field("keys", &keys).finish()
    }
}

impl FactoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the factory for a pair.
    pub fn register<F>(&mut self, kind: ObjectKind, operation: SqlType, factory: F) -> &mut Self
    where
        F: SqlFactory + 'static,
    {
        self.factories.insert((kind, operation), Arc::new(factory));
        self
    }

    /// Remove a pair, making it unsupported for the dialect.
    pub fn remove(&mut self, kind: ObjectKind, operation: SqlType) -> &mut Self {
        self.factories.remove(&(kind, operation));
        self
    }

    pub fn get(&self, kind: ObjectKind, operation: SqlType) -> Option<&Arc<dyn SqlFactory>> {
        self.factories.get(&(kind, operation))
    }

    pub fn contains(&self, kind: ObjectKind, operation: SqlType) -> bool {
        self.factories.contains_key(&(kind, operation))
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// A dialect's factory overrides, applied on top of its parent's.
pub type FactoryLayer = fn(&mut FactoryTable);

/// Factory lookup for one dialect, owned by the caller that requested it.
#[derive(Debug, Clone)]
pub struct SqlFactoryRegistry<'d> {
    dialect: &'d Dialect,
    table: FactoryTable,
    options: SqlFactoryOptions,
}

impl<'d> SqlFactoryRegistry<'d> {
    /// Defaults plus `layers`, in order.
    pub fn with_layers(dialect: &'d Dialect, layers: &[FactoryLayer]) -> Self {
        let mut table = FactoryTable::new();
        factories::register_defaults(&mut table);
        for layer in layers {
            layer(&mut table);
        }
        Self {
            dialect,
            table,
            options: SqlFactoryOptions::default(),
        }
    }

    pub fn dialect(&self) -> &'d Dialect {
        self.dialect
    }

    pub fn options(&self) -> &SqlFactoryOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut SqlFactoryOptions {
        &mut self.options
    }

    pub fn with_options(mut self, options: SqlFactoryOptions) -> Self {
        self.options = options;
        self
    }

    /// Override a factory for this registry only.
    pub fn register<F>(&mut self, kind: ObjectKind, operation: SqlType, factory: F) -> &mut Self
    where
        F: SqlFactory + 'static,
    {
        self.table.register(kind, operation, factory);
        self
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn contains(&self, kind: ObjectKind, operation: SqlType) -> bool {
        self.table.contains(kind, operation)
    }

    /// The factory for a pair.
    pub fn get(&self, kind: ObjectKind, operation: SqlType) -> Result<&dyn SqlFactory> {
        match self.table.get(kind, operation) {
            Some(factory) => Ok(factory.as_ref()),
            None => Err(SqlWeaveError::unregistered(kind, operation, self.dialect.id())),
        }
    }

    /// A builder bound to this registry's dialect and options.
    pub fn builder(&self) -> SqlBuilder<'_> {
        SqlBuilder::new(self.dialect, &self.options)
    }

    /// Statements for `operation` on a concrete object.
    pub fn create_sql(&self, operation: SqlType, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        debug!(
            "Generating {:?} for {:?} {}",
            operation,
            object.kind(),
            object.qualified_name()
        );
        self.get(object.kind(), operation)?.create_sql(self, object)
    }

    /// Statements applying one difference. Empty differences yield nothing.
    pub fn diff_sql(&self, diff: &SchemaDifference<'_>) -> Result<Vec<SqlOperation>> {
        match (diff.state, diff.original.as_ref(), diff.target.as_ref()) {
            (DiffState::Unchanged, _, _) => Ok(Vec::new()),
            (DiffState::Added, _, Some(target)) => self.create_sql(SqlType::Create, target),
            (DiffState::Removed, Some(original), _) => self.create_sql(SqlType::Drop, original),
            (DiffState::Modified, _, _) if diff.is_empty() => Ok(Vec::new()),
            (DiffState::Modified, _, _) => self
                .get(diff.kind, SqlType::Alter)?
                .create_diff_sql(self, diff),
            (state, _, _) => Err(SqlWeaveError::Config(format!(
                "{:?} difference for {} is missing its {} object",
                state,
                diff.name,
                if state == DiffState::Added { "target" } else { "original" }
            ))),
        }
    }

    /// Statements turning the `original` schema into `target`, given the
    /// differences [`SchemaComparer::compare_schemas`] found between them.
    ///
    /// Views are dropped first and created last, tables are dropped before
    /// sequences are and created after them, so dependent objects never
    /// outlive or precede what they use. Foreign keys of other tables that
    /// reference a changed or dropped column are dropped before any table is
    /// altered and created again at the end, when the target still has them.
    ///
    /// [`SchemaComparer::compare_schemas`]: crate::diff::SchemaComparer::compare_schemas
    pub fn schema_diff_sql(
        &self,
        original: &Schema,
        target: &Schema,
        diffs: &[SchemaDifference<'_>],
    ) -> Result<Vec<SqlOperation>> {
        let rank = |d: &SchemaDifference<'_>| -> u8 {
            match (d.state, d.kind) {
                (DiffState::Removed, ObjectKind::View) => 0,
                (DiffState::Modified, ObjectKind::View) => 0,
                (DiffState::Removed, ObjectKind::Table) => 1,
                (DiffState::Removed, _) => 2,
                (DiffState::Added, ObjectKind::Sequence) => 3,
                (DiffState::Modified, ObjectKind::Sequence) => 3,
                (DiffState::Added, ObjectKind::Table) => 4,
                (DiffState::Modified, ObjectKind::Table) => 5,
                (DiffState::Added, _) => 6,
                _ => 7,
            }
        };
        let inbound = inbound_foreign_keys(original, diffs);
        let deferred: HashSet<String> = inbound
            .iter()
            .map(|&(owner, fk)| DbObject::ForeignKey(owner, fk).qualified_name().to_ascii_lowercase())
            .collect();
        let is_deferred = |op: &SqlOperation| {
            op.object_kind == ObjectKind::ForeignKey
                && deferred.contains(&op.object_name.to_ascii_lowercase())
        };

        let mut operations = Vec::new();
        for &(owner, fk) in &inbound {
            operations.extend(self.create_sql(SqlType::Drop, &DbObject::ForeignKey(owner, fk))?);
        }
        let mut ordered: Vec<&SchemaDifference<'_>> = diffs.iter().collect();
        ordered.sort_by_key(|d| rank(d));
        for diff in ordered {
            operations.extend(self.diff_sql(diff)?.into_iter().filter(|op| !is_deferred(op)));
        }
        for &(owner, fk) in &inbound {
            let Some(target_owner) = find_table(target, owner.schema_name.as_deref(), &owner.name) else {
                continue;
            };
            let Some(target_fk) = target_owner
                .foreign_keys
                .iter()
                .find(|k| k.name.eq_ignore_ascii_case(&fk.name))
            else {
                continue;
            };
            let ref_schema = target_fk.ref_schema.as_deref().or(target_owner.schema_name.as_deref());
            if find_table(target, ref_schema, &target_fk.ref_table).is_none() {
                debug!("Foreign key {} references a dropped table, not recreated", target_fk.name);
                continue;
            }
            let object = DbObject::ForeignKey(target_owner, target_fk);
            operations.extend(self.create_sql(SqlType::Create, &object)?);
        }
        Ok(operations)
    }
}

fn find_table<'s>(schema: &'s Schema, schema_name: Option<&str>, name: &str) -> Option<&'s Table> {
    schema.tables.iter().find(|t| {
        t.name.eq_ignore_ascii_case(name)
            && match (t.schema_name.as_deref(), schema_name) {
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                (None, None) => true,
                _ => false,
            }
    })
}
