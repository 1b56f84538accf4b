//! Diff engine: property-level deltas between two snapshots of a schema.
//!
//! A [`SchemaDifference`] records, for one pair of same-kind objects, the
//! changed scalar properties as `(old, new)` JSON values and the differences
//! of contained objects (columns, constraints, indexes) as children. Only
//! changed children are recorded, so a structurally identical pair yields an
//! empty difference.
//!
//! Equality is dialect-aware: column types are compared by the DDL the active
//! dialect would emit, so synonyms (`INT4` and `INTEGER` on PostgreSQL)
//! compare equal.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::core::{
    Column, DbObject, ForeignKey, Index, ObjectKind, PrimaryKey, Schema, Sequence, Table, View,
};
use crate::dialect::Dialect;

/// How an object differs between the original and target snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffState {
    Unchanged,
    Added,
    Removed,
    Modified,
}

/// Old and new value of one property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyChange {
    pub old: Value,
    pub new: Value,
}

/// Difference of one object pair.
#[derive(Debug, Clone)]
pub struct SchemaDifference<'a> {
    pub kind: ObjectKind,
    pub name: String,
    pub state: DiffState,
    pub original: Option<DbObject<'a>>,
    pub target: Option<DbObject<'a>>,
    /// Changed scalar properties, keyed by property name.
    pub properties: BTreeMap<String, PropertyChange>,
    /// Differences of contained objects; only changed ones are kept.
    pub children: Vec<SchemaDifference<'a>>,
}

impl<'a> SchemaDifference<'a> {
    fn added(target: DbObject<'a>) -> Self {
        Self {
            kind: target.kind(),
            name: target.name().to_string(),
            state: DiffState::Added,
            original: None,
            target: Some(target),
            properties: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    fn removed(original: DbObject<'a>) -> Self {
        Self {
            kind: original.kind(),
            name: original.name().to_string(),
            state: DiffState::Removed,
            original: Some(original),
            target: None,
            properties: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    fn pair(original: DbObject<'a>, target: DbObject<'a>) -> Self {
        Self {
            kind: target.kind(),
            name: target.name().to_string(),
            state: DiffState::Unchanged,
            original: Some(original),
            target: Some(target),
            properties: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// No property and no child changed.
    pub fn is_empty(&self) -> bool {
        match self.state {
            DiffState::Unchanged => true,
            DiffState::Added | DiffState::Removed => false,
            DiffState::Modified => self.properties.is_empty() && self.children.is_empty(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyChange> {
        self.properties.get(name)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Changed children of one kind.
    pub fn children_of(&self, kind: ObjectKind) -> impl Iterator<Item = &SchemaDifference<'a>> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    /// Changed child by kind and name (case-insensitive).
    pub fn child(&self, kind: ObjectKind, name: &str) -> Option<&SchemaDifference<'a>> {
        self.children_of(kind)
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    fn compare(&mut self, property: &str, old: Value, new: Value) {
        if old != new {
            self.properties
                .insert(property.to_string(), PropertyChange { old, new });
        }
    }

    fn push_child(&mut self, child: SchemaDifference<'a>) {
        if !child.is_empty() {
            self.children.push(child);
        }
    }

    /// Mark as modified when anything changed.
    fn settle(mut self) -> Self {
        if self.state == DiffState::Unchanged
            && (!self.properties.is_empty() || !self.children.is_empty())
        {
            self.state = DiffState::Modified;
        }
        self
    }
}

/// Computes differences using one dialect's notion of equality.
#[derive(Debug, Clone, Copy)]
pub struct SchemaComparer<'d> {
    dialect: &'d Dialect,
}

fn names_value(names: &[String]) -> Value {
    Value::Array(names.iter().map(|n| json!(n.to_ascii_lowercase())).collect())
}

/// Whitespace-insensitive text; used for check definitions and view bodies.
fn normalize_sql(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Default expressions as catalogs report them: `((0))` and `0` are equal.
fn normalize_default(text: &str) -> String {
    let mut current = text.trim();
    while current.starts_with('(') && current.ends_with(')') && current.len() >= 2 {
        current = current[1..current.len() - 1].trim();
    }
    current.to_string()
}

/// Pair up two name-keyed lists: `(original, target)` with either side
/// missing when the object was added or removed. Target order wins, removed
/// objects come last.
fn pair_by_name<'x, T>(
    original: &'x [T],
    target: &'x [T],
    name: impl Fn(&T) -> &str,
) -> Vec<(Option<&'x T>, Option<&'x T>)> {
    let mut pairs: Vec<(Option<&T>, Option<&T>)> = target
        .iter()
        .map(|t| {
            let o = original
                .iter()
                .find(|o| name(o).eq_ignore_ascii_case(name(t)));
            (o, Some(t))
        })
        .collect();
    for o in original {
        if !target.iter().any(|t| name(t).eq_ignore_ascii_case(name(o))) {
            pairs.push((Some(o), None));
        }
    }
    pairs
}

impl<'d> SchemaComparer<'d> {
    pub fn new(dialect: &'d Dialect) -> Self {
        Self { dialect }
    }

    /// Differences of every table, sequence and view of two schemas.
    /// Unchanged objects are left out.
    pub fn compare_schemas<'a>(&self, original: &'a Schema, target: &'a Schema) -> Vec<SchemaDifference<'a>> {
        let mut diffs = Vec::new();
        for pair in pair_by_name(&original.tables, &target.tables, |t| t.name.as_str()) {
            let diff = match pair {
                (Some(o), Some(t)) => self.compare_tables(o, t),
                (None, Some(t)) => SchemaDifference::added(DbObject::Table(t)),
                (Some(o), None) => SchemaDifference::removed(DbObject::Table(o)),
                (None, None) => continue,
            };
            if !diff.is_empty() {
                diffs.push(diff);
            }
        }
        for pair in pair_by_name(&original.sequences, &target.sequences, |s| s.name.as_str()) {
            let diff = match pair {
                (Some(o), Some(t)) => self.compare_sequences(o, t),
                (None, Some(t)) => SchemaDifference::added(DbObject::Sequence(t)),
                (Some(o), None) => SchemaDifference::removed(DbObject::Sequence(o)),
                (None, None) => continue,
            };
            if !diff.is_empty() {
                diffs.push(diff);
            }
        }
        for pair in pair_by_name(&original.views, &target.views, |v| v.name.as_str()) {
            let diff = match pair {
                (Some(o), Some(t)) => self.compare_views(o, t),
                (None, Some(t)) => SchemaDifference::added(DbObject::View(t)),
                (Some(o), None) => SchemaDifference::removed(DbObject::View(o)),
                (None, None) => continue,
            };
            if !diff.is_empty() {
                diffs.push(diff);
            }
        }
        debug!("Schema comparison found {} changed objects", diffs.len());
        diffs
    }

    /// Difference of two snapshots of one table.
    pub fn compare_tables<'a>(&self, original: &'a Table, target: &'a Table) -> SchemaDifference<'a> {
        let mut diff = SchemaDifference::pair(DbObject::Table(original), DbObject::Table(target));
        diff.compare("remarks", json!(original.remarks), json!(target.remarks));

        for pair in pair_by_name(&original.columns, &target.columns, |c| c.name.as_str()) {
            let child = match pair {
                (Some(o), Some(t)) => self.compare_columns(original, o, target, t),
                (None, Some(t)) => SchemaDifference::added(DbObject::Column(target, t)),
                (Some(o), None) => SchemaDifference::removed(DbObject::Column(original, o)),
                (None, None) => continue,
            };
            diff.push_child(child);
        }

        let pks = (original.primary_key.as_ref(), target.primary_key.as_ref());
        let pk_child = match pks {
            (Some(o), Some(t)) => Some(self.compare_primary_keys(original, o, target, t)),
            (None, Some(t)) => Some(SchemaDifference::added(DbObject::PrimaryKey(target, t))),
            (Some(o), None) => Some(SchemaDifference::removed(DbObject::PrimaryKey(original, o))),
            (None, None) => None,
        };
        if let Some(child) = pk_child {
            diff.push_child(child);
        }

        for pair in pair_by_name(&original.unique_constraints, &target.unique_constraints, |u| u.name.as_str()) {
            let child = match pair {
                (Some(o), Some(t)) => {
                    let mut c = SchemaDifference::pair(
                        DbObject::UniqueConstraint(original, o),
                        DbObject::UniqueConstraint(target, t),
                    );
                    c.compare("columns", names_value(&o.columns), names_value(&t.columns));
                    c.settle()
                }
                (None, Some(t)) => SchemaDifference::added(DbObject::UniqueConstraint(target, t)),
                (Some(o), None) => SchemaDifference::removed(DbObject::UniqueConstraint(original, o)),
                (None, None) => continue,
            };
            diff.push_child(child);
        }

        for pair in pair_by_name(&original.check_constraints, &target.check_constraints, |c| c.name.as_str()) {
            let child = match pair {
                (Some(o), Some(t)) => {
                    let mut c = SchemaDifference::pair(
                        DbObject::CheckConstraint(original, o),
                        DbObject::CheckConstraint(target, t),
                    );
                    c.compare(
                        "definition",
                        json!(normalize_sql(&o.definition)),
                        json!(normalize_sql(&t.definition)),
                    );
                    c.settle()
                }
                (None, Some(t)) => SchemaDifference::added(DbObject::CheckConstraint(target, t)),
                (Some(o), None) => SchemaDifference::removed(DbObject::CheckConstraint(original, o)),
                (None, None) => continue,
            };
            diff.push_child(child);
        }

        for pair in pair_by_name(&original.foreign_keys, &target.foreign_keys, |f| f.name.as_str()) {
            let child = match pair {
                (Some(o), Some(t)) => self.compare_foreign_keys(original, o, target, t),
                (None, Some(t)) => SchemaDifference::added(DbObject::ForeignKey(target, t)),
                (Some(o), None) => SchemaDifference::removed(DbObject::ForeignKey(original, o)),
                (None, None) => continue,
            };
            diff.push_child(child);
        }

        for pair in pair_by_name(&original.indexes, &target.indexes, |i| i.name.as_str()) {
            let child = match pair {
                (Some(o), Some(t)) => self.compare_indexes(original, o, target, t),
                (None, Some(t)) => SchemaDifference::added(DbObject::Index(target, t)),
                (Some(o), None) => SchemaDifference::removed(DbObject::Index(original, o)),
                (None, None) => continue,
            };
            diff.push_child(child);
        }

        diff.settle()
    }

    pub fn compare_columns<'a>(
        &self,
        original_table: &'a Table,
        original: &'a Column,
        target_table: &'a Table,
        target: &'a Column,
    ) -> SchemaDifference<'a> {
        let mut diff = SchemaDifference::pair(
            DbObject::Column(original_table, original),
            DbObject::Column(target_table, target),
        );
        diff.compare(
            "data_type",
            json!(self.dialect.column_type_sql(original)),
            json!(self.dialect.column_type_sql(target)),
        );
        diff.compare("not_null", json!(original.not_null), json!(target.not_null));
        diff.compare(
            "default_value",
            json!(original.default_value.as_deref().map(normalize_default)),
            json!(target.default_value.as_deref().map(normalize_default)),
        );
        diff.compare("identity", json!(original.identity), json!(target.identity));
        diff.compare("on_update", json!(original.on_update), json!(target.on_update));
        diff.compare(
            "formula",
            json!(original.formula.as_deref().map(normalize_sql)),
            json!(target.formula.as_deref().map(normalize_sql)),
        );
        diff.compare("remarks", json!(original.remarks), json!(target.remarks));
        diff.settle()
    }

    fn compare_primary_keys<'a>(
        &self,
        original_table: &'a Table,
        original: &'a PrimaryKey,
        target_table: &'a Table,
        target: &'a PrimaryKey,
    ) -> SchemaDifference<'a> {
        let mut diff = SchemaDifference::pair(
            DbObject::PrimaryKey(original_table, original),
            DbObject::PrimaryKey(target_table, target),
        );
        diff.compare(
            "name",
            json!(original.name.to_ascii_lowercase()),
            json!(target.name.to_ascii_lowercase()),
        );
        diff.compare("columns", names_value(&original.columns), names_value(&target.columns));
        diff.settle()
    }

    fn compare_foreign_keys<'a>(
        &self,
        original_table: &'a Table,
        original: &'a ForeignKey,
        target_table: &'a Table,
        target: &'a ForeignKey,
    ) -> SchemaDifference<'a> {
        let mut diff = SchemaDifference::pair(
            DbObject::ForeignKey(original_table, original),
            DbObject::ForeignKey(target_table, target),
        );
        diff.compare("columns", names_value(&original.columns), names_value(&target.columns));
        diff.compare(
            "ref_table",
            json!(original.ref_table.to_ascii_lowercase()),
            json!(target.ref_table.to_ascii_lowercase()),
        );
        diff.compare("ref_schema", json!(original.ref_schema), json!(target.ref_schema));
        diff.compare(
            "ref_columns",
            names_value(&original.ref_columns),
            names_value(&target.ref_columns),
        );
        diff.compare("on_delete", json!(original.on_delete), json!(target.on_delete));
        diff.compare("on_update", json!(original.on_update), json!(target.on_update));
        diff.settle()
    }

    fn compare_indexes<'a>(
        &self,
        original_table: &'a Table,
        original: &'a Index,
        target_table: &'a Table,
        target: &'a Index,
    ) -> SchemaDifference<'a> {
        let mut diff = SchemaDifference::pair(
            DbObject::Index(original_table, original),
            DbObject::Index(target_table, target),
        );
        diff.compare("columns", names_value(&original.columns), names_value(&target.columns));
        diff.compare("unique", json!(original.unique), json!(target.unique));
        diff.compare(
            "index_type",
            json!(original.index_type.as_deref().map(str::to_ascii_uppercase)),
            json!(target.index_type.as_deref().map(str::to_ascii_uppercase)),
        );
        diff.compare("includes", names_value(&original.includes), names_value(&target.includes));
        diff.settle()
    }

    pub fn compare_sequences<'a>(&self, original: &'a Sequence, target: &'a Sequence) -> SchemaDifference<'a> {
        let mut diff = SchemaDifference::pair(DbObject::Sequence(original), DbObject::Sequence(target));
        diff.compare("start", json!(original.start), json!(target.start));
        diff.compare("increment", json!(original.increment), json!(target.increment));
        diff.compare("min_value", json!(original.min_value), json!(target.min_value));
        diff.compare("max_value", json!(original.max_value), json!(target.max_value));
        diff.compare("cache", json!(original.cache), json!(target.cache));
        diff.compare("cycle", json!(original.cycle), json!(target.cycle));
        diff.settle()
    }

    pub fn compare_views<'a>(&self, original: &'a View, target: &'a View) -> SchemaDifference<'a> {
        let mut diff = SchemaDifference::pair(DbObject::View(original), DbObject::View(target));
        diff.compare(
            "statement",
            json!(normalize_sql(&original.statement)),
            json!(normalize_sql(&target.statement)),
        );
        diff.settle()
    }
}

/// Names of the columns a table-scoped constraint or index reads.
pub(crate) fn referenced_columns<'a>(object: &DbObject<'a>) -> &'a [String] {
    match object {
        DbObject::PrimaryKey(_, pk) => &pk.columns,
        DbObject::UniqueConstraint(_, u) => &u.columns,
        DbObject::ForeignKey(_, fk) => &fk.columns,
        DbObject::CheckConstraint(_, c) => &c.columns,
        DbObject::Index(_, i) => &i.columns,
        DbObject::Column(..) | DbObject::Table(_) | DbObject::Sequence(_) | DbObject::View(_) => &[],
    }
}

/// Foreign keys of other tables that reference a column a table difference
/// drops or changes, or that reference a dropped table.
///
/// Owners that are dropped themselves are skipped; their keys go with them.
pub(crate) fn inbound_foreign_keys<'a>(
    original: &'a Schema,
    diffs: &[SchemaDifference<'_>],
) -> Vec<(&'a Table, &'a ForeignKey)> {
    let is_removed = |table: &Table| {
        diffs.iter().any(|d| {
            d.kind == ObjectKind::Table
                && d.state == DiffState::Removed
                && d.name.eq_ignore_ascii_case(&table.name)
        })
    };
    let mut inbound: Vec<(&'a Table, &'a ForeignKey)> = Vec::new();
    for diff in diffs.iter().filter(|d| d.kind == ObjectKind::Table) {
        let Some(DbObject::Table(changed)) = diff.original else {
            continue;
        };
        let affected: Vec<String> = match diff.state {
            DiffState::Removed => changed.columns.iter().map(|c| c.name.to_ascii_lowercase()).collect(),
            DiffState::Modified => diff
                .children
                .iter()
                .filter(|c| c.state != DiffState::Added)
                .flat_map(|c| match (c.kind, c.original.as_ref()) {
                    (ObjectKind::Column, _) => vec![c.name.clone()],
                    (
                        ObjectKind::PrimaryKey | ObjectKind::UniqueConstraint | ObjectKind::Index,
                        Some(object),
                    ) => referenced_columns(object).to_vec(),
                    _ => Vec::new(),
                })
                .map(|c| c.to_ascii_lowercase())
                .collect(),
            _ => continue,
        };
        if affected.is_empty() {
            continue;
        }
        let is_changed = |table: &Table| {
            table.name.eq_ignore_ascii_case(&changed.name) && table.schema_name == changed.schema_name
        };
        for owner in original.tables.iter().filter(|&t| !is_changed(t) && !is_removed(t)) {
            for fk in &owner.foreign_keys {
                let ref_schema = fk.ref_schema.as_deref().or(owner.schema_name.as_deref());
                let same_schema = match (ref_schema, changed.schema_name.as_deref()) {
                    (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                    (None, None) => true,
                    _ => false,
                };
                let hits = same_schema
                    && fk.ref_table.eq_ignore_ascii_case(&changed.name)
                    && fk
                        .ref_columns
                        .iter()
                        .any(|c| affected.contains(&c.to_ascii_lowercase()));
                let seen = inbound
                    .iter()
                    .any(|(t, k)| std::ptr::eq(*t, owner) && std::ptr::eq(*k, fk));
                if hits && !seen {
                    inbound.push((owner, fk));
                }
            }
        }
    }
    debug!("{} inbound foreign keys depend on changed tables", inbound.len());
    inbound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;

    fn employee() -> Table {
        Table::new("employee")
            .with_column(Column::new("id").with_type(DataType::Int).not_null())
            .with_column(Column::new("name").with_type(DataType::Varchar).with_length(10))
            .with_column(
                Column::new("salary")
                    .with_type(DataType::Decimal)
                    .with_length(9)
                    .with_scale(2),
            )
            .with_primary_key(&["id"])
            .with_unique("uk_employee_name", &["name"])
            .with_index(Index {
                name: "ix_employee_salary".into(),
                columns: vec!["salary".into()],
                ..Default::default()
            })
    }

    fn dialect() -> Dialect {
        crate::drivers::ansi::dialect()
    }

    #[test]
    fn test_identical_clone_yields_empty_diff() {
        let dialect = dialect();
        let comparer = SchemaComparer::new(&dialect);
        let original = employee();
        let target = original.clone();
        let diff = comparer.compare_tables(&original, &target);
        assert!(diff.is_empty());
        assert_eq!(diff.state, DiffState::Unchanged);
        assert!(diff.properties.is_empty());
        assert!(diff.children.is_empty());
    }

    #[test]
    fn test_column_changes_are_recorded() {
        let dialect = dialect();
        let comparer = SchemaComparer::new(&dialect);
        let original = employee();
        let mut target = original.clone();
        target.columns[1].length = Some(40);
        target.columns[1].not_null = true;
        target.columns.remove(2);
        target.columns.push(Column::new("hired_on").with_type(DataType::Date));

        let diff = comparer.compare_tables(&original, &target);
        assert_eq!(diff.state, DiffState::Modified);

        let name = diff.child(ObjectKind::Column, "name").unwrap();
        assert_eq!(name.state, DiffState::Modified);
        assert_eq!(
            name.property("data_type").unwrap().new,
            json!("VARCHAR(40)")
        );
        assert!(name.has_property("not_null"));

        assert_eq!(diff.child(ObjectKind::Column, "salary").unwrap().state, DiffState::Removed);
        assert_eq!(diff.child(ObjectKind::Column, "hired_on").unwrap().state, DiffState::Added);
        assert!(diff.child(ObjectKind::Column, "id").is_none());
    }

    #[test]
    fn test_default_and_case_normalization() {
        let dialect = dialect();
        let comparer = SchemaComparer::new(&dialect);
        let mut original = employee();
        original.columns[0].default_value = Some("((0))".into());
        let mut target = employee();
        target.columns[0].default_value = Some("0".into());
        target.unique_constraints[0].columns = vec!["NAME".into()];
        let diff = comparer.compare_tables(&original, &target);
        assert!(diff.is_empty());
    }

    #[test]
    fn test_synonym_types_compare_equal() {
        let dialect = dialect();
        let comparer = SchemaComparer::new(&dialect);
        let original = Table::new("t").with_column(Column::new("n").with_type(DataType::Int));
        let target = Table::new("t").with_column(
            Column::new("n")
                .with_type(DataType::Int)
                .with_type_name("INTEGER"),
        );
        assert!(comparer.compare_tables(&original, &target).is_empty());
    }

    #[test]
    fn test_compare_schemas() {
        let dialect = dialect();
        let comparer = SchemaComparer::new(&dialect);
        let original = Schema {
            tables: vec![employee(), Table::new("legacy")],
            sequences: vec![Sequence::new("seq_emp")],
            ..Default::default()
        };
        let mut target = original.clone();
        target.tables.remove(1);
        target.sequences[0].increment = Some(10);
        target.views.push(View {
            schema_name: None,
            name: "v_emp".into(),
            statement: "SELECT id FROM employee".into(),
        });

        let diffs = comparer.compare_schemas(&original, &target);
        let summary: Vec<_> = diffs.iter().map(|d| (d.kind, d.name.as_str(), d.state)).collect();
        assert_eq!(
            summary,
            vec![
                (ObjectKind::Table, "legacy", DiffState::Removed),
                (ObjectKind::Sequence, "seq_emp", DiffState::Modified),
                (ObjectKind::View, "v_emp", DiffState::Added),
            ]
        );
    }

    #[test]
    fn test_referenced_columns() {
        let table = employee();
        let index = &table.indexes[0];
        assert_eq!(referenced_columns(&DbObject::Index(&table, index)), &["salary".to_string()]);
        assert!(referenced_columns(&DbObject::Table(&table)).is_empty());
    }
}
