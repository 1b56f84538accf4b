//! Emitted SQL statements and the object/operation keys factories are
//! registered under.

use serde::{Deserialize, Serialize};

use super::schema::{
    CheckConstraint, Column, ForeignKey, Index, PrimaryKey, Sequence, Table, UniqueConstraint,
    View,
};

/// Kind of schema object a factory handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Table,
    Column,
    PrimaryKey,
    UniqueConstraint,
    ForeignKey,
    CheckConstraint,
    Index,
    Sequence,
    View,
}

/// Operation a factory performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    Create,
    Drop,
    Alter,
    Insert,
    Update,
    Delete,
    MergeByPk,
    SelectAll,
    Lock,
    Truncate,
    /// Delimiter switch emitted around procedural statements.
    SetDelimiter,
}

/// Borrowed view of one schema object handed to a factory.
#[derive(Debug, Clone, Copy)]
pub enum DbObject<'a> {
    Table(&'a Table),
    Column(&'a Table, &'a Column),
    PrimaryKey(&'a Table, &'a PrimaryKey),
    UniqueConstraint(&'a Table, &'a UniqueConstraint),
    ForeignKey(&'a Table, &'a ForeignKey),
    CheckConstraint(&'a Table, &'a CheckConstraint),
    Index(&'a Table, &'a Index),
    Sequence(&'a Sequence),
    View(&'a View),
}

impl<'a> DbObject<'a> {
    pub fn kind(&self) -> ObjectKind {
        match self {
            DbObject::Table(_) => ObjectKind::Table,
            DbObject::Column(..) => ObjectKind::Column,
            DbObject::PrimaryKey(..) => ObjectKind::PrimaryKey,
            DbObject::UniqueConstraint(..) => ObjectKind::UniqueConstraint,
            DbObject::ForeignKey(..) => ObjectKind::ForeignKey,
            DbObject::CheckConstraint(..) => ObjectKind::CheckConstraint,
            DbObject::Index(..) => ObjectKind::Index,
            DbObject::Sequence(_) => ObjectKind::Sequence,
            DbObject::View(_) => ObjectKind::View,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            DbObject::Table(t) => &t.name,
            DbObject::Column(_, c) => &c.name,
            DbObject::PrimaryKey(_, pk) => &pk.name,
            DbObject::UniqueConstraint(_, u) => &u.name,
            DbObject::ForeignKey(_, fk) => &fk.name,
            DbObject::CheckConstraint(_, c) => &c.name,
            DbObject::Index(_, i) => &i.name,
            DbObject::Sequence(s) => &s.name,
            DbObject::View(v) => &v.name,
        }
    }

    /// The owning table for table-scoped objects.
    pub fn table(&self) -> Option<&'a Table> {
        match self {
            DbObject::Table(t)
            | DbObject::Column(t, _)
            | DbObject::PrimaryKey(t, _)
            | DbObject::UniqueConstraint(t, _)
            | DbObject::ForeignKey(t, _)
            | DbObject::CheckConstraint(t, _)
            | DbObject::Index(t, _) => Some(t),
            DbObject::Sequence(_) | DbObject::View(_) => None,
        }
    }

    /// `schema.name` for top-level objects, `table.name` for table-scoped ones.
    pub fn qualified_name(&self) -> String {
        match self {
            DbObject::Table(t) => t.full_name(),
            DbObject::Sequence(s) => qualify(s.schema_name.as_deref(), &s.name),
            DbObject::View(v) => qualify(v.schema_name.as_deref(), &v.name),
            other => match other.table() {
                Some(t) => format!("{}.{}", t.full_name(), other.name()),
                None => other.name().to_string(),
            },
        }
    }
}

fn qualify(schema: Option<&str>, name: &str) -> String {
    match schema {
        Some(s) => format!("{}.{}", s, name),
        None => name.to_string(),
    }
}

/// One emitted, directly executable statement plus purpose metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlOperation {
    /// Statement text without a trailing delimiter.
    pub sql: String,
    /// Operation that produced the statement.
    pub sql_type: SqlType,
    /// Kind of the target object.
    pub object_kind: ObjectKind,
    /// Qualified name of the target object.
    pub object_name: String,
}

impl SqlOperation {
    pub fn new(sql: impl Into<String>, sql_type: SqlType, object: &DbObject<'_>) -> Self {
        Self {
            sql: sql.into(),
            sql_type,
            object_kind: object.kind(),
            object_name: object.qualified_name(),
        }
    }
}

impl std::fmt::Display for SqlOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_object_metadata() {
        let table = Table::new("orders").with_schema("sales");
        let index = Index {
            name: "ix_orders_date".into(),
            columns: vec!["order_date".into()],
            ..Default::default()
        };
        let obj = DbObject::Index(&table, &index);
        assert_eq!(obj.kind(), ObjectKind::Index);
        assert_eq!(obj.name(), "ix_orders_date");
        assert_eq!(obj.qualified_name(), "sales.orders.ix_orders_date");
        assert_eq!(obj.table().map(|t| t.name.as_str()), Some("orders"));
    }

    #[test]
    fn test_sql_operation_new() {
        let seq = Sequence::new("seq_order");
        let op = SqlOperation::new("CREATE SEQUENCE seq_order", SqlType::Create, &DbObject::Sequence(&seq));
        assert_eq!(op.object_kind, ObjectKind::Sequence);
        assert_eq!(op.object_name, "seq_order");
        assert_eq!(op.to_string(), "CREATE SEQUENCE seq_order");
    }
}
