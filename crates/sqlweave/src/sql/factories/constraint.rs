//! Primary key, unique, foreign key and check constraint factories.

use tracing::warn;

use crate::core::{
    CheckConstraint, DbObject, ForeignKey, ObjectKind, PrimaryKey, SqlOperation, SqlType,
    UniqueConstraint,
};
use crate::dialect::DropConstraintStyle;
use crate::error::Result;
use crate::sql::builder::SqlBuilder;
use crate::sql::registry::{SqlFactory, SqlFactoryRegistry};

use super::{single, wrong_object};

/// Whether the options (and the dialect) let a constraint kind through.
pub(crate) fn enabled(registry: &SqlFactoryRegistry<'_>, kind: ObjectKind) -> bool {
    let table = &registry.options().table;
    match kind {
        ObjectKind::ForeignKey => table.with_foreign_key_constraint,
        ObjectKind::UniqueConstraint => table.with_unique_constraint,
        ObjectKind::CheckConstraint => {
            table.with_check_constraint && registry.dialect().features.supports_check_constraint
        }
        _ => true,
    }
}

fn constraint_prefix(b: &mut SqlBuilder<'_>, name: &str) {
    if !name.is_empty() {
        b.keyword("CONSTRAINT").constraint_name(name);
    }
}

pub(crate) fn primary_key_clause(b: &mut SqlBuilder<'_>, pk: &PrimaryKey) {
    constraint_prefix(b, &pk.name);
    b.keyword("PRIMARY KEY").lparen().names(&pk.columns).rparen();
}

pub(crate) fn unique_clause(b: &mut SqlBuilder<'_>, unique: &UniqueConstraint) {
    constraint_prefix(b, &unique.name);
    b.keyword("UNIQUE").lparen().names(&unique.columns).rparen();
}

pub(crate) fn check_clause(b: &mut SqlBuilder<'_>, check: &CheckConstraint) {
    constraint_prefix(b, &check.name);
    b.keyword("CHECK").lparen().keyword(check.definition.trim()).rparen();
}

/// `CONSTRAINT fk FOREIGN KEY (..) REFERENCES t (..) [ON DELETE ..] [ON UPDATE ..]`.
///
/// Rules the dialect cannot express are left out.
pub(crate) fn foreign_key_clause(b: &mut SqlBuilder<'_>, fk: &ForeignKey) {
    let dialect = b.dialect();
    constraint_prefix(b, &fk.name);
    b.keyword("FOREIGN KEY")
        .lparen()
        .names(&fk.columns)
        .rparen()
        .keyword("REFERENCES")
        .object_name(fk.ref_schema.as_deref(), &fk.ref_table)
        .lparen()
        .names(&fk.ref_columns)
        .rparen();
    if let Some(rule) = fk.on_delete.sql() {
        if dialect.supports_rule_on_delete(fk.on_delete) {
            b.keyword("ON DELETE").keyword(rule);
        } else {
            warn!("{}: ON DELETE {} not supported by {}, omitted", fk.name, rule, dialect);
        }
    }
    if let Some(rule) = fk.on_update.sql() {
        if dialect.supports_rule_on_update(fk.on_update) {
            b.keyword("ON UPDATE").keyword(rule);
        } else {
            warn!("{}: ON UPDATE {} not supported by {}, omitted", fk.name, rule, dialect);
        }
    }
}

fn add_constraint(
    registry: &SqlFactoryRegistry<'_>,
    object: &DbObject<'_>,
    clause: impl FnOnce(&mut SqlBuilder<'_>),
) -> Result<Vec<SqlOperation>> {
    if !enabled(registry, object.kind()) {
        return Ok(Vec::new());
    }
    let Some(table) = object.table() else {
        return Err(wrong_object(object, ObjectKind::Table));
    };
    let mut b = registry.builder();
    b.alter_table(table).keyword("ADD");
    clause(&mut b);
    single(b.into_sql(), SqlType::Create, object)
}

/// `ALTER TABLE t ADD CONSTRAINT pk PRIMARY KEY (..)`
#[derive(Debug, Clone, Copy, Default)]
pub struct AddPrimaryKey;

impl SqlFactory for AddPrimaryKey {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let DbObject::PrimaryKey(_, pk) = object else {
            return Err(wrong_object(object, ObjectKind::PrimaryKey));
        };
        add_constraint(registry, object, |b| primary_key_clause(b, pk))
    }
}

/// `ALTER TABLE t ADD CONSTRAINT uk UNIQUE (..)`
#[derive(Debug, Clone, Copy, Default)]
pub struct AddUniqueConstraint;

impl SqlFactory for AddUniqueConstraint {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let DbObject::UniqueConstraint(_, unique) = object else {
            return Err(wrong_object(object, ObjectKind::UniqueConstraint));
        };
        add_constraint(registry, object, |b| unique_clause(b, unique))
    }
}

/// `ALTER TABLE t ADD CONSTRAINT fk FOREIGN KEY (..) REFERENCES ..`
#[derive(Debug, Clone, Copy, Default)]
pub struct AddForeignKey;

impl SqlFactory for AddForeignKey {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let DbObject::ForeignKey(_, fk) = object else {
            return Err(wrong_object(object, ObjectKind::ForeignKey));
        };
        add_constraint(registry, object, |b| foreign_key_clause(b, fk))
    }
}

/// `ALTER TABLE t ADD CONSTRAINT ck CHECK (..)`
#[derive(Debug, Clone, Copy, Default)]
pub struct AddCheckConstraint;

impl SqlFactory for AddCheckConstraint {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let DbObject::CheckConstraint(_, check) = object else {
            return Err(wrong_object(object, ObjectKind::CheckConstraint));
        };
        add_constraint(registry, object, |b| check_clause(b, check))
    }
}

/// Drops any table constraint, spelled per [`DropConstraintStyle`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DropConstraint;

impl SqlFactory for DropConstraint {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        if !enabled(registry, object.kind()) {
            return Ok(Vec::new());
        }
        let (table, name) = match object {
            DbObject::PrimaryKey(t, pk) => (*t, pk.name.as_str()),
            DbObject::UniqueConstraint(t, u) => (*t, u.name.as_str()),
            DbObject::ForeignKey(t, fk) => (*t, fk.name.as_str()),
            DbObject::CheckConstraint(t, c) => (*t, c.name.as_str()),
            other => return Err(wrong_object(other, ObjectKind::PrimaryKey)),
        };
        let mut b = registry.builder();
        b.alter_table(table).drop();
        match (registry.dialect().syntax.drop_constraint, object.kind()) {
            (DropConstraintStyle::MySql, ObjectKind::PrimaryKey) => {
                b.keyword("PRIMARY KEY");
            }
            (DropConstraintStyle::MySql, ObjectKind::ForeignKey) => {
                b.keyword("FOREIGN KEY").constraint_name(name);
            }
            (DropConstraintStyle::MySql, ObjectKind::UniqueConstraint) => {
                b.keyword("INDEX").constraint_name(name);
            }
            (DropConstraintStyle::MySql, _) => {
                b.keyword("CHECK").constraint_name(name);
            }
            (DropConstraintStyle::Standard, _) => {
                b.keyword("CONSTRAINT").constraint_name(name);
            }
        }
        single(b.into_sql(), SqlType::Drop, object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CascadeRule, Table};
    use crate::dialect::{Dialect, Product};

    fn orders() -> Table {
        Table::new("orders")
            .with_schema("sales")
            .with_primary_key(&["id"])
            .with_unique("uk_orders_no", &["order_no"])
            .with_foreign_key(ForeignKey {
                name: "fk_orders_customer".into(),
                columns: vec!["customer_id".into()],
                ref_schema: Some("sales".into()),
                ref_table: "customer".into(),
                ref_columns: vec!["id".into()],
                on_delete: CascadeRule::Cascade,
                on_update: CascadeRule::SetNull,
            })
            .with_check(CheckConstraint {
                name: "ck_orders_qty".into(),
                definition: "qty > 0".into(),
                columns: vec!["qty".into()],
            })
    }

    fn dialect() -> Dialect {
        let mut dialect = Dialect::new("d", "D", Product::Ansi);
        dialect.syntax.default_case = crate::core::DefaultCase::LowerCase;
        dialect
    }

    #[test]
    fn test_add_constraints() {
        let dialect = dialect();
        let registry = dialect.sql_factory_registry();
        let table = orders();
        let pk = table.primary_key.as_ref().unwrap();
        let ops = registry
            .create_sql(SqlType::Create, &DbObject::PrimaryKey(&table, pk))
            .unwrap();
        assert_eq!(
            ops[0].sql,
            "ALTER TABLE sales.orders ADD CONSTRAINT pk_orders PRIMARY KEY (id)"
        );

        let fk = &table.foreign_keys[0];
        let ops = registry
            .create_sql(SqlType::Create, &DbObject::ForeignKey(&table, fk))
            .unwrap();
        assert_eq!(
            ops[0].sql,
            "ALTER TABLE sales.orders ADD CONSTRAINT fk_orders_customer FOREIGN KEY (customer_id) \
             REFERENCES sales.customer (id) ON DELETE CASCADE ON UPDATE SET NULL"
        );

        let check = &table.check_constraints[0];
        let ops = registry
            .create_sql(SqlType::Create, &DbObject::CheckConstraint(&table, check))
            .unwrap();
        assert_eq!(
            ops[0].sql,
            "ALTER TABLE sales.orders ADD CONSTRAINT ck_orders_qty CHECK (qty > 0)"
        );
    }

    #[test]
    fn test_unsupported_rule_is_omitted() {
        let mut dialect = dialect();
        dialect.features.supports_cascade_update = false;
        let registry = dialect.sql_factory_registry();
        let table = orders();
        let ops = registry
            .create_sql(SqlType::Create, &DbObject::ForeignKey(&table, &table.foreign_keys[0]))
            .unwrap();
        assert!(ops[0].sql.ends_with("ON DELETE CASCADE"));
    }

    #[test]
    fn test_options_toggle_constraints() {
        let dialect = dialect();
        let mut registry = dialect.sql_factory_registry();
        registry.options_mut().table.with_foreign_key_constraint = false;
        let table = orders();
        let fk = DbObject::ForeignKey(&table, &table.foreign_keys[0]);
        assert!(registry.create_sql(SqlType::Create, &fk).unwrap().is_empty());
        assert!(registry.create_sql(SqlType::Drop, &fk).unwrap().is_empty());
    }

    #[test]
    fn test_drop_styles() {
        let mut dialect = dialect();
        let table = orders();
        let pk = DbObject::PrimaryKey(&table, table.primary_key.as_ref().unwrap());
        let uk = DbObject::UniqueConstraint(&table, &table.unique_constraints[0]);

        let ops = dialect.sql_factory_registry().create_sql(SqlType::Drop, &uk).unwrap();
        assert_eq!(ops[0].sql, "ALTER TABLE sales.orders DROP CONSTRAINT uk_orders_no");

        dialect.syntax.drop_constraint = DropConstraintStyle::MySql;
        let registry = dialect.sql_factory_registry();
        assert_eq!(
            registry.create_sql(SqlType::Drop, &pk).unwrap()[0].sql,
            "ALTER TABLE sales.orders DROP PRIMARY KEY"
        );
        assert_eq!(
            registry.create_sql(SqlType::Drop, &uk).unwrap()[0].sql,
            "ALTER TABLE sales.orders DROP INDEX uk_orders_no"
        );
    }
}
