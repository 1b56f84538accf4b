//! Index factories.

use tracing::warn;

use crate::core::{DbObject, Index, ObjectKind, SqlOperation, SqlType, Table};
use crate::dialect::DropIndexStyle;
use crate::error::Result;
use crate::sql::registry::{SqlFactory, SqlFactoryRegistry};

use super::{single, wrong_object};

fn index_of<'a>(object: &DbObject<'a>) -> Result<(&'a Table, &'a Index)> {
    match object {
        DbObject::Index(table, index) => Ok((*table, *index)),
        other => Err(wrong_object(other, ObjectKind::Index)),
    }
}

/// Where a vendor index type goes in `CREATE INDEX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexTypePosition {
    /// Index types are not written.
    #[default]
    Ignored,
    /// `CREATE UNIQUE CLUSTERED INDEX ix ON t (..)`
    BeforeIndex,
    /// `CREATE INDEX ix USING BTREE ON t (..)`
    AfterName,
    /// `CREATE INDEX ix ON t USING gin (..)`
    AfterTable,
}

/// `CREATE [UNIQUE] INDEX ix ON t (..) [INCLUDE (..)]`
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateIndex {
    pub type_position: IndexTypePosition,
}

impl CreateIndex {
    pub fn with_type_position(type_position: IndexTypePosition) -> Self {
        Self { type_position }
    }
}

impl SqlFactory for CreateIndex {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let (table, index) = index_of(object)?;
        let dialect = registry.dialect();

        let index_type = index.index_type.as_deref().filter(|t| {
            let known = dialect.syntax.index_types.iter().any(|k| k.eq_ignore_ascii_case(t));
            if !known || self.type_position == IndexTypePosition::Ignored {
                warn!("Index type {} of {} not supported by {}, omitted", t, index.name, dialect);
                return false;
            }
            true
        });

        let mut b = registry.builder();
        b.create().if_(index.unique, |b| {
            b.keyword("UNIQUE");
        });
        if let (Some(t), IndexTypePosition::BeforeIndex) = (index_type, self.type_position) {
            b.keyword(&t.to_ascii_uppercase());
        }
        b.keyword("INDEX").constraint_name(&index.name);
        if let (Some(t), IndexTypePosition::AfterName) = (index_type, self.type_position) {
            b.keyword("USING").keyword(&t.to_ascii_uppercase());
        }
        b.on().table_name(table);
        if let (Some(t), IndexTypePosition::AfterTable) = (index_type, self.type_position) {
            b.keyword("USING").keyword(&t.to_ascii_lowercase());
        }
        b.lparen().names(&index.columns).rparen();

        if !index.includes.is_empty() {
            if dialect.features.supports_index_include {
                b.keyword("INCLUDE").lparen().names(&index.includes).rparen();
            } else {
                warn!("INCLUDE columns of {} not supported by {}, omitted", index.name, dialect);
            }
        }
        single(b.into_sql(), SqlType::Create, object)
    }
}

/// Drops an index, spelled per [`DropIndexStyle`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DropIndex;

impl SqlFactory for DropIndex {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let (table, index) = index_of(object)?;
        let mut b = registry.builder();
        b.drop().keyword("INDEX");
        match registry.dialect().syntax.drop_index {
            DropIndexStyle::Qualified => {
                b.object_name(table.schema_name.as_deref(), &index.name);
            }
            DropIndexStyle::OnTable => {
                b.constraint_name(&index.name).on().table_name(table);
            }
            DropIndexStyle::TableDot => {
                let table_name = b.qualified_name(table.schema_name.as_deref(), &table.name);
                b.keyword(&table_name).append(".").constraint_name(&index.name);
            }
        }
        single(b.into_sql(), SqlType::Drop, object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DefaultCase;
    use crate::dialect::{Dialect, Product};
    use crate::sql::registry::FactoryTable;

    fn dialect() -> Dialect {
        let mut dialect = Dialect::new("d", "D", Product::Ansi);
        dialect.syntax.default_case = DefaultCase::LowerCase;
        dialect.syntax.index_types = vec!["CLUSTERED".into(), "NONCLUSTERED".into()];
        dialect
    }

    fn clustered_layer(table: &mut FactoryTable) {
        table.register(
            ObjectKind::Index,
            SqlType::Create,
            CreateIndex::with_type_position(IndexTypePosition::BeforeIndex),
        );
    }

    fn orders() -> Table {
        Table::new("orders").with_schema("dbo").with_index(Index {
            name: "ix_orders_date".into(),
            columns: vec!["order_date".into(), "customer_id".into()],
            unique: true,
            index_type: Some("clustered".into()),
            includes: vec!["total".into()],
        })
    }

    #[test]
    fn test_create_index_default_ignores_type_and_include() {
        let dialect = dialect();
        let registry = dialect.sql_factory_registry();
        let table = orders();
        let ops = registry
            .create_sql(SqlType::Create, &DbObject::Index(&table, &table.indexes[0]))
            .unwrap();
        assert_eq!(
            ops[0].sql,
            "CREATE UNIQUE INDEX ix_orders_date ON dbo.orders (order_date, customer_id)"
        );
    }

    #[test]
    fn test_create_index_with_type_and_include() {
        let mut dialect = dialect().with_layer(clustered_layer);
        dialect.features.supports_index_include = true;
        let registry = dialect.sql_factory_registry();
        let table = orders();
        let ops = registry
            .create_sql(SqlType::Create, &DbObject::Index(&table, &table.indexes[0]))
            .unwrap();
        assert_eq!(
            ops[0].sql,
            "CREATE UNIQUE CLUSTERED INDEX ix_orders_date ON dbo.orders (order_date, customer_id) INCLUDE (total)"
        );
    }

    #[test]
    fn test_drop_index_styles() {
        let mut dialect = dialect();
        let table = orders();
        let object = DbObject::Index(&table, &table.indexes[0]);
        let expected = [
            (DropIndexStyle::Qualified, "DROP INDEX dbo.ix_orders_date"),
            (DropIndexStyle::OnTable, "DROP INDEX ix_orders_date ON dbo.orders"),
            (DropIndexStyle::TableDot, "DROP INDEX dbo.orders.ix_orders_date"),
        ];
        for (style, sql) in expected {
            dialect.syntax.drop_index = style;
            let registry = dialect.sql_factory_registry();
            assert_eq!(registry.create_sql(SqlType::Drop, &object).unwrap()[0].sql, sql);
        }
    }
}
