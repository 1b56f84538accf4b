//! View factories.

use crate::core::{DbObject, ObjectKind, SqlOperation, SqlType, View};
use crate::diff::SchemaDifference;
use crate::error::{Result, SqlWeaveError};
use crate::sql::registry::{SqlFactory, SqlFactoryRegistry};

use super::{single, wrong_object};

fn view_of<'a>(object: &DbObject<'a>) -> Result<&'a View> {
    match object {
        DbObject::View(view) => Ok(*view),
        other => Err(wrong_object(other, ObjectKind::View)),
    }
}

/// `CREATE VIEW v AS` followed by the body on its own line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateView;

impl SqlFactory for CreateView {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let view = view_of(object)?;
        let mut b = registry.builder();
        b.create()
            .keyword("VIEW")
            .object_name(view.schema_name.as_deref(), &view.name)
            .keyword("AS")
            .line_break()
            .append(view.statement.trim());
        single(b.into_sql(), SqlType::Create, object)
    }
}

/// `DROP VIEW v`
#[derive(Debug, Clone, Copy, Default)]
pub struct DropView;

impl SqlFactory for DropView {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let view = view_of(object)?;
        let mut b = registry.builder();
        b.drop()
            .keyword("VIEW")
            .if_exists()
            .object_name(view.schema_name.as_deref(), &view.name);
        single(b.into_sql(), SqlType::Drop, object)
    }
}

/// A changed view is dropped and created again.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlterView;

impl SqlFactory for AlterView {
    fn create_sql(&self, _registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        Err(SqlWeaveError::Config(format!(
            "ALTER of view {} needs a schema difference",
            object.qualified_name()
        )))
    }

    fn create_diff_sql(
        &self,
        registry: &SqlFactoryRegistry<'_>,
        diff: &SchemaDifference<'_>,
    ) -> Result<Vec<SqlOperation>> {
        let (Some(original), Some(target)) = (diff.original, diff.target) else {
            return Err(SqlWeaveError::Config(format!(
                "View difference for {} lacks one of its views",
                diff.name
            )));
        };
        let mut operations = registry.create_sql(SqlType::Drop, &original)?;
        operations.extend(registry.create_sql(SqlType::Create, &target)?);
        Ok(operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DefaultCase;
    use crate::diff::SchemaComparer;
    use crate::dialect::{Dialect, Product};

    #[test]
    fn test_view_create_drop_and_replace() {
        let mut dialect = Dialect::new("d", "D", Product::Ansi);
        dialect.syntax.default_case = DefaultCase::LowerCase;
        let registry = dialect.sql_factory_registry();
        let original = View {
            schema_name: None,
            name: "v_active".into(),
            statement: "SELECT id FROM emp WHERE active = 1".into(),
        };
        let mut target = original.clone();
        target.statement = "SELECT id, name FROM emp WHERE active = 1".into();

        let ops = registry.create_sql(SqlType::Create, &DbObject::View(&original)).unwrap();
        assert_eq!(ops[0].sql, "CREATE VIEW v_active AS\nSELECT id FROM emp WHERE active = 1");

        let diff = SchemaComparer::new(&dialect).compare_views(&original, &target);
        let sql: Vec<_> = registry.diff_sql(&diff).unwrap().into_iter().map(|o| o.sql).collect();
        assert_eq!(
            sql,
            vec![
                "DROP VIEW v_active".to_string(),
                "CREATE VIEW v_active AS\nSELECT id, name FROM emp WHERE active = 1".to_string(),
            ]
        );
    }
}
