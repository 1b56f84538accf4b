//! Sequence factories.

use crate::core::{DbObject, ObjectKind, Sequence, SqlOperation, SqlType};
use crate::diff::SchemaDifference;
use crate::error::{Result, SqlWeaveError};
use crate::sql::builder::SqlBuilder;
use crate::sql::registry::{SqlFactory, SqlFactoryRegistry};

use super::{single, wrong_object};

fn sequence_of<'a>(object: &DbObject<'a>) -> Result<&'a Sequence> {
    match object {
        DbObject::Sequence(sequence) => Ok(*sequence),
        other => Err(wrong_object(other, ObjectKind::Sequence)),
    }
}

fn option(b: &mut SqlBuilder<'_>, keyword: &str, value: Option<i64>) {
    if let Some(v) = value {
        b.keyword(keyword).keyword(&v.to_string());
    }
}

/// `CREATE SEQUENCE s [START WITH n] [INCREMENT BY n] [MINVALUE n] [MAXVALUE n] [CACHE n] [CYCLE]`
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateSequence;

impl SqlFactory for CreateSequence {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let sequence = sequence_of(object)?;
        let mut b = registry.builder();
        b.create()
            .keyword("SEQUENCE")
            .object_name(sequence.schema_name.as_deref(), &sequence.name);
        option(&mut b, "START WITH", sequence.start);
        option(&mut b, "INCREMENT BY", sequence.increment);
        option(&mut b, "MINVALUE", sequence.min_value);
        option(&mut b, "MAXVALUE", sequence.max_value);
        option(&mut b, "CACHE", sequence.cache);
        if sequence.cycle {
            b.keyword("CYCLE");
        }
        single(b.into_sql(), SqlType::Create, object)
    }
}

/// `DROP SEQUENCE s`
#[derive(Debug, Clone, Copy, Default)]
pub struct DropSequence;

impl SqlFactory for DropSequence {
    fn create_sql(&self, registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        let sequence = sequence_of(object)?;
        let mut b = registry.builder();
        b.drop()
            .keyword("SEQUENCE")
            .if_exists()
            .object_name(sequence.schema_name.as_deref(), &sequence.name);
        single(b.into_sql(), SqlType::Drop, object)
    }
}

/// `ALTER SEQUENCE s` restating only the changed options; a changed start
/// value becomes `RESTART WITH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlterSequence;

impl SqlFactory for AlterSequence {
    fn create_sql(&self, _registry: &SqlFactoryRegistry<'_>, object: &DbObject<'_>) -> Result<Vec<SqlOperation>> {
        Err(SqlWeaveError::Config(format!(
            "ALTER of sequence {} needs a schema difference",
            object.qualified_name()
        )))
    }

    fn create_diff_sql(
        &self,
        registry: &SqlFactoryRegistry<'_>,
        diff: &SchemaDifference<'_>,
    ) -> Result<Vec<SqlOperation>> {
        let Some(target) = diff.target else {
            return Err(SqlWeaveError::Config(format!(
                "Sequence difference for {} lacks its target",
                diff.name
            )));
        };
        let sequence = sequence_of(&target)?;
        let mut b = registry.builder();
        b.keyword("ALTER SEQUENCE")
            .object_name(sequence.schema_name.as_deref(), &sequence.name);
        if diff.has_property("start") {
            option(&mut b, "RESTART WITH", sequence.start);
        }
        if diff.has_property("increment") {
            option(&mut b, "INCREMENT BY", sequence.increment);
        }
        if diff.has_property("min_value") {
            match sequence.min_value {
                Some(_) => option(&mut b, "MINVALUE", sequence.min_value),
                None => {
                    b.keyword("NO MINVALUE");
                }
            }
        }
        if diff.has_property("max_value") {
            match sequence.max_value {
                Some(_) => option(&mut b, "MAXVALUE", sequence.max_value),
                None => {
                    b.keyword("NO MAXVALUE");
                }
            }
        }
        if diff.has_property("cache") {
            option(&mut b, "CACHE", sequence.cache);
        }
        if diff.has_property("cycle") {
            b.keyword(if sequence.cycle { "CYCLE" } else { "NO CYCLE" });
        }
        single(b.into_sql(), SqlType::Alter, &target)
    }
}
