//! MariaDB dialects, branched off MySQL 5.6.

use crate::core::DataType;
use crate::dialect::{DbDataType, Dialect, DialectVersion, Product, ProductLattice, SequenceStyle};
use crate::error::Result;

use super::{mysql, with_sequences};

/// MariaDB up to 10.1.
pub fn dialect() -> Dialect {
    mysql::mysql5_6(&mysql::dialect())
        .derive("mariadb", "MariaDB", DialectVersion::new(5, 5))
        .for_product(Product::MariaDb)
}

/// 10.2: common table expressions and enforced CHECK constraints.
fn mariadb10_2(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive("mariadb10_2", "MariaDB 10.2", DialectVersion::new(10, 2));
    dialect.features.supports_with = true;
    dialect.features.supports_check_constraint = true;
    dialect
}

/// 10.2.7: JSON as an alias of LONGTEXT.
fn mariadb10_2_7(parent: &Dialect) -> Dialect {
    let mut dialect = parent.derive(
        "mariadb10_2_7",
        "MariaDB 10.2.7",
        DialectVersion::new(10, 2).with_revision(7),
    );
    dialect
        .catalog_mut()
        .register(DbDataType::new(DataType::Json, "JSON").literal("'", "'"));
    dialect
}

/// 10.3: sequences.
fn mariadb10_3(parent: &Dialect) -> Dialect {
    let mut dialect = parent
        .derive("mariadb10_3", "MariaDB 10.3", DialectVersion::new(10, 3))
        .with_layer(with_sequences);
    dialect.syntax.sequence = SequenceStyle::NextValueFor;
    dialect.features.supports_sequence = true;
    dialect
}

pub fn lattice() -> Result<ProductLattice> {
    let base = dialect();
    let v10_2 = mariadb10_2(&base);
    let v10_2_7 = mariadb10_2_7(&v10_2);
    let v10_3 = mariadb10_3(&v10_2_7);

    let mut lattice = ProductLattice::new(Product::MariaDb, "MariaDB", base)?;
    lattice
        .add((10, 2, 0), v10_2)?
        .add((10, 2, 7), v10_2_7)?
        .add((10, 3, 0), v10_3)?
        .alias((11, 0, 0), "mariadb10_3")?;
    Ok(lattice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DbObject, Sequence, SqlType};

    #[test]
    fn test_version_bounds() {
        let lattice = lattice().unwrap();
        assert_eq!(lattice.resolve(5, 5, None).id(), "mariadb");
        assert_eq!(lattice.resolve(10, 1, Some(40)).id(), "mariadb");
        assert_eq!(lattice.resolve(10, 2, Some(6)).id(), "mariadb10_2");
        assert_eq!(lattice.resolve(10, 2, Some(7)).id(), "mariadb10_2_7");
        assert_eq!(lattice.resolve(10, 11, None).id(), "mariadb10_3");
        assert_eq!(lattice.resolve(11, 4, None).id(), "mariadb10_3");
    }

    #[test]
    fn test_branch_is_incomparable_with_later_mysql() {
        let mysql = super::mysql::lattice().unwrap();
        let mariadb = lattice().unwrap();
        let my8 = mysql.resolve(8, 0, None);
        let maria = mariadb.resolve(10, 2, Some(7));
        assert_eq!(maria.partial_cmp(my8), None);
        assert_eq!(my8.partial_cmp(maria), None);
        assert!(maria > mysql.default_dialect());
        assert_eq!(maria.product(), Product::MariaDb);
    }

    #[test]
    fn test_sequences_return_in_10_3() {
        let lattice = lattice().unwrap();
        let seq = Sequence::new("seq_order");
        let object = DbObject::Sequence(&seq);
        assert!(lattice.resolve(10, 2, None).sql_factory_registry().create_sql(SqlType::Create, &object).is_err());
        let ops = lattice
            .resolve(10, 3, None)
            .sql_factory_registry()
            .create_sql(SqlType::Create, &object)
            .unwrap();
        assert!(ops[0].sql.starts_with("CREATE SEQUENCE seq_order"));
        assert_eq!(
            lattice.resolve(10, 3, None).sequence_next_value("seq_order").as_deref(),
            Some("NEXT VALUE FOR seq_order")
        );
    }
}
