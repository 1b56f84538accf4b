//! Built-in product dialects.
//!
//! Each module builds one product chain: a root dialect carrying the
//! product's catalog and syntax, and derived dialects overriding what later
//! versions changed. `lattice()` registers the chain with its version bounds.

pub mod ansi;
pub mod db2;
pub mod derby;
pub mod h2;
pub mod hana;
pub mod hsqldb;
pub mod jet;
pub mod mariadb;
pub mod mysql;
pub mod oracle;
pub mod postgres;
pub mod spanner;
pub mod sqlite;
pub mod sqlserver;
pub mod sybase;

use crate::core::{ObjectKind, SqlType};
use crate::dialect::ProductLattice;
use crate::error::Result;
use crate::sql::factories::{AlterSequence, CreateSequence, DropSequence};
use crate::sql::registry::FactoryTable;

/// Every built-in product lattice, in name-matching order.
///
/// MariaDB is listed before MySQL: MariaDB servers may report a product name
/// mentioning MySQL.
pub fn builtin_lattices() -> Result<Vec<ProductLattice>> {
    Ok(vec![
        mariadb::lattice()?,
        mysql::lattice()?,
        postgres::lattice()?,
        sqlserver::lattice()?,
        sybase::lattice()?,
        oracle::lattice()?,
        hsqldb::lattice()?,
        h2::lattice()?,
        sqlite::lattice()?,
        derby::lattice()?,
        db2::lattice()?,
        hana::lattice()?,
        spanner::lattice()?,
        jet::lattice()?,
    ])
}

/// Layer for products without sequences.
pub(crate) fn without_sequences(table: &mut FactoryTable) {
    table
        .remove(ObjectKind::Sequence, SqlType::Create)
        .remove(ObjectKind::Sequence, SqlType::Drop)
        .remove(ObjectKind::Sequence, SqlType::Alter);
}

/// Layer for versions that gained sequences over a parent without them.
pub(crate) fn with_sequences(table: &mut FactoryTable) {
    table
        .register(ObjectKind::Sequence, SqlType::Create, CreateSequence)
        .register(ObjectKind::Sequence, SqlType::Drop, DropSequence)
        .register(ObjectKind::Sequence, SqlType::Alter, AlterSequence);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{DialectResolver, Product};

    #[test]
    fn test_builtin_lattices_build() {
        let lattices = builtin_lattices().unwrap();
        assert_eq!(lattices.len(), 14);
        let total: usize = lattices.iter().map(|l| l.dialects().len()).sum();
        assert!(total >= 40, "only {} dialects", total);
    }

    #[test]
    fn test_every_dialect_stays_in_its_product() {
        let resolver = DialectResolver::with_builtins().unwrap();
        for lattice in builtin_lattices().unwrap() {
            for dialect in lattice.dialects() {
                assert_eq!(dialect.product(), lattice.product(), "{}", dialect.id());
                assert!(resolver.dialect(dialect.id()).is_some());
            }
        }
        assert_eq!(resolver.dialect("ansi").map(|d| d.product()), Some(Product::Ansi));
    }

    #[test]
    fn test_dialect_ids_are_unique() {
        let resolver = DialectResolver::with_builtins().unwrap();
        let mut ids: Vec<&str> = resolver.dialects().map(|d| d.id()).collect();
        let count = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), count);
    }
}
