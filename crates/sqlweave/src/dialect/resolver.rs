//! Version resolver: maps a product name and version to a dialect.
//!
//! Each product owns a [`ProductLattice`]: its dialects (the first one is the
//! product default) and a table of version lower bounds pointing into them.
//! Resolution is total:
//!
//! - the product is picked by name pattern, unknown products get the generic
//!   SQL dialect
//! - within the product, the greatest lower bound with the same major version
//!   wins; a missing revision accepts every revision of that minor
//! - when no bound of that major applies, the product default is returned

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::error::{Result, SqlWeaveError};

use super::{Dialect, Product};

/// A version lower bound resolving to one dialect of the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VersionBound {
    major: u32,
    minor: u32,
    revision: u32,
    dialect: usize,
}

/// Dialect chain and version table of one product.
#[derive(Debug, Clone)]
pub struct ProductLattice {
    product: Product,
    pattern: Regex,
    dialects: Vec<Dialect>,
    bounds: Vec<VersionBound>,
}

impl ProductLattice {
    /// Start a lattice whose default (oldest) dialect is `default`.
    ///
    /// `pattern` is matched case-insensitively against the product name the
    /// driver reports.
    pub fn new(product: Product, pattern: &str, default: Dialect) -> Result<Self> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| SqlWeaveError::Config(format!("Invalid product pattern '{}': {}", pattern, e)))?;
        Ok(Self {
            product,
            pattern,
            dialects: vec![default],
            bounds: Vec::new(),
        })
    }

    /// Register `dialect` for versions from `major.minor.revision` up to the
    /// next bound of the same major.
    ///
    /// The dialect must derive from one already in the lattice.
    pub fn add(&mut self, version: (u32, u32, u32), dialect: Dialect) -> Result<&mut Self> {
        if self.get(dialect.id()).is_some() {
            return Err(SqlWeaveError::Config(format!(
                "Dialect '{}' registered twice",
                dialect.id()
            )));
        }
        match dialect.fallback() {
            Some(parent) if self.get(parent).is_some() => {}
            other => {
                return Err(SqlWeaveError::Config(format!(
                    "Dialect '{}' falls back to {:?}, which is not in the {:?} lattice",
                    dialect.id(),
                    other,
                    self.product
                )));
            }
        }
        self.dialects.push(dialect);
        let index = self.dialects.len() - 1;
        self.push_bound(version, index)
    }

    /// Point another version bound at an already registered dialect.
    pub fn alias(&mut self, version: (u32, u32, u32), id: &str) -> Result<&mut Self> {
        let index = self
            .dialects
            .iter()
            .position(|d| d.id() == id)
            .ok_or_else(|| SqlWeaveError::Config(format!("Unknown dialect '{}'", id)))?;
        self.push_bound(version, index)
    }

    fn push_bound(&mut self, version: (u32, u32, u32), dialect: usize) -> Result<&mut Self> {
        let (major, minor, revision) = version;
        if self
            .bounds
            .iter()
            .any(|b| (b.major, b.minor, b.revision) == version)
        {
            return Err(SqlWeaveError::Config(format!(
                "Version bound {}.{}.{} registered twice for {:?}",
                major, minor, revision, self.product
            )));
        }
        self.bounds.push(VersionBound {
            major,
            minor,
            revision,
            dialect,
        });
        Ok(self)
    }

    pub fn product(&self) -> Product {
        self.product
    }

    pub fn matches(&self, product_name: &str) -> bool {
        self.pattern.is_match(product_name)
    }

    /// The product default (oldest documented) dialect.
    pub fn default_dialect(&self) -> &Dialect {
        &self.dialects[0]
    }

    pub fn dialects(&self) -> &[Dialect] {
        &self.dialects
    }

    pub fn get(&self, id: &str) -> Option<&Dialect> {
        self.dialects.iter().find(|d| d.id() == id)
    }

    /// Greatest lower bound of `major.minor.revision` within `major`.
    pub fn resolve(&self, major: u32, minor: u32, revision: Option<u32>) -> &Dialect {
        let wanted = (minor, revision.unwrap_or(u32::MAX));
        let best = self
            .bounds
            .iter()
            .filter(|b| b.major == major && (b.minor, b.revision) <= wanted)
            .max_by_key(|b| (b.minor, b.revision));
        match best {
            Some(bound) => &self.dialects[bound.dialect],
            None => self.default_dialect(),
        }
    }
}

/// Resolves live targets to dialects across every registered product.
#[derive(Debug, Clone)]
pub struct DialectResolver {
    lattices: Vec<ProductLattice>,
    generic: Dialect,
}

impl Default for DialectResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DialectResolver {
    /// A resolver that knows no product and answers with the generic dialect.
    pub fn new() -> Self {
        Self {
            lattices: Vec::new(),
            generic: crate::drivers::ansi::dialect(),
        }
    }

    /// A resolver with every built-in product registered.
    pub fn with_builtins() -> Result<Self> {
        let mut resolver = Self::new();
        for lattice in crate::drivers::builtin_lattices()? {
            resolver.register(lattice);
        }
        Ok(resolver)
    }

    /// Register a product lattice. Earlier registrations win name matches.
    pub fn register(&mut self, lattice: ProductLattice) -> &mut Self {
        self.lattices.push(lattice);
        self
    }

    /// Resolve a product name and version to a dialect. Never fails.
    pub fn resolve(
        &self,
        product_name: &str,
        major: u32,
        minor: u32,
        revision: Option<u32>,
    ) -> &Dialect {
        let dialect = match self.lattices.iter().find(|l| l.matches(product_name)) {
            Some(lattice) => lattice.resolve(major, minor, revision),
            None => &self.generic,
        };
        debug!(
            "Resolved {} {}.{}.{:?} to dialect {}",
            product_name,
            major,
            minor,
            revision,
            dialect.id()
        );
        dialect
    }

    pub fn lattice(&self, product: Product) -> Option<&ProductLattice> {
        self.lattices.iter().find(|l| l.product() == product)
    }

    /// Look up a dialect by id.
    pub fn dialect(&self, id: &str) -> Option<&Dialect> {
        if self.generic.id() == id {
            return Some(&self.generic);
        }
        self.lattices.iter().find_map(|l| l.get(id))
    }

    /// Every registered dialect, generic first.
    pub fn dialects(&self) -> impl Iterator<Item = &Dialect> {
        std::iter::once(&self.generic).chain(self.lattices.iter().flat_map(|l| l.dialects().iter()))
    }
}
