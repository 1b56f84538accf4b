//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::dialect::{Dialect, DialectResolver};
use crate::error::Result;
use crate::sql::SqlFactoryRegistry;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// SHA-256 of the serialized configuration, hex encoded.
    pub fn hash(&self) -> String {
        let yaml = serde_yaml::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(yaml.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// The dialect of the configured target.
    pub fn resolve_dialect<'r>(&self, resolver: &'r DialectResolver) -> &'r Dialect {
        let dialect = resolver.resolve(
            &self.target.product,
            self.target.major,
            self.target.minor,
            self.target.revision,
        );
        debug!("Configured target {} uses dialect {}", self.target.product, dialect.id());
        dialect
    }

    /// A factory registry for `dialect` carrying the configured options.
    pub fn sql_factory_registry<'d>(&self, dialect: &'d Dialect) -> SqlFactoryRegistry<'d> {
        dialect.sql_factory_registry().with_options(self.sql.clone())
    }
}
