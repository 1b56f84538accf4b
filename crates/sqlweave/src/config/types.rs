//! Configuration type definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::sql::SqlFactoryOptions;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target database product and version.
    pub target: TargetConfig,

    /// Statement generation options.
    #[serde(default)]
    pub sql: SqlFactoryOptions,

    /// Version ledger and migration scripts.
    #[serde(default)]
    pub versioning: VersioningConfig,
}

/// Target database product and version, resolved to a dialect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Product name as the driver reports it (e.g. "PostgreSQL",
    /// "Microsoft SQL Server").
    pub product: String,

    /// Major version (default: 0, which resolves to the product default).
    #[serde(default)]
    pub major: u32,

    /// Minor version (default: 0).
    #[serde(default)]
    pub minor: u32,

    /// Revision; absent accepts every revision of the minor version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
}

/// Version ledger and script settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersioningConfig {
    /// Ledger table name (default: "schema_version").
    #[serde(default = "default_ledger_table")]
    pub table: String,

    /// Ledger table schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Ledger column names.
    #[serde(default)]
    pub columns: LedgerColumns,

    /// Highest version applied going up, lowest version reverted going down.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_change_to_apply: Option<i64>,

    /// Directory of `<id>_<name>.up.sql` / `<id>_<name>.down.sql` scripts
    /// (default: "migrations").
    #[serde(default = "default_script_dir")]
    pub script_dir: PathBuf,

    /// Run each version inside its own transaction (default: true).
    #[serde(default = "default_true")]
    pub transactional: bool,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            table: default_ledger_table(),
            schema: None,
            columns: LedgerColumns::default(),
            last_change_to_apply: None,
            script_dir: default_script_dir(),
            transactional: true,
        }
    }
}

/// Column names of the version ledger table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerColumns {
    /// Version id column (unique).
    pub id: String,

    /// SHA-256 of the applied up script.
    pub checksum: String,

    /// When the version was recorded.
    pub applied_at: String,
}

impl Default for LedgerColumns {
    fn default() -> Self {
        Self {
            id: "version_id".to_string(),
            checksum: "checksum".to_string(),
            applied_at: "applied_at".to_string(),
        }
    }
}

fn default_ledger_table() -> String {
    "schema_version".to_string()
}

fn default_script_dir() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_true() -> bool {
    true
}
