//! Configuration validation.

use super::Config;
use crate::core::validate_identifier;
use crate::error::{Result, SqlWeaveError};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Target validation
    if config.target.product.trim().is_empty() {
        return Err(SqlWeaveError::Config("target.product is required".into()));
    }

    // Generation options
    if config.sql.table.dml_batch_size == 0 {
        return Err(SqlWeaveError::Config(
            "sql.table.dml_batch_size must be at least 1".into(),
        ));
    }
    validate_identifier(&config.sql.table.temporary_alias)
        .map_err(|e| SqlWeaveError::Config(format!("sql.table.temporary_alias: {}", e)))?;

    // Ledger validation
    let versioning = &config.versioning;
    validate_identifier(&versioning.table)
        .map_err(|e| SqlWeaveError::Config(format!("versioning.table: {}", e)))?;
    if let Some(schema) = &versioning.schema {
        validate_identifier(schema)
            .map_err(|e| SqlWeaveError::Config(format!("versioning.schema: {}", e)))?;
    }

    let columns = [
        ("id", &versioning.columns.id),
        ("checksum", &versioning.columns.checksum),
        ("applied_at", &versioning.columns.applied_at),
    ];
    for (field, name) in &columns {
        validate_identifier(name)
            .map_err(|e| SqlWeaveError::Config(format!("versioning.columns.{}: {}", field, e)))?;
    }
    for (i, (field, name)) in columns.iter().enumerate() {
        if let Some((other, _)) = columns[i + 1..]
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
        {
            return Err(SqlWeaveError::Config(format!(
                "versioning.columns.{} and versioning.columns.{} are both '{}'",
                field, other, name
            )));
        }
    }

    if versioning.script_dir.as_os_str().is_empty() {
        return Err(SqlWeaveError::Config(
            "versioning.script_dir must not be empty".into(),
        ));
    }

    Ok(())
}
