//! Error types for dialect resolution, SQL generation and version apply.

use thiserror::Error;

use crate::core::operation::{ObjectKind, SqlType};
use crate::splitter::Span;
use crate::version::Direction;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum SqlWeaveError {
    /// Configuration error (invalid YAML, bad identifier, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// An explicit vendor type conflicts with the canonical type already chosen.
    #[error("Type mismatch for '{type_name}': expected {expected}, vendor type resolves to {found}")]
    TypeMismatch {
        type_name: String,
        expected: String,
        found: String,
    },

    /// No factory registered for a (kind, operation) pair.
    ///
    /// This is a configuration bug in the dialect registry, never a data problem.
    #[error("No SQL factory registered for {kind:?}/{operation:?} in dialect {dialect}")]
    UnregisteredOperation {
        kind: ObjectKind,
        operation: SqlType,
        dialect: String,
    },

    /// The ledger did not hold the expected pre-state for a version.
    #[error("Concurrency fault on version {version_id} ({direction}): {reason}")]
    ConcurrencyFault {
        version_id: i64,
        direction: Direction,
        reason: String,
    },

    /// A statement of a version script failed to execute.
    #[error("Script execution failed for version {version_id} at {span}: {message}\n  Statement: {statement}")]
    ScriptExecution {
        version_id: i64,
        span: Span,
        statement: String,
        message: String,
    },

    /// Failure reported by the connection collaborator.
    #[error("Connection error: {0}")]
    Connection(String),

    /// IO error (script files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SqlWeaveError {
    /// Create a ConcurrencyFault error.
    pub fn concurrency(version_id: i64, direction: Direction, reason: impl Into<String>) -> Self {
        SqlWeaveError::ConcurrencyFault {
            version_id,
            direction,
            reason: reason.into(),
        }
    }

    /// Create a ScriptExecution error for the statement at `span`.
    pub fn script(
        version_id: i64,
        span: Span,
        statement: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        SqlWeaveError::ScriptExecution {
            version_id,
            span,
            statement: statement.into(),
            message: message.into(),
        }
    }

    /// Create an UnregisteredOperation error.
    pub fn unregistered(kind: ObjectKind, operation: SqlType, dialect: impl Into<String>) -> Self {
        SqlWeaveError::UnregisteredOperation {
            kind,
            operation,
            dialect: dialect.into(),
        }
    }

    /// Whether this error signals a lost race on the version ledger.
    pub fn is_concurrency_fault(&self) -> bool {
        matches!(self, SqlWeaveError::ConcurrencyFault { .. })
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, SqlWeaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrency_fault_is_distinguishable() {
        let err = SqlWeaveError::concurrency(3, Direction::Up, "row already exists");
        assert!(err.is_concurrency_fault());
        assert!(err.to_string().contains("version 3"));

        let io = SqlWeaveError::Connection("socket closed".into());
        assert!(!io.is_concurrency_fault());
    }

    #[test]
    fn test_script_error_carries_span() {
        let err = SqlWeaveError::script(7, Span::new(10, 20), "SELECT 1", "boom");
        let text = err.to_string();
        assert!(text.contains("version 7"));
        assert!(text.contains("10..20"));
        assert!(text.contains("SELECT 1"));
    }

    #[test]
    fn test_format_detailed_includes_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.sql");
        let err = SqlWeaveError::from(io);
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: IO error"));
    }
}
