//! Error taxonomy for a migration run.

use std::path::PathBuf;

use crate::connection::DbError;

pub type Result<T, E = MigrationError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("cannot connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: DbError,
    },

    #[error("bookkeeping step `{step}` failed: {source}")]
    SchemaBookkeeping {
        step: &'static str,
        #[source]
        source: DbError,
    },

    #[error("script {script} failed: {source}")]
    ScriptExecution {
        script: String,
        statement: String,
        #[source]
        source: DbError,
    },

    #[error("one-time script {script} has changed since it was applied (recorded hash {recorded}, current hash {current})")]
    PolicyViolation {
        script: String,
        recorded: String,
        current: String,
    },

    #[error("{operation} is not supported by the {engine} dialect")]
    UnsupportedOperation {
        operation: &'static str,
        engine: String,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("database error while {context}: {source}")]
    Database {
        context: String,
        #[source]
        source: DbError,
    },

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MigrationError {
    pub fn unsupported(operation: &'static str, engine: impl Into<String>) -> Self {
        MigrationError::UnsupportedOperation { operation, engine: engine.into() }
    }

    /// Stable short name used in reports and machine-readable output.
    pub fn category(&self) -> &'static str {
        match self {
            MigrationError::Connection { .. } => "connection",
            MigrationError::SchemaBookkeeping { .. } => "schema_bookkeeping",
            MigrationError::ScriptExecution { .. } => "script_execution",
            MigrationError::PolicyViolation { .. } => "policy_violation",
            MigrationError::UnsupportedOperation { .. } => "unsupported_operation",
            MigrationError::Configuration(_) => "configuration",
            MigrationError::Database { .. } => "database",
            MigrationError::Io { .. } => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn script_failure_keeps_engine_message_in_chain() {
        let err = MigrationError::ScriptExecution {
            script: "0001_tables.sql".into(),
            statement: "CREATE TABLE".into(),
            source: DbError::new("near \"TABLE\": syntax error"),
        };
        assert_eq!(err.category(), "script_execution");
        assert!(err.to_string().contains("0001_tables.sql"));
        let cause = err.source().map(|s| s.to_string()).unwrap_or_default();
        assert!(cause.contains("syntax error"));
    }

    #[test]
    fn unsupported_names_operation_and_engine() {
        let err = MigrationError::unsupported("backup database", "Access");
        assert_eq!(err.to_string(), "backup database is not supported by the Access dialect");
    }
}
