//! Per-engine SQL text: administrative statements, bookkeeping DDL and the
//! parameterized bookkeeping DML, plus each engine's batch separator.
//!
//! Identifiers are formatted straight into the SQL (they come from
//! configuration, never from script content). Every free-form value goes
//! through a bind placeholder produced by [`DialectScripts::param`].

mod access;
mod oracle;
mod registry;
mod sqlite;
mod tsql;

pub use access::AccessScripts;
pub use oracle::OracleScripts;
pub use registry::DialectRegistry;
pub use sqlite::SqliteScripts;
pub use tsql::TSqlScripts;

use splitter::{Separator, Splitter};
use sqlmill_core::{MigrationError, Result};

/// Columns returned by [`DialectScripts::get_latest_version`].
pub const VERSION_COLUMNS: &str = "id, repository_path, version, entered_by, entry_date";
/// Columns returned by [`DialectScripts::list_script_runs`].
pub const SCRIPT_RUN_COLUMNS: &str = "version_id, script_name, text_hash, one_time_script, entered_by, entry_date";
/// Columns returned by [`DialectScripts::list_script_run_errors`].
pub const SCRIPT_RUN_ERROR_COLUMNS: &str =
    "version_id, script_name, erroneous_part_of_script, error_message, entered_by, entry_date";

pub trait DialectScripts: Send + Sync {
    /// Registry key, e.g. `SQLServer`.
    fn name(&self) -> &'static str;

    /// Splitter configured with this engine's separator and comment rules.
    fn splitter(&self) -> Splitter;

    /// Bind placeholder for a named parameter.
    fn param(&self, name: &str) -> String;

    /// Fully qualified bookkeeping table name.
    fn qualified(&self, schema: &str, table: &str) -> String;

    /// SQL expression for the current timestamp.
    fn now(&self) -> &'static str;

    /// `SELECT <columns> <rest>` limited to the first row.
    fn select_top_one(&self, columns: &str, rest: &str) -> String;

    fn create_database(&self, _database: &str) -> Result<String> {
        Err(self.unsupported("create database"))
    }

    fn set_recovery_mode(&self, _database: &str, _simple: bool) -> Result<String> {
        Err(self.unsupported("set recovery mode"))
    }

    fn backup_database(&self, _database: &str, _output_path: &str) -> Result<String> {
        Err(self.unsupported("backup database"))
    }

    fn restore_database(&self, _database: &str, _restore_from_path: &str, _custom_options: Option<&str>) -> Result<String> {
        Err(self.unsupported("restore database"))
    }

    fn delete_database(&self, _database: &str) -> Result<String> {
        Err(self.unsupported("delete database"))
    }

    fn use_database(&self, _database: &str) -> Result<String> {
        Err(self.unsupported("use database"))
    }

    /// `None` when the schema is only a table-name prefix for this engine.
    fn create_schema(&self, schema: &str) -> Option<String>;

    /// Scalar query returning a row count greater than zero when the table exists.
    fn table_exists(&self, schema: &str, table: &str) -> String;

    fn create_version_table(&self, schema: &str, version_table: &str) -> String;

    fn create_scripts_run_table(&self, schema: &str, version_table: &str, scripts_run_table: &str) -> String;

    fn create_scripts_run_errors_table(&self, schema: &str, scripts_run_errors_table: &str) -> String;

    /// Binds `repository_path`, `repository_version`, `user_name`.
    fn insert_version(&self, schema: &str, version_table: &str) -> String {
        format!(
            "INSERT INTO {} (repository_path, version, entered_by, entry_date) VALUES ({}, {}, {}, {})",
            self.qualified(schema, version_table),
            self.param("repository_path"),
            self.param("repository_version"),
            self.param("user_name"),
            self.now()
        )
    }

    /// Binds `repository_path`; returns [`VERSION_COLUMNS`].
    fn get_latest_version(&self, schema: &str, version_table: &str) -> String {
        self.select_top_one(
            VERSION_COLUMNS,
            &format!(
                "FROM {} WHERE repository_path = {} ORDER BY entry_date DESC, id DESC",
                self.qualified(schema, version_table),
                self.param("repository_path")
            ),
        )
    }

    /// Binds `repository_path`; returns the newest `id`.
    fn get_version_id(&self, schema: &str, version_table: &str) -> String {
        self.select_top_one(
            "id",
            &format!(
                "FROM {} WHERE repository_path = {} ORDER BY entry_date DESC, id DESC",
                self.qualified(schema, version_table),
                self.param("repository_path")
            ),
        )
    }

    /// Binds `version_id`, `script_name`, `text_hash`, `one_time_script`, `user_name`.
    fn insert_script_run(&self, schema: &str, scripts_run_table: &str) -> String {
        format!(
            "INSERT INTO {} (version_id, script_name, text_hash, one_time_script, entered_by, entry_date) VALUES ({}, {}, {}, {}, {}, {})",
            self.qualified(schema, scripts_run_table),
            self.param("version_id"),
            self.param("script_name"),
            self.param("text_hash"),
            self.param("one_time_script"),
            self.param("user_name"),
            self.now()
        )
    }

    /// Binds `version_id`, `script_name`, `erroneous_part_of_script`, `error_message`, `user_name`.
    fn insert_script_run_error(&self, schema: &str, scripts_run_errors_table: &str) -> String {
        format!(
            "INSERT INTO {} (version_id, script_name, erroneous_part_of_script, error_message, entered_by, entry_date) VALUES ({}, {}, {}, {}, {}, {})",
            self.qualified(schema, scripts_run_errors_table),
            self.param("version_id"),
            self.param("script_name"),
            self.param("erroneous_part_of_script"),
            self.param("error_message"),
            self.param("user_name"),
            self.now()
        )
    }

    /// Binds `script_name`; returns the hash recorded by the newest run.
    fn get_current_script_hash(&self, schema: &str, scripts_run_table: &str) -> String {
        self.select_top_one(
            "text_hash",
            &format!(
                "FROM {} WHERE script_name = {} ORDER BY entry_date DESC, id DESC",
                self.qualified(schema, scripts_run_table),
                self.param("script_name")
            ),
        )
    }

    /// Binds `script_name`; returns one row per recorded run.
    fn has_script_run(&self, schema: &str, scripts_run_table: &str) -> String {
        format!(
            "SELECT script_name FROM {} WHERE script_name = {}",
            self.qualified(schema, scripts_run_table),
            self.param("script_name")
        )
    }

    /// No parameters; returns [`SCRIPT_RUN_COLUMNS`] oldest first.
    fn list_script_runs(&self, schema: &str, scripts_run_table: &str) -> String {
        format!("SELECT {SCRIPT_RUN_COLUMNS} FROM {} ORDER BY id", self.qualified(schema, scripts_run_table))
    }

    /// No parameters; returns [`SCRIPT_RUN_ERROR_COLUMNS`] oldest first.
    fn list_script_run_errors(&self, schema: &str, scripts_run_errors_table: &str) -> String {
        format!(
            "SELECT {SCRIPT_RUN_ERROR_COLUMNS} FROM {} ORDER BY id",
            self.qualified(schema, scripts_run_errors_table)
        )
    }

    fn unsupported(&self, operation: &'static str) -> MigrationError {
        MigrationError::unsupported(operation, self.name())
    }
}

/// Separator for a token alone on its line, or no batching when the token
/// does not form a valid pattern.
pub(crate) fn line_separator(token: &str) -> Separator {
    Separator::line_token(token).unwrap_or(Separator::None)
}

/// `[name]` with `]` doubled.
pub(crate) fn bracket(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Single-quoted literal with `'` doubled.
pub(crate) fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
