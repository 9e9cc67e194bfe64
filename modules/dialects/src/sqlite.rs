use splitter::Splitter;

use crate::{bracket, line_separator, literal, DialectScripts};

/// SQLite. The database is the file named by the connection string and is
/// created when it is first opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteScripts;

impl DialectScripts for SqliteScripts {
    fn name(&self) -> &'static str {
        "SQLite"
    }

    /// `GO` lines are honored so scripts can be cut into separately
    /// reported batches; the engine itself accepts multi-statement batches.
    fn splitter(&self) -> Splitter {
        Splitter::new(line_separator("GO"))
    }

    fn param(&self, name: &str) -> String {
        format!(":{name}")
    }

    fn qualified(&self, schema: &str, table: &str) -> String {
        bracket(&format!("{schema}_{table}"))
    }

    fn now(&self) -> &'static str {
        "strftime('%Y-%m-%d %H:%M:%f', 'now')"
    }

    fn select_top_one(&self, columns: &str, rest: &str) -> String {
        format!("SELECT {columns} {rest} LIMIT 1")
    }

    fn create_schema(&self, _schema: &str) -> Option<String> {
        None
    }

    fn table_exists(&self, schema: &str, table: &str) -> String {
        format!(
            "SELECT COUNT(1) FROM sqlite_master WHERE type='table' AND name={}",
            literal(&format!("{schema}_{table}"))
        )
    }

    fn create_version_table(&self, schema: &str, version_table: &str) -> String {
        format!(
            "CREATE TABLE {} (\n  id               INTEGER PRIMARY KEY AUTOINCREMENT,\n  repository_path  TEXT,\n  version          TEXT,\n  entry_date       TEXT NOT NULL,\n  entered_by       TEXT\n)",
            self.qualified(schema, version_table)
        )
    }

    fn create_scripts_run_table(&self, schema: &str, version_table: &str, scripts_run_table: &str) -> String {
        format!(
            "CREATE TABLE {} (\n  id               INTEGER PRIMARY KEY AUTOINCREMENT,\n  version_id       INTEGER REFERENCES {}(id),\n  script_name      TEXT,\n  text_hash        TEXT,\n  one_time_script  INTEGER NOT NULL CHECK (one_time_script IN (0,1)),\n  entry_date       TEXT NOT NULL,\n  entered_by       TEXT\n)",
            self.qualified(schema, scripts_run_table),
            self.qualified(schema, version_table)
        )
    }

    fn create_scripts_run_errors_table(&self, schema: &str, scripts_run_errors_table: &str) -> String {
        format!(
            "CREATE TABLE {} (\n  id                        INTEGER PRIMARY KEY AUTOINCREMENT,\n  version_id                INTEGER,\n  script_name               TEXT,\n  erroneous_part_of_script  TEXT,\n  error_message             TEXT,\n  entry_date                TEXT NOT NULL,\n  entered_by                TEXT\n)",
            self.qualified(schema, scripts_run_errors_table)
        )
    }
}
