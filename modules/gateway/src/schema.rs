//! Administrative statements and the bookkeeping DDL.

use sqlmill_core::{MigrationError, Result};
use tracing::info;

use crate::open::Gateway;

impl Gateway {
    fn target_database(&mut self) -> Result<String> {
        Ok(self.initialize_connection()?.database_name.clone())
    }

    /// Dialect templates are one logical statement each and go out unsplit.
    fn run_admin(&mut self, script: &str, context: &str) -> Result<()> {
        self.run_statement(script, &[])
            .map_err(|source| MigrationError::Database { context: context.to_string(), source })?;
        Ok(())
    }

    /// Operator-supplied scripts are split with the dialect's separator.
    fn run_admin_batches(&mut self, script: &str, context: &str) -> Result<()> {
        for batch in self.splitter().split(script) {
            self.run_admin(&batch, context)?;
        }
        Ok(())
    }

    fn use_admin_database(&mut self) -> Result<()> {
        match self.engine().admin_database() {
            Some(admin) => self.use_database(admin),
            None => Ok(()),
        }
    }

    pub fn create_database_if_it_doesnt_exist(&mut self) -> Result<()> {
        let database = self.target_database()?;
        let context = format!("creating database {database}");
        if let Some(custom) = self.settings.custom_create_database_script.clone() {
            self.use_admin_database()?;
            info!(database = %database, "creating database with the custom script");
            return self.run_admin_batches(&custom, &context);
        }
        let script = self.dialect.create_database(&database)?;
        self.use_admin_database()?;
        info!(database = %database, "creating database if missing");
        self.run_admin(&script, &context)
    }

    pub fn set_recovery_mode(&mut self, simple: bool) -> Result<()> {
        let database = self.target_database()?;
        let script = self.dialect.set_recovery_mode(&database, simple)?;
        self.use_admin_database()?;
        info!(database = %database, simple, "setting recovery mode");
        self.run_admin(&script, &format!("setting recovery mode on {database}"))
    }

    pub fn backup_database(&mut self, output_path: &str) -> Result<()> {
        let database = self.target_database()?;
        let script = self.dialect.backup_database(&database, output_path)?;
        self.run_admin(&script, &format!("backing up {database}"))
    }

    /// Runs under the restore timeout; the command timeout is put back on
    /// every exit path.
    pub fn restore_database(&mut self, restore_from_path: &str, custom_options: Option<&str>) -> Result<()> {
        let database = self.target_database()?;
        let script = self.dialect.restore_database(&database, restore_from_path, custom_options)?;
        self.use_admin_database()?;

        let previous = self.command_timeout();
        let restore_timeout = self.settings.restore_timeout;
        self.set_command_timeout(restore_timeout)
            .map_err(|source| MigrationError::Database { context: "raising the timeout for restore".into(), source })?;
        info!(database = %database, from = %restore_from_path, "restoring database");
        let restored = self.run_admin(&script, &format!("restoring {database}"));
        let reset = self
            .set_command_timeout(previous)
            .map_err(|source| MigrationError::Database { context: "resetting the command timeout".into(), source });
        restored.and(reset)
    }

    pub fn delete_database_if_it_exists(&mut self) -> Result<()> {
        let database = self.target_database()?;
        let script = self.dialect.delete_database(&database)?;
        self.use_admin_database()?;
        info!(database = %database, "dropping database if present");
        self.run_admin(&script, &format!("dropping database {database}"))
    }

    pub fn use_database(&mut self, database: &str) -> Result<()> {
        let sql = self.dialect.use_database(database)?;
        self.run_statement(&sql, &[])
            .map_err(|source| MigrationError::Database { context: format!("switching to {database}"), source })?;
        Ok(())
    }

    /// Points the session at the target database. File-based engines are
    /// already connected to it.
    pub fn use_target_database(&mut self) -> Result<()> {
        if self.engine().is_file_based() {
            return Ok(());
        }
        let database = self.target_database()?;
        self.use_database(&database)
    }

    pub fn table_exists(&mut self, table: &str) -> Result<bool> {
        let sql = self.dialect.table_exists(&self.settings.names.schema, table);
        let count = self
            .run_scalar(&sql, &[])
            .map_err(|source| MigrationError::SchemaBookkeeping { step: "table_exists", source })?;
        Ok(count.as_i64().unwrap_or(0) > 0)
    }

    fn create_table_if_missing(&mut self, step: &'static str, table: &str, ddl: String) -> Result<()> {
        if self.table_exists(table)? {
            return Ok(());
        }
        info!(table, "creating bookkeeping table");
        self.run_statement(&ddl, &[])
            .map_err(|source| MigrationError::SchemaBookkeeping { step, source })?;
        Ok(())
    }

    pub fn create_roundhouse_schema_if_it_doesnt_exist(&mut self) -> Result<()> {
        let Some(sql) = self.dialect.create_schema(&self.settings.names.schema) else {
            return Ok(());
        };
        self.run_statement(&sql, &[])
            .map_err(|source| MigrationError::SchemaBookkeeping { step: "create_schema", source })?;
        Ok(())
    }

    pub fn create_roundhouse_version_table_if_it_doesnt_exist(&mut self) -> Result<()> {
        let names = self.settings.names.clone();
        let ddl = self.dialect.create_version_table(&names.schema, &names.version_table);
        self.create_table_if_missing("create_version_table", &names.version_table, ddl)
    }

    pub fn create_roundhouse_scripts_run_table_if_it_doesnt_exist(&mut self) -> Result<()> {
        let names = self.settings.names.clone();
        let ddl = self.dialect.create_scripts_run_table(&names.schema, &names.version_table, &names.scripts_run_table);
        self.create_table_if_missing("create_scripts_run_table", &names.scripts_run_table, ddl)
    }

    pub fn create_roundhouse_scripts_run_errors_table_if_it_doesnt_exist(&mut self) -> Result<()> {
        let names = self.settings.names.clone();
        let ddl = self.dialect.create_scripts_run_errors_table(&names.schema, &names.scripts_run_errors_table);
        self.create_table_if_missing("create_scripts_run_errors_table", &names.scripts_run_errors_table, ddl)
    }

    /// Schema plus the three bookkeeping tables, in dependency order.
    pub fn ensure_bookkeeping(&mut self) -> Result<()> {
        self.create_roundhouse_schema_if_it_doesnt_exist()?;
        self.create_roundhouse_version_table_if_it_doesnt_exist()?;
        self.create_roundhouse_scripts_run_table_if_it_doesnt_exist()?;
        self.create_roundhouse_scripts_run_errors_table_if_it_doesnt_exist()
    }
}
