use sqlmill_core::{MigrationError, Parameter, Result};
use tracing::debug;

use crate::open::Gateway;

const REPOSITORY_PATH_SIZE: usize = 255;
const VERSION_SIZE: usize = 50;
const USER_NAME_SIZE: usize = 50;
const SCRIPT_NAME_SIZE: usize = 255;
const TEXT_HASH_SIZE: usize = 512;

impl Gateway {
    fn user_name(&self) -> Parameter {
        Parameter::text("user_name", self.settings.user_name.clone(), Some(USER_NAME_SIZE))
    }

    /// Appends a version row and returns the id the engine assigned it.
    pub fn insert_version_and_get_version_id(&mut self, repository_path: &str, repository_version: &str) -> Result<i64> {
        let names = self.settings.names.clone();
        let insert = self.dialect.insert_version(&names.schema, &names.version_table);
        let params = [
            Parameter::text("repository_path", repository_path, Some(REPOSITORY_PATH_SIZE)),
            Parameter::text("repository_version", repository_version, Some(VERSION_SIZE)),
            self.user_name(),
        ];
        self.run_statement(&insert, &params)
            .map_err(|source| MigrationError::Database { context: "recording the version".into(), source })?;

        let version_id = self.get_version_id(repository_path)?.ok_or_else(|| MigrationError::Database {
            context: "recording the version".into(),
            source: sqlmill_core::DbError::new("inserted version row was not found"),
        })?;
        debug!(version_id, repository_path, repository_version, "version recorded");
        Ok(version_id)
    }

    pub fn insert_script_run(&mut self, script_name: &str, text_hash: &str, run_once: bool, version_id: i64) -> Result<()> {
        let names = self.settings.names.clone();
        let sql = self.dialect.insert_script_run(&names.schema, &names.scripts_run_table);
        let params = [
            Parameter::int64("version_id", version_id),
            Parameter::text("script_name", script_name, Some(SCRIPT_NAME_SIZE)),
            Parameter::text("text_hash", text_hash, Some(TEXT_HASH_SIZE)),
            Parameter::boolean("one_time_script", run_once),
            self.user_name(),
        ];
        self.run_statement(&sql, &params).map_err(|source| MigrationError::Database {
            context: format!("recording the run of {script_name}"),
            source,
        })?;
        Ok(())
    }

    pub fn insert_script_run_error(
        &mut self,
        script_name: &str,
        erroneous_part_of_script: &str,
        error_message: &str,
        version_id: i64,
    ) -> Result<()> {
        let names = self.settings.names.clone();
        let sql = self.dialect.insert_script_run_error(&names.schema, &names.scripts_run_errors_table);
        let params = [
            Parameter::int64("version_id", version_id),
            Parameter::text("script_name", script_name, Some(SCRIPT_NAME_SIZE)),
            Parameter::text("erroneous_part_of_script", erroneous_part_of_script, None),
            Parameter::text("error_message", error_message, None),
            self.user_name(),
        ];
        self.run_statement(&sql, &params).map_err(|source| MigrationError::Database {
            context: format!("recording the failure of {script_name}"),
            source,
        })?;
        Ok(())
    }
}
