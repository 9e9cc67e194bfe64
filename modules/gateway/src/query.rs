use sqlmill_core::{
    MigrationError, Parameter, Result, Rows, ScriptRunErrorRecord, ScriptRunRecord, Value, VersionRecord,
};

use crate::open::Gateway;

fn text(rows: &Rows, row: usize, column: &str) -> String {
    rows.get(row, column).cloned().and_then(Value::into_text).unwrap_or_default()
}

fn int(rows: &Rows, row: usize, column: &str) -> i64 {
    rows.get(row, column).and_then(Value::as_i64).unwrap_or_default()
}

fn lookup_failed(context: &str) -> impl FnOnce(sqlmill_core::DbError) -> MigrationError + '_ {
    move |source| MigrationError::Database { context: context.to_string(), source }
}

impl Gateway {
    /// Newest version row for the repository.
    pub fn get_latest_version(&mut self, repository_path: &str) -> Result<Option<VersionRecord>> {
        let names = self.settings.names.clone();
        let sql = self.dialect.get_latest_version(&names.schema, &names.version_table);
        let rows = self
            .run_query(&sql, &[Parameter::text("repository_path", repository_path, Some(255))])
            .map_err(lookup_failed("reading the current version"))?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(VersionRecord {
            version_id: int(&rows, 0, "id"),
            repository_path: text(&rows, 0, "repository_path"),
            repository_version: text(&rows, 0, "version"),
            entered_by: text(&rows, 0, "entered_by"),
            entry_date: text(&rows, 0, "entry_date"),
        }))
    }

    pub fn get_version(&mut self, repository_path: &str) -> Result<Option<String>> {
        Ok(self.get_latest_version(repository_path)?.map(|v| v.repository_version))
    }

    pub fn get_version_id(&mut self, repository_path: &str) -> Result<Option<i64>> {
        let names = self.settings.names.clone();
        let sql = self.dialect.get_version_id(&names.schema, &names.version_table);
        let id = self
            .run_scalar(&sql, &[Parameter::text("repository_path", repository_path, Some(255))])
            .map_err(lookup_failed("reading the version id"))?;
        Ok(id.as_i64())
    }

    /// Hash recorded by the most recent run of the script, if it ever ran.
    pub fn get_current_script_hash(&mut self, script_name: &str) -> Result<Option<String>> {
        let names = self.settings.names.clone();
        let sql = self.dialect.get_current_script_hash(&names.schema, &names.scripts_run_table);
        let hash = self
            .run_scalar(&sql, &[Parameter::text("script_name", script_name, Some(255))])
            .map_err(lookup_failed("reading the recorded script hash"))?;
        Ok(hash.into_text())
    }

    pub fn has_run_script_already(&mut self, script_name: &str) -> Result<bool> {
        let names = self.settings.names.clone();
        let sql = self.dialect.has_script_run(&names.schema, &names.scripts_run_table);
        let rows = self
            .run_query(&sql, &[Parameter::text("script_name", script_name, Some(255))])
            .map_err(lookup_failed("checking the script history"))?;
        Ok(!rows.is_empty())
    }

    /// Every recorded run, oldest first.
    pub fn script_runs(&mut self) -> Result<Vec<ScriptRunRecord>> {
        let names = self.settings.names.clone();
        let sql = self.dialect.list_script_runs(&names.schema, &names.scripts_run_table);
        let rows = self.run_query(&sql, &[]).map_err(lookup_failed("listing script runs"))?;
        Ok((0..rows.len())
            .map(|i| ScriptRunRecord {
                version_id: int(&rows, i, "version_id"),
                script_name: text(&rows, i, "script_name"),
                content_hash: text(&rows, i, "text_hash"),
                run_once: rows.get(i, "one_time_script").and_then(Value::as_bool).unwrap_or(false),
                entered_by: text(&rows, i, "entered_by"),
                entry_date: text(&rows, i, "entry_date"),
            })
            .collect())
    }

    pub fn script_run_errors(&mut self) -> Result<Vec<ScriptRunErrorRecord>> {
        let names = self.settings.names.clone();
        let sql = self.dialect.list_script_run_errors(&names.schema, &names.scripts_run_errors_table);
        let rows = self.run_query(&sql, &[]).map_err(lookup_failed("listing script failures"))?;
        Ok((0..rows.len())
            .map(|i| ScriptRunErrorRecord {
                version_id: int(&rows, i, "version_id"),
                script_name: text(&rows, i, "script_name"),
                failing_statement: text(&rows, i, "erroneous_part_of_script"),
                error_message: text(&rows, i, "error_message"),
                entered_by: text(&rows, i, "entered_by"),
                entry_date: text(&rows, i, "entry_date"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use dialects::DialectRegistry;
    use sqlmill_core::{Rows, Value};

    use crate::testing::{Recorder, RecordingConnector};
    use crate::{Engine, Gateway, GatewaySettings};

    fn open(recorder: &Recorder) -> Gateway {
        let mut settings = GatewaySettings::new(Engine::SqlServer);
        settings.server_name = Some("db01".into());
        settings.database_name = Some("app".into());
        let mut gw =
            Gateway::new(settings, &DialectRegistry::standard(), Box::new(RecordingConnector::new(recorder.clone())))
                .unwrap();
        gw.open_connection(false).unwrap();
        gw
    }

    #[test]
    fn unknown_script_has_no_hash() {
        let recorder = Recorder::default();
        let mut gw = open(&recorder);
        assert_eq!(gw.get_current_script_hash("never.sql").unwrap(), None);
        assert!(!gw.has_run_script_already("never.sql").unwrap());
    }

    #[test]
    fn latest_version_maps_columns_case_insensitively() {
        let recorder = Recorder::default();
        recorder.answer_rows(
            "FROM [RoundhousE].[Version]",
            Rows {
                columns: vec!["ID".into(), "REPOSITORY_PATH".into(), "VERSION".into(), "ENTERED_BY".into(), "ENTRY_DATE".into()],
                rows: vec![vec![
                    Value::Int(4),
                    Value::Text("repo".into()),
                    Value::Text("2.0".into()),
                    Value::Text("deploy".into()),
                    Value::Text("2024-01-01 10:00:00".into()),
                ]],
            },
        );
        let mut gw = open(&recorder);
        let latest = gw.get_latest_version("repo").unwrap().unwrap();
        assert_eq!(latest.version_id, 4);
        assert_eq!(latest.repository_version, "2.0");
        assert_eq!(gw.get_version("repo").unwrap().as_deref(), Some("2.0"));
    }

    #[test]
    fn script_runs_read_one_time_flag() {
        let recorder = Recorder::default();
        recorder.answer_rows(
            "FROM [RoundhousE].[ScriptsRun]",
            Rows {
                columns: ["version_id", "script_name", "text_hash", "one_time_script", "entered_by", "entry_date"]
                    .map(String::from)
                    .to_vec(),
                rows: vec![vec![
                    Value::Int(1),
                    Value::Text("a.sql".into()),
                    Value::Text("h".into()),
                    Value::Int(1),
                    Value::Text("me".into()),
                    Value::Text("now".into()),
                ]],
            },
        );
        let mut gw = open(&recorder);
        let runs = gw.script_runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert!(runs[0].run_once);
        assert_eq!(runs[0].content_hash, "h");
    }
}
