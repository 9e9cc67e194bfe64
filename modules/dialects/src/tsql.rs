use splitter::Splitter;
use sqlmill_core::Result;

use crate::{bracket, line_separator, literal, DialectScripts};

/// SQL Server. The 2000 variant lacks `sys.*` catalog views, `MAX` types and
/// real schemas, and has no managed restore.
#[derive(Debug, Clone, Copy)]
pub struct TSqlScripts {
    legacy: bool,
}

impl TSqlScripts {
    pub const fn modern() -> Self {
        TSqlScripts { legacy: false }
    }

    pub const fn sql2000() -> Self {
        TSqlScripts { legacy: true }
    }

    fn long_text(&self) -> &'static str {
        if self.legacy {
            "NTEXT"
        } else {
            "NVARCHAR(MAX)"
        }
    }

    fn database_exists(&self, database: &str) -> String {
        if self.legacy {
            format!("EXISTS(SELECT * FROM master..sysdatabases WHERE name = {})", literal(database))
        } else {
            format!("EXISTS(SELECT * FROM sys.databases WHERE [name] = {})", literal(database))
        }
    }
}

impl DialectScripts for TSqlScripts {
    fn name(&self) -> &'static str {
        if self.legacy {
            "SQLServer2000"
        } else {
            "SQLServer"
        }
    }

    fn splitter(&self) -> Splitter {
        Splitter::new(line_separator("GO")).with_nested_block_comments(true)
    }

    fn param(&self, name: &str) -> String {
        format!("@{name}")
    }

    fn qualified(&self, schema: &str, table: &str) -> String {
        if self.legacy {
            format!("[dbo].{}", bracket(&format!("{schema}_{table}")))
        } else {
            format!("{}.{}", bracket(schema), bracket(table))
        }
    }

    fn now(&self) -> &'static str {
        "GETDATE()"
    }

    fn select_top_one(&self, columns: &str, rest: &str) -> String {
        format!("SELECT TOP 1 {columns} {rest}")
    }

    fn create_database(&self, database: &str) -> Result<String> {
        Ok(format!(
            "IF NOT {}\nBEGIN\n    CREATE DATABASE {}\nEND",
            self.database_exists(database),
            bracket(database)
        ))
    }

    fn set_recovery_mode(&self, database: &str, simple: bool) -> Result<String> {
        let mode = if simple { "SIMPLE" } else { "FULL" };
        Ok(format!(
            "IF {}\nBEGIN\n    ALTER DATABASE {} SET RECOVERY {mode}\nEND",
            self.database_exists(database),
            bracket(database)
        ))
    }

    fn restore_database(&self, database: &str, restore_from_path: &str, custom_options: Option<&str>) -> Result<String> {
        if self.legacy {
            return Err(self.unsupported("restore database"));
        }
        let extra = custom_options
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| format!(", {o}"))
            .unwrap_or_default();
        Ok(format!(
            "IF {exists}\nBEGIN\n    ALTER DATABASE {db} SET SINGLE_USER WITH ROLLBACK IMMEDIATE\nEND\n\
             RESTORE DATABASE {db} FROM DISK = N{path} WITH NOUNLOAD, STATS = 10, RECOVERY, REPLACE{extra}\n\
             ALTER DATABASE {db} SET MULTI_USER",
            exists = self.database_exists(database),
            db = bracket(database),
            path = literal(restore_from_path),
        ))
    }

    fn delete_database(&self, database: &str) -> Result<String> {
        Ok(format!(
            "IF {}\nBEGIN\n    ALTER DATABASE {db} SET SINGLE_USER WITH ROLLBACK IMMEDIATE\n    DROP DATABASE {db}\nEND",
            self.database_exists(database),
            db = bracket(database)
        ))
    }

    fn use_database(&self, database: &str) -> Result<String> {
        Ok(format!("USE {}", bracket(database)))
    }

    fn create_schema(&self, schema: &str) -> Option<String> {
        if self.legacy {
            return None;
        }
        let create = format!("CREATE SCHEMA {}", bracket(schema));
        Some(format!(
            "IF NOT EXISTS(SELECT * FROM sys.schemas WHERE [name] = {})\nBEGIN\n    EXEC({})\nEND",
            literal(schema),
            literal(&create)
        ))
    }

    fn table_exists(&self, schema: &str, table: &str) -> String {
        if self.legacy {
            format!(
                "SELECT COUNT(*) FROM dbo.sysobjects WHERE name = {} AND xtype = 'U'",
                literal(&format!("{schema}_{table}"))
            )
        } else {
            format!(
                "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_SCHEMA = {} AND TABLE_NAME = {}",
                literal(schema),
                literal(table)
            )
        }
    }

    fn create_version_table(&self, schema: &str, version_table: &str) -> String {
        format!(
            "CREATE TABLE {}\n(\n    id BIGINT IDENTITY(1,1) NOT NULL PRIMARY KEY\n    ,repository_path NVARCHAR(255) NULL\n    ,version NVARCHAR(50) NULL\n    ,entry_date DATETIME NOT NULL\n    ,entered_by NVARCHAR(50) NULL\n)",
            self.qualified(schema, version_table)
        )
    }

    fn create_scripts_run_table(&self, schema: &str, version_table: &str, scripts_run_table: &str) -> String {
        format!(
            "CREATE TABLE {}\n(\n    id BIGINT IDENTITY(1,1) NOT NULL PRIMARY KEY\n    ,version_id BIGINT NULL REFERENCES {}(id)\n    ,script_name NVARCHAR(255) NULL\n    ,text_hash NVARCHAR(512) NULL\n    ,one_time_script BIT NULL\n    ,entry_date DATETIME NOT NULL\n    ,entered_by NVARCHAR(50) NULL\n)",
            self.qualified(schema, scripts_run_table),
            self.qualified(schema, version_table)
        )
    }

    fn create_scripts_run_errors_table(&self, schema: &str, scripts_run_errors_table: &str) -> String {
        format!(
            "CREATE TABLE {}\n(\n    id BIGINT IDENTITY(1,1) NOT NULL PRIMARY KEY\n    ,version_id BIGINT NULL\n    ,script_name NVARCHAR(255) NULL\n    ,erroneous_part_of_script {long}\n    ,error_message {long}\n    ,entry_date DATETIME NOT NULL\n    ,entered_by NVARCHAR(50) NULL\n)",
            self.qualified(schema, scripts_run_errors_table),
            long = self.long_text()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modern_uses_real_schemas() {
        let d = TSqlScripts::modern();
        assert_eq!(d.qualified("RoundhousE", "Version"), "[RoundhousE].[Version]");
        let create = d.create_schema("RoundhousE").unwrap();
        assert!(create.contains("sys.schemas"));
        assert!(create.contains("EXEC('CREATE SCHEMA [RoundhousE]')"));
    }

    #[test]
    fn legacy_prefixes_tables_and_uses_old_catalogs() {
        let d = TSqlScripts::sql2000();
        assert_eq!(d.name(), "SQLServer2000");
        assert_eq!(d.qualified("RoundhousE", "Version"), "[dbo].[RoundhousE_Version]");
        assert!(d.create_schema("RoundhousE").is_none());
        assert!(d.create_database("app").unwrap().contains("master..sysdatabases"));
        assert!(d.create_scripts_run_errors_table("RoundhousE", "ScriptsRunErrors").contains("NTEXT"));
        assert!(d.restore_database("app", "c:\\app.bak", None).is_err());
    }

    #[test]
    fn restore_appends_custom_options() {
        let d = TSqlScripts::modern();
        let sql = d.restore_database("app", "c:\\backups\\app.bak", Some("MOVE 'app' TO 'd:\\app.mdf'")).unwrap();
        assert!(sql.contains("FROM DISK = N'c:\\backups\\app.bak'"));
        assert!(sql.contains("REPLACE, MOVE 'app' TO 'd:\\app.mdf'"));
        assert!(sql.ends_with("SET MULTI_USER"));
    }

    #[test]
    fn database_names_are_bracketed_and_escaped() {
        let d = TSqlScripts::modern();
        let sql = d.create_database("my'db]").unwrap();
        assert!(sql.contains("[name] = 'my''db]'"));
        assert!(sql.contains("CREATE DATABASE [my'db]]]"));
        assert_eq!(d.use_database("app").unwrap(), "USE [app]");
    }

    #[test]
    fn dml_uses_at_parameters() {
        let d = TSqlScripts::modern();
        let sql = d.get_current_script_hash("RoundhousE", "ScriptsRun");
        assert!(sql.starts_with("SELECT TOP 1 text_hash FROM [RoundhousE].[ScriptsRun]"));
        assert!(sql.contains("script_name = @script_name"));
    }

    #[test]
    fn splits_on_go_lines() {
        assert_eq!(TSqlScripts::modern().splitter().split("SELECT 1\nGO\nSELECT 2").len(), 2);
    }
}
