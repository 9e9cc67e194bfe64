use splitter::Splitter;
use sqlmill_core::Result;

use crate::{line_separator, literal, DialectScripts};

/// Oracle. A "database" here is a schema owned by a user of the same name.
///
/// Batches end at a `/` alone on its line, as in SQL*Plus, so PL/SQL blocks
/// keep their inner `;`. Plain SQL statements are written without a
/// trailing `;`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleScripts;

impl DialectScripts for OracleScripts {
    fn name(&self) -> &'static str {
        "Oracle"
    }

    fn splitter(&self) -> Splitter {
        Splitter::new(line_separator("/"))
    }

    fn param(&self, name: &str) -> String {
        format!(":{name}")
    }

    fn qualified(&self, schema: &str, table: &str) -> String {
        format!("{schema}_{table}")
    }

    fn now(&self) -> &'static str {
        "SYSTIMESTAMP"
    }

    fn select_top_one(&self, columns: &str, rest: &str) -> String {
        format!("SELECT * FROM (SELECT {columns} {rest}) WHERE ROWNUM = 1")
    }

    fn create_database(&self, database: &str) -> Result<String> {
        Ok(format!(
            "DECLARE\n    v_exists INTEGER := 0;\nBEGIN\n    SELECT COUNT(*) INTO v_exists FROM all_users WHERE username = UPPER({name});\n    IF v_exists = 0 THEN\n        EXECUTE IMMEDIATE 'CREATE USER {user} IDENTIFIED EXTERNALLY';\n        EXECUTE IMMEDIATE 'GRANT CONNECT, RESOURCE TO {user}';\n    END IF;\nEND;",
            name = literal(database),
            user = database.replace('\'', "")
        ))
    }

    fn delete_database(&self, database: &str) -> Result<String> {
        Ok(format!(
            "DECLARE\n    v_exists INTEGER := 0;\nBEGIN\n    SELECT COUNT(*) INTO v_exists FROM all_users WHERE username = UPPER({name});\n    IF v_exists > 0 THEN\n        EXECUTE IMMEDIATE 'DROP USER {user} CASCADE';\n    END IF;\nEND;",
            name = literal(database),
            user = database.replace('\'', "")
        ))
    }

    fn use_database(&self, database: &str) -> Result<String> {
        Ok(format!("ALTER SESSION SET CURRENT_SCHEMA = {database}"))
    }

    fn create_schema(&self, _schema: &str) -> Option<String> {
        None
    }

    fn table_exists(&self, schema: &str, table: &str) -> String {
        format!(
            "SELECT COUNT(*) FROM user_tables WHERE table_name = UPPER({})",
            literal(&format!("{schema}_{table}"))
        )
    }

    fn create_version_table(&self, schema: &str, version_table: &str) -> String {
        format!(
            "CREATE TABLE {}\n(\n    id NUMBER(19) GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY\n    ,repository_path VARCHAR2(255)\n    ,version VARCHAR2(50)\n    ,entry_date TIMESTAMP NOT NULL\n    ,entered_by VARCHAR2(50)\n)",
            self.qualified(schema, version_table)
        )
    }

    fn create_scripts_run_table(&self, schema: &str, version_table: &str, scripts_run_table: &str) -> String {
        format!(
            "CREATE TABLE {}\n(\n    id NUMBER(19) GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY\n    ,version_id NUMBER(19) REFERENCES {}(id)\n    ,script_name VARCHAR2(255)\n    ,text_hash VARCHAR2(512)\n    ,one_time_script NUMBER(1)\n    ,entry_date TIMESTAMP NOT NULL\n    ,entered_by VARCHAR2(50)\n)",
            self.qualified(schema, scripts_run_table),
            self.qualified(schema, version_table)
        )
    }

    fn create_scripts_run_errors_table(&self, schema: &str, scripts_run_errors_table: &str) -> String {
        format!(
            "CREATE TABLE {}\n(\n    id NUMBER(19) GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY\n    ,version_id NUMBER(19)\n    ,script_name VARCHAR2(255)\n    ,erroneous_part_of_script CLOB\n    ,error_message CLOB\n    ,entry_date TIMESTAMP NOT NULL\n    ,entered_by VARCHAR2(50)\n)",
            self.qualified(schema, scripts_run_errors_table)
        )
    }
}
