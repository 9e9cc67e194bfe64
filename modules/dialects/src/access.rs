use splitter::{Separator, Splitter};

use crate::{bracket, literal, DialectScripts};

/// Microsoft Access (Jet/ACE). The database is a file managed outside the
/// migrator, so no create/use/drop; parameters are positional.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessScripts;

impl DialectScripts for AccessScripts {
    fn name(&self) -> &'static str {
        "Access"
    }

    fn splitter(&self) -> Splitter {
        Splitter::new(Separator::Terminator(';'))
    }

    fn param(&self, _name: &str) -> String {
        "?".to_string()
    }

    fn qualified(&self, schema: &str, table: &str) -> String {
        bracket(&format!("{schema}_{table}"))
    }

    fn now(&self) -> &'static str {
        "Now()"
    }

    fn select_top_one(&self, columns: &str, rest: &str) -> String {
        format!("SELECT TOP 1 {columns} {rest}")
    }

    fn create_schema(&self, _schema: &str) -> Option<String> {
        None
    }

    fn table_exists(&self, schema: &str, table: &str) -> String {
        format!(
            "SELECT COUNT(*) FROM MSysObjects WHERE Name = {} AND Type = 1",
            literal(&format!("{schema}_{table}"))
        )
    }

    fn create_version_table(&self, schema: &str, version_table: &str) -> String {
        format!(
            "CREATE TABLE {}\n(\n    id AUTOINCREMENT PRIMARY KEY\n    ,repository_path TEXT(255)\n    ,version TEXT(50)\n    ,entry_date DATETIME\n    ,entered_by TEXT(50)\n)",
            self.qualified(schema, version_table)
        )
    }

    fn create_scripts_run_table(&self, schema: &str, _version_table: &str, scripts_run_table: &str) -> String {
        format!(
            "CREATE TABLE {}\n(\n    id AUTOINCREMENT PRIMARY KEY\n    ,version_id LONG\n    ,script_name TEXT(255)\n    ,text_hash TEXT(255)\n    ,one_time_script YESNO\n    ,entry_date DATETIME\n    ,entered_by TEXT(50)\n)",
            self.qualified(schema, scripts_run_table)
        )
    }

    fn create_scripts_run_errors_table(&self, schema: &str, scripts_run_errors_table: &str) -> String {
        format!(
            "CREATE TABLE {}\n(\n    id AUTOINCREMENT PRIMARY KEY\n    ,version_id LONG\n    ,script_name TEXT(255)\n    ,erroneous_part_of_script MEMO\n    ,error_message MEMO\n    ,entry_date DATETIME\n    ,entered_by TEXT(50)\n)",
            self.qualified(schema, scripts_run_errors_table)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_prefixed_and_bracketed() {
        assert_eq!(AccessScripts.qualified("RoundhousE", "ScriptsRun"), "[RoundhousE_ScriptsRun]");
        assert!(AccessScripts.create_schema("RoundhousE").is_none());
        assert!(AccessScripts.table_exists("RoundhousE", "Version").contains("'RoundhousE_Version'"));
    }

    #[test]
    fn positional_placeholders() {
        let sql = AccessScripts.insert_version("RoundhousE", "Version");
        assert_eq!(sql.matches('?').count(), 3);
        assert!(sql.contains("Now()"));
    }

    #[test]
    fn database_lifecycle_is_unsupported() {
        assert!(AccessScripts.use_database("app").is_err());
        assert!(AccessScripts.delete_database("app").is_err());
        assert!(AccessScripts.set_recovery_mode("app", true).is_err());
        assert!(AccessScripts.restore_database("app", "x", None).is_err());
    }

    #[test]
    fn splits_on_semicolons() {
        let parts = AccessScripts.splitter().split("CREATE TABLE a (x TEXT);\nCREATE TABLE b (y TEXT);");
        assert_eq!(parts, vec!["CREATE TABLE a (x TEXT)", "CREATE TABLE b (y TEXT)"]);
    }

    #[test]
    fn any_bare_semicolon_ends_a_statement() {
        let parts = AccessScripts.splitter().split("SELECT 1;SELECT ';' FROM t -- a;b\n;UPDATE t SET x = 1;");
        assert_eq!(parts, vec!["SELECT 1", "SELECT ';' FROM t -- a;b", "UPDATE t SET x = 1"]);
    }
}
