//! Turning caller input into a connection string the driver can open.

use sqlmill_core::{MigrationError, Result};

use crate::engine::Engine;

/// Where a run connects, after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    /// Empty for file-based engines.
    pub server_name: String,
    pub database_name: String,
    pub connection_string: String,
}

impl ConnectionTarget {
    /// `server/database`, for messages. Never includes options, which may
    /// hold credentials.
    pub fn describe(&self) -> String {
        if self.server_name.is_empty() {
            self.database_name.clone()
        } else {
            format!("{}/{}", self.server_name, self.database_name)
        }
    }
}

/// Resolves server and database names and a canonical connection string.
///
/// A custom connection string is split into `key=value` parts. Server and
/// database keys fill in names the caller did not set explicitly; every
/// other option is kept in order. The engine's trusted-auth option is
/// appended only when no authentication option is present.
///
/// The resulting string points at the engine's administrative database when
/// it has one, so a missing target database can still be created.
pub fn resolve(
    engine: Engine,
    server_name: Option<&str>,
    database_name: Option<&str>,
    connection_string: Option<&str>,
) -> Result<ConnectionTarget> {
    let mut server = non_empty(server_name);
    let mut database = non_empty(database_name);
    let mut options: Vec<String> = Vec::new();

    if let Some(custom) = non_empty(connection_string) {
        for part in custom.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = match part.split_once('=') {
                Some((k, v)) => (k.trim().to_ascii_lowercase(), v.trim().to_string()),
                None => (part.to_ascii_lowercase(), String::new()),
            };
            if engine.server_keys().contains(&key.as_str()) {
                if server.is_none() && !value.is_empty() {
                    server = Some(value);
                }
            } else if engine.database_keys().contains(&key.as_str()) {
                if database.is_none() && !value.is_empty() {
                    database = Some(value);
                }
            } else {
                options.push(part.to_string());
            }
        }
    }

    let has_auth = options.iter().any(|o| {
        let key = o.split_once('=').map(|(k, _)| k).unwrap_or(o).trim().to_ascii_lowercase();
        engine.auth_keys().contains(&key.as_str())
    });
    if !has_auth {
        if let Some(auth) = engine.default_auth() {
            options.push(auth.to_string());
        }
    }

    let database = database.ok_or_else(|| {
        MigrationError::Configuration(format!("no database name given for {engine} (set it directly or in the connection string)"))
    })?;
    let server = match server {
        Some(s) => s,
        None if engine.requires_server() => {
            return Err(MigrationError::Configuration(format!(
                "no server name given for {engine} (set it directly or in the connection string)"
            )))
        }
        None => String::new(),
    };

    let mut parts = Vec::new();
    match engine {
        Engine::SqlServer | Engine::SqlServer2000 => {
            parts.push(format!("Server={server}"));
            parts.push(format!("Initial Catalog={}", engine.admin_database().unwrap_or(database.as_str())));
        }
        Engine::Oracle => parts.push(format!("Data Source={server}")),
        Engine::Access | Engine::Sqlite => parts.push(format!("Data Source={database}")),
    }
    parts.extend(options);

    Ok(ConnectionTarget { server_name: server, database_name: database, connection_string: parts.join(";") })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_discrete_fields_with_trusted_auth() {
        let t = resolve(Engine::SqlServer, Some("(local)"), Some("app"), None).unwrap();
        assert_eq!(t.server_name, "(local)");
        assert_eq!(t.database_name, "app");
        assert_eq!(t.connection_string, "Server=(local);Initial Catalog=master;Integrated Security=SSPI");
    }

    #[test]
    fn parses_custom_string_case_insensitively_and_keeps_options() {
        let t = resolve(
            Engine::SqlServer,
            None,
            None,
            Some("DATA SOURCE=db01;Initial Catalog=app;User Id=deploy;Password=pw;Connect Timeout=5"),
        )
        .unwrap();
        assert_eq!(t.server_name, "db01");
        assert_eq!(t.database_name, "app");
        assert_eq!(t.connection_string, "Server=db01;Initial Catalog=master;User Id=deploy;Password=pw;Connect Timeout=5");
    }

    #[test]
    fn appends_trusted_auth_only_when_no_auth_option() {
        let t = resolve(Engine::SqlServer, None, None, Some("server=db01;database=app;Encrypt=true")).unwrap();
        assert!(t.connection_string.ends_with("Encrypt=true;Integrated Security=SSPI"));
        let t = resolve(Engine::SqlServer, None, None, Some("server=db01;database=app;Trusted_Connection=yes")).unwrap();
        assert_eq!(t.connection_string.matches("Integrated Security").count(), 0);
    }

    #[test]
    fn explicit_fields_win_over_the_string() {
        let t = resolve(Engine::SqlServer, Some("db02"), Some("other"), Some("server=db01;database=app")).unwrap();
        assert_eq!(t.server_name, "db02");
        assert_eq!(t.database_name, "other");
    }

    #[test]
    fn fails_fast_without_a_target() {
        let err = resolve(Engine::SqlServer, None, Some("app"), None).unwrap_err();
        assert_eq!(err.category(), "configuration");
        assert!(resolve(Engine::Sqlite, None, None, None).is_err());
        assert!(resolve(Engine::Oracle, Some("tns"), None, None).is_err());
    }

    #[test]
    fn file_based_engines_need_no_server() {
        let t = resolve(Engine::Sqlite, None, None, Some("Data Source=/tmp/app.db")).unwrap();
        assert_eq!(t.database_name, "/tmp/app.db");
        assert_eq!(t.connection_string, "Data Source=/tmp/app.db");
        assert_eq!(t.describe(), "/tmp/app.db");

        let t = resolve(Engine::Access, None, Some("c:\\app.mdb"), Some("Provider=Microsoft.ACE.OLEDB.12.0")).unwrap();
        assert_eq!(t.connection_string, "Data Source=c:\\app.mdb;Provider=Microsoft.ACE.OLEDB.12.0");
    }

    #[test]
    fn oracle_uses_os_auth_by_default() {
        let t = resolve(Engine::Oracle, Some("ORCL"), Some("app"), None).unwrap();
        assert_eq!(t.connection_string, "Data Source=ORCL;User Id=/");
        assert_eq!(t.describe(), "ORCL/app");
    }
}
