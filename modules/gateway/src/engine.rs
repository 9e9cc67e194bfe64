use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use sqlmill_core::MigrationError;

/// Database engine family. Variants differ in connection setup and in the
/// dialect they bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    SqlServer,
    SqlServer2000,
    Access,
    Oracle,
    Sqlite,
}

impl Engine {
    pub const ALL: [Engine; 5] = [Engine::SqlServer, Engine::SqlServer2000, Engine::Access, Engine::Oracle, Engine::Sqlite];

    /// Key into the dialect registry.
    pub fn dialect_name(self) -> &'static str {
        match self {
            Engine::SqlServer => "SQLServer",
            Engine::SqlServer2000 => "SQLServer2000",
            Engine::Access => "Access",
            Engine::Oracle => "Oracle",
            Engine::Sqlite => "SQLite",
        }
    }

    /// The database is a file that exists once a connection has been opened
    /// (SQLite) or is provisioned outside the migrator (Access).
    pub fn is_file_based(self) -> bool {
        matches!(self, Engine::Access | Engine::Sqlite)
    }

    pub fn requires_server(self) -> bool {
        matches!(self, Engine::SqlServer | Engine::SqlServer2000 | Engine::Oracle)
    }

    /// Database used for administrative statements, when the engine has one.
    pub fn admin_database(self) -> Option<&'static str> {
        match self {
            Engine::SqlServer | Engine::SqlServer2000 => Some("master"),
            _ => None,
        }
    }

    pub(crate) fn server_keys(self) -> &'static [&'static str] {
        match self {
            Engine::SqlServer | Engine::SqlServer2000 => &["server", "data source", "address", "addr", "network address"],
            Engine::Oracle => &["data source"],
            Engine::Access | Engine::Sqlite => &[],
        }
    }

    pub(crate) fn database_keys(self) -> &'static [&'static str] {
        match self {
            Engine::SqlServer | Engine::SqlServer2000 => &["initial catalog", "database"],
            Engine::Oracle => &[],
            Engine::Access => &["data source"],
            Engine::Sqlite => &["data source", "filename"],
        }
    }

    /// Options that already say how to authenticate.
    pub(crate) fn auth_keys(self) -> &'static [&'static str] {
        match self {
            Engine::SqlServer | Engine::SqlServer2000 => {
                &["integrated security", "trusted_connection", "user id", "uid", "user", "password", "pwd"]
            }
            Engine::Oracle => &["integrated security", "user id", "password", "dba privilege"],
            Engine::Access => &["user id", "password", "jet oledb:database password"],
            Engine::Sqlite => &[],
        }
    }

    /// Appended when no auth option was supplied.
    pub(crate) fn default_auth(self) -> Option<&'static str> {
        match self {
            Engine::SqlServer | Engine::SqlServer2000 => Some("Integrated Security=SSPI"),
            Engine::Oracle => Some("User Id=/"),
            Engine::Access | Engine::Sqlite => None,
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dialect_name())
    }
}

impl FromStr for Engine {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        match key.as_str() {
            "sqlserver" | "mssql" | "sqlserver2005" | "sqlserver2008" | "tsql" => Ok(Engine::SqlServer),
            "sqlserver2000" | "mssql2000" => Ok(Engine::SqlServer2000),
            "access" | "msaccess" | "jet" => Ok(Engine::Access),
            "oracle" => Ok(Engine::Oracle),
            "sqlite" | "sqlite3" => Ok(Engine::Sqlite),
            _ => Err(MigrationError::Configuration(format!("unknown database engine: {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("SQL-Server".parse::<Engine>().unwrap(), Engine::SqlServer);
        assert_eq!("sqlserver2000".parse::<Engine>().unwrap(), Engine::SqlServer2000);
        assert_eq!("SQLite3".parse::<Engine>().unwrap(), Engine::Sqlite);
        assert!("postgres".parse::<Engine>().is_err());
    }

    #[test]
    fn every_engine_has_a_standard_dialect() {
        let registry = dialects::DialectRegistry::standard();
        for engine in Engine::ALL {
            assert!(registry.get(engine.dialect_name()).is_some(), "{engine}");
        }
    }
}
