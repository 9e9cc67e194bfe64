use std::path::Path;

use rusqlite::Connection as RawConnection;
use sqlmill_core::{Connection, Connector, DbError};
use tracing::debug;

use crate::bind::db_error;
use crate::conn::SqliteConnection;

/// Opens database files named by `Data Source=<path>` connection strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteConnector;

impl Connector for SqliteConnector {
    fn connect(&self, connection_string: &str) -> Result<Box<dyn Connection>, DbError> {
        let source = data_source(connection_string)
            .ok_or_else(|| DbError::new(format!("no data source in `{connection_string}`")))?;
        Ok(Box::new(SqliteConnection::open(source)?))
    }
}

/// File named by the connection string. A string without `=` is taken as a
/// bare path.
pub fn data_source(connection_string: &str) -> Option<&str> {
    let trimmed = connection_string.trim();
    if !trimmed.contains('=') {
        return Some(trimmed).filter(|s| !s.is_empty());
    }
    trimmed.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        let key = key.trim();
        let matches = ["data source", "datasource", "filename", "database"].iter().any(|k| key.eq_ignore_ascii_case(k));
        Some(value.trim()).filter(|v| matches && !v.is_empty())
    })
}

impl SqliteConnection {
    pub fn open(source: &str) -> Result<Self, DbError> {
        let conn = if source == ":memory:" {
            RawConnection::open_in_memory()
        } else {
            RawConnection::open(Path::new(source))
        }
        .map_err(db_error)?;
        apply_pragmas(&conn).map_err(db_error)?;
        debug!(source, "sqlite database opened");
        Ok(SqliteConnection::new(conn))
    }
}

fn apply_pragmas(conn: &RawConnection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_source_forms() {
        assert_eq!(data_source("Data Source=app.db"), Some("app.db"));
        assert_eq!(data_source("data source = /tmp/app.db ; Mode=rwc"), Some("/tmp/app.db"));
        assert_eq!(data_source("Mode=rwc;Filename=x.db"), Some("x.db"));
        assert_eq!(data_source("app.db"), Some("app.db"));
        assert_eq!(data_source("Mode=rwc"), None);
        assert_eq!(data_source("  "), None);
    }

    #[test]
    fn memory_database_has_foreign_keys_on() {
        let mut conn = SqliteConnector.connect("Data Source=:memory:").unwrap();
        let on = conn.scalar("PRAGMA foreign_keys", &[]).unwrap();
        assert_eq!(on.as_i64(), Some(1));
    }
}
