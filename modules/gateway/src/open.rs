use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

use dialects::{DialectRegistry, DialectScripts};
use splitter::Splitter;
use sqlmill_core::{BookkeepingNames, Connection, Connector, DbError, MigrationError, Parameter, Result, Rows, Value};
use tracing::{debug, warn};

use crate::engine::Engine;
use crate::target::{resolve, ConnectionTarget};

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub engine: Engine,
    pub server_name: Option<String>,
    pub database_name: Option<String>,
    pub connection_string: Option<String>,
    pub names: BookkeepingNames,
    /// Recorded as `entered_by` on every bookkeeping row.
    pub user_name: String,
    pub command_timeout: Duration,
    /// Used instead of `command_timeout` while a restore runs.
    pub restore_timeout: Duration,
    /// Replaces the dialect's create-database statement when set.
    pub custom_create_database_script: Option<String>,
}

impl GatewaySettings {
    pub fn new(engine: Engine) -> Self {
        GatewaySettings {
            engine,
            server_name: None,
            database_name: None,
            connection_string: None,
            names: BookkeepingNames::default(),
            user_name: String::new(),
            command_timeout: Duration::from_secs(60),
            restore_timeout: Duration::from_secs(900),
            custom_create_database_script: None,
        }
    }
}

pub struct Gateway {
    pub(crate) settings: GatewaySettings,
    pub(crate) dialect: Arc<dyn DialectScripts>,
    connector: Box<dyn Connector>,
    target: Option<ConnectionTarget>,
    connection: Option<Box<dyn Connection>>,
    in_transaction: bool,
    command_timeout: Duration,
}

impl Gateway {
    /// Binds the dialect registered for the engine.
    pub fn new(settings: GatewaySettings, registry: &DialectRegistry, connector: Box<dyn Connector>) -> Result<Self> {
        let engine = settings.engine;
        let dialect = registry.get(engine.dialect_name()).ok_or_else(|| {
            MigrationError::Configuration(format!("no dialect registered for {engine}"))
        })?;
        let command_timeout = settings.command_timeout;
        Ok(Gateway { settings, dialect, connector, target: None, connection: None, in_transaction: false, command_timeout })
    }

    pub fn engine(&self) -> Engine {
        self.settings.engine
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    pub fn dialect(&self) -> &dyn DialectScripts {
        self.dialect.as_ref()
    }

    pub fn splitter(&self) -> Splitter {
        self.dialect.splitter()
    }

    pub fn target(&self) -> Option<&ConnectionTarget> {
        self.target.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    /// Resolves server, database and connection string. Idempotent.
    pub fn initialize_connection(&mut self) -> Result<&ConnectionTarget> {
        if self.target.is_none() {
            let s = &self.settings;
            let target = resolve(
                s.engine,
                s.server_name.as_deref(),
                s.database_name.as_deref(),
                s.connection_string.as_deref(),
            )?;
            debug!(engine = %s.engine, target = %target.describe(), "connection target resolved");
            self.target = Some(target);
        }
        self.target.as_ref().ok_or_else(|| MigrationError::Configuration("connection target not resolved".into()))
    }

    pub fn open_connection(&mut self, with_transaction: bool) -> Result<()> {
        let target = self.initialize_connection()?.clone();
        if self.connection.is_none() {
            let mut conn = self
                .connector
                .connect(&target.connection_string)
                .map_err(|source| MigrationError::Connection { target: target.describe(), source })?;
            conn.set_command_timeout(self.command_timeout)
                .map_err(|source| MigrationError::Connection { target: target.describe(), source })?;
            self.connection = Some(conn);
            debug!(target = %target.describe(), "connection opened");
        }
        if with_transaction {
            self.begin_transaction()?;
        }
        Ok(())
    }

    /// Opens the connection and returns a guard that releases it on every
    /// exit path. Dropping the guard rolls back an open transaction;
    /// [`ConnectionScope::close`] commits it.
    pub fn scoped(&mut self, with_transaction: bool) -> Result<ConnectionScope<'_>> {
        self.open_connection(with_transaction)?;
        Ok(ConnectionScope { gateway: self, closed: false })
    }

    pub fn begin_transaction(&mut self) -> Result<()> {
        if self.in_transaction {
            return Ok(());
        }
        self.connection()
            .and_then(|c| c.begin())
            .map_err(|source| MigrationError::Database { context: "beginning a transaction".into(), source })?;
        self.in_transaction = true;
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        self.connection()
            .and_then(|c| c.commit())
            .map_err(|source| MigrationError::Database { context: "committing the transaction".into(), source })
    }

    /// Aborts the open transaction. Statements run afterwards autocommit.
    pub fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        warn!("rolling back the migration transaction");
        self.connection()
            .and_then(|c| c.rollback())
            .map_err(|source| MigrationError::Database { context: "rolling back the transaction".into(), source })
    }

    /// Commits any open transaction and releases the connection.
    pub fn close_connection(&mut self) -> Result<()> {
        let committed = self.commit();
        self.connection = None;
        committed
    }

    fn abandon(&mut self) {
        if let Err(e) = self.rollback() {
            warn!(error = %e, "rollback on release failed");
        }
        self.connection = None;
    }

    pub fn set_command_timeout(&mut self, timeout: Duration) -> std::result::Result<(), DbError> {
        if let Some(conn) = self.connection.as_deref_mut() {
            conn.set_command_timeout(timeout)?;
        }
        self.command_timeout = timeout;
        Ok(())
    }

    pub fn run_statement(&mut self, sql: &str, params: &[Parameter]) -> std::result::Result<u64, DbError> {
        debug!(sql = %summarize(sql), params = params.len(), "run statement");
        self.connection()?.execute(sql, params)
    }

    pub fn run_scalar(&mut self, sql: &str, params: &[Parameter]) -> std::result::Result<Value, DbError> {
        debug!(sql = %summarize(sql), params = params.len(), "run scalar");
        self.connection()?.scalar(sql, params)
    }

    pub fn run_query(&mut self, sql: &str, params: &[Parameter]) -> std::result::Result<Rows, DbError> {
        debug!(sql = %summarize(sql), params = params.len(), "run query");
        self.connection()?.query(sql, params)
    }

    fn connection(&mut self) -> std::result::Result<&mut dyn Connection, DbError> {
        match self.connection.as_deref_mut() {
            Some(conn) => Ok(conn),
            None => Err(DbError::new("connection is not open")),
        }
    }
}

/// Open connection owned by a scope. Derefs to the [`Gateway`].
pub struct ConnectionScope<'g> {
    gateway: &'g mut Gateway,
    closed: bool,
}

impl ConnectionScope<'_> {
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.gateway.close_connection()
    }
}

impl Deref for ConnectionScope<'_> {
    type Target = Gateway;

    fn deref(&self) -> &Gateway {
        self.gateway
    }
}

impl DerefMut for ConnectionScope<'_> {
    fn deref_mut(&mut self) -> &mut Gateway {
        self.gateway
    }
}

impl Drop for ConnectionScope<'_> {
    fn drop(&mut self) {
        if !self.closed {
            self.gateway.abandon();
        }
    }
}

/// First line of a statement, shortened for logs.
fn summarize(sql: &str) -> String {
    let line = sql.trim().lines().next().unwrap_or_default();
    if line.chars().count() > 80 {
        let cut: String = line.chars().take(80).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}
