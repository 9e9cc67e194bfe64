//! Driver contract. Each engine family plugs a concrete driver in behind
//! these traits; the gateway never sees the wire protocol.

use std::time::Duration;

use crate::params::{Parameter, Rows, Value};

/// Failure reported by the engine or driver, carrying its message verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DbError {
    pub message: String,
}

impl DbError {
    pub fn new(message: impl Into<String>) -> Self {
        DbError { message: message.into() }
    }
}

/// A live connection. Statements run inside the open transaction, if any.
pub trait Connection {
    /// Runs one batch. Without parameters the batch may hold several
    /// statements when the engine accepts that.
    fn execute(&mut self, sql: &str, params: &[Parameter]) -> Result<u64, DbError>;

    /// First column of the first row, or `Value::Null` when there is no row.
    fn scalar(&mut self, sql: &str, params: &[Parameter]) -> Result<Value, DbError>;

    fn query(&mut self, sql: &str, params: &[Parameter]) -> Result<Rows, DbError>;

    fn begin(&mut self) -> Result<(), DbError>;
    fn commit(&mut self) -> Result<(), DbError>;
    fn rollback(&mut self) -> Result<(), DbError>;

    fn set_command_timeout(&mut self, timeout: Duration) -> Result<(), DbError>;
}

/// Opens connections from a resolved connection string.
pub trait Connector {
    fn connect(&self, connection_string: &str) -> Result<Box<dyn Connection>, DbError>;
}
