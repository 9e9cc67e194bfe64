//! Recording connection used by the unit tests.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use sqlmill_core::{Connection, Connector, DbError, Parameter, Rows, Value};

#[derive(Default)]
struct State {
    statements: Vec<String>,
    params: Vec<Vec<Parameter>>,
    timeouts: Vec<Duration>,
    connection_strings: Vec<String>,
    refuse: bool,
    scalars: Vec<(String, Value)>,
    queries: Vec<(String, Rows)>,
    failures: Vec<(String, String)>,
}

#[derive(Clone, Default)]
pub(crate) struct Recorder(Arc<Mutex<State>>);

impl Recorder {
    fn state(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap()
    }

    pub fn refuse_connections(&self) {
        self.state().refuse = true;
    }

    /// Scalar answer for statements containing `pattern`.
    pub fn answer(&self, pattern: &str, value: Value) {
        self.state().scalars.push((pattern.to_string(), value));
    }

    pub fn answer_rows(&self, pattern: &str, rows: Rows) {
        self.state().queries.push((pattern.to_string(), rows));
    }

    pub fn fail_on(&self, pattern: &str, message: &str) {
        self.state().failures.push((pattern.to_string(), message.to_string()));
    }

    pub fn statements(&self) -> Vec<String> {
        self.state().statements.clone()
    }

    pub fn params(&self) -> Vec<Vec<Parameter>> {
        self.state().params.clone()
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.state().timeouts.clone()
    }

    pub fn connection_strings(&self) -> Vec<String> {
        self.state().connection_strings.clone()
    }

    fn record(&self, sql: &str, params: &[Parameter]) -> Result<(), DbError> {
        let mut state = self.state();
        state.statements.push(sql.to_string());
        state.params.push(params.to_vec());
        match state.failures.iter().find(|(p, _)| sql.contains(p.as_str())) {
            Some((_, message)) => Err(DbError::new(message.clone())),
            None => Ok(()),
        }
    }
}

pub(crate) struct RecordingConnector(Recorder);

impl RecordingConnector {
    pub fn new(recorder: Recorder) -> Self {
        RecordingConnector(recorder)
    }
}

impl Connector for RecordingConnector {
    fn connect(&self, connection_string: &str) -> Result<Box<dyn Connection>, DbError> {
        let mut state = self.0.state();
        state.connection_strings.push(connection_string.to_string());
        if state.refuse {
            return Err(DbError::new("login failed"));
        }
        Ok(Box::new(RecordingConnection(self.0.clone())))
    }
}

struct RecordingConnection(Recorder);

impl Connection for RecordingConnection {
    fn execute(&mut self, sql: &str, params: &[Parameter]) -> Result<u64, DbError> {
        self.0.record(sql, params)?;
        Ok(1)
    }

    fn scalar(&mut self, sql: &str, params: &[Parameter]) -> Result<Value, DbError> {
        self.0.record(sql, params)?;
        let state = self.0.state();
        Ok(state
            .scalars
            .iter()
            .find(|(p, _)| sql.contains(p.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Null))
    }

    fn query(&mut self, sql: &str, params: &[Parameter]) -> Result<Rows, DbError> {
        self.0.record(sql, params)?;
        let state = self.0.state();
        Ok(state
            .queries
            .iter()
            .find(|(p, _)| sql.contains(p.as_str()))
            .map(|(_, r)| r.clone())
            .unwrap_or_default())
    }

    fn begin(&mut self) -> Result<(), DbError> {
        self.0.record("BEGIN", &[])
    }

    fn commit(&mut self) -> Result<(), DbError> {
        self.0.record("COMMIT", &[])
    }

    fn rollback(&mut self) -> Result<(), DbError> {
        self.0.record("ROLLBACK", &[])
    }

    fn set_command_timeout(&mut self, timeout: Duration) -> Result<(), DbError> {
        self.0.state().timeouts.push(timeout);
        Ok(())
    }
}
