use std::time::Duration;

use rusqlite::types::Value as SqlValue;
use rusqlite::{Batch, Connection as RawConnection, ToSql};
use sqlmill_core::{Connection, DbError, Parameter, Rows, Value};

use crate::bind::{db_error, from_sql, named};

pub struct SqliteConnection {
    conn: RawConnection,
}

impl SqliteConnection {
    pub(crate) fn new(conn: RawConnection) -> Self {
        SqliteConnection { conn }
    }

    /// Runs `visit` over every row of a single parameterized statement.
    fn each_row(
        &self,
        sql: &str,
        params: &[Parameter],
        mut visit: impl FnMut(&rusqlite::Row<'_>, usize) -> rusqlite::Result<bool>,
    ) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare(sql).map_err(db_error)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let bound = named(params);
        let refs: Vec<(&str, &dyn ToSql)> = bound.iter().map(|(n, v)| (n.as_str(), v as &dyn ToSql)).collect();
        let mut rows = stmt.query(refs.as_slice()).map_err(db_error)?;
        while let Some(row) = rows.next().map_err(db_error)? {
            if !visit(row, width).map_err(db_error)? {
                break;
            }
        }
        Ok(columns)
    }
}

fn read_row(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<Vec<Value>> {
    (0..width).map(|i| row.get::<_, SqlValue>(i).map(from_sql)).collect()
}

impl Connection for SqliteConnection {
    fn execute(&mut self, sql: &str, params: &[Parameter]) -> Result<u64, DbError> {
        if !params.is_empty() {
            self.each_row(sql, params, |_, _| Ok(true))?;
            return Ok(self.conn.changes() as u64);
        }
        let mut changed = 0u64;
        let mut batch = Batch::new(&self.conn, sql);
        while let Some(mut stmt) = batch.next().map_err(db_error)? {
            let mut rows = stmt.query([]).map_err(db_error)?;
            while rows.next().map_err(db_error)?.is_some() {}
            changed += self.conn.changes() as u64;
        }
        Ok(changed)
    }

    fn scalar(&mut self, sql: &str, params: &[Parameter]) -> Result<Value, DbError> {
        let mut first = Value::Null;
        self.each_row(sql, params, |row, _| {
            first = from_sql(row.get::<_, SqlValue>(0)?);
            Ok(false)
        })?;
        Ok(first)
    }

    fn query(&mut self, sql: &str, params: &[Parameter]) -> Result<Rows, DbError> {
        let mut rows = Vec::new();
        let columns = self.each_row(sql, params, |row, width| {
            rows.push(read_row(row, width)?);
            Ok(true)
        })?;
        Ok(Rows { columns, rows })
    }

    fn begin(&mut self) -> Result<(), DbError> {
        self.conn.execute_batch("BEGIN").map_err(db_error)
    }

    fn commit(&mut self) -> Result<(), DbError> {
        self.conn.execute_batch("COMMIT").map_err(db_error)
    }

    fn rollback(&mut self) -> Result<(), DbError> {
        self.conn.execute_batch("ROLLBACK").map_err(db_error)
    }

    fn set_command_timeout(&mut self, timeout: Duration) -> Result<(), DbError> {
        self.conn.busy_timeout(timeout).map_err(db_error)
    }
}
