use rusqlite::types::Value as SqlValue;
use sqlmill_core::{DbError, Parameter, Value};

pub(crate) fn db_error(e: rusqlite::Error) -> DbError {
    DbError::new(e.to_string())
}

pub(crate) fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Text(s) => SqlValue::Text(s.clone()),
    }
}

pub(crate) fn from_sql(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::Int(i),
        SqlValue::Real(f) => Value::Text(f.to_string()),
        SqlValue::Text(s) => Value::Text(s),
        SqlValue::Blob(b) => Value::Text(String::from_utf8_lossy(&b).into_owned()),
    }
}

/// `:name` bindings for a prepared statement.
pub(crate) fn named(params: &[Parameter]) -> Vec<(String, SqlValue)> {
    params.iter().map(|p| (format!(":{}", p.name), to_sql(&p.value))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_bind_as_integers() {
        assert_eq!(to_sql(&Value::Bool(true)), SqlValue::Integer(1));
        assert_eq!(from_sql(SqlValue::Integer(0)).as_bool(), Some(false));
    }

    #[test]
    fn names_get_a_colon_prefix() {
        let bound = named(&[Parameter::int64("version_id", 3)]);
        assert_eq!(bound[0].0, ":version_id");
    }
}
