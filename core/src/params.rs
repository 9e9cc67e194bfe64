use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    AnsiString,
    Int64,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(v) => Some(*v != 0),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => Some(true),
                "0" | "false" => Some(false),
                _ => None,
            },
            Value::Null => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(s),
            Value::Int(v) => Some(v.to_string()),
            Value::Bool(b) => Some(b.to_string()),
        }
    }
}

/// A named, typed bind value. `size` is the declared maximum length for
/// string parameters, passed through to drivers that honor it.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub db_type: DbType,
    pub value: Value,
    pub size: Option<usize>,
}

impl Parameter {
    pub fn text(name: &str, value: impl Into<String>, size: Option<usize>) -> Self {
        Parameter { name: name.to_string(), db_type: DbType::AnsiString, value: Value::Text(value.into()), size }
    }

    pub fn int64(name: &str, value: i64) -> Self {
        Parameter { name: name.to_string(), db_type: DbType::Int64, value: Value::Int(value), size: None }
    }

    pub fn boolean(name: &str, value: bool) -> Self {
        Parameter { name: name.to_string(), db_type: DbType::Boolean, value: Value::Bool(value), size: None }
    }
}

/// Tabular result of a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Rows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column lookup is case-insensitive; engines disagree on identifier case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_conversions() {
        assert_eq!(Value::Text(" 42".into()).as_i64(), Some(42));
        assert_eq!(Value::Int(0).as_bool(), Some(false));
        assert_eq!(Value::Text("TRUE".into()).as_bool(), Some(true));
        assert_eq!(Value::Null.into_text(), None);
    }

    #[test]
    fn rows_lookup_ignores_column_case() {
        let rows = Rows {
            columns: vec!["SCRIPT_NAME".into(), "text_hash".into()],
            rows: vec![vec![Value::Text("a.sql".into()), Value::Text("h".into())]],
        };
        assert_eq!(rows.get(0, "script_name"), Some(&Value::Text("a.sql".into())));
        assert_eq!(rows.get(1, "script_name"), None);
        assert_eq!(rows.get(0, "missing"), None);
    }
}
