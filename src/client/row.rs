use std::collections::HashMap;

/// A single column value as returned by a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Decimal(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Int(v as i64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

/// Column name to value. Lookups are by exact column name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: HashMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        column: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    pub fn get(
        &self,
        column: &str,
    ) -> Option<&Value> {
        self.columns.get(column)
    }

    pub fn get_text(
        &self,
        column: &str,
    ) -> Option<&str> {
        match self.get(column)? {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Accepts integer columns and numeric text (drivers differ on COUNT(*)).
    pub fn get_u64(
        &self,
        column: &str,
    ) -> Option<u64> {
        match self.get(column)? {
            Value::Int(i) => u64::try_from(*i).ok(),
            Value::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Binary and text columns both yield their raw bytes.
    pub fn get_bytes(
        &self,
        column: &str,
    ) -> Option<&[u8]> {
        match self.get(column)? {
            Value::Bytes(b) => Some(b.as_slice()),
            Value::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }
}
