//! Wire-level types exchanged between the query engine and a driver adapter.
//!
//! The query engine never sees engine-native values. Arguments arrive as
//! [`ArgValue`] tagged with a declared [`ScalarType`], and result rows leave
//! as positional sequences of [`ResultValue`] alongside one resolved
//! [`ScalarType`] per column.
//!
//! ```rust
//! use prax_driver::{ArgValue, ScalarType, SqlQuery};
//!
//! let query = SqlQuery::new("SELECT * FROM users WHERE id = ?")
//!     .bind("9007199254740993", ScalarType::Int64);
//!
//! assert_eq!(query.args.len(), 1);
//! assert_eq!(query.arg_type(0), Some(ScalarType::Int64));
//! assert!(matches!(query.args[0], ArgValue::Text(_)));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed wire-level scalar type taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    /// 32-bit integer.
    Int32,
    /// 64-bit integer.
    Int64,
    /// Single precision float.
    Float,
    /// Double precision float.
    Double,
    /// Arbitrary precision decimal.
    Numeric,
    /// Text.
    Text,
    /// Raw bytes.
    Bytes,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time.
    DateTime,
    /// JSON document.
    Json,
    /// A number whose width could not be determined.
    UnknownNumber,
}

impl ScalarType {
    /// Whether this is one of the integer types.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Int32 | Self::Int64)
    }

    /// Get the name of this type as exposed on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::Numeric => "Numeric",
            Self::Text => "Text",
            Self::Bytes => "Bytes",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::DateTime => "DateTime",
            Self::Json => "Json",
            Self::UnknownNumber => "UnknownNumber",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw argument value as supplied by the query engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value. Large integers and base64 bytes travel as text.
    Text(String),
    /// Binary value.
    Bytes(Vec<u8>),
    /// Timestamp value.
    DateTime(DateTime<Utc>),
    /// JSON value.
    Json(serde_json::Value),
    /// List of values (byte arrays arrive as lists of integers).
    List(Vec<ArgValue>),
}

impl ArgValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<Vec<u8>> for ArgValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<DateTime<Utc>> for ArgValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl From<serde_json::Value> for ArgValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A statement issued by the query engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlQuery {
    /// SQL text with positional `?` placeholders.
    pub sql: String,
    /// Positional arguments.
    pub args: Vec<ArgValue>,
    /// Declared scalar type of each argument, aligned with `args`.
    pub arg_types: Vec<ScalarType>,
}

impl SqlQuery {
    /// Create a statement without arguments.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
            arg_types: Vec::new(),
        }
    }

    /// Append an argument with its declared type.
    pub fn bind(mut self, value: impl Into<ArgValue>, scalar_type: ScalarType) -> Self {
        self.args.push(value.into());
        self.arg_types.push(scalar_type);
        self
    }

    /// Declared type of the argument at `index`, if one was given.
    pub fn arg_type(&self, index: usize) -> Option<ScalarType> {
        self.arg_types.get(index).copied()
    }
}

/// A decoded result value.
///
/// Integers that may exceed the host's safe range are never exposed as
/// numbers; they arrive as [`ResultValue::Text`] holding the decimal digits.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultValue {
    /// Null value.
    Null,
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Bytes, serialized as a sequence of byte values.
    Bytes(Vec<u8>),
}

impl ResultValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer content, parsing decimal strings.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Reinterpret an engine boolean (`1` / `0`, native or as decimal text).
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_i64()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }
}

/// The result of `query_raw`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    /// Column names, in result order. Names may repeat.
    pub column_names: Vec<String>,
    /// Resolved type of each column.
    pub column_types: Vec<ScalarType>,
    /// Rows as positional sequences aligned with the columns.
    pub rows: Vec<Vec<ResultValue>>,
    /// Row id of the last insert, as a decimal string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_insert_id: Option<String>,
}

impl ResultSet {
    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    /// Check whether the result holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Static information about the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    /// Maximum number of bind values per statement.
    pub max_bind_values: Option<usize>,
    /// Whether the engine can resolve relations with joins.
    pub supports_relation_joins: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_value_from() {
        assert_eq!(ArgValue::from(42), ArgValue::Int(42));
        assert_eq!(ArgValue::from("x"), ArgValue::Text("x".to_string()));
        assert_eq!(ArgValue::from(None::<i64>), ArgValue::Null);
        assert!(ArgValue::from(None::<bool>).is_null());
    }

    #[test]
    fn test_sql_query_bind() {
        let query = SqlQuery::new("INSERT INTO t VALUES (?, ?)")
            .bind(1, ScalarType::Int32)
            .bind(true, ScalarType::Boolean);

        assert_eq!(query.args, vec![ArgValue::Int(1), ArgValue::Bool(true)]);
        assert_eq!(query.arg_type(1), Some(ScalarType::Boolean));
        assert_eq!(query.arg_type(2), None);
    }

    #[test]
    fn test_result_value_as_bool() {
        assert_eq!(ResultValue::Int(1).as_bool(), Some(true));
        assert_eq!(ResultValue::Text("0".into()).as_bool(), Some(false));
        assert_eq!(ResultValue::Int(2).as_bool(), None);
        assert_eq!(ResultValue::Null.as_bool(), None);
    }

    #[test]
    fn test_result_value_serialize() {
        let row = vec![
            ResultValue::Null,
            ResultValue::Int(7),
            ResultValue::Text("9007199254740993".into()),
            ResultValue::Bytes(vec![1, 2]),
        ];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"[null,7,"9007199254740993",[1,2]]"#);
    }

    #[test]
    fn test_scalar_type_display() {
        assert_eq!(ScalarType::UnknownNumber.to_string(), "UnknownNumber");
        assert!(ScalarType::Int64.is_integer());
        assert!(!ScalarType::Double.is_integer());
    }
}
