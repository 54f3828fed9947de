//! Type conversion between wire values and SQLite values.
//!
//! Arguments are coerced according to their declared [`ScalarType`] before
//! binding, and result values are normalized according to the resolved type
//! of their column. Integers never leave as plain numbers while safe-integer
//! mode is on: they are rendered as decimal text so no precision is lost.

use base64::prelude::*;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use serde_json::Value as JsonValue;

use prax_driver::{ArgValue, DriverError, ResultValue, ScalarType, SqlQuery};

use crate::config::TimestampFormat;

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Coerce every argument of a statement.
pub fn encode_arguments(
    query: &SqlQuery,
    format: TimestampFormat,
) -> Result<Vec<Value>, DriverError> {
    query
        .args
        .iter()
        .enumerate()
        .map(|(index, arg)| encode_argument(arg, query.arg_type(index), format))
        .collect()
}

/// Coerce one argument to the value that gets bound.
pub fn encode_argument(
    arg: &ArgValue,
    scalar_type: Option<ScalarType>,
    format: TimestampFormat,
) -> Result<Value, DriverError> {
    match (arg, scalar_type) {
        (ArgValue::Null, _) => Ok(Value::Null),
        (ArgValue::Bool(b), _) => Ok(Value::Integer(i64::from(*b))),

        (ArgValue::Text(s), Some(ScalarType::Int32 | ScalarType::Int64)) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| DriverError::invalid_input(format!("'{}' is not a valid integer", s))),
        (ArgValue::Text(s), Some(ScalarType::Float | ScalarType::Double | ScalarType::Numeric)) => s
            .trim()
            .parse::<f64>()
            .map(Value::Real)
            .map_err(|_| DriverError::invalid_input(format!("'{}' is not a valid number", s))),

        (ArgValue::DateTime(dt), _) => Ok(encode_timestamp(dt, format)),
        (ArgValue::Text(s), Some(ScalarType::DateTime)) => {
            parse_timestamp(s).map(|dt| encode_timestamp(&dt, format))
        }

        (ArgValue::Text(s), Some(ScalarType::Bytes)) => BASE64_STANDARD
            .decode(s)
            .map(Value::Blob)
            .map_err(|e| DriverError::invalid_input(format!("invalid base64 bytes: {}", e))),
        (ArgValue::List(items), Some(ScalarType::Bytes)) => byte_list(items).map(Value::Blob),
        (ArgValue::Bytes(bytes), _) => Ok(Value::Blob(bytes.clone())),

        (ArgValue::Json(json), _) => Ok(Value::Text(json.to_string())),
        (ArgValue::List(items), _) => Ok(Value::Text(list_to_json(items).to_string())),

        (ArgValue::Int(i), _) => Ok(Value::Integer(*i)),
        (ArgValue::Float(f), _) => Ok(Value::Real(*f)),
        (ArgValue::Text(s), _) => Ok(Value::Text(s.clone())),
    }
}

fn encode_timestamp(dt: &DateTime<Utc>, format: TimestampFormat) -> Value {
    match format {
        TimestampFormat::Iso8601 => {
            Value::Text(dt.format("%Y-%m-%dT%H:%M:%S%.3f+00:00").to_string())
        }
        TimestampFormat::UnixEpochMs => Value::Integer(dt.timestamp_millis()),
    }
}

/// Parse a timestamp supplied as text.
///
/// Accepts RFC 3339, naive date-times (taken as UTC) and bare dates.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DriverError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| DriverError::invalid_input(format!("'{}' is not a valid timestamp", s)))
}

fn byte_list(items: &[ArgValue]) -> Result<Vec<u8>, DriverError> {
    items
        .iter()
        .map(|item| match item {
            ArgValue::Int(i) => u8::try_from(*i)
                .map_err(|_| DriverError::invalid_input(format!("byte value {} out of range", i))),
            other => Err(DriverError::invalid_input(format!(
                "expected a byte value, got {:?}",
                other
            ))),
        })
        .collect()
}

fn list_to_json(items: &[ArgValue]) -> JsonValue {
    JsonValue::Array(items.iter().map(to_json).collect())
}

fn to_json(value: &ArgValue) -> JsonValue {
    match value {
        ArgValue::Null => JsonValue::Null,
        ArgValue::Bool(b) => JsonValue::Bool(*b),
        ArgValue::Int(i) => JsonValue::Number((*i).into()),
        ArgValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        ArgValue::Text(s) => JsonValue::String(s.clone()),
        ArgValue::Bytes(bytes) => {
            JsonValue::Array(bytes.iter().map(|b| JsonValue::from(*b)).collect())
        }
        ArgValue::DateTime(dt) => {
            JsonValue::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        ArgValue::Json(json) => json.clone(),
        ArgValue::List(items) => list_to_json(items),
    }
}

/// Normalize a raw row against the resolved column types.
pub fn decode_row(
    values: Vec<Value>,
    column_types: &[ScalarType],
    safe_integers: bool,
) -> Vec<ResultValue> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let column_type = column_types.get(index).copied().unwrap_or(ScalarType::Int32);
            decode_value(value, column_type, safe_integers)
        })
        .collect()
}

/// Normalize one raw value.
pub fn decode_value(value: Value, column_type: ScalarType, safe_integers: bool) -> ResultValue {
    match (value, column_type) {
        (Value::Null, _) => ResultValue::Null,
        (Value::Blob(bytes), _) => ResultValue::Bytes(bytes),
        (Value::Text(s), ScalarType::Bytes) => match BASE64_STANDARD.decode(&s) {
            Ok(bytes) => ResultValue::Bytes(bytes),
            Err(_) => ResultValue::Text(s),
        },
        (Value::Text(s), _) => ResultValue::Text(s),

        (Value::Integer(i), ScalarType::DateTime) => {
            millis_to_iso(i).unwrap_or_else(|| decode_integer(i, safe_integers))
        }
        (Value::Real(f), ScalarType::DateTime) => {
            millis_to_iso(f as i64).unwrap_or(ResultValue::Float(f))
        }

        (Value::Real(f), ScalarType::Int32 | ScalarType::Int64) if f.fract() != 0.0 => {
            decode_integer(f.trunc() as i64, safe_integers)
        }
        (Value::Real(f), _) => ResultValue::Float(f),
        (Value::Integer(i), _) => decode_integer(i, safe_integers),
    }
}

fn decode_integer(i: i64, safe_integers: bool) -> ResultValue {
    if safe_integers {
        ResultValue::Text(i.to_string())
    } else {
        ResultValue::Int(i)
    }
}

fn millis_to_iso(ms: i64) -> Option<ResultValue> {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| ResultValue::Text(dt.to_rfc3339_opts(SecondsFormat::Millis, true)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn encode(arg: impl Into<ArgValue>, scalar_type: ScalarType) -> Value {
        encode_argument(&arg.into(), Some(scalar_type), TimestampFormat::Iso8601).unwrap()
    }

    #[test]
    fn test_encode_null_and_bool() {
        assert_eq!(encode(ArgValue::Null, ScalarType::Int32), Value::Null);
        assert_eq!(encode(true, ScalarType::Boolean), Value::Integer(1));
        assert_eq!(encode(false, ScalarType::Boolean), Value::Integer(0));
    }

    #[test]
    fn test_encode_big_integer_text() {
        assert_eq!(
            encode("9007199254740993", ScalarType::Int64),
            Value::Integer(9_007_199_254_740_993)
        );
    }

    #[test]
    fn test_encode_invalid_integer_text() {
        let err = encode_argument(&"abc".into(), Some(ScalarType::Int32), TimestampFormat::Iso8601)
            .unwrap_err();
        assert!(matches!(err.kind, prax_driver::DriverErrorKind::InvalidInputValue { .. }));
    }

    #[test]
    fn test_encode_numeric_text() {
        assert_eq!(encode("1.25", ScalarType::Double), Value::Real(1.25));
    }

    #[test]
    fn test_encode_timestamp_formats() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            encode_argument(&dt.into(), None, TimestampFormat::Iso8601).unwrap(),
            Value::Text("2024-01-02T03:04:05.000+00:00".into())
        );
        assert_eq!(
            encode_argument(&dt.into(), None, TimestampFormat::UnixEpochMs).unwrap(),
            Value::Integer(dt.timestamp_millis())
        );
    }

    #[test]
    fn test_encode_timestamp_text() {
        assert_eq!(
            encode("2024-01-02T03:04:05Z", ScalarType::DateTime),
            Value::Text("2024-01-02T03:04:05.000+00:00".into())
        );
        assert_eq!(
            encode("2024-01-02", ScalarType::DateTime),
            Value::Text("2024-01-02T00:00:00.000+00:00".into())
        );
    }

    #[test]
    fn test_encode_bytes() {
        assert_eq!(encode("AQID", ScalarType::Bytes), Value::Blob(vec![1, 2, 3]));
        let list = ArgValue::List(vec![ArgValue::Int(0), ArgValue::Int(255)]);
        assert_eq!(encode(list, ScalarType::Bytes), Value::Blob(vec![0, 255]));

        let out_of_range = ArgValue::List(vec![ArgValue::Int(256)]);
        assert!(
            encode_argument(&out_of_range, Some(ScalarType::Bytes), TimestampFormat::Iso8601)
                .is_err()
        );
    }

    #[test]
    fn test_encode_json() {
        let json = serde_json::json!({"a": 1});
        assert_eq!(encode(json, ScalarType::Json), Value::Text(r#"{"a":1}"#.into()));

        let list = ArgValue::List(vec![ArgValue::Int(1), ArgValue::Text("x".into())]);
        assert_eq!(encode(list, ScalarType::Json), Value::Text(r#"[1,"x"]"#.into()));
    }

    #[test]
    fn test_encode_passthrough() {
        assert_eq!(encode("hello", ScalarType::Text), Value::Text("hello".into()));
        assert_eq!(encode(1.5, ScalarType::Double), Value::Real(1.5));
        assert_eq!(encode(7, ScalarType::Int32), Value::Integer(7));
    }

    #[test]
    fn test_decode_safe_integers() {
        assert_eq!(
            decode_value(Value::Integer(9_007_199_254_740_993), ScalarType::Int64, true),
            ResultValue::Text("9007199254740993".into())
        );
        assert_eq!(decode_value(Value::Integer(5), ScalarType::Int64, false), ResultValue::Int(5));
    }

    #[test]
    fn test_decode_truncates_fractional_integers() {
        assert_eq!(decode_value(Value::Real(2.7), ScalarType::Int32, false), ResultValue::Int(2));
        assert_eq!(
            decode_value(Value::Real(-2.7), ScalarType::Int32, true),
            ResultValue::Text("-2".into())
        );
        assert_eq!(
            decode_value(Value::Real(2.7), ScalarType::Double, true),
            ResultValue::Float(2.7)
        );
    }

    #[test]
    fn test_decode_datetime_from_millis() {
        assert_eq!(
            decode_value(Value::Integer(0), ScalarType::DateTime, true),
            ResultValue::Text("1970-01-01T00:00:00.000Z".into())
        );
    }

    #[test]
    fn test_decode_bytes() {
        assert_eq!(
            decode_value(Value::Blob(vec![1, 2]), ScalarType::Bytes, true),
            ResultValue::Bytes(vec![1, 2])
        );
        assert_eq!(
            decode_value(Value::Text("AQID".into()), ScalarType::Bytes, true),
            ResultValue::Bytes(vec![1, 2, 3])
        );
        assert_eq!(
            decode_value(Value::Text("not base64!".into()), ScalarType::Bytes, true),
            ResultValue::Text("not base64!".into())
        );
    }

    #[test]
    fn test_decode_row() {
        let row = decode_row(
            vec![Value::Null, Value::Text("a".into()), Value::Integer(1)],
            &[ScalarType::Int32, ScalarType::Text, ScalarType::Int32],
            false,
        );
        assert_eq!(
            row,
            vec![ResultValue::Null, ResultValue::Text("a".into()), ResultValue::Int(1)]
        );
    }
}
