//! Column type resolution.
//!
//! Result columns are typed from the declared schema of the tables a
//! statement touches. Columns without a usable declaration (expressions,
//! aggregates, untyped columns) are typed from the first non-null value in
//! the result, and default to [`ScalarType::Int32`] when every value is null.
//!
//! ```rust
//! use prax_sqlite::columns::{extract_tables, scalar_type_for};
//! use prax_driver::ScalarType;
//!
//! assert_eq!(scalar_type_for("varchar(255)"), Some(ScalarType::Text));
//! assert_eq!(scalar_type_for("DECIMAL(10, 2)"), Some(ScalarType::Numeric));
//!
//! let tables = extract_tables(r#"SELECT * FROM "main"."users" u JOIN [posts] p ON p.user_id = u.id"#);
//! assert_eq!(tables.len(), 2);
//! assert_eq!(tables[0].schema.as_deref(), Some("main"));
//! assert_eq!(tables[1].name, "posts");
//! ```

use std::sync::OnceLock;

use regex_lite::Regex;
use rusqlite::types::Value;
use tracing::trace;

use prax_driver::ScalarType;

const IDENT: &str = r#"(?:"[^"]+"|`[^`]+`|\[[^\]]+\]|[A-Za-z_][A-Za-z0-9_$]*)"#;
const ALIAS: &str = r"[A-Za-z_][A-Za-z0-9_]*";

/// A table referenced by a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Schema qualifier, if any.
    pub schema: Option<String>,
    /// Unquoted table name.
    pub name: String,
}

/// A column as declared in a table definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredColumn {
    /// Column name.
    pub name: String,
    /// Declared type, `None` for untyped columns.
    pub declared_type: Option<String>,
}

/// Normalize a declared type: uppercase, trimmed, without a length suffix.
pub fn normalize_declared_type(declared: &str) -> String {
    let base = match declared.find('(') {
        Some(open) => &declared[..open],
        None => declared,
    };
    base.trim().to_uppercase()
}

/// Map a declared type to its scalar type.
pub fn scalar_type_for(declared: &str) -> Option<ScalarType> {
    let scalar = match normalize_declared_type(declared).as_str() {
        "INT" | "INTEGER" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT2" | "SERIAL"
        | "UNSIGNED INT" | "UNSIGNED INTEGER" | "UNSIGNED TINYINT" | "UNSIGNED SMALLINT"
        | "UNSIGNED MEDIUMINT" => ScalarType::Int32,
        "BIGINT" | "UNSIGNED BIGINT" | "UNSIGNED BIG INT" | "INT8" => ScalarType::Int64,
        "FLOAT" | "DOUBLE" | "DOUBLE PRECISION" | "REAL" | "NUMERIC" => ScalarType::Double,
        "DECIMAL" => ScalarType::Numeric,
        "TEXT" | "CLOB" | "CHARACTER" | "VARCHAR" | "VARYING CHARACTER" | "NCHAR"
        | "NATIVE CHARACTER" | "NVARCHAR" | "CHAR" => ScalarType::Text,
        "BLOB" => ScalarType::Bytes,
        "BOOLEAN" => ScalarType::Boolean,
        "DATE" => ScalarType::Date,
        "TIME" => ScalarType::Time,
        "DATETIME" | "TIMESTAMP" => ScalarType::DateTime,
        "JSON" | "JSONB" => ScalarType::Json,
        _ => return None,
    };
    Some(scalar)
}

/// Infer a scalar type from a raw engine value.
pub fn infer_from_value(value: &Value, safe_integers: bool) -> Option<ScalarType> {
    match value {
        Value::Null => None,
        Value::Text(_) => Some(ScalarType::Text),
        Value::Integer(_) if safe_integers => Some(ScalarType::Int64),
        Value::Integer(_) | Value::Real(_) => Some(ScalarType::UnknownNumber),
        Value::Blob(_) => Some(ScalarType::Bytes),
    }
}

/// Resolve the type of every result column.
///
/// `declared` is aligned with the result columns; `rows` are only inspected
/// for columns whose declaration is missing or unrecognized.
pub fn resolve_column_types(
    declared: &[Option<String>],
    rows: &[Vec<Value>],
    safe_integers: bool,
) -> Vec<ScalarType> {
    declared
        .iter()
        .enumerate()
        .map(|(index, declared_type)| {
            declared_type
                .as_deref()
                .and_then(scalar_type_for)
                .or_else(|| {
                    rows.iter()
                        .filter_map(|row| row.get(index))
                        .find_map(|value| infer_from_value(value, safe_integers))
                })
                .unwrap_or(ScalarType::Int32)
        })
        .collect()
}

fn table_ref_regex() -> Option<&'static Regex> {
    static TABLE_REF: OnceLock<Option<Regex>> = OnceLock::new();
    TABLE_REF
        .get_or_init(|| {
            // A comma list of references, with an optional alias before each comma.
            let reference = format!(r"{ident}(?:\s*\.\s*{ident})?", ident = IDENT);
            let alias = format!(r"(?:\s+(?:AS\s+)?{})?", ALIAS);
            let pattern = format!(
                r"(?i)\b(?:FROM|JOIN|INTO|UPDATE)\s+({reference}(?:{alias}\s*,\s*{reference})*)"
            );
            Regex::new(&pattern).ok()
        })
        .as_ref()
}

fn list_item_regex() -> Option<&'static Regex> {
    static LIST_ITEM: OnceLock<Option<Regex>> = OnceLock::new();
    LIST_ITEM
        .get_or_init(|| {
            let pattern = format!(
                r"(?:^|,)\s*({ident})(?:\s*\.\s*({ident}))?",
                ident = IDENT
            );
            Regex::new(&pattern).ok()
        })
        .as_ref()
}

fn unquote(ident: &str) -> String {
    let quoted = [('"', '"'), ('`', '`'), ('[', ']')];
    for (open, close) in quoted {
        if let Some(inner) = ident.strip_prefix(open).and_then(|s| s.strip_suffix(close)) {
            return inner.to_string();
        }
    }
    ident.to_string()
}

/// Extract the tables a statement reads from or writes to, in order of
/// appearance and without duplicates.
pub fn extract_tables(sql: &str) -> Vec<TableRef> {
    let (Some(regex), Some(item)) = (table_ref_regex(), list_item_regex()) else {
        return Vec::new();
    };

    let mut tables: Vec<TableRef> = Vec::new();
    for list in regex.captures_iter(sql).filter_map(|captures| captures.get(1)) {
        for captures in item.captures_iter(list.as_str()) {
            let Some(first) = captures.get(1) else {
                continue;
            };
            let table = match captures.get(2) {
                Some(second) => TableRef {
                    schema: Some(unquote(first.as_str())),
                    name: unquote(second.as_str()),
                },
                None => TableRef {
                    schema: None,
                    name: unquote(first.as_str()),
                },
            };
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
    }
    tables
}

/// Read the declared columns of the given tables.
///
/// Tables that do not exist, or whose metadata cannot be read, contribute
/// nothing.
pub fn declared_columns(conn: &rusqlite::Connection, tables: &[TableRef]) -> Vec<DeclaredColumn> {
    let mut columns = Vec::new();
    for table in tables {
        match table_columns(conn, table) {
            Ok(found) => columns.extend(found),
            Err(e) => trace!(table = %table.name, error = %e, "Skipping table metadata"),
        }
    }
    columns
}

fn table_columns(
    conn: &rusqlite::Connection,
    table: &TableRef,
) -> rusqlite::Result<Vec<DeclaredColumn>> {
    match &table.schema {
        Some(schema) => {
            let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1, ?2)")?;
            let rows = stmt.query_map([table.name.as_str(), schema.as_str()], declared_column)?;
            rows.collect()
        }
        None => {
            let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1)")?;
            let rows = stmt.query_map([table.name.as_str()], declared_column)?;
            rows.collect()
        }
    }
}

fn declared_column(row: &rusqlite::Row<'_>) -> rusqlite::Result<DeclaredColumn> {
    let declared_type: Option<String> = row.get(1)?;
    Ok(DeclaredColumn {
        name: row.get(0)?,
        declared_type: declared_type.filter(|t| !t.trim().is_empty()),
    })
}

/// Fill the gaps in positional declared types from table metadata.
///
/// Positions that already carry a declaration keep it. The rest take the
/// first declared column with the same name (case-insensitive).
pub fn fill_declared_types(
    positional: Vec<Option<String>>,
    column_names: &[String],
    declared: &[DeclaredColumn],
) -> Vec<Option<String>> {
    positional
        .into_iter()
        .zip(column_names)
        .map(|(declared_type, name)| {
            declared_type.or_else(|| {
                declared
                    .iter()
                    .find(|column| column.name.eq_ignore_ascii_case(name))
                    .and_then(|column| column.declared_type.clone())
            })
        })
        .collect()
}
