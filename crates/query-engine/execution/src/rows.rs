//! Results of a query, and decoding SQLite rows into them.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row as _, TypeInfo, ValueRef};

use query_engine_sql::sql::execution_plan::{OutputColumn, OutputType};

/// A row keyed by column name, in the order the columns were selected.
pub type Row = IndexMap<String, Value>;

/// The result of executing a query. Its shape depends on the terminal
/// operators of the expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    /// A single aggregate value.
    Scalar(Value),
    /// One value per row, from `values()`.
    Values(Vec<Value>),
    /// The columns chosen by `select()` or `aggregate()`.
    Rows(Vec<Row>),
    /// Every column of the collection. `one()` gives exactly one.
    Entities(Vec<Row>),
}

impl QueryResult {
    /// The number of rows behind the result.
    pub fn row_count(&self) -> usize {
        match self {
            QueryResult::Scalar(_) => 1,
            QueryResult::Values(values) => values.len(),
            QueryResult::Rows(rows) | QueryResult::Entities(rows) => rows.len(),
        }
    }
}

/// A page of results with links to its neighbours.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginationResult {
    pub page: QueryResult,
    pub total: i64,
    pub previous_page: Option<String>,
    pub next_page: Option<String>,
}

/// Decode a row into a mapping from column alias to value.
pub fn decode_row(row: &SqliteRow, columns: &[OutputColumn]) -> Result<Row, sqlx::Error> {
    columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            Ok((
                column.alias.name.clone(),
                decode_value(row, index, column.output_type)?,
            ))
        })
        .collect()
}

/// Decode one column of a row by the type of the value SQLite holds.
///
/// Booleans are stored as integers and JSON documents as text, so the
/// column's output type decides how those are read back.
pub fn decode_value(
    row: &SqliteRow,
    index: usize,
    output_type: OutputType,
) -> Result<Value, sqlx::Error> {
    let storage_class = {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        raw.type_info().name().to_string()
    };

    let value = match storage_class.as_str() {
        "INTEGER" => {
            let integer: i64 = row.try_get(index)?;
            match output_type {
                OutputType::Boolean => Value::Bool(integer != 0),
                OutputType::Default | OutputType::Json => Value::from(integer),
            }
        }
        "REAL" => {
            let float: f64 = row.try_get(index)?;
            serde_json::Number::from_f64(float).map_or(Value::Null, Value::Number)
        }
        "BLOB" => {
            let bytes: Vec<u8> = row.try_get(index)?;
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => {
            let text: String = row.try_get(index)?;
            match output_type {
                OutputType::Json => {
                    serde_json::from_str(&text).unwrap_or(Value::String(text))
                }
                OutputType::Boolean => match text.as_str() {
                    "true" | "1" => Value::Bool(true),
                    "false" | "0" => Value::Bool(false),
                    _ => Value::String(text),
                },
                OutputType::Default => Value::String(text),
            }
        }
    };
    Ok(value)
}
