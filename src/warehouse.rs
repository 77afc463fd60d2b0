//! Query execution adapter.
//!
//! The [`Warehouse`] trait is the single seam between this crate and the
//! external data warehouse. Every value that reaches a statement goes
//! through a bound [`SqlParam`]; statement text is never assembled from
//! user input.
//!
//! ```rust
//! use warehouse_docs::warehouse::{SqlParam, Table};
//! use serde_json::json;
//!
//! let table = Table::new(vec!["URL".into()], vec![vec![json!("https://x")]]);
//! assert_eq!(table.into_first_value(), Some(json!("https://x")));
//!
//! let p: SqlParam = 3600_i64.into();
//! assert_eq!(p.type_name(), "FIXED");
//! ```

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::QueryError;

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
}

impl SqlParam {
    /// Binding type name understood by the statements API.
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlParam::Text(_) => "TEXT",
            SqlParam::Integer(_) => "FIXED",
            SqlParam::Real(_) => "REAL",
            SqlParam::Boolean(_) => "BOOLEAN",
        }
    }

    /// Binding value; the statements API takes every value as a string.
    pub fn wire_value(&self) -> String {
        match self {
            SqlParam::Text(s) => s.clone(),
            SqlParam::Integer(i) => i.to_string(),
            SqlParam::Real(f) => f.to_string(),
            SqlParam::Boolean(b) => b.to_string(),
        }
    }
}

impl From<&str> for SqlParam {
    fn from(s: &str) -> Self {
        SqlParam::Text(s.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(s: String) -> Self {
        SqlParam::Text(s)
    }
}

impl From<i64> for SqlParam {
    fn from(i: i64) -> Self {
        SqlParam::Integer(i)
    }
}

impl From<u32> for SqlParam {
    fn from(i: u32) -> Self {
        SqlParam::Integer(i64::from(i))
    }
}

impl From<f64> for SqlParam {
    fn from(f: f64) -> Self {
        SqlParam::Real(f)
    }
}

impl From<bool> for SqlParam {
    fn from(b: bool) -> Self {
        SqlParam::Boolean(b)
    }
}

/// Tabular statement result: ordered columns, ordered rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Builds a table. Short rows are padded with nulls, long rows truncated,
    /// so every row lines up with `columns`.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// Values of one column, in row order. Empty if the column is unknown.
    pub fn column(&self, name: &str) -> Vec<&Value> {
        match self.column_index(name) {
            Some(idx) => self.rows.iter().map(|r| &r[idx]).collect(),
            None => Vec::new(),
        }
    }

    /// First column of the first row; `None` when there are no rows.
    pub fn into_first_value(self) -> Option<Value> {
        self.rows.into_iter().next().and_then(|r| r.into_iter().next())
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
    }
}

/// Borrowed view of one result row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    /// Column lookup; exact name first, then case-insensitive.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == name)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(name)))?;
        self.values.get(idx)
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }

    pub fn to_object(&self) -> Map<String, Value> {
        self.columns
            .iter()
            .cloned()
            .zip(self.values.iter().cloned())
            .collect()
    }
}

/// Parameterized access to the external warehouse.
///
/// Implementations perform one network round trip per call and keep no
/// state between calls. Errors are reserved for connectivity, permission
/// and statement failures; an empty result set is not an error.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Runs `sql` with `params` bound positionally to its `?` placeholders.
    async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<Table, QueryError>;

    /// First column of the first row, or `None` when no rows came back.
    async fn scalar(&self, sql: &str, params: &[SqlParam]) -> Result<Option<Value>, QueryError> {
        Ok(self.execute(sql, params).await?.into_first_value())
    }
}

/// True for unquoted identifiers (`RAW_DOCS`, `Analytics$1`). Names that pass
/// can be placed in statement text or handed to `IDENTIFIER(?)` safely.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 255 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
