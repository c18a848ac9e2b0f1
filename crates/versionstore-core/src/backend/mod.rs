//! SQL execution backend abstraction.
//!
//! The store renders statements itself and only needs a backend that can run
//! a statement with positional parameters, either for effect or for rows.

mod dialect;
mod sqlite;

pub use dialect::Dialect;
pub use sqlite::SqliteExecutor;

use crate::error::StoreResult;
use std::collections::HashMap;
use std::fmt;

/// A result row: column name to textual value. NULL maps to an empty string.
pub type Row = HashMap<String, String>;

/// Positional statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Null,
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Text(s) => write!(f, "{:?}", s),
            SqlValue::Integer(i) => write!(f, "{}", i),
            SqlValue::Null => f.write_str("NULL"),
        }
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(i: i64) -> Self {
        SqlValue::Integer(i)
    }
}

impl rusqlite::ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, ValueRef};
        Ok(match self {
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            SqlValue::Null => ToSqlOutput::Borrowed(ValueRef::Null),
        })
    }
}

/// Capability the store needs from a database driver.
///
/// Implementations must be safe to share between threads; the store adds no
/// locking of its own. Every call is a single autocommit statement.
#[cfg_attr(test, mockall::automock)]
pub trait SqlExecutor: Send + Sync {
    /// SQL flavour used to render statements for this backend.
    fn dialect(&self) -> Dialect;

    /// Execute a statement for effect, returning the number of affected rows.
    fn execute(&self, sql: &str, params: &[SqlValue]) -> StoreResult<usize>;

    /// Execute a query, returning every row as a column-name keyed map.
    fn query(&self, sql: &str, params: &[SqlValue]) -> StoreResult<Vec<Row>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_conversions() {
        assert_eq!(SqlValue::from("a"), SqlValue::Text("a".to_string()));
        assert_eq!(SqlValue::from(7_i64), SqlValue::Integer(7));
    }

    #[test]
    fn test_sql_value_display() {
        assert_eq!(SqlValue::from("x").to_string(), "\"x\"");
        assert_eq!(SqlValue::Integer(3).to_string(), "3");
        assert_eq!(SqlValue::Null.to_string(), "NULL");
    }
}
