//! SQLite execution backend using rusqlite.

use super::{Dialect, Row, SqlExecutor, SqlValue};
use crate::error::{StoreError, StoreResult};
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed executor. The connection is serialized behind a mutex.
pub struct SqliteExecutor {
    conn: Mutex<Connection>,
}

impl SqliteExecutor {
    /// Open (or create) a database file. `":memory:"` opens an in-memory database.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if path.to_str() == Some(":memory:") {
            return Self::in_memory();
        }

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(|e| {
            StoreError::connection(format!("Failed to open SQLite database at {:?}: {}", path, e))
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::connection(format!("Failed to open in-memory SQLite: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::database(format!("Failed to acquire lock: {}", e)))
    }
}

fn value_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}

impl SqlExecutor for SqliteExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&self, sql: &str, params: &[SqlValue]) -> StoreResult<usize> {
        let conn = self.conn()?;
        Ok(conn.execute(sql, params_from_iter(params.iter()))?)
    }

    fn query(&self, sql: &str, params: &[SqlValue]) -> StoreResult<Vec<Row>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut mapped = Row::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                mapped.insert(name.clone(), value_to_string(row.get_ref(i)?));
            }
            out.push(mapped);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_execute_and_query_as_strings() {
        let exec = SqliteExecutor::in_memory().unwrap();
        exec.execute("CREATE TABLE t (a TEXT, b INTEGER, c TEXT)", &[])
            .unwrap();
        let affected = exec
            .execute(
                "INSERT INTO t (a, b, c) VALUES (?, ?, ?)",
                &[SqlValue::from("x"), SqlValue::Integer(42), SqlValue::Null],
            )
            .unwrap();
        assert_eq!(affected, 1);

        let rows = exec.query("SELECT a, b, c FROM t", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["a"], "x");
        assert_eq!(rows[0]["b"], "42");
        assert_eq!(rows[0]["c"], "");
    }

    #[test]
    fn test_query_uses_column_aliases() {
        let exec = SqliteExecutor::in_memory().unwrap();
        let rows = exec.query("SELECT COUNT(*) AS count", &[]).unwrap();
        assert_eq!(rows[0]["count"], "1");
    }

    #[test]
    fn test_backend_error_propagates() {
        let exec = SqliteExecutor::in_memory().unwrap();
        let err = exec.query("SELECT * FROM missing_table", &[]).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::DbOperationFailed);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("versions.db");
        let exec = SqliteExecutor::open(&path).unwrap();
        exec.execute("CREATE TABLE t (a TEXT)", &[]).unwrap();
        assert!(path.exists());
        assert_eq!(exec.dialect(), Dialect::Sqlite);
    }
}
