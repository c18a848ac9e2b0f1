//! Rendered SQL statements with positional parameters.

use crate::backend::{Dialect, SqlValue};
use crate::versioning::schema::COLUMN_ID;
use crate::versioning::version::ColumnValues;
use std::fmt;

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        write!(f, "{} [{}]", self.sql, params.join(", "))
    }
}

/// Accumulates parameters and hands out dialect placeholders for them.
pub(crate) struct Params {
    dialect: Dialect,
    values: Vec<SqlValue>,
}

impl Params {
    pub(crate) fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            values: Vec::new(),
        }
    }

    /// Bind `value` and return its placeholder.
    pub(crate) fn bind(&mut self, value: SqlValue) -> String {
        self.values.push(value);
        self.dialect.placeholder(self.values.len())
    }

    pub(crate) fn finish(self, sql: String) -> Statement {
        Statement {
            sql,
            params: self.values,
        }
    }
}

/// `INSERT` of every given column.
pub fn insert(table: &str, values: &ColumnValues, dialect: Dialect) -> Statement {
    let mut params = Params::new(dialect);
    let columns: Vec<String> = values.keys().map(|c| dialect.quote_ident(c)).collect();
    let placeholders: Vec<String> = values.values().map(|v| params.bind(v.clone())).collect();

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        dialect.quote_ident(table),
        columns.join(", "),
        placeholders.join(", ")
    );
    params.finish(sql)
}

/// `UPDATE` of the given columns on the row with primary key `id`.
pub fn update_by_id(table: &str, changes: &ColumnValues, id: &str, dialect: Dialect) -> Statement {
    let mut params = Params::new(dialect);
    let assignments: Vec<String> = changes
        .iter()
        .map(|(column, value)| {
            format!("{} = {}", dialect.quote_ident(column), params.bind(value.clone()))
        })
        .collect();
    let key = params.bind(SqlValue::from(id));

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = {}",
        dialect.quote_ident(table),
        assignments.join(", "),
        dialect.quote_ident(COLUMN_ID),
        key
    );
    params.finish(sql)
}

/// `DELETE` of the row with primary key `id`.
pub fn delete_by_id(table: &str, id: &str, dialect: Dialect) -> Statement {
    let mut params = Params::new(dialect);
    let key = params.bind(SqlValue::from(id));
    let sql = format!(
        "DELETE FROM {} WHERE {} = {}",
        dialect.quote_ident(table),
        dialect.quote_ident(COLUMN_ID),
        key
    );
    params.finish(sql)
}
