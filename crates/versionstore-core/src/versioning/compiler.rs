//! Query compiler: turns a [`VersionQuery`] into a filtered, sorted and
//! paginated description of a version table read, then renders it to SQL.
//!
//! Compilation is pure. The caller supplies "now" so the soft-delete filter
//! always reflects the time the query was built.

use crate::backend::{Dialect, SqlValue};
use crate::versioning::query::{SortOrder, VersionQuery};
use crate::versioning::schema::{
    COLUMN_ENTITY_ID, COLUMN_ENTITY_TYPE, COLUMN_ID, COLUMN_SOFT_DELETED_AT,
};
use crate::versioning::statement::{Params, Statement};

/// A single comparison against a bound value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Eq { column: String, value: SqlValue },
    Gt { column: String, value: SqlValue },
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Predicate::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn gt(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Predicate::Gt {
            column: column.into(),
            value: value.into(),
        }
    }

    fn render(&self, dialect: Dialect, params: &mut Params) -> String {
        let (column, op, value) = match self {
            Predicate::Eq { column, value } => (column, "=", value),
            Predicate::Gt { column, value } => (column, ">", value),
        };
        format!("{} {} {}", dialect.quote_ident(column), op, params.bind(value.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    pub column: String,
    pub direction: SortOrder,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    All,
    Columns(Vec<String>),
}

/// Compiled form of a version query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    /// Caller filters, ANDed together.
    pub filters: Vec<Predicate>,
    pub order: Option<OrderClause>,
    /// Always empty for count-only queries.
    pub pagination: Pagination,
    pub projection: Projection,
    /// Live-rows-only filter; `None` when soft-deleted rows were requested.
    pub soft_delete: Option<Predicate>,
    pub count_only: bool,
}

/// Compile an already validated query. `now` is the storage-format timestamp
/// that separates live from soft-deleted rows.
pub fn compile(query: &VersionQuery, now: &str) -> CompiledQuery {
    let mut filters = Vec::new();
    if let Some(id) = query.id() {
        filters.push(Predicate::eq(COLUMN_ID, id));
    }
    if let Some(entity_type) = query.entity_type() {
        filters.push(Predicate::eq(COLUMN_ENTITY_TYPE, entity_type));
    }
    if let Some(entity_id) = query.entity_id() {
        filters.push(Predicate::eq(COLUMN_ENTITY_ID, entity_id));
    }

    // A count must see the whole matching set, not one page of it.
    let pagination = if query.is_count_only() {
        Pagination::default()
    } else {
        Pagination {
            limit: query.limit(),
            offset: query.offset(),
        }
    };

    let order = query.order_by().map(|column| OrderClause {
        column: column.to_string(),
        direction: query.resolved_sort_order(),
    });

    let projection = if query.columns().is_empty() {
        Projection::All
    } else {
        Projection::Columns(query.columns().to_vec())
    };

    let soft_delete = if query.soft_deleted_included() {
        None
    } else {
        Some(Predicate::gt(COLUMN_SOFT_DELETED_AT, now))
    };

    CompiledQuery {
        filters,
        order,
        pagination,
        projection,
        soft_delete,
        count_only: query.is_count_only(),
    }
}

impl CompiledQuery {
    /// All predicates in WHERE order.
    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.filters.iter().chain(self.soft_delete.iter())
    }

    fn render_where(&self, dialect: Dialect, params: &mut Params) -> String {
        let clauses: Vec<String> = self
            .predicates()
            .map(|p| p.render(dialect, params))
            .collect();
        if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        }
    }

    /// `SELECT` of the projected columns.
    pub fn render_select(&self, table: &str, dialect: Dialect) -> Statement {
        let mut params = Params::new(dialect);

        let columns = match &self.projection {
            Projection::All => "*".to_string(),
            Projection::Columns(columns) => columns
                .iter()
                .map(|c| dialect.quote_ident(c))
                .collect::<Vec<_>>()
                .join(", "),
        };

        let mut sql = format!("SELECT {} FROM {}", columns, dialect.quote_ident(table));
        sql.push_str(&self.render_where(dialect, &mut params));

        if let Some(order) = &self.order {
            sql.push_str(&format!(
                " ORDER BY {} {}",
                dialect.quote_ident(&order.column),
                order.direction.as_sql()
            ));
        }

        match (self.pagination.limit, self.pagination.offset) {
            (Some(limit), offset) => {
                sql.push_str(&format!(" LIMIT {}", params.bind(SqlValue::Integer(limit))));
                if let Some(offset) = offset {
                    sql.push_str(&format!(" OFFSET {}", params.bind(SqlValue::Integer(offset))));
                }
            }
            (None, Some(offset)) => {
                if let Some(unbounded) = dialect.unbounded_limit() {
                    sql.push(' ');
                    sql.push_str(unbounded);
                }
                sql.push_str(&format!(" OFFSET {}", params.bind(SqlValue::Integer(offset))));
            }
            (None, None) => {}
        }

        params.finish(sql)
    }

    /// `SELECT COUNT(*) AS count` over the same filters, with no ordering or
    /// pagination.
    pub fn render_count(&self, table: &str, dialect: Dialect) -> Statement {
        let mut params = Params::new(dialect);
        let mut sql = format!("SELECT COUNT(*) AS count FROM {}", dialect.quote_ident(table));
        sql.push_str(&self.render_where(dialect, &mut params));
        params.finish(sql)
    }
}
