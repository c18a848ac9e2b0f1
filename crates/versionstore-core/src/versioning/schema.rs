//! Column names and table DDL for the version table.

use crate::backend::Dialect;

pub const COLUMN_ID: &str = "id";
pub const COLUMN_ENTITY_TYPE: &str = "entity_type";
pub const COLUMN_ENTITY_ID: &str = "entity_id";
pub const COLUMN_CONTENT: &str = "content";
pub const COLUMN_REVISION: &str = "revision";
pub const COLUMN_CREATED_AT: &str = "created_at";
pub const COLUMN_SOFT_DELETED_AT: &str = "soft_deleted_at";

/// Width of the identifier columns.
pub const ID_LENGTH: u32 = 40;

/// Shape of one version table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    table_name: String,
    revisions_enabled: bool,
}

impl TableSchema {
    pub fn new(table_name: impl Into<String>, revisions_enabled: bool) -> Self {
        Self {
            table_name: table_name.into(),
            revisions_enabled,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn revisions_enabled(&self) -> bool {
        self.revisions_enabled
    }

    /// Persisted columns, in DDL order.
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = vec![COLUMN_ID, COLUMN_ENTITY_TYPE, COLUMN_ENTITY_ID, COLUMN_CONTENT];
        if self.revisions_enabled {
            columns.push(COLUMN_REVISION);
        }
        columns.push(COLUMN_CREATED_AT);
        columns.push(COLUMN_SOFT_DELETED_AT);
        columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns().contains(&column)
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this schema.
    pub fn create_table_sql(&self, dialect: Dialect) -> String {
        let q = |c: &str| dialect.quote_ident(c);
        let mut defs = vec![
            format!("{} {} NOT NULL PRIMARY KEY", q(COLUMN_ID), dialect.string_type(ID_LENGTH)),
            format!("{} {} NOT NULL", q(COLUMN_ENTITY_TYPE), dialect.string_type(ID_LENGTH)),
            format!("{} {} NOT NULL", q(COLUMN_ENTITY_ID), dialect.string_type(ID_LENGTH)),
            format!("{} {}", q(COLUMN_CONTENT), dialect.long_text_type()),
        ];
        if self.revisions_enabled {
            defs.push(format!("{} {}", q(COLUMN_REVISION), dialect.integer_type()));
        }
        defs.push(format!("{} {}", q(COLUMN_CREATED_AT), dialect.datetime_type()));
        defs.push(format!("{} {}", q(COLUMN_SOFT_DELETED_AT), dialect.datetime_type()));

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            q(&self.table_name),
            defs.join(",\n    ")
        )
    }
}
