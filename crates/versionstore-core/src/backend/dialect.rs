//! Per-driver SQL rendering rules.

use serde::{Deserialize, Serialize};

/// SQL flavour of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Sqlite,
    Postgres,
    MySql,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
        }
    }

    /// Placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::Sqlite | Dialect::MySql => "?".to_string(),
        }
    }

    /// Quote an identifier, doubling any embedded quote character.
    pub fn quote_ident(&self, ident: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", ident.replace('`', "``")),
            Dialect::Sqlite | Dialect::Postgres => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    /// Clause needed in front of OFFSET when no LIMIT was requested.
    pub fn unbounded_limit(&self) -> Option<&'static str> {
        match self {
            Dialect::Sqlite => Some("LIMIT -1"),
            Dialect::MySql => Some("LIMIT 18446744073709551615"),
            Dialect::Postgres => None,
        }
    }

    pub fn string_type(&self, length: u32) -> String {
        match self {
            Dialect::Sqlite => "TEXT".to_string(),
            Dialect::Postgres | Dialect::MySql => format!("VARCHAR({})", length),
        }
    }

    pub fn long_text_type(&self) -> &'static str {
        match self {
            Dialect::MySql => "LONGTEXT",
            Dialect::Sqlite | Dialect::Postgres => "TEXT",
        }
    }

    pub fn datetime_type(&self) -> &'static str {
        match self {
            Dialect::Postgres => "TIMESTAMP",
            Dialect::Sqlite | Dialect::MySql => "DATETIME",
        }
    }

    pub fn integer_type(&self) -> &'static str {
        match self {
            Dialect::MySql => "INT",
            Dialect::Sqlite | Dialect::Postgres => "INTEGER",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(Dialect::Sqlite.placeholder(3), "?");
        assert_eq!(Dialect::MySql.placeholder(1), "?");
        assert_eq!(Dialect::Postgres.placeholder(3), "$3");
    }

    #[test]
    fn test_quote_ident_escapes() {
        assert_eq!(Dialect::Sqlite.quote_ident("id"), "\"id\"");
        assert_eq!(Dialect::Postgres.quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(Dialect::MySql.quote_ident("a`b"), "`a``b`");
    }
}
