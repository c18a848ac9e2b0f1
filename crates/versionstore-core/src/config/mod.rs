//! Configuration system for versionstore.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{StoreError, StoreResult};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Name of the version table.
    pub table_name: String,
    /// SQLite database file used by [`crate::SqlVersionStore::open`].
    /// `":memory:"` selects an in-memory database.
    pub database_path: PathBuf,
    /// Create the table on construction.
    pub automigrate_enabled: bool,
    /// Log every statement and its parameters at debug level.
    pub debug_enabled: bool,
    /// Persist and require a positive `revision` per version.
    pub revisions_enabled: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let store_dir = dirs::home_dir()
            .map(|h| h.join(".versionstore"))
            .unwrap_or_else(|| PathBuf::from(".versionstore"));

        Self {
            table_name: "versions".to_string(),
            database_path: store_dir.join("versions.db"),
            automigrate_enabled: true,
            debug_enabled: false,
            revisions_enabled: false,
        }
    }
}

impl StoreConfig {
    /// Default configuration for the given table.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    /// Builder: set database path
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    /// Builder: enable or disable automigration
    pub fn with_automigrate(mut self, enabled: bool) -> Self {
        self.automigrate_enabled = enabled;
        self
    }

    /// Builder: enable or disable statement logging
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_enabled = enabled;
        self
    }

    /// Builder: enable or disable the revision column
    pub fn with_revisions(mut self, enabled: bool) -> Self {
        self.revisions_enabled = enabled;
        self
    }

    /// Check the table name is present and safe to splice into DDL.
    pub fn validate(&self) -> StoreResult<()> {
        if self.table_name.is_empty() {
            return Err(StoreError::missing_field(
                "table_name",
                "version store: table name is required",
            ));
        }
        if !IDENTIFIER.is_match(&self.table_name) {
            return Err(StoreError::validation(format!(
                "version store: table name '{}' is not a valid identifier",
                self.table_name
            )));
        }
        Ok(())
    }

    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| StoreError::Configuration(e.to_string()))
            }
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| StoreError::Configuration(e.to_string()))
            }
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&content).map_err(|e| StoreError::Configuration(e.to_string()))
            }
            _ => Err(StoreError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(table) = std::env::var("VERSIONSTORE_TABLE") {
            config.table_name = table;
        }
        if let Ok(path) = std::env::var("VERSIONSTORE_DB_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(enabled) = env_flag("VERSIONSTORE_AUTOMIGRATE") {
            config.automigrate_enabled = enabled;
        }
        if let Some(enabled) = env_flag("VERSIONSTORE_DEBUG") {
            config.debug_enabled = enabled;
        }
        if let Some(enabled) = env_flag("VERSIONSTORE_REVISIONS") {
            config.revisions_enabled = enabled;
        }

        config
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
