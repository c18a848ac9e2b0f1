//! Error types for versionstore operations.
//!
//! Every error carries a structured [`ErrorCode`] so callers can tell a
//! rejected precondition apart from a failing backend without string matching.

use thiserror::Error;

/// Result type alias for versionstore operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Main error type for all versionstore operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A precondition on an entity, query or configuration was not met.
    /// Nothing was sent to the backend.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        field: Option<&'static str>,
    },

    /// The requested version does not exist (or is not live).
    #[error("Version not found: {message}")]
    NotFound {
        message: String,
        code: ErrorCode,
        version_id: Option<String>,
    },

    /// Statement execution failed in the backend.
    #[error("Database error: {message}")]
    Database {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValInvalidInput,
    ValMissingField,
    ValInvalidQuery,

    // Version (VER_xxx)
    VerNotFound,

    // Database (DB_xxx)
    DbConnectionFailed,
    DbOperationFailed,
    DbCountAnomaly,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValMissingField => "VAL_002",
            ErrorCode::ValInvalidQuery => "VAL_003",
            ErrorCode::VerNotFound => "VER_001",
            ErrorCode::DbConnectionFailed => "DB_001",
            ErrorCode::DbOperationFailed => "DB_002",
            ErrorCode::DbCountAnomaly => "DB_003",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl StoreError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            field: None,
        }
    }

    /// Create a validation error for a required field left empty.
    pub fn missing_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValMissingField,
            field: Some(field),
        }
    }

    /// Create a validation error for a query specification field.
    pub fn invalid_query(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidQuery,
            field: Some(field),
        }
    }

    /// Create a not found error.
    pub fn not_found(version_id: impl Into<String>) -> Self {
        let id = version_id.into();
        Self::NotFound {
            message: format!("Version with id '{}' not found", id),
            code: ErrorCode::VerNotFound,
            version_id: Some(id),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Create a database connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbConnectionFailed,
            source: None,
        }
    }

    /// Create a count anomaly error: the backend answered a count statement
    /// without a usable row.
    pub fn count_anomaly(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbCountAnomaly,
            source: None,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::Database { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// The offending field for validation errors, when known.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => *field,
            _ => None,
        }
    }

    /// True for errors raised before any statement reached the backend.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            code: ErrorCode::DbOperationFailed,
            source: Some(Box::new(err)),
        }
    }
}
