//! versionstore-core - Entity version history on top of a SQL table.
//!
//! Each change to an entity is appended as a new version row. Old rows are
//! never rewritten except to retire them with a soft-delete timestamp, which
//! keeps the full history queryable.
//!
//! # Example
//!
//! ```no_run
//! use versionstore_core::{SqlVersionStore, StoreConfig, Version, VersionQuery, VersionStore};
//!
//! let config = StoreConfig::new("page_versions").with_database_path(":memory:");
//! let store = SqlVersionStore::open(config)?;
//!
//! let mut version = Version::new()
//!     .with_entity_type("webpage")
//!     .with_entity_id("home")
//!     .with_content("<h1>Hello</h1>");
//! store.version_create(&mut version)?;
//!
//! let history = store.version_list(
//!     &VersionQuery::new()
//!         .set_entity_type("webpage")
//!         .set_entity_id("home")
//!         .set_order_by("created_at"),
//! )?;
//! # Ok::<(), versionstore_core::StoreError>(())
//! ```

pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod versioning;

// Re-export commonly used types
pub use backend::{Dialect, Row, SqlExecutor, SqlValue, SqliteExecutor};
pub use clock::{Clock, FixedClock, SystemClock, MAX_DATETIME};
pub use config::StoreConfig;
pub use error::{ErrorCode, StoreError, StoreResult};
pub use versioning::{SortOrder, SqlVersionStore, Version, VersionQuery, VersionStore};
