//! Append-and-soft-delete versioning of arbitrary entities.
//!
//! Every change to an entity is stored as a new immutable [`Version`] row.
//! Rows are retired by stamping `soft_deleted_at` rather than removing them,
//! so a version stays visible until that moment has passed.

pub mod compiler;
mod query;
mod schema;
pub mod statement;
mod store;
mod version;

pub use compiler::{compile, CompiledQuery, OrderClause, Pagination, Predicate, Projection};
pub use query::{SortOrder, VersionQuery, ASC};
pub use schema::{
    TableSchema, COLUMN_CONTENT, COLUMN_CREATED_AT, COLUMN_ENTITY_ID, COLUMN_ENTITY_TYPE,
    COLUMN_ID, COLUMN_REVISION, COLUMN_SOFT_DELETED_AT, ID_LENGTH,
};
pub use statement::Statement;
pub use store::{SqlVersionStore, VersionStore};
pub use version::{ColumnValues, Version};
