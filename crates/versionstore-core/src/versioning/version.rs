//! Version entity with change tracking.
//!
//! A version keeps a snapshot of its column values as last loaded or
//! persisted. Updates diff the current values against that baseline so only
//! modified columns are written.

use crate::backend::{Row, SqlValue};
use crate::clock::{self, Clock, SystemClock, MAX_DATETIME};
use crate::versioning::schema::{
    COLUMN_CONTENT, COLUMN_CREATED_AT, COLUMN_ENTITY_ID, COLUMN_ENTITY_TYPE, COLUMN_ID,
    COLUMN_REVISION, COLUMN_SOFT_DELETED_AT,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Column name to value, ordered by column name.
pub type ColumnValues = BTreeMap<&'static str, SqlValue>;

/// An immutable content snapshot tied to an owning entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    id: String,
    entity_type: String,
    entity_id: String,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    revision: Option<i64>,
    created_at: String,
    soft_deleted_at: String,
    /// Column values as last loaded or persisted; `None` until then.
    #[serde(skip)]
    baseline: Option<ColumnValues>,
}

impl Version {
    /// Create a fresh version with a generated id, stamped now and live.
    pub fn new() -> Self {
        Self::new_at(&SystemClock)
    }

    /// Create a fresh version using `clock` for the creation timestamp.
    pub fn new_at(clock: &dyn Clock) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            entity_type: String::new(),
            entity_id: String::new(),
            content: String::new(),
            revision: None,
            created_at: clock.now_string(),
            soft_deleted_at: MAX_DATETIME.to_string(),
            baseline: None,
        }
    }

    /// Rebuild a version from a stored row. Values are taken verbatim and the
    /// result starts clean.
    pub fn from_existing_data(row: &Row) -> Self {
        let text = |column: &str| row.get(column).cloned().unwrap_or_default();
        let revision = row
            .get(COLUMN_REVISION)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<i64>().ok());

        let mut version = Self {
            id: text(COLUMN_ID),
            entity_type: text(COLUMN_ENTITY_TYPE),
            entity_id: text(COLUMN_ENTITY_ID),
            content: text(COLUMN_CONTENT),
            revision,
            created_at: text(COLUMN_CREATED_AT),
            soft_deleted_at: text(COLUMN_SOFT_DELETED_AT),
            baseline: None,
        };
        version.mark_as_not_dirty();
        version
    }

    // ==================== Change tracking ====================

    /// Every persisted column with its current value.
    pub fn data(&self) -> ColumnValues {
        let mut data = ColumnValues::new();
        data.insert(COLUMN_ID, SqlValue::from(self.id.as_str()));
        data.insert(COLUMN_ENTITY_TYPE, SqlValue::from(self.entity_type.as_str()));
        data.insert(COLUMN_ENTITY_ID, SqlValue::from(self.entity_id.as_str()));
        data.insert(COLUMN_CONTENT, SqlValue::from(self.content.as_str()));
        if let Some(revision) = self.revision {
            data.insert(COLUMN_REVISION, SqlValue::Integer(revision));
        }
        data.insert(COLUMN_CREATED_AT, SqlValue::from(self.created_at.as_str()));
        data.insert(COLUMN_SOFT_DELETED_AT, SqlValue::from(self.soft_deleted_at.as_str()));
        data
    }

    /// Columns whose value differs from the baseline. A version that was
    /// never persisted reports every column.
    pub fn data_changed(&self) -> ColumnValues {
        let current = self.data();
        let Some(baseline) = &self.baseline else {
            return current;
        };

        let mut changed: ColumnValues = current
            .iter()
            .filter(|(column, value)| baseline.get(*column) != Some(*value))
            .map(|(column, value)| (*column, value.clone()))
            .collect();

        // A column that was cleared since the baseline is written as NULL.
        for column in baseline.keys() {
            if !current.contains_key(column) {
                changed.insert(*column, SqlValue::Null);
            }
        }
        changed
    }

    /// Reset the baseline to the current values.
    pub fn mark_as_not_dirty(&mut self) {
        self.baseline = Some(self.data());
    }

    pub fn is_dirty(&self) -> bool {
        !self.data_changed().is_empty()
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn revision(&self) -> Option<i64> {
        self.revision
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn soft_deleted_at(&self) -> &str {
        &self.soft_deleted_at
    }

    pub fn created_at_datetime(&self) -> Option<DateTime<Utc>> {
        clock::parse_datetime(&self.created_at)
    }

    /// `None` for live versions, whose marker is the far-future sentinel.
    pub fn soft_deleted_at_datetime(&self) -> Option<DateTime<Utc>> {
        if self.is_soft_deleted() {
            clock::parse_datetime(&self.soft_deleted_at)
        } else {
            None
        }
    }

    pub fn is_soft_deleted(&self) -> bool {
        self.soft_deleted_at != MAX_DATETIME
    }

    // ==================== Setters ====================

    pub fn set_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = id.into();
        self
    }

    pub fn set_entity_type(&mut self, entity_type: impl Into<String>) -> &mut Self {
        self.entity_type = entity_type.into();
        self
    }

    pub fn set_entity_id(&mut self, entity_id: impl Into<String>) -> &mut Self {
        self.entity_id = entity_id.into();
        self
    }

    pub fn set_content(&mut self, content: impl Into<String>) -> &mut Self {
        self.content = content.into();
        self
    }

    pub fn set_revision(&mut self, revision: Option<i64>) -> &mut Self {
        self.revision = revision;
        self
    }

    pub fn set_created_at(&mut self, created_at: impl Into<String>) -> &mut Self {
        self.created_at = created_at.into();
        self
    }

    pub fn set_soft_deleted_at(&mut self, soft_deleted_at: impl Into<String>) -> &mut Self {
        self.soft_deleted_at = soft_deleted_at.into();
        self
    }

    // ==================== Builders ====================

    /// Builder: set id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.set_id(id);
        self
    }

    /// Builder: set entity type
    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.set_entity_type(entity_type);
        self
    }

    /// Builder: set entity id
    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.set_entity_id(entity_id);
        self
    }

    /// Builder: set content
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.set_content(content);
        self
    }

    /// Builder: set revision
    pub fn with_revision(mut self, revision: i64) -> Self {
        self.set_revision(Some(revision));
        self
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new()
    }
}

/// Versions compare by persisted values; change-tracking state is ignored.
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.data() == other.data()
    }
}

impl Eq for Version {}
