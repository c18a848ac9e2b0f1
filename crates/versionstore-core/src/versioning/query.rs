//! Version query specification.
//!
//! Every property is independently present or absent. A filter only takes
//! effect when it was explicitly set, so `id` unset and `id` set to `""` are
//! different queries (and the latter is rejected by [`VersionQuery::validate`]).

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};

/// Token accepted as "ascending" (case-insensitive). Anything else sorts descending.
pub const ASC: &str = "asc";

/// Resolved sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Resolve a caller-supplied token; only `asc` (any case) is ascending.
    pub fn from_token(token: &str) -> Self {
        if token.eq_ignore_ascii_case(ASC) {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Filter, sort and pagination descriptor for version listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort_order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    soft_deleted_included: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    columns: Vec<String>,
}

impl VersionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check every explicitly set property. The first violation is returned.
    pub fn validate(&self) -> StoreResult<()> {
        if matches!(&self.id, Some(id) if id.is_empty()) {
            return Err(StoreError::invalid_query("id", "version query. id cannot be empty"));
        }

        if matches!(&self.entity_id, Some(id) if id.is_empty()) {
            return Err(StoreError::invalid_query(
                "entity_id",
                "version query. entity_id cannot be empty",
            ));
        }

        if matches!(&self.entity_type, Some(t) if t.is_empty()) {
            return Err(StoreError::invalid_query(
                "entity_type",
                "version query. entity_type cannot be empty",
            ));
        }

        if let Some(limit) = self.limit {
            if limit < 0 {
                return Err(StoreError::invalid_query(
                    "limit",
                    "version query. limit cannot be negative",
                ));
            }
            if limit < 1 {
                return Err(StoreError::invalid_query(
                    "limit",
                    "version query. limit cannot be less than 1",
                ));
            }
        }

        if matches!(self.offset, Some(offset) if offset < 0) {
            return Err(StoreError::invalid_query(
                "offset",
                "version query. offset cannot be negative",
            ));
        }

        Ok(())
    }

    // ==================== id ====================

    pub fn has_id(&self) -> bool {
        self.id.is_some()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    // ==================== entity_id ====================

    pub fn has_entity_id(&self) -> bool {
        self.entity_id.is_some()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn set_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    // ==================== entity_type ====================

    pub fn has_entity_type(&self) -> bool {
        self.entity_type.is_some()
    }

    pub fn entity_type(&self) -> Option<&str> {
        self.entity_type.as_deref()
    }

    pub fn set_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    // ==================== pagination ====================

    pub fn has_offset(&self) -> bool {
        self.offset.is_some()
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    pub fn set_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn has_limit(&self) -> bool {
        self.limit.is_some()
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn set_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    // ==================== ordering ====================

    pub fn has_sort_order(&self) -> bool {
        self.sort_order.is_some()
    }

    pub fn sort_order(&self) -> Option<&str> {
        self.sort_order.as_deref()
    }

    pub fn set_sort_order(mut self, sort_order: impl Into<String>) -> Self {
        self.sort_order = Some(sort_order.into());
        self
    }

    /// Effective direction: descending unless an `asc` token was set.
    pub fn resolved_sort_order(&self) -> SortOrder {
        self.sort_order
            .as_deref()
            .map(SortOrder::from_token)
            .unwrap_or_default()
    }

    pub fn has_order_by(&self) -> bool {
        self.order_by.is_some()
    }

    pub fn order_by(&self) -> Option<&str> {
        self.order_by.as_deref()
    }

    pub fn set_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    // ==================== flags ====================

    pub fn has_count_only(&self) -> bool {
        self.count_only.is_some()
    }

    pub fn is_count_only(&self) -> bool {
        self.count_only.unwrap_or(false)
    }

    pub fn set_count_only(mut self, count_only: bool) -> Self {
        self.count_only = Some(count_only);
        self
    }

    pub fn has_soft_deleted_included(&self) -> bool {
        self.soft_deleted_included.is_some()
    }

    pub fn soft_deleted_included(&self) -> bool {
        self.soft_deleted_included.unwrap_or(false)
    }

    pub fn set_soft_deleted_included(mut self, included: bool) -> Self {
        self.soft_deleted_included = Some(included);
        self
    }

    // ==================== projection ====================

    /// Explicit projection; empty means every column.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn set_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }
}
