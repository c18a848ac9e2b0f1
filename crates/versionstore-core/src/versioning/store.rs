//! Version storage layer.
//!
//! Validates input, compiles queries, renders statements for the backend's
//! dialect and maps result rows back into [`Version`] entities. Each
//! operation issues at most one statement.

use crate::backend::{Dialect, SqlExecutor, SqliteExecutor};
use crate::clock::{Clock, SystemClock, MAX_DATETIME};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::versioning::compiler::compile;
use crate::versioning::query::VersionQuery;
use crate::versioning::schema::{TableSchema, COLUMN_CREATED_AT, COLUMN_ID};
use crate::versioning::statement::{self, Statement};
use crate::versioning::version::Version;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Trait for version storage operations
pub trait VersionStore: Send + Sync {
    /// Create the version table if it does not exist yet
    fn auto_migrate(&self) -> StoreResult<()>;

    /// Toggle statement logging
    fn enable_debug(&self, debug: bool);

    /// Persist a new version
    fn version_create(&self, version: &mut Version) -> StoreResult<()>;

    /// Find a live version by id; `None` when nothing matches
    fn version_find_by_id(&self, id: &str) -> StoreResult<Option<Version>>;

    /// List versions matching a query
    fn version_list(&self, query: &VersionQuery) -> StoreResult<Vec<Version>>;

    /// Count versions matching a query, ignoring its pagination
    fn version_count(&self, query: &VersionQuery) -> StoreResult<u64>;

    /// Write the changed columns of a version
    fn version_update(&self, version: &mut Version) -> StoreResult<()>;

    /// Permanently remove a version
    fn version_delete(&self, version: &Version) -> StoreResult<()>;

    /// Permanently remove a version by id
    fn version_delete_by_id(&self, id: &str) -> StoreResult<()>;

    /// Mark a version as deleted now
    fn version_soft_delete(&self, version: &mut Version) -> StoreResult<()>;

    /// Mark the live version with this id as deleted now
    fn version_soft_delete_by_id(&self, id: &str) -> StoreResult<()>;
}

/// SQL-backed version store
pub struct SqlVersionStore {
    schema: TableSchema,
    executor: Arc<dyn SqlExecutor>,
    dialect: Dialect,
    clock: Arc<dyn Clock>,
    debug_enabled: AtomicBool,
}

impl SqlVersionStore {
    /// Create a store over an existing backend. Runs the migration when
    /// `config.automigrate_enabled` is set.
    pub fn new(config: StoreConfig, executor: Arc<dyn SqlExecutor>) -> StoreResult<Self> {
        Self::with_clock(config, executor, Arc::new(SystemClock))
    }

    /// Like [`SqlVersionStore::new`], with an explicit time source.
    pub fn with_clock(
        config: StoreConfig,
        executor: Arc<dyn SqlExecutor>,
        clock: Arc<dyn Clock>,
    ) -> StoreResult<Self> {
        config.validate()?;

        let dialect = executor.dialect();
        let store = Self {
            schema: TableSchema::new(config.table_name.clone(), config.revisions_enabled),
            executor,
            dialect,
            clock,
            debug_enabled: AtomicBool::new(config.debug_enabled),
        };

        if config.automigrate_enabled {
            store.auto_migrate()?;
        }

        Ok(store)
    }

    /// Open a SQLite database at `config.database_path` and create a store on it.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let executor = SqliteExecutor::open(&config.database_path)?;
        Self::new(config, Arc::new(executor))
    }

    pub fn table_name(&self) -> &str {
        self.schema.table_name()
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn is_debug_enabled(&self) -> bool {
        self.debug_enabled.load(Ordering::Relaxed)
    }

    fn log_sql(&self, stmt: &Statement) {
        if self.is_debug_enabled() {
            tracing::debug!(
                table = self.table_name(),
                sql = %stmt.sql,
                params = ?stmt.params,
                "version store statement"
            );
        }
    }

    fn execute(&self, stmt: &Statement) -> StoreResult<usize> {
        self.log_sql(stmt);
        self.executor.execute(&stmt.sql, &stmt.params)
    }

    fn validate_new(&self, version: &Version) -> StoreResult<()> {
        if version.id().is_empty() {
            return Err(StoreError::missing_field("id", "version id should not be empty"));
        }
        if version.entity_id().is_empty() {
            return Err(StoreError::missing_field(
                "entity_id",
                "version entity id should not be empty",
            ));
        }
        if version.entity_type().is_empty() {
            return Err(StoreError::missing_field(
                "entity_type",
                "version entity type should not be empty",
            ));
        }
        if self.schema.revisions_enabled() && !matches!(version.revision(), Some(r) if r >= 1) {
            return Err(StoreError::missing_field(
                "revision",
                "version revision should be greater than 0",
            ));
        }
        Ok(())
    }
}

impl VersionStore for SqlVersionStore {
    fn auto_migrate(&self) -> StoreResult<()> {
        let stmt = Statement {
            sql: self.schema.create_table_sql(self.dialect),
            params: Vec::new(),
        };
        self.execute(&stmt)?;
        tracing::info!(table = self.table_name(), dialect = self.dialect.as_str(), "version table ready");
        Ok(())
    }

    fn enable_debug(&self, debug: bool) {
        self.debug_enabled.store(debug, Ordering::Relaxed);
    }

    fn version_create(&self, version: &mut Version) -> StoreResult<()> {
        self.validate_new(version)?;

        version.set_created_at(self.clock.now_string());
        version.set_soft_deleted_at(MAX_DATETIME);

        let mut data = version.data();
        data.retain(|column, _| self.schema.has_column(column));

        let stmt = statement::insert(self.table_name(), &data, self.dialect);
        self.execute(&stmt)?;

        version.mark_as_not_dirty();
        Ok(())
    }

    fn version_find_by_id(&self, id: &str) -> StoreResult<Option<Version>> {
        if id.is_empty() {
            return Err(StoreError::missing_field("id", "version id is empty"));
        }

        let query = VersionQuery::new().set_id(id).set_limit(1);
        Ok(self.version_list(&query)?.into_iter().next())
    }

    fn version_list(&self, query: &VersionQuery) -> StoreResult<Vec<Version>> {
        query.validate()?;

        let compiled = compile(query, &self.clock.now_string());
        let stmt = compiled.render_select(self.table_name(), self.dialect);
        self.log_sql(&stmt);

        let rows = self.executor.query(&stmt.sql, &stmt.params)?;
        Ok(rows.iter().map(Version::from_existing_data).collect())
    }

    fn version_count(&self, query: &VersionQuery) -> StoreResult<u64> {
        let query = query.clone().set_count_only(true);
        query.validate()?;

        let compiled = compile(&query, &self.clock.now_string());
        let stmt = compiled.render_count(self.table_name(), self.dialect);
        self.log_sql(&stmt);

        let rows = self.executor.query(&stmt.sql, &stmt.params)?;
        let Some(row) = rows.first() else {
            tracing::warn!(table = self.table_name(), "count query returned no rows");
            return Err(StoreError::count_anomaly("count query returned no rows"));
        };

        let raw = row.get("count").map(String::as_str).unwrap_or_default();
        raw.parse::<u64>().map_err(|e| {
            StoreError::count_anomaly(format!("count query returned '{}': {}", raw, e))
        })
    }

    fn version_update(&self, version: &mut Version) -> StoreResult<()> {
        let mut changed = version.data_changed();
        // id is the key and created_at is write-once
        changed.remove(COLUMN_ID);
        changed.remove(COLUMN_CREATED_AT);
        changed.retain(|column, _| self.schema.has_column(column));

        if changed.is_empty() {
            return Ok(());
        }

        let stmt = statement::update_by_id(self.table_name(), &changed, version.id(), self.dialect);
        self.execute(&stmt)?;

        version.mark_as_not_dirty();
        Ok(())
    }

    fn version_delete(&self, version: &Version) -> StoreResult<()> {
        self.version_delete_by_id(version.id())
    }

    fn version_delete_by_id(&self, id: &str) -> StoreResult<()> {
        if id.is_empty() {
            return Err(StoreError::missing_field("id", "version id is empty"));
        }

        let stmt = statement::delete_by_id(self.table_name(), id, self.dialect);
        self.execute(&stmt)?;
        Ok(())
    }

    fn version_soft_delete(&self, version: &mut Version) -> StoreResult<()> {
        version.set_soft_deleted_at(self.clock.now_string());
        self.version_update(version)
    }

    fn version_soft_delete_by_id(&self, id: &str) -> StoreResult<()> {
        match self.version_find_by_id(id)? {
            Some(mut version) => self.version_soft_delete(&mut version),
            None => Err(StoreError::not_found(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockSqlExecutor, Row};
    use crate::clock::FixedClock;
    use crate::error::ErrorCode;
    use chrono::{TimeZone, Utc};

    fn start() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn sqlite_store(clock: Arc<FixedClock>) -> SqlVersionStore {
        let executor = Arc::new(SqliteExecutor::in_memory().unwrap());
        SqlVersionStore::with_clock(StoreConfig::new("versions"), executor, clock).unwrap()
    }

    fn webpage(entity_id: &str, content: &str) -> Version {
        Version::new()
            .with_entity_type("webpage")
            .with_entity_id(entity_id)
            .with_content(content)
    }

    /// Mock backend that expects no statements at all.
    fn silent_executor() -> MockSqlExecutor {
        let mut mock = MockSqlExecutor::new();
        mock.expect_dialect().return_const(Dialect::Sqlite);
        mock.expect_execute().never();
        mock.expect_query().never();
        mock
    }

    fn store_over(mock: MockSqlExecutor) -> SqlVersionStore {
        SqlVersionStore::new(StoreConfig::new("versions").with_automigrate(false), Arc::new(mock))
            .unwrap()
    }

    #[test]
    fn test_new_rejects_missing_table_name() {
        let executor = Arc::new(silent_executor());
        let err = SqlVersionStore::new(StoreConfig::new(""), executor).err().unwrap();
        assert_eq!(err.field(), Some("table_name"));
    }

    #[test]
    fn test_auto_migrate_is_idempotent() {
        let store = sqlite_store(Arc::new(FixedClock::new(start())));
        store.auto_migrate().unwrap();
        store.auto_migrate().unwrap();
    }

    #[test]
    fn test_create_stamps_timestamps_from_clock() {
        let clock = Arc::new(FixedClock::new(start()));
        let store = sqlite_store(clock.clone());

        let mut v = webpage("1", "content1");
        v.set_soft_deleted_at("2000-01-01 00:00:00");
        store.version_create(&mut v).unwrap();

        assert_eq!(v.created_at(), "2024-06-01 12:00:00");
        assert_eq!(v.soft_deleted_at(), MAX_DATETIME);
        assert!(!v.is_dirty());

        let found = store.version_find_by_id(v.id()).unwrap().unwrap();
        assert_eq!(found, v);
    }

    #[test]
    fn test_create_validation_happens_before_io() {
        let store = store_over(silent_executor());

        let cases = [
            (webpage("1", "c").with_id(""), "id"),
            (webpage("", "c"), "entity_id"),
            (Version::new().with_entity_id("1"), "entity_type"),
        ];
        for (mut version, field) in cases {
            let err = store.version_create(&mut version).unwrap_err();
            assert_eq!(err.code(), ErrorCode::ValMissingField);
            assert_eq!(err.field(), Some(field));
        }
    }

    #[test]
    fn test_create_duplicate_id_is_backend_error() {
        let store = sqlite_store(Arc::new(FixedClock::new(start())));
        let mut first = webpage("1", "a").with_id("same");
        let mut second = webpage("1", "b").with_id("same");

        store.version_create(&mut first).unwrap();
        let err = store.version_create(&mut second).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DbOperationFailed);
    }

    #[test]
    fn test_find_by_id_empty_is_error_missing_is_none() {
        let store = sqlite_store(Arc::new(FixedClock::new(start())));
        assert!(store.version_find_by_id("").unwrap_err().is_validation());
        assert!(store.version_find_by_id("nope").unwrap().is_none());
    }

    #[test]
    fn test_update_without_changes_issues_no_statement() {
        let store = store_over(silent_executor());

        let mut row = Row::new();
        row.insert("id".into(), "v1".into());
        row.insert("entity_type".into(), "webpage".into());
        row.insert("entity_id".into(), "1".into());
        row.insert("soft_deleted_at".into(), MAX_DATETIME.into());
        let mut v = Version::from_existing_data(&row);

        store.version_update(&mut v).unwrap();

        // id and created_at never reach an UPDATE
        v.set_id("v2").set_created_at("2020-01-01 00:00:00");
        store.version_update(&mut v).unwrap();
    }

    #[test]
    fn test_update_writes_only_changed_columns() {
        let mut mock = MockSqlExecutor::new();
        mock.expect_dialect().return_const(Dialect::Sqlite);
        mock.expect_execute()
            .withf(|sql, params| {
                sql.starts_with("UPDATE \"versions\" SET \"soft_deleted_at\" = ?")
                    && sql.ends_with("WHERE \"id\" = ?")
                    && params.len() == 2
            })
            .times(1)
            .returning(|_, _| Ok(1));
        let store = store_over(mock);

        let mut row = Row::new();
        row.insert("id".into(), "v1".into());
        row.insert("soft_deleted_at".into(), MAX_DATETIME.into());
        let mut v = Version::from_existing_data(&row);
        v.set_soft_deleted_at("2024-06-01 12:00:00");

        store.version_update(&mut v).unwrap();
        assert!(!v.is_dirty());

        // Baseline was reset, so a second update is a no-op.
        store.version_update(&mut v).unwrap();
    }

    #[test]
    fn test_backend_errors_are_propagated() {
        let mut mock = MockSqlExecutor::new();
        mock.expect_dialect().return_const(Dialect::Sqlite);
        mock.expect_query()
            .returning(|_, _| Err(StoreError::connection("connection reset")));
        let store = store_over(mock);

        let err = store.version_list(&VersionQuery::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DbConnectionFailed);
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_invalid_query_issues_no_statement() {
        let store = store_over(silent_executor());
        let err = store
            .version_list(&VersionQuery::new().set_limit(0))
            .unwrap_err();
        assert_eq!(err.field(), Some("limit"));

        let err = store
            .version_count(&VersionQuery::new().set_entity_id(""))
            .unwrap_err();
        assert_eq!(err.field(), Some("entity_id"));
    }

    #[test]
    fn test_count_without_rows_is_anomaly() {
        let mut mock = MockSqlExecutor::new();
        mock.expect_dialect().return_const(Dialect::Sqlite);
        mock.expect_query().times(1).returning(|_, _| Ok(Vec::new()));
        let store = store_over(mock);

        let err = store.version_count(&VersionQuery::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DbCountAnomaly);
    }

    #[test]
    fn test_count_with_garbage_value_is_anomaly() {
        let mut mock = MockSqlExecutor::new();
        mock.expect_dialect().return_const(Dialect::Sqlite);
        mock.expect_query().returning(|_, _| {
            let mut row = Row::new();
            row.insert("count".into(), "many".into());
            Ok(vec![row])
        });
        let store = store_over(mock);

        let err = store.version_count(&VersionQuery::new()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DbCountAnomaly);
    }

    #[test]
    fn test_zero_count_is_a_value() {
        let store = sqlite_store(Arc::new(FixedClock::new(start())));
        assert_eq!(store.version_count(&VersionQuery::new()).unwrap(), 0);
    }

    #[test]
    fn test_soft_delete_uses_clock_and_hides_version() {
        let clock = Arc::new(FixedClock::new(start()));
        let store = sqlite_store(clock.clone());

        let mut v = webpage("1", "content1");
        store.version_create(&mut v).unwrap();

        clock.advance(chrono::Duration::minutes(5));
        store.version_soft_delete(&mut v).unwrap();
        assert_eq!(v.soft_deleted_at(), "2024-06-01 12:05:00");

        assert!(store.version_find_by_id(v.id()).unwrap().is_none());

        let all = store
            .version_list(
                &VersionQuery::new()
                    .set_id(v.id())
                    .set_soft_deleted_included(true)
                    .set_limit(1),
            )
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].soft_deleted_at(), "2024-06-01 12:05:00");
    }

    #[test]
    fn test_future_soft_delete_stays_visible_until_reached() {
        let clock = Arc::new(FixedClock::new(start()));
        let store = sqlite_store(clock.clone());

        let mut v = webpage("1", "content1");
        store.version_create(&mut v).unwrap();
        v.set_soft_deleted_at("2024-06-01 13:00:00");
        store.version_update(&mut v).unwrap();

        assert!(store.version_find_by_id(v.id()).unwrap().is_some());
        clock.advance(chrono::Duration::hours(2));
        assert!(store.version_find_by_id(v.id()).unwrap().is_none());
    }

    #[test]
    fn test_soft_delete_by_unknown_id_fails() {
        let store = sqlite_store(Arc::new(FixedClock::new(start())));
        let err = store.version_soft_delete_by_id("missing").unwrap_err();
        assert_eq!(err.code(), ErrorCode::VerNotFound);
        assert!(store.version_soft_delete_by_id("").unwrap_err().is_validation());
    }

    #[test]
    fn test_delete_missing_id_is_not_an_error() {
        let store = sqlite_store(Arc::new(FixedClock::new(start())));
        store.version_delete_by_id("never-existed").unwrap();
        assert!(store.version_delete_by_id("").unwrap_err().is_validation());
    }

    #[test]
    fn test_revision_required_when_enabled() {
        let executor = Arc::new(SqliteExecutor::in_memory().unwrap());
        let store =
            SqlVersionStore::new(StoreConfig::new("versions").with_revisions(true), executor)
                .unwrap();

        let mut missing = webpage("1", "a");
        let err = store.version_create(&mut missing).unwrap_err();
        assert_eq!(err.field(), Some("revision"));

        let mut zero = webpage("1", "a").with_revision(0);
        assert!(store.version_create(&mut zero).unwrap_err().is_validation());

        let mut ok = webpage("1", "a").with_revision(3);
        store.version_create(&mut ok).unwrap();
        let found = store.version_find_by_id(ok.id()).unwrap().unwrap();
        assert_eq!(found.revision(), Some(3));
    }

    #[test]
    fn test_revision_ignored_when_disabled() {
        let store = sqlite_store(Arc::new(FixedClock::new(start())));
        let mut v = webpage("1", "a").with_revision(7);
        store.version_create(&mut v).unwrap();

        let found = store.version_find_by_id(v.id()).unwrap().unwrap();
        assert!(found.revision().is_none());
    }

    #[test]
    fn test_enable_debug_toggles_flag() {
        let store = store_over(silent_executor());
        assert!(!store.is_debug_enabled());
        store.enable_debug(true);
        assert!(store.is_debug_enabled());
    }
}
