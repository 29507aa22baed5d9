//! Repository layer: the gateway between the checklist and its store

pub mod memory;
pub mod postgres;
pub mod warehouse;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;

use crate::{
    config::{AppConfig, StoreBackend},
    error::{AppError, AppResult},
    models::inspection::{InspectionRecord, RecentSubmission, RecentSubmissions},
};

/// Three-part name of the inspections table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub catalog: String,
    pub schema: String,
    pub table: String,
}

fn backtick(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

fn double_quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

impl TableRef {
    pub fn new(catalog: &str, schema: &str, table: &str) -> Self {
        Self {
            catalog: catalog.to_string(),
            schema: schema.to_string(),
            table: table.to_string(),
        }
    }

    /// `catalog`.`schema` for warehouse SQL
    pub fn warehouse_schema(&self) -> String {
        format!("{}.{}", backtick(&self.catalog), backtick(&self.schema))
    }

    /// `catalog`.`schema`.`table` for warehouse SQL
    pub fn warehouse_table(&self) -> String {
        format!("{}.{}", self.warehouse_schema(), backtick(&self.table))
    }

    /// "schema"."table" for Postgres; the catalog is the connected database
    pub fn postgres_table(&self) -> String {
        format!("{}.{}", double_quote(&self.schema), double_quote(&self.table))
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.catalog, self.schema, self.table)
    }
}

/// Backend holding the inspections table.
///
/// Implementations bind every free-text and enum value as a parameter and
/// let the store assign `submitted_at`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InspectionStore: Send + Sync {
    /// Short backend name for logs
    fn backend(&self) -> &'static str;

    /// Write one validated record
    async fn insert(&self, record: &InspectionRecord) -> AppResult<()>;

    /// Newest rows first, at most `limit`
    async fn fetch_recent(&self, limit: u32) -> AppResult<Vec<RecentSubmission>>;

    /// Create the schema and table when missing
    async fn provision(&self) -> AppResult<()>;
}

/// Persistence gateway shared by the services
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn InspectionStore>,
}

fn failure_message(error: AppError) -> String {
    match error {
        AppError::Store(msg) | AppError::WriteFailure(msg) | AppError::Internal(msg) => msg,
        other => other.to_string(),
    }
}

impl Repository {
    /// Create a new repository over the given store
    pub fn new(store: Arc<dyn InspectionStore>) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Insert one inspection. Any store failure becomes a single
    /// `WriteFailure` carrying the underlying message; nothing is retried.
    pub async fn inspections_insert(&self, record: &InspectionRecord) -> AppResult<()> {
        self.store
            .insert(record)
            .await
            .map_err(|e| AppError::WriteFailure(failure_message(e)))
    }

    /// Read the newest inspections. Store failures degrade to `Unavailable`.
    pub async fn inspections_recent(&self, limit: u32) -> RecentSubmissions {
        match self.store.fetch_recent(limit).await {
            Ok(rows) => RecentSubmissions::from_rows(rows),
            Err(e) => {
                tracing::warn!(backend = self.store.backend(), "Recent inspections unavailable: {}", e);
                RecentSubmissions::Unavailable
            }
        }
    }

    pub async fn inspections_provision(&self) -> AppResult<()> {
        self.store.provision().await
    }
}

/// Store handles built once at process start
pub struct OpenedStore {
    pub repository: Repository,
    /// Present for the warehouse backend; also used for identity lookup
    pub warehouse_api: Option<Arc<dyn warehouse::WarehouseApi>>,
}

/// Build the configured backend and wrap it in the gateway
pub async fn open_store(config: &AppConfig) -> AppResult<OpenedStore> {
    let table = TableRef::new(&config.store.catalog, &config.store.schema, &config.store.table);

    match config.store.backend {
        StoreBackend::Warehouse => {
            let api: Arc<dyn warehouse::WarehouseApi> =
                Arc::new(warehouse::HttpWarehouseApi::new(&config.warehouse)?);
            let store = warehouse::WarehouseStore::new(api.clone(), &config.warehouse, table)?;
            Ok(OpenedStore {
                repository: Repository::new(Arc::new(store)),
                warehouse_api: Some(api),
            })
        }
        StoreBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .connect(&config.database.url)
                .await?;
            Ok(OpenedStore {
                repository: Repository::new(Arc::new(postgres::PostgresStore::new(pool, table))),
                warehouse_api: None,
            })
        }
        StoreBackend::Memory => Ok(OpenedStore {
            repository: Repository::new(Arc::new(memory::MemoryStore::new())),
            warehouse_api: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn row(facility: &str) -> RecentSubmission {
        RecentSubmission {
            inspection_date: NaiveDate::from_ymd_opt(2026, 10, 19),
            facility_name: Some(facility.to_string()),
            machine_type: Some("Scale".to_string()),
            machine_id: Some("SC-1".to_string()),
            power_status: Some("OK".to_string()),
            follow_up_required: Some(false),
            submitted_at: Some(Utc::now()),
            user_email: None,
        }
    }

    #[test]
    fn test_table_quoting() {
        let table = TableRef::new("main", "checks", "equip`ment");
        assert_eq!(table.warehouse_table(), "`main`.`checks`.`equip``ment`");
        let table = TableRef::new("main", "checks", "equipment");
        assert_eq!(table.postgres_table(), "\"checks\".\"equipment\"");
        assert_eq!(table.to_string(), "main.checks.equipment");
    }

    #[tokio::test]
    async fn test_recent_rows() {
        let mut store = MockInspectionStore::new();
        store
            .expect_fetch_recent()
            .withf(|limit| *limit == 20)
            .returning(|_| Ok(vec![row("Perth")]));
        let repo = Repository::new(Arc::new(store));
        match repo.inspections_recent(20).await {
            RecentSubmissions::Rows(rows) => assert_eq!(rows.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_recent_empty_is_not_unavailable() {
        let mut store = MockInspectionStore::new();
        store.expect_fetch_recent().returning(|_| Ok(Vec::new()));
        let repo = Repository::new(Arc::new(store));
        assert_eq!(repo.inspections_recent(5).await, RecentSubmissions::Empty);
    }

    #[tokio::test]
    async fn test_recent_failure_degrades() {
        let mut store = MockInspectionStore::new();
        store.expect_backend().return_const("mock");
        store
            .expect_fetch_recent()
            .returning(|_| Err(AppError::Store("warehouse is stopped".to_string())));
        let repo = Repository::new(Arc::new(store));
        assert_eq!(repo.inspections_recent(5).await, RecentSubmissions::Unavailable);
    }

    #[tokio::test]
    async fn test_insert_failure_keeps_message() {
        let mut store = MockInspectionStore::new();
        store
            .expect_insert()
            .times(1)
            .returning(|_| Err(AppError::Store("PERMISSION_DENIED: no MODIFY on table".to_string())));
        let repo = Repository::new(Arc::new(store));

        let record = crate::models::inspection::tests::record();
        let err = repo.inspections_insert(&record).await.unwrap_err();
        match err {
            AppError::WriteFailure(msg) => assert_eq!(msg, "PERMISSION_DENIED: no MODIFY on table"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
