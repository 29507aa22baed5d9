//! SQL warehouse backend built on the statement execution REST API.
//!
//! Statements are submitted with a short server-side wait. A statement that
//! is still pending or running after that wait is polled at a fixed interval
//! until it reaches a terminal state or the poll budget runs out.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{InspectionStore, TableRef};
use crate::{
    config::WarehouseConfig,
    error::{AppError, AppResult},
    models::inspection::{
        InspectionRecord, RecentSubmission, StatementParameter, INSERT_COLUMNS, RECENT_COLUMNS,
    },
};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatementRequest {
    pub statement: String,
    pub warehouse_id: String,
    pub catalog: String,
    pub schema: String,
    pub parameters: Vec<StatementParameter>,
    pub wait_timeout: String,
    pub on_wait_timeout: String,
    pub disposition: String,
    pub format: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
    Closed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceError {
    pub error_code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatementStatus {
    pub state: StatementState,
    pub error: Option<ServiceError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultSchema {
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultManifest {
    pub schema: Option<ResultSchema>,
    pub total_row_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultData {
    pub data_array: Option<Vec<Vec<Option<String>>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatementResponse {
    pub statement_id: String,
    pub status: Option<StatementStatus>,
    pub manifest: Option<ResultManifest>,
    pub result: Option<ResultData>,
}

impl StatementResponse {
    fn state(&self) -> StatementState {
        self.status
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(StatementState::Unknown)
    }

    fn error_message(&self) -> String {
        self.status
            .as_ref()
            .and_then(|s| s.error.as_ref())
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| "SQL execution failed".to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScimEmail {
    pub value: Option<String>,
    pub primary: Option<bool>,
}

/// Subset of the workspace SCIM `Me` document
#[derive(Debug, Clone, Deserialize)]
pub struct ScimUser {
    #[serde(rename = "userName")]
    pub user_name: Option<String>,
    #[serde(default)]
    pub emails: Vec<ScimEmail>,
}

impl ScimUser {
    /// Primary (or unflagged) email first, then any email, then the user name
    pub fn best_email(&self) -> Option<String> {
        let with_value = || self.emails.iter().filter(|e| e.value.is_some());
        with_value()
            .find(|e| e.primary.unwrap_or(true))
            .or_else(|| with_value().next())
            .and_then(|e| e.value.clone())
            .or_else(|| self.user_name.clone())
            .filter(|v| !v.trim().is_empty())
    }
}

/// Terminal view of a statement after polling
#[derive(Debug)]
pub enum StatementOutcome {
    Succeeded(StatementResponse),
    Failed(String),
    /// Poll budget exhausted; carries the statement id
    StillRunning(String),
}

// ---------------------------------------------------------------------------
// REST client
// ---------------------------------------------------------------------------

/// Calls made against the workspace REST API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WarehouseApi: Send + Sync {
    async fn submit(&self, request: &StatementRequest) -> AppResult<StatementResponse>;
    async fn get_statement(&self, statement_id: &str) -> AppResult<StatementResponse>;
    async fn get_result_chunk(&self, statement_id: &str, chunk_index: u32) -> AppResult<ResultData>;
    async fn current_user(&self) -> AppResult<ScimUser>;
}

/// Long-lived HTTP handle to the workspace, built once at startup
#[derive(Clone)]
pub struct HttpWarehouseApi {
    client: reqwest::Client,
    host: String,
    headers: HeaderMap,
}

impl HttpWarehouseApi {
    pub fn new(config: &WarehouseConfig) -> AppResult<Self> {
        let host = config.host.trim().trim_end_matches('/').to_string();
        if host.is_empty() {
            return Err(AppError::Configuration(
                "Missing workspace host. Set DATABRICKS_HOST before starting the server.".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| AppError::Configuration(format!("Invalid token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, host, headers })
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ServiceError>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or(body);
        Err(AppError::Store(format!("{}: {}", status, message)))
    }
}

#[async_trait]
impl WarehouseApi for HttpWarehouseApi {
    async fn submit(&self, request: &StatementRequest) -> AppResult<StatementResponse> {
        let response = self
            .client
            .post(format!("{}/api/2.0/sql/statements/", self.host))
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn get_statement(&self, statement_id: &str) -> AppResult<StatementResponse> {
        let response = self
            .client
            .get(format!("{}/api/2.0/sql/statements/{}", self.host, statement_id))
            .headers(self.headers.clone())
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn get_result_chunk(&self, statement_id: &str, chunk_index: u32) -> AppResult<ResultData> {
        let response = self
            .client
            .get(format!(
                "{}/api/2.0/sql/statements/{}/result/chunks/{}",
                self.host, statement_id, chunk_index
            ))
            .headers(self.headers.clone())
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn current_user(&self) -> AppResult<ScimUser> {
        let response = self
            .client
            .get(format!("{}/api/2.0/preview/scim/v2/Me", self.host))
            .headers(self.headers.clone())
            .send()
            .await?;
        Self::read_json(response).await
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct WarehouseStore {
    api: Arc<dyn WarehouseApi>,
    warehouse_id: String,
    table: TableRef,
    wait_timeout_secs: u64,
    poll_interval: Duration,
    max_polls: u32,
}

impl WarehouseStore {
    pub fn new(api: Arc<dyn WarehouseApi>, config: &WarehouseConfig, table: TableRef) -> AppResult<Self> {
        let warehouse_id = config.warehouse_id().ok_or_else(|| {
            AppError::Configuration(
                "Missing SQL warehouse URL. Set DATABRICKS_WAREHOUSE_HTTP_PATH before starting the server."
                    .to_string(),
            )
        })?;
        if !matches!(config.wait_timeout_secs, 0 | 5..=50) {
            return Err(AppError::Configuration(format!(
                "Invalid warehouse wait timeout {}s; use 0 or between 5 and 50 seconds.",
                config.wait_timeout_secs
            )));
        }

        Ok(Self {
            api,
            warehouse_id: warehouse_id.to_string(),
            table,
            wait_timeout_secs: config.wait_timeout_secs,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_polls: config.max_polls,
        })
    }

    fn request(&self, statement: String, parameters: Vec<StatementParameter>) -> StatementRequest {
        StatementRequest {
            statement,
            warehouse_id: self.warehouse_id.clone(),
            catalog: self.table.catalog.clone(),
            schema: self.table.schema.clone(),
            parameters,
            wait_timeout: format!("{}s", self.wait_timeout_secs),
            on_wait_timeout: "CONTINUE".to_string(),
            disposition: "INLINE".to_string(),
            format: "JSON_ARRAY".to_string(),
        }
    }

    /// Poll a submitted statement until it is terminal or the budget is spent
    #[instrument(name = "warehouse_await_statement", skip_all, fields(statement_id = %response.statement_id))]
    pub async fn await_statement(&self, mut response: StatementResponse) -> AppResult<StatementOutcome> {
        let mut polls = 0;
        loop {
            match response.state() {
                StatementState::Succeeded => return Ok(StatementOutcome::Succeeded(response)),
                StatementState::Pending | StatementState::Running => {}
                _ => return Ok(StatementOutcome::Failed(response.error_message())),
            }
            if polls >= self.max_polls {
                return Ok(StatementOutcome::StillRunning(response.statement_id));
            }
            polls += 1;
            tokio::time::sleep(self.poll_interval).await;
            tracing::debug!(poll = polls, "Statement not finished, polling");
            response = self.api.get_statement(&response.statement_id).await?;
        }
    }

    /// Submit one statement and wait for it to succeed
    pub async fn execute(
        &self,
        statement: String,
        parameters: Vec<StatementParameter>,
    ) -> AppResult<StatementResponse> {
        let submitted = self.api.submit(&self.request(statement, parameters)).await?;
        match self.await_statement(submitted).await? {
            StatementOutcome::Succeeded(response) => Ok(response),
            StatementOutcome::Failed(message) => Err(AppError::Store(message)),
            StatementOutcome::StillRunning(id) => Err(AppError::Store(format!(
                "Statement {} still running after {} polls",
                id, self.max_polls
            ))),
        }
    }

    fn insert_sql(&self) -> String {
        let values: Vec<String> = INSERT_COLUMNS
            .iter()
            .map(|column| match *column {
                "inspection_date" => "to_date(:inspection_date)".to_string(),
                "alarms_functional" | "calibration_confirmed" | "follow_up_required" => {
                    format!("CASE WHEN lower(:{c}) = 'true' THEN TRUE ELSE FALSE END", c = column)
                }
                "calibration_due_date" => "CASE WHEN :calibration_due_date = '' THEN NULL \
                     ELSE to_date(:calibration_due_date) END"
                    .to_string(),
                "temperature_celsius" | "pressure_kpa" => {
                    format!("TRY_CAST(NULLIF(:{}, '') AS DOUBLE)", column)
                }
                other => format!(":{}", other),
            })
            .collect();

        format!(
            "INSERT INTO {} ({}, submitted_at) VALUES ({}, current_timestamp())",
            self.table.warehouse_table(),
            INSERT_COLUMNS.join(", "),
            values.join(", ")
        )
    }

    fn recent_sql(&self, limit: u32) -> String {
        format!(
            "SELECT {} FROM {} ORDER BY submitted_at DESC LIMIT {}",
            RECENT_COLUMNS.join(", "),
            self.table.warehouse_table(),
            limit
        )
    }

    async fn result_rows(&self, response: &StatementResponse) -> AppResult<Vec<Vec<Option<String>>>> {
        if let Some(rows) = response.result.as_ref().and_then(|r| r.data_array.clone()) {
            return Ok(rows);
        }
        let total = response.manifest.as_ref().and_then(|m| m.total_row_count);
        if total == Some(0) {
            return Ok(Vec::new());
        }
        let chunk = self.api.get_result_chunk(&response.statement_id, 0).await?;
        Ok(chunk.data_array.unwrap_or_default())
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Map JSON_ARRAY rows onto the recent submissions projection by column name
fn to_submissions(columns: &[ColumnInfo], rows: Vec<Vec<Option<String>>>) -> Vec<RecentSubmission> {
    let index: HashMap<&str, usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.as_str(), i))
        .collect();

    rows.into_iter()
        .map(|row| {
            let cell = |name: &str| -> Option<String> {
                index.get(name).and_then(|&i| row.get(i).cloned().flatten())
            };
            RecentSubmission {
                inspection_date: cell("inspection_date")
                    .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
                facility_name: cell("facility_name"),
                machine_type: cell("machine_type"),
                machine_id: cell("machine_id"),
                power_status: cell("power_status"),
                follow_up_required: cell("follow_up_required")
                    .map(|v| v.eq_ignore_ascii_case("true")),
                submitted_at: cell("submitted_at").and_then(|ts| parse_timestamp(&ts)),
                user_email: cell("user_email"),
            }
        })
        .collect()
}

#[async_trait]
impl InspectionStore for WarehouseStore {
    fn backend(&self) -> &'static str {
        "warehouse"
    }

    async fn insert(&self, record: &InspectionRecord) -> AppResult<()> {
        self.execute(self.insert_sql(), record.to_parameters()).await?;
        Ok(())
    }

    async fn fetch_recent(&self, limit: u32) -> AppResult<Vec<RecentSubmission>> {
        let response = self.execute(self.recent_sql(limit), Vec::new()).await?;
        let columns = response
            .manifest
            .as_ref()
            .and_then(|m| m.schema.as_ref())
            .map(|s| s.columns.clone())
            .unwrap_or_default();
        let rows = self.result_rows(&response).await?;
        Ok(to_submissions(&columns, rows))
    }

    async fn provision(&self) -> AppResult<()> {
        self.execute(
            format!("CREATE SCHEMA IF NOT EXISTS {}", self.table.warehouse_schema()),
            Vec::new(),
        )
        .await?;

        let table = self.table.warehouse_table();
        self.execute(
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    inspection_date DATE COMMENT 'Date the routine inspection took place',
                    facility_name STRING COMMENT 'Facility or donor centre where the equipment resides',
                    nurse_name STRING COMMENT 'Nurse or technician performing the inspection',
                    machine_type STRING COMMENT 'Type of device or instrument inspected',
                    machine_id STRING COMMENT 'Unique identifier or serial number for the device',
                    room_location STRING COMMENT 'Location of the equipment within the facility',
                    power_status STRING COMMENT 'Power supply check result',
                    alarms_functional BOOLEAN COMMENT 'Whether alarms passed functional testing',
                    calibration_due_date DATE COMMENT 'Next calibration due date noted on the device',
                    calibration_confirmed BOOLEAN COMMENT 'Whether calibration records were verified',
                    temperature_celsius DOUBLE COMMENT 'Operating temperature in Celsius',
                    pressure_kpa DOUBLE COMMENT 'Operating pressure in kilopascals',
                    cleaning_status STRING COMMENT 'Cleanliness and disinfection status',
                    issues_noted STRING COMMENT 'Issues or observations captured during the inspection',
                    follow_up_required BOOLEAN COMMENT 'Whether follow-up action is required',
                    follow_up_actions STRING COMMENT 'Planned follow-up actions or responsible parties',
                    user_email STRING COMMENT 'Email address of the submitting user',
                    submitted_at TIMESTAMP COMMENT 'Time the submission was stored'
                )
                USING DELTA
                COMMENT 'Routine equipment inspection submissions.'
                TBLPROPERTIES (
                    delta.autoOptimize.optimizeWrite = true,
                    delta.autoOptimize.autoCompact = true
                )
                "#,
                table
            ),
            Vec::new(),
        )
        .await?;

        tracing::info!("Verified table exists: {}", table);
        Ok(())
    }
}
