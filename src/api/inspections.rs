//! Inspection checklist endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::{
        enums::{CleaningStatus, MachineType, PowerStatus},
        inspection::{InspectionForm, InspectionRecord, RecentSubmission, RecentSubmissions},
    },
    AppState,
};

use super::Submitter;

pub const SAVED_NOTICE: &str = "Latest inspection saved to the warehouse.";
pub const EMPTY_MESSAGE: &str = "No equipment inspections have been recorded yet.";
pub const UNRESOLVED_EMAIL_NOTICE: &str = "Unable to resolve the current user email automatically; \
     submissions will still be recorded but the email column may be empty.";

/// Toggle defaults shown on a fresh form
#[derive(Serialize, ToSchema)]
pub struct FormDefaults {
    pub alarms_functional: bool,
    pub calibration_confirmed: bool,
    pub follow_up_required: bool,
}

#[derive(Serialize, ToSchema)]
pub struct FormOptions {
    pub machine_types: Vec<MachineType>,
    pub power_statuses: Vec<PowerStatus>,
    pub cleaning_statuses: Vec<CleaningStatus>,
    pub defaults: FormDefaults,
    /// Email that will be stored with a submission
    pub user_email: Option<String>,
    pub user_notice: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentQuery {
    /// Maximum rows to return
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecentStatus {
    Rows,
    Empty,
    Unavailable,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecentSubmissionsResponse {
    pub status: RecentStatus,
    pub rows: Vec<RecentSubmission>,
    /// Informational text for the empty and unavailable states
    pub message: Option<String>,
    /// One-shot confirmation after a successful submission
    pub notice: Option<String>,
}

/// Option lists and defaults for the checklist form
#[utoipa::path(
    get,
    path = "/inspections/options",
    tag = "inspections",
    responses(
        (status = 200, description = "Form options", body = FormOptions)
    )
)]
pub async fn form_options(Submitter(user_email): Submitter) -> Json<FormOptions> {
    let user_notice = match user_email {
        Some(_) => None,
        None => Some(UNRESOLVED_EMAIL_NOTICE.to_string()),
    };

    Json(FormOptions {
        machine_types: MachineType::ALL.to_vec(),
        power_statuses: PowerStatus::ALL.to_vec(),
        cleaning_statuses: CleaningStatus::ALL.to_vec(),
        defaults: FormDefaults {
            alarms_functional: true,
            calibration_confirmed: true,
            follow_up_required: false,
        },
        user_email,
        user_notice,
    })
}

/// Submit an inspection checklist
#[utoipa::path(
    post,
    path = "/inspections",
    tag = "inspections",
    request_body = InspectionForm,
    responses(
        (status = 201, description = "Inspection recorded", body = InspectionRecord),
        (status = 400, description = "Malformed body or invalid fields, one message per rule", body = crate::error::ErrorResponse),
        (status = 502, description = "Store rejected the write", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_inspection(
    State(state): State<AppState>,
    Submitter(user_email): Submitter,
    payload: Result<Json<InspectionForm>, JsonRejection>,
) -> AppResult<(StatusCode, Json<InspectionRecord>)> {
    let Json(form) = payload?;
    let record = state
        .services
        .inspections
        .submit(&form, user_email.as_deref())
        .await?;
    state.mark_submission_saved();
    Ok((StatusCode::CREATED, Json(record)))
}

/// Most recent submissions, newest first
#[utoipa::path(
    get,
    path = "/inspections/recent",
    tag = "inspections",
    params(RecentQuery),
    responses(
        (status = 200, description = "Recent submissions", body = RecentSubmissionsResponse),
        (status = 400, description = "Malformed query", body = crate::error::ErrorResponse)
    )
)]
pub async fn recent_inspections(
    State(state): State<AppState>,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> AppResult<Json<RecentSubmissionsResponse>> {
    let Query(query) = query?;
    let notice = state
        .take_submission_saved()
        .then(|| SAVED_NOTICE.to_string());

    let (status, rows, message) = match state.services.inspections.recent(query.limit).await {
        RecentSubmissions::Rows(rows) => (RecentStatus::Rows, rows, None),
        RecentSubmissions::Empty => (RecentStatus::Empty, Vec::new(), Some(EMPTY_MESSAGE.to_string())),
        RecentSubmissions::Unavailable => (
            RecentStatus::Unavailable,
            Vec::new(),
            Some(EMPTY_MESSAGE.to_string()),
        ),
    };

    Ok(Json(RecentSubmissionsResponse {
        status,
        rows,
        message,
        notice,
    }))
}
