//! Inspection checklist model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::enums::{CleaningStatus, MachineType, PowerStatus};

/// Columns written by an insert, in table order. `submitted_at` is assigned
/// by the store and is never part of this list.
pub const INSERT_COLUMNS: [&str; 17] = [
    "inspection_date",
    "facility_name",
    "nurse_name",
    "machine_type",
    "machine_id",
    "room_location",
    "power_status",
    "alarms_functional",
    "calibration_due_date",
    "calibration_confirmed",
    "temperature_celsius",
    "pressure_kpa",
    "cleaning_status",
    "issues_noted",
    "follow_up_required",
    "follow_up_actions",
    "user_email",
];

/// Columns returned by the recent submissions read
pub const RECENT_COLUMNS: [&str; 8] = [
    "inspection_date",
    "facility_name",
    "machine_type",
    "machine_id",
    "power_status",
    "follow_up_required",
    "submitted_at",
    "user_email",
];

fn default_true() -> bool {
    true
}

/// Raw checklist as entered on the form.
///
/// Free-text fields arrive untrimmed; optional readings arrive as text and
/// are coerced during validation.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_follow_up", skip_on_field_errors = false))]
pub struct InspectionForm {
    pub inspection_date: NaiveDate,
    #[serde(default)]
    #[validate(custom(function = "validate_required_text"))]
    pub facility_name: String,
    /// Inspector name
    #[serde(default)]
    #[validate(custom(function = "validate_required_text"))]
    pub nurse_name: String,
    pub machine_type: MachineType,
    #[serde(default)]
    #[validate(custom(function = "validate_required_text"))]
    pub machine_id: String,
    #[serde(default)]
    #[validate(custom(function = "validate_required_text"))]
    pub room_location: String,
    pub power_status: PowerStatus,
    #[serde(default = "default_true")]
    pub alarms_functional: bool,
    /// Next calibration due date (YYYY-MM-DD), blank if not recorded
    #[serde(default)]
    #[validate(custom(function = "validate_calibration_due"))]
    pub calibration_due_date: String,
    #[serde(default = "default_true")]
    pub calibration_confirmed: bool,
    /// Operating temperature in Celsius, blank if not applicable
    #[serde(default)]
    #[validate(custom(function = "validate_reading"))]
    pub temperature_celsius: String,
    /// Operating pressure in kPa, blank if not applicable
    #[serde(default)]
    #[validate(custom(function = "validate_reading"))]
    pub pressure_kpa: String,
    pub cleaning_status: CleaningStatus,
    #[serde(default)]
    pub issues_noted: String,
    #[serde(default)]
    pub follow_up_required: bool,
    #[serde(default)]
    pub follow_up_actions: String,
}

fn validate_required_text(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

fn validate_calibration_due(value: &str) -> Result<(), ValidationError> {
    parse_optional_date(value).map(|_| ())
}

fn validate_reading(value: &str) -> Result<(), ValidationError> {
    parse_optional_reading(value).map(|_| ())
}

fn validate_follow_up(form: &InspectionForm) -> Result<(), ValidationError> {
    if form.follow_up_required && form.follow_up_actions.trim().is_empty() {
        return Err(ValidationError::new("follow_up_actions_required"));
    }
    Ok(())
}

/// Parse an optional `YYYY-MM-DD` calendar date. Blank input is `None`.
pub fn parse_optional_date(value: &str) -> Result<Option<NaiveDate>, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let bytes = value.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(ValidationError::new("date_format"));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ValidationError::new("date_format"))
}

/// Parse an optional real-valued reading. Blank input is `None`.
pub fn parse_optional_reading(value: &str) -> Result<Option<f64>, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let bytes = value.as_bytes();
    let grouped = bytes.iter().enumerate().all(|(i, b)| {
        *b != b'_'
            || (i > 0
                && bytes[i - 1].is_ascii_digit()
                && bytes.get(i + 1).is_some_and(u8::is_ascii_digit))
    });
    if !grouped {
        return Err(ValidationError::new("number_format"));
    }
    // Digit group separators such as `1_000`
    match value.replace('_', "").parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(Some(number)),
        _ => Err(ValidationError::new("number_format")),
    }
}

/// Validated inspection ready to be written. Never mutated after validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct InspectionRecord {
    pub inspection_date: NaiveDate,
    pub facility_name: String,
    pub nurse_name: String,
    pub machine_type: MachineType,
    pub machine_id: String,
    pub room_location: String,
    pub power_status: PowerStatus,
    pub alarms_functional: bool,
    pub calibration_due_date: Option<NaiveDate>,
    pub calibration_confirmed: bool,
    pub temperature_celsius: Option<f64>,
    pub pressure_kpa: Option<f64>,
    pub cleaning_status: CleaningStatus,
    pub issues_noted: Option<String>,
    pub follow_up_required: bool,
    pub follow_up_actions: Option<String>,
    /// Submitter email, resolved best-effort
    pub user_email: Option<String>,
}

/// Named statement parameter. Every value travels as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementParameter {
    pub name: &'static str,
    pub value: String,
}

fn bool_literal(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

impl InspectionRecord {
    /// Canonical insert parameters in `INSERT_COLUMNS` order.
    ///
    /// Booleans become lowercase `true`/`false`, readings and dates become
    /// text, and absent optionals become the empty string.
    pub fn to_parameters(&self) -> Vec<StatementParameter> {
        let values = [
            self.inspection_date.format("%Y-%m-%d").to_string(),
            self.facility_name.clone(),
            self.nurse_name.clone(),
            self.machine_type.as_str().to_string(),
            self.machine_id.clone(),
            self.room_location.clone(),
            self.power_status.as_str().to_string(),
            bool_literal(self.alarms_functional),
            self.calibration_due_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            bool_literal(self.calibration_confirmed),
            self.temperature_celsius.map(|t| t.to_string()).unwrap_or_default(),
            self.pressure_kpa.map(|p| p.to_string()).unwrap_or_default(),
            self.cleaning_status.as_str().to_string(),
            self.issues_noted.clone().unwrap_or_default(),
            bool_literal(self.follow_up_required),
            self.follow_up_actions.clone().unwrap_or_default(),
            self.user_email.clone().unwrap_or_default(),
        ];

        INSERT_COLUMNS
            .into_iter()
            .zip(values)
            .map(|(name, value)| StatementParameter { name, value })
            .collect()
    }
}

/// Projection shown in the recent submissions list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RecentSubmission {
    pub inspection_date: Option<NaiveDate>,
    pub facility_name: Option<String>,
    pub machine_type: Option<String>,
    pub machine_id: Option<String>,
    pub power_status: Option<String>,
    pub follow_up_required: Option<bool>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub user_email: Option<String>,
}

/// Outcome of a recent submissions read
#[derive(Debug, Clone, PartialEq)]
pub enum RecentSubmissions {
    Rows(Vec<RecentSubmission>),
    /// The store answered with zero rows
    Empty,
    /// The store could not be read
    Unavailable,
}

impl RecentSubmissions {
    pub fn from_rows(rows: Vec<RecentSubmission>) -> Self {
        if rows.is_empty() {
            RecentSubmissions::Empty
        } else {
            RecentSubmissions::Rows(rows)
        }
    }
}
