//! Checklist validation: turns a raw form into a typed record or the full,
//! ordered list of problems to show the inspector.

use std::collections::HashSet;

use validator::{Validate, ValidationErrors};

use crate::models::inspection::{
    parse_optional_date, parse_optional_reading, InspectionForm, InspectionRecord,
};

pub const CALIBRATION_DATE_MESSAGE: &str = "Calibration due date must follow YYYY-MM-DD format.";
pub const TEMPERATURE_MESSAGE: &str = "Temperature must be recorded as a number (e.g. 4.5).";
pub const PRESSURE_MESSAGE: &str = "Pressure must be recorded as a number (e.g. 101.3).";
pub const FOLLOW_UP_MESSAGE: &str =
    "Provide follow-up actions when follow-up is marked as required.";

/// Required text fields and their display labels, in reporting order
const REQUIRED_FIELDS: [(&str, &str); 4] = [
    ("facility_name", "Facility name"),
    ("nurse_name", "Inspector name"),
    ("machine_id", "Equipment ID"),
    ("room_location", "Location"),
];

/// Field-level rules after the required text checks, in reporting order
const FORMAT_RULES: [(&str, &str, &str); 3] = [
    ("calibration_due_date", "date_format", CALIBRATION_DATE_MESSAGE),
    ("temperature_celsius", "number_format", TEMPERATURE_MESSAGE),
    ("pressure_kpa", "number_format", PRESSURE_MESSAGE),
];

const FOLLOW_UP_CODE: &str = "follow_up_actions_required";

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Flatten validator output into display messages in rule order.
fn messages(errors: &ValidationErrors) -> Vec<String> {
    let failed: HashSet<(String, String)> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter()
                .map(move |e| (field.clone(), e.code.to_string()))
        })
        .collect();

    let mut out = Vec::new();
    for (field, label) in REQUIRED_FIELDS {
        if failed.contains(&(field.to_string(), "required".to_string())) {
            out.push(format!("{} is required.", label));
        }
    }
    for (field, code, message) in FORMAT_RULES {
        if failed.contains(&(field.to_string(), code.to_string())) {
            out.push(message.to_string());
        }
    }
    if failed.iter().any(|(_, code)| code == FOLLOW_UP_CODE) {
        out.push(FOLLOW_UP_MESSAGE.to_string());
    }
    out
}

/// Validate a raw form.
///
/// Every rule is evaluated; on failure the returned list holds one message
/// per violated rule. Pure: no I/O and no clock access.
pub fn validate_inspection(
    form: &InspectionForm,
    user_email: Option<&str>,
) -> Result<InspectionRecord, Vec<String>> {
    if let Err(errors) = form.validate() {
        return Err(messages(&errors));
    }

    let calibration_due_date = parse_optional_date(&form.calibration_due_date)
        .map_err(|_| vec![CALIBRATION_DATE_MESSAGE.to_string()])?;
    let temperature_celsius = parse_optional_reading(&form.temperature_celsius)
        .map_err(|_| vec![TEMPERATURE_MESSAGE.to_string()])?;
    let pressure_kpa = parse_optional_reading(&form.pressure_kpa)
        .map_err(|_| vec![PRESSURE_MESSAGE.to_string()])?;

    Ok(InspectionRecord {
        inspection_date: form.inspection_date,
        facility_name: form.facility_name.trim().to_string(),
        nurse_name: form.nurse_name.trim().to_string(),
        machine_type: form.machine_type,
        machine_id: form.machine_id.trim().to_string(),
        room_location: form.room_location.trim().to_string(),
        power_status: form.power_status,
        alarms_functional: form.alarms_functional,
        calibration_due_date,
        calibration_confirmed: form.calibration_confirmed,
        temperature_celsius,
        pressure_kpa,
        cleaning_status: form.cleaning_status,
        issues_noted: non_blank(&form.issues_noted),
        follow_up_required: form.follow_up_required,
        follow_up_actions: non_blank(&form.follow_up_actions),
        user_email: user_email.and_then(non_blank),
    })
}
