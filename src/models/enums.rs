//! Fixed option sets offered by the inspection checklist

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// MachineType
// ---------------------------------------------------------------------------

/// Machine or instrument being inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum MachineType {
    #[serde(rename = "Apheresis Machine")]
    ApheresisMachine,
    #[serde(rename = "Blood Fridge")]
    BloodFridge,
    #[serde(rename = "Blood Pressure Monitor")]
    BloodPressureMonitor,
    Centrifuge,
    Defibrillator,
    #[serde(rename = "Infusion Pump")]
    InfusionPump,
    Scale,
    Other,
}

impl MachineType {
    pub const ALL: [MachineType; 8] = [
        MachineType::ApheresisMachine,
        MachineType::BloodFridge,
        MachineType::BloodPressureMonitor,
        MachineType::Centrifuge,
        MachineType::Defibrillator,
        MachineType::InfusionPump,
        MachineType::Scale,
        MachineType::Other,
    ];

    /// Label stored in the `machine_type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineType::ApheresisMachine => "Apheresis Machine",
            MachineType::BloodFridge => "Blood Fridge",
            MachineType::BloodPressureMonitor => "Blood Pressure Monitor",
            MachineType::Centrifuge => "Centrifuge",
            MachineType::Defibrillator => "Defibrillator",
            MachineType::InfusionPump => "Infusion Pump",
            MachineType::Scale => "Scale",
            MachineType::Other => "Other",
        }
    }
}

impl std::fmt::Display for MachineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PowerStatus
// ---------------------------------------------------------------------------

/// Power supply check result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PowerStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Needs Attention")]
    NeedsAttention,
    #[serde(rename = "Out of Service")]
    OutOfService,
}

impl PowerStatus {
    pub const ALL: [PowerStatus; 3] = [
        PowerStatus::Ok,
        PowerStatus::NeedsAttention,
        PowerStatus::OutOfService,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerStatus::Ok => "OK",
            PowerStatus::NeedsAttention => "Needs Attention",
            PowerStatus::OutOfService => "Out of Service",
        }
    }
}

impl std::fmt::Display for PowerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CleaningStatus
// ---------------------------------------------------------------------------

/// Cleanliness and disinfection status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum CleaningStatus {
    Sanitized,
    #[serde(rename = "Needs Cleaning")]
    NeedsCleaning,
    #[serde(rename = "Not Applicable")]
    NotApplicable,
}

impl CleaningStatus {
    pub const ALL: [CleaningStatus; 3] = [
        CleaningStatus::Sanitized,
        CleaningStatus::NeedsCleaning,
        CleaningStatus::NotApplicable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CleaningStatus::Sanitized => "Sanitized",
            CleaningStatus::NeedsCleaning => "Needs Cleaning",
            CleaningStatus::NotApplicable => "Not Applicable",
        }
    }
}

impl std::fmt::Display for CleaningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
