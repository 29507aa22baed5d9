//! Data models for inspection checklists

pub mod enums;
pub mod inspection;

// Re-export commonly used types
pub use enums::{CleaningStatus, MachineType, PowerStatus};
pub use inspection::{InspectionForm, InspectionRecord, RecentSubmission, RecentSubmissions};
