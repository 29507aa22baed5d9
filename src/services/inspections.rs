//! Inspection submission service

use crate::{
    config::InspectionsConfig,
    error::{AppError, AppResult},
    models::inspection::{InspectionForm, InspectionRecord, RecentSubmissions},
    repository::Repository,
};

use super::validation::validate_inspection;

#[derive(Clone)]
pub struct InspectionsService {
    repository: Repository,
    config: InspectionsConfig,
}

impl InspectionsService {
    pub fn new(repository: Repository, config: InspectionsConfig) -> Self {
        Self { repository, config }
    }

    /// Validate and persist one checklist.
    ///
    /// Validation runs before any store round-trip; a rejected form never
    /// reaches the repository. Duplicate submissions are written as-is.
    pub async fn submit(
        &self,
        form: &InspectionForm,
        user_email: Option<&str>,
    ) -> AppResult<InspectionRecord> {
        let record = validate_inspection(form, user_email).map_err(AppError::Validation)?;

        if let Err(e) = self.repository.inspections_insert(&record).await {
            tracing::error!(
                backend = self.repository.backend(),
                machine_id = %record.machine_id,
                "Failed to save inspection: {}",
                e
            );
            return Err(e);
        }

        tracing::info!(
            facility = %record.facility_name,
            machine_id = %record.machine_id,
            follow_up = record.follow_up_required,
            "Inspection recorded"
        );
        Ok(record)
    }

    /// Effective row limit for the recent list
    pub fn recent_limit(&self, requested: Option<u32>) -> u32 {
        let max = self.config.max_recent_limit.max(1);
        requested
            .unwrap_or(self.config.recent_limit)
            .clamp(1, max)
    }

    /// Most recent submissions; never fails, see `RecentSubmissions`
    pub async fn recent(&self, requested: Option<u32>) -> RecentSubmissions {
        self.repository
            .inspections_recent(self.recent_limit(requested))
            .await
    }
}
