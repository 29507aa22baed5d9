//! Business logic services

pub mod identity;
pub mod inspections;
pub mod validation;

use crate::{config::InspectionsConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub inspections: inspections::InspectionsService,
    pub identity: identity::IdentityService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        inspections_config: InspectionsConfig,
        identity: identity::IdentityService,
    ) -> Self {
        Self {
            inspections: inspections::InspectionsService::new(repository, inspections_config),
            identity,
        }
    }
}
