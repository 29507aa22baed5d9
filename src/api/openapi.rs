//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::{health, inspections};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Equipment Checks API",
        version = "0.1.0",
        description = "Equipment inspection checklist REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Inspections
        inspections::form_options,
        inspections::create_inspection,
        inspections::recent_inspections,
    ),
    components(
        schemas(
            // Inspections
            crate::models::enums::MachineType,
            crate::models::enums::PowerStatus,
            crate::models::enums::CleaningStatus,
            crate::models::inspection::InspectionForm,
            crate::models::inspection::InspectionRecord,
            crate::models::inspection::RecentSubmission,
            inspections::FormOptions,
            inspections::FormDefaults,
            inspections::RecentStatus,
            inspections::RecentSubmissionsResponse,
            // Health
            health::HealthResponse,
            health::ReadinessResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "inspections", description = "Equipment inspection checklists")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
