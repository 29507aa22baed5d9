//! API handlers for the checklist REST endpoints

pub mod health;
pub mod inspections;
pub mod openapi;

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{services::identity::FORWARDED_EMAIL_HEADER, AppState};

/// Submitter email for the current request, if one could be resolved
pub struct Submitter(pub Option<String>);

#[async_trait]
impl FromRequestParts<AppState> for Submitter {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get(FORWARDED_EMAIL_HEADER)
            .and_then(|value| value.to_str().ok());

        Ok(Submitter(state.services.identity.resolve(forwarded)))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/inspections", post(inspections::create_inspection))
        .route("/inspections/options", get(inspections::form_options))
        .route("/inspections/recent", get(inspections::recent_inspections))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
