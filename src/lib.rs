//! Equipment inspection checklist server
//!
//! Validates inspection checklists, records them in an analytical table and
//! serves the most recent submissions over a REST JSON API.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    /// Set after a successful submission, cleared when first reported
    last_submission_saved: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: AppConfig, services: services::Services) -> Self {
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
            last_submission_saved: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn mark_submission_saved(&self) {
        self.last_submission_saved.store(true, Ordering::SeqCst);
    }

    /// Returns true once per successful submission
    pub fn take_submission_saved(&self) -> bool {
        self.last_submission_saved.swap(false, Ordering::SeqCst)
    }
}
