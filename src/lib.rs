// src/lib.rs
use std::sync::Arc;

use actix_web::web;

pub mod config;
pub mod errors;
pub mod format;
pub mod handlers;
pub mod models;
pub mod services;
pub mod widget;

use crate::services::BackendClient;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<BackendClient>,
}

/// Registers the API and health routes. The static demo page is mounted
/// separately by the binary so tests can serve the routes alone.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api").route("/predict", web::post().to(handlers::predict)))
        .route("/health", web::get().to(handlers::health));
}
