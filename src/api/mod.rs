//! HTTP surface (spec.md §6): route table wiring handlers to `AppState`.

pub mod dto;
mod handlers;

use crate::core::app_state::AppState;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/research", post(handlers::create_job))
        .route("/api/research/config/countries", get(handlers::list_countries))
        .route("/api/research/config/languages", get(handlers::list_languages))
        .route("/api/research/:id", get(handlers::get_job).delete(handlers::delete_job))
        .route("/api/research/:id/export", get(handlers::export_job))
        .with_state(state)
}
