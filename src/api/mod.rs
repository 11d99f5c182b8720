pub mod dto;
pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use chrono::Duration;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    config::{Config, SensorInfo},
    reports::ReportService,
    store::{NoteStore, ReadingStore},
};
use handlers::ApiDoc;

/// Shared per-request context: the store boundaries, the report service built
/// on top of them, and the injected deployment configuration.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReadingStore>,
    pub notes: Arc<dyn NoteStore>,
    pub reports: ReportService,
    pub topology: Arc<Vec<SensorInfo>>,
    pub liveness_window: Duration,
    pub fleet_freshness: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ReadingStore>,
        notes: Arc<dyn NoteStore>,
        config: &Config,
    ) -> Self {
        Self {
            reports: ReportService::new(store.clone()),
            store,
            notes,
            topology: Arc::new(config.topology.clone()),
            liveness_window: config.liveness_window(),
            fleet_freshness: config.fleet_freshness(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/sensors", get(handlers::get_sensors))
        .route("/floors/{floor}/sensors", get(handlers::get_sensors_by_floor))
        .route("/sensors/{sensor_id}", get(handlers::get_sensor))
        .route("/sensors/{sensor_id}/latest", get(handlers::get_sensor_latest))
        .route(
            "/sensors/{sensor_id}/monthly",
            get(handlers::get_monthly_averages),
        )
        .route(
            "/sensors/{sensor_id}/notes",
            get(handlers::get_notes).post(handlers::add_note),
        )
        .route(
            "/sensors/{sensor_id}/notes/{note_id}",
            delete(handlers::delete_note),
        )
        .route("/fleet/health", get(handlers::get_fleet_health))
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/reports/generate", post(handlers::generate_report))
        .with_state(state)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
}
