//! JSON HTTP API over the hospital store.
//!
//! Handlers validate request shape, call one store operation and render the
//! result. All business rules live in the store and allocation engine.

pub mod alerts;
pub mod beds;
pub mod dashboard;
pub mod health;
pub mod patients;

use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::metrics::AppMetrics;
use crate::store::HospitalData;

/// State shared by every route.
pub struct AppState {
    pub hospital: Arc<HospitalData>,
    pub metrics: Arc<AppMetrics>,
}

pub type SharedState = Arc<AppState>;

/// Error half of every handler result: a status and `{"error": ...}` body.
pub type ApiError = (StatusCode, Json<Value>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

pub(crate) fn not_found(what: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, format!("{} not found", what))
}

/// Unwrap a JSON body, turning axum's rejection into the `{"error": ...}`
/// shape. Malformed or mistyped bodies are `400`; a missing JSON content
/// type keeps axum's `415`.
pub(crate) fn parse_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(rejection)) => {
            Err(api_error(rejection.status(), rejection.body_text()))
        }
        Err(rejection) => Err(api_error(StatusCode::BAD_REQUEST, rejection.body_text())),
    }
}

/// Assemble the full router.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(dashboard::metrics))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/patients", get(patients::list_patients).post(patients::create_patient))
        .route("/patients/critical", get(patients::critical_patients))
        .route("/patients/requiring-icu", get(patients::patients_requiring_icu))
        .route("/patients/unallocated", get(patients::unallocated_patients))
        .route(
            "/patients/:id",
            get(patients::get_patient)
                .put(patients::update_patient)
                .delete(patients::delete_patient),
        )
        .route("/patients/:id/vitals", patch(patients::update_vitals))
        .route("/patients/:id/eligible-beds", get(patients::eligible_beds))
        .route("/beds", get(beds::list_beds).post(beds::create_bed))
        .route("/beds/available", get(beds::available_beds))
        .route("/beds/available-icu", get(beds::available_icu_beds))
        .route("/beds/sanitation-overdue", get(beds::sanitation_overdue_beds))
        .route(
            "/beds/:id",
            get(beds::get_bed).put(beds::update_bed).delete(beds::delete_bed),
        )
        .route("/beds/:id/allocate", post(beds::allocate_bed))
        .route("/beds/:id/deallocate", post(beds::deallocate_bed))
        .route("/beds/:id/sanitize", post(beds::sanitize_bed))
        .route("/alerts", get(alerts::list_alerts))
        .route("/alerts/:id/read", post(alerts::mark_alert_read))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
