//! Dashboard counters and the Prometheus scrape endpoint.

use axum::{
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::Response,
    Json,
};

use crate::store::Census;
use super::{api_error, ApiError, SharedState};

/// `GET /dashboard`: headline counts for the front page.
pub async fn dashboard(State(state): State<SharedState>) -> Json<Census> {
    Json(state.hospital.census())
}

/// `GET /metrics`: refresh the census gauges, then render the registry.
pub async fn metrics(State(state): State<SharedState>) -> Result<Response, ApiError> {
    state.metrics.observe(&state.hospital);
    let body = state.metrics.render().map_err(|err| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", err),
        )
    })?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(Body::from(body))
        .expect("metrics response should be valid"))
}
