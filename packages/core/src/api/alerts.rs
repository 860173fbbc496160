//! Alert feed endpoints.
//!
//! Routes:
//! - `GET  /alerts`            all alerts, newest first (`?unread=true` to filter)
//! - `POST /alerts/:id/read`   mark one alert as read

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::model::Alert;
use super::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct AlertListQuery {
    pub unread: Option<bool>,
}

/// `GET /alerts`
pub async fn list_alerts(
    State(state): State<SharedState>,
    Query(params): Query<AlertListQuery>,
) -> Json<Vec<Alert>> {
    let alerts = if params.unread.unwrap_or(false) {
        state.hospital.get_unread_alerts()
    } else {
        state.hospital.get_all_alerts()
    };
    Json(alerts)
}

/// `POST /alerts/:id/read`: unknown IDs are ignored, like the store does.
pub async fn mark_alert_read(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> StatusCode {
    state.hospital.mark_alert_as_read(&id);
    StatusCode::NO_CONTENT
}
