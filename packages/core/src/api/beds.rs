//! Bed and allocation endpoints.
//!
//! Routes:
//! - `GET    /beds`                          all beds by ward, then type
//! - `POST   /beds`                          register a bed
//! - `GET    /beds/available`                empty beds within the sanitation window
//! - `GET    /beds/available-icu`            the same, ICU only
//! - `GET    /beds/sanitation-overdue`       beds past the sanitation window
//! - `GET    /beds/:id`                      one bed
//! - `PUT    /beds/:id`                      replace ward / type / last sanitized
//! - `DELETE /beds/:id`                      remove an empty bed (409 when occupied)
//! - `POST   /beds/:id/allocate`             give the bed to `{"patient_id": ...}`
//! - `POST   /beds/:id/deallocate`           vacate the bed
//! - `POST   /beds/:id/sanitize`             record a sanitation now

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::allocation::AllocationError;
use crate::model::{Bed, BedType, Patient, SanitationStatus};
use super::{api_error, not_found, parse_json, ApiError, SharedState};

/// A bed with its derived fields evaluated at response time.
#[derive(Debug, Clone, Serialize)]
pub struct BedView {
    #[serde(flatten)]
    pub bed: Bed,
    pub is_available: bool,
    pub sanitation_status: SanitationStatus,
}

impl BedView {
    pub fn new(bed: Bed, now: DateTime<Utc>) -> Self {
        Self {
            is_available: bed.is_available(now),
            sanitation_status: bed.sanitation_status(now),
            bed,
        }
    }
}

// ---- Request / response shapes ----

#[derive(Debug, Deserialize)]
pub struct BedRequest {
    pub ward_name: String,
    pub bed_type: BedType,
    pub last_sanitized: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    pub patient_id: String,
}

#[derive(Debug, Serialize)]
pub struct AllocationResponse {
    pub patient: Patient,
    pub bed: BedView,
}

fn validate_ward(ward_name: &str) -> Result<(), ApiError> {
    if ward_name.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Ward name is required"));
    }
    Ok(())
}

fn views(state: &SharedState, beds: Vec<Bed>) -> Json<Vec<BedView>> {
    let now = state.hospital.now();
    Json(beds.into_iter().map(|bed| BedView::new(bed, now)).collect())
}

fn view_of(state: &SharedState, id: &str) -> Result<Json<BedView>, ApiError> {
    state
        .hospital
        .get_bed(id)
        .map(|bed| Json(BedView::new(bed, state.hospital.now())))
        .ok_or_else(|| not_found("Bed"))
}

// ---- Handlers ----

/// `GET /beds`
pub async fn list_beds(State(state): State<SharedState>) -> Json<Vec<BedView>> {
    let beds = state.hospital.get_all_beds();
    views(&state, beds)
}

/// `POST /beds`
pub async fn create_bed(
    State(state): State<SharedState>,
    payload: Result<Json<BedRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BedView>), ApiError> {
    let body = parse_json(payload)?;
    validate_ward(&body.ward_name)?;

    let last_sanitized = body.last_sanitized.unwrap_or_else(|| state.hospital.now());
    let bed = Bed::new(body.ward_name.trim(), body.bed_type, last_sanitized);
    let id = bed.id.clone();
    state.hospital.add_bed(bed);

    Ok((StatusCode::CREATED, view_of(&state, &id)?))
}

/// `GET /beds/:id`
pub async fn get_bed(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<BedView>, ApiError> {
    view_of(&state, &id)
}

/// `PUT /beds/:id`: occupancy is never taken from the request.
pub async fn update_bed(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<BedRequest>, JsonRejection>,
) -> Result<Json<BedView>, ApiError> {
    let body = parse_json(payload)?;
    let mut bed = state.hospital.get_bed(&id).ok_or_else(|| not_found("Bed"))?;
    validate_ward(&body.ward_name)?;

    bed.ward_name = body.ward_name.trim().to_string();
    bed.bed_type = body.bed_type;
    if let Some(last_sanitized) = body.last_sanitized {
        bed.last_sanitized = last_sanitized;
    }
    state.hospital.update_bed(bed);

    view_of(&state, &id)
}

/// `DELETE /beds/:id`
pub async fn delete_bed(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.hospital.get_bed(&id).is_none() {
        return Err(not_found("Bed"));
    }
    if state.hospital.delete_bed(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(StatusCode::CONFLICT, "Cannot delete occupied bed"))
    }
}

/// `POST /beds/:id/allocate`
///
/// Rule violations answer `409` with the same message recorded on the
/// failure alert.
pub async fn allocate_bed(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<AllocateRequest>, JsonRejection>,
) -> Result<Json<AllocationResponse>, ApiError> {
    let body = parse_json(payload)?;
    match state.hospital.try_allocate_bed_to_patient(&body.patient_id, &id) {
        Ok((patient, bed)) => {
            state.metrics.record_allocation(true);
            Ok(Json(AllocationResponse {
                patient,
                bed: BedView::new(bed, state.hospital.now()),
            }))
        }
        Err(AllocationError::PatientNotFound(_)) => Err(not_found("Patient")),
        Err(AllocationError::BedNotFound(_)) => Err(not_found("Bed")),
        Err(rejection) => {
            state.metrics.record_allocation(false);
            Err(api_error(StatusCode::CONFLICT, rejection.to_string()))
        }
    }
}

/// `POST /beds/:id/deallocate`
pub async fn deallocate_bed(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<BedView>, ApiError> {
    if state.hospital.get_bed(&id).is_none() {
        return Err(not_found("Bed"));
    }
    if !state.hospital.deallocate_bed(&id) {
        return Err(api_error(StatusCode::CONFLICT, "Bed is not occupied"));
    }
    view_of(&state, &id)
}

/// `POST /beds/:id/sanitize`
pub async fn sanitize_bed(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<BedView>, ApiError> {
    if !state.hospital.sanitize_bed(&id) {
        return Err(not_found("Bed"));
    }
    view_of(&state, &id)
}

/// `GET /beds/available`
pub async fn available_beds(State(state): State<SharedState>) -> Json<Vec<BedView>> {
    let beds = state.hospital.get_available_beds();
    views(&state, beds)
}

/// `GET /beds/available-icu`
pub async fn available_icu_beds(State(state): State<SharedState>) -> Json<Vec<BedView>> {
    let beds = state.hospital.get_available_icu_beds();
    views(&state, beds)
}

/// `GET /beds/sanitation-overdue`
pub async fn sanitation_overdue_beds(State(state): State<SharedState>) -> Json<Vec<BedView>> {
    let beds = state.hospital.get_sanitation_overdue_beds();
    views(&state, beds)
}
