//! Patient endpoints.
//!
//! Routes:
//! - `GET    /patients`                     all patients, newest admission first
//! - `POST   /patients`                     admit a patient
//! - `GET    /patients/critical`            critical patients
//! - `GET    /patients/requiring-icu`       critical patients without a bed
//! - `GET    /patients/unallocated`         patients without a bed
//! - `GET    /patients/:id`                 one patient
//! - `PUT    /patients/:id`                 replace a patient record
//! - `DELETE /patients/:id`                 discharge
//! - `PATCH  /patients/:id/vitals`          record new vitals
//! - `GET    /patients/:id/eligible-beds`   beds offered to this patient

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::Patient;
use crate::vitals::VitalSigns;
use super::beds::BedView;
use super::{api_error, not_found, parse_json, ApiError, SharedState};

// ---- Request shapes ----

#[derive(Debug, Deserialize)]
pub struct PatientRequest {
    pub name: String,
    pub age: u32,
    pub disease_category: String,
    pub temperature: f64,
    pub pulse_rate: u32,
    pub oxygen_level: f64,
    pub admission_date: Option<DateTime<Utc>>,
}

impl PatientRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Patient name is required".to_string());
        }
        if self.age > 120 {
            return Err("Age must be between 0 and 120".to_string());
        }
        if self.disease_category.trim().is_empty() {
            return Err("Disease category is required".to_string());
        }
        if !(35.0..=42.0).contains(&self.temperature) {
            return Err("Temperature must be between 35°C and 42°C".to_string());
        }
        if !(20..=250).contains(&self.pulse_rate) {
            return Err("Pulse rate must be between 20 and 250".to_string());
        }
        if !(0.0..=100.0).contains(&self.oxygen_level) {
            return Err("Oxygen level must be between 0% and 100%".to_string());
        }
        Ok(())
    }

    fn vitals(&self) -> VitalSigns {
        VitalSigns::new(self.temperature, self.pulse_rate, self.oxygen_level)
    }
}

#[derive(Debug, Deserialize)]
pub struct VitalsRequest {
    pub temperature: f64,
    pub pulse_rate: u32,
    pub oxygen_level: f64,
}

impl VitalsRequest {
    fn validate(&self) -> Result<(), String> {
        if !self.temperature.is_finite() {
            return Err("Temperature must be a number".to_string());
        }
        if !(0.0..=100.0).contains(&self.oxygen_level) {
            return Err("Oxygen level must be between 0% and 100%".to_string());
        }
        Ok(())
    }
}

fn bad_request(message: String) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, message)
}

// ---- Handlers ----

/// `GET /patients`
pub async fn list_patients(State(state): State<SharedState>) -> Json<Vec<Patient>> {
    Json(state.hospital.get_all_patients())
}

/// `POST /patients`
pub async fn create_patient(
    State(state): State<SharedState>,
    payload: Result<Json<PatientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let body = parse_json(payload)?;
    body.validate().map_err(bad_request)?;

    let admitted = body.admission_date.unwrap_or_else(|| state.hospital.now());
    let patient = Patient::new(
        body.name.trim(),
        body.age,
        body.disease_category.trim(),
        body.vitals(),
        admitted,
    );
    let id = patient.id.clone();
    state.hospital.add_patient(patient);

    let stored = state.hospital.get_patient(&id).ok_or_else(|| not_found("Patient"))?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `GET /patients/:id`
pub async fn get_patient(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    state
        .hospital
        .get_patient(&id)
        .map(Json)
        .ok_or_else(|| not_found("Patient"))
}

/// `PUT /patients/:id`: full replace; the admission date is kept unless given.
pub async fn update_patient(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<PatientRequest>, JsonRejection>,
) -> Result<Json<Patient>, ApiError> {
    let body = parse_json(payload)?;
    let mut patient = state.hospital.get_patient(&id).ok_or_else(|| not_found("Patient"))?;
    body.validate().map_err(bad_request)?;

    patient.name = body.name.trim().to_string();
    patient.age = body.age;
    patient.disease_category = body.disease_category.trim().to_string();
    patient.vitals = body.vitals();
    if let Some(admitted) = body.admission_date {
        patient.admission_date = admitted;
    }
    state.hospital.update_patient(patient);

    state
        .hospital
        .get_patient(&id)
        .map(Json)
        .ok_or_else(|| not_found("Patient"))
}

/// `DELETE /patients/:id`
pub async fn delete_patient(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.hospital.delete_patient(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Patient"))
    }
}

/// `PATCH /patients/:id/vitals`
pub async fn update_vitals(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    payload: Result<Json<VitalsRequest>, JsonRejection>,
) -> Result<Json<Patient>, ApiError> {
    let body = parse_json(payload)?;
    body.validate().map_err(bad_request)?;

    let vitals = VitalSigns::new(body.temperature, body.pulse_rate, body.oxygen_level);
    if !state.hospital.update_vitals(&id, vitals) {
        return Err(not_found("Patient"));
    }

    state
        .hospital
        .get_patient(&id)
        .map(Json)
        .ok_or_else(|| not_found("Patient"))
}

/// `GET /patients/:id/eligible-beds`
pub async fn eligible_beds(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<BedView>>, ApiError> {
    let beds = state
        .hospital
        .eligible_beds_for(&id)
        .ok_or_else(|| not_found("Patient"))?;
    let now = state.hospital.now();
    Ok(Json(beds.into_iter().map(|bed| BedView::new(bed, now)).collect()))
}

/// `GET /patients/critical`
pub async fn critical_patients(State(state): State<SharedState>) -> Json<Vec<Patient>> {
    Json(state.hospital.get_critical_patients())
}

/// `GET /patients/requiring-icu`
pub async fn patients_requiring_icu(State(state): State<SharedState>) -> Json<Vec<Patient>> {
    Json(state.hospital.get_patients_requiring_icu())
}

/// `GET /patients/unallocated`
pub async fn unallocated_patients(State(state): State<SharedState>) -> Json<Vec<Patient>> {
    Json(state.hospital.get_unallocated_patients())
}
