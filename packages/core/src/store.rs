//! In-memory hospital store.
//!
//! `HospitalData` owns the patient, bed and alert collections. Each
//! collection is a sharded concurrent map, so request handlers and the
//! sanitation monitor can share one `Arc<HospitalData>` without any locking
//! of their own. Every read hands back a cloned snapshot.
//!
//! Bed allocation lives in [`crate::allocation`] as a further `impl` block
//! on this type; it is the only code that writes the patient/bed link
//! fields.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;

use crate::clock::Clock;
use crate::model::{Alert, AlertType, Bed, BedType, Patient};
use crate::vitals::{self, VitalSigns};

#[derive(Debug, Clone)]
struct AlertEntry {
    /// Insertion order, breaks ties between alerts raised in the same instant.
    sequence: u64,
    alert: Alert,
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Census {
    pub total_patients: usize,
    pub critical_patients: usize,
    pub available_beds: usize,
    pub overdue_beds: usize,
    pub unread_alerts: usize,
}

/// The process-wide store. Construct once at startup and share via `Arc`.
pub struct HospitalData {
    pub(crate) patients: DashMap<String, Patient>,
    pub(crate) beds: DashMap<String, Bed>,
    alerts: DashMap<String, AlertEntry>,
    alert_sequence: AtomicU64,
    allocation_lock: Mutex<()>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl HospitalData {
    pub fn new(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            patients: DashMap::new(),
            beds: DashMap::new(),
            alerts: DashMap::new(),
            alert_sequence: AtomicU64::new(0),
            allocation_lock: Mutex::new(()),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Serializes the allocation engine's check-then-act sequences.
    pub(crate) fn allocation_guard(&self) -> MutexGuard<'_, ()> {
        self.allocation_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ---- Patients ----

    /// Snapshot of all patients, most recently admitted first.
    pub fn get_all_patients(&self) -> Vec<Patient> {
        self.patients_where(|_| true)
    }

    pub fn get_patient(&self, id: &str) -> Option<Patient> {
        if id.trim().is_empty() {
            return None;
        }
        self.patients.get(id).map(|p| p.value().clone())
    }

    /// Insert or replace a patient, then raise alerts for abnormal vitals.
    ///
    /// `is_critical` is re-derived. The bed link is kept from the stored
    /// record when replacing and cleared for a new patient. The read of the
    /// stored link and the write happen under one entry lock.
    pub fn add_patient(&self, mut patient: Patient) {
        patient.refresh_critical();

        match self.patients.entry(patient.id.clone()) {
            Entry::Occupied(mut slot) => {
                patient.assigned_bed_id = slot.get().assigned_bed_id.clone();
                slot.insert(patient.clone());
            }
            Entry::Vacant(slot) => {
                patient.assigned_bed_id = None;
                slot.insert(patient.clone());
            }
        }
        tracing::debug!("Patient {} ({}) admitted", patient.name, patient.id);
        self.raise_vital_alerts(&patient);
    }

    /// Replace an existing patient record. Silently does nothing when the
    /// ID is unknown; check with [`get_patient`](Self::get_patient) first.
    pub fn update_patient(&self, mut patient: Patient) {
        patient.refresh_critical();

        let replaced = match self.patients.get_mut(&patient.id) {
            Some(mut slot) => {
                patient.assigned_bed_id = slot.assigned_bed_id.clone();
                *slot = patient.clone();
                true
            }
            None => false,
        };

        if replaced {
            self.raise_vital_alerts(&patient);
        } else {
            tracing::debug!("Ignoring update for unknown patient {}", patient.id);
        }
    }

    /// Patch only the vital signs of a stored patient, in place, then
    /// re-derive `is_critical` and raise alerts for abnormal readings.
    ///
    /// Returns `false` when the patient does not exist.
    pub fn update_vitals(&self, id: &str, vitals: VitalSigns) -> bool {
        let patched = match self.patients.get_mut(id) {
            Some(mut slot) => {
                slot.vitals = vitals;
                slot.refresh_critical();
                Some(slot.value().clone())
            }
            None => None,
        };

        match patched {
            Some(patient) => {
                self.raise_vital_alerts(&patient);
                true
            }
            None => false,
        }
    }

    /// Remove a patient unconditionally. A bed the patient occupied keeps its
    /// occupancy until it is deallocated.
    pub fn delete_patient(&self, id: &str) -> bool {
        if id.trim().is_empty() {
            return false;
        }
        self.patients.remove(id).is_some()
    }

    pub fn get_critical_patients(&self) -> Vec<Patient> {
        self.patients_where(|p| p.is_critical)
    }

    pub fn get_patients_requiring_icu(&self) -> Vec<Patient> {
        self.patients_where(|p| p.is_critical && p.is_unassigned())
    }

    pub fn get_unallocated_patients(&self) -> Vec<Patient> {
        self.patients_where(Patient::is_unassigned)
    }

    fn patients_where(&self, keep: impl Fn(&Patient) -> bool) -> Vec<Patient> {
        let mut patients: Vec<Patient> = self
            .patients
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        patients.sort_by(|a, b| {
            b.admission_date
                .cmp(&a.admission_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        patients
    }

    // ---- Beds ----

    /// Snapshot of all beds ordered by ward name, then bed type.
    pub fn get_all_beds(&self) -> Vec<Bed> {
        self.beds_where(|_| true)
    }

    pub fn get_bed(&self, id: &str) -> Option<Bed> {
        if id.trim().is_empty() {
            return None;
        }
        self.beds.get(id).map(|b| b.value().clone())
    }

    /// Insert or replace a bed. Occupancy is kept from the stored record when
    /// replacing and starts empty for a new bed.
    pub fn add_bed(&self, mut bed: Bed) {
        tracing::debug!("Bed {} ({}) registered", bed.description(), bed.id);
        match self.beds.entry(bed.id.clone()) {
            Entry::Occupied(mut slot) => {
                bed.is_occupied = slot.get().is_occupied;
                bed.patient_id = slot.get().patient_id.clone();
                slot.insert(bed);
            }
            Entry::Vacant(slot) => {
                bed.is_occupied = false;
                bed.patient_id = None;
                slot.insert(bed);
            }
        }
    }

    /// Replace an existing bed record, keeping its occupancy. Silently does
    /// nothing when the ID is unknown.
    pub fn update_bed(&self, mut bed: Bed) {
        if let Some(mut slot) = self.beds.get_mut(&bed.id) {
            bed.is_occupied = slot.is_occupied;
            bed.patient_id = slot.patient_id.clone();
            *slot = bed;
        }
    }

    /// Remove a bed. Fails (returns `false`) while the bed is occupied.
    pub fn delete_bed(&self, id: &str) -> bool {
        if id.trim().is_empty() {
            return false;
        }
        let _guard = self.allocation_guard();
        self.beds.remove_if(id, |_, bed| !bed.is_occupied).is_some()
    }

    pub fn get_available_beds(&self) -> Vec<Bed> {
        let now = self.now();
        self.beds_where(|b| b.is_available(now))
    }

    pub fn get_available_icu_beds(&self) -> Vec<Bed> {
        let now = self.now();
        self.beds_where(|b| b.bed_type == BedType::Icu && b.is_available(now))
    }

    pub fn get_sanitation_overdue_beds(&self) -> Vec<Bed> {
        let now = self.now();
        self.beds_where(|b| b.needs_sanitation(now))
    }

    /// Beds worth offering to a patient: ICU beds for critical patients,
    /// any available bed otherwise. `None` for an unknown patient.
    pub fn eligible_beds_for(&self, patient_id: &str) -> Option<Vec<Bed>> {
        let patient = self.get_patient(patient_id)?;
        Some(if patient.is_critical {
            self.get_available_icu_beds()
        } else {
            self.get_available_beds()
        })
    }

    fn beds_where(&self, keep: impl Fn(&Bed) -> bool) -> Vec<Bed> {
        let mut beds: Vec<Bed> = self
            .beds
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        beds.sort_by(|a, b| {
            a.ward_name
                .cmp(&b.ward_name)
                .then(a.bed_type.cmp(&b.bed_type))
                .then_with(|| a.id.cmp(&b.id))
        });
        beds
    }

    // ---- Alerts ----

    /// All alerts, newest first.
    pub fn get_all_alerts(&self) -> Vec<Alert> {
        self.alerts_where(|_| true)
    }

    pub fn get_unread_alerts(&self) -> Vec<Alert> {
        self.alerts_where(|a| !a.is_read)
    }

    pub fn add_alert(&self, alert: Alert) {
        let sequence = self.alert_sequence.fetch_add(1, Ordering::Relaxed);
        self.alerts
            .insert(alert.id.clone(), AlertEntry { sequence, alert });
    }

    /// Flag an alert as read. Unknown IDs are ignored.
    pub fn mark_alert_as_read(&self, id: &str) {
        if let Some(mut entry) = self.alerts.get_mut(id) {
            entry.alert.is_read = true;
        }
    }

    /// A new alert timestamped by the store clock.
    pub(crate) fn stamped_alert(&self, alert_type: AlertType, message: impl Into<String>) -> Alert {
        Alert::new(alert_type, message, self.now())
    }

    fn alerts_where(&self, keep: impl Fn(&Alert) -> bool) -> Vec<Alert> {
        let mut entries: Vec<AlertEntry> = self
            .alerts
            .iter()
            .filter(|entry| keep(&entry.value().alert))
            .map(|entry| entry.value().clone())
            .collect();
        entries.sort_by(|a, b| {
            b.alert
                .created_at
                .cmp(&a.alert.created_at)
                .then(b.sequence.cmp(&a.sequence))
        });
        entries.into_iter().map(|entry| entry.alert).collect()
    }

    fn raise_vital_alerts(&self, patient: &Patient) {
        for finding in vitals::evaluate(&patient.vitals) {
            tracing::warn!("{}: {}", patient.name, finding);
            self.add_alert(
                self.stamped_alert(AlertType::CriticalVital, finding.to_string())
                    .with_patient(patient.name.clone()),
            );
        }
    }

    // ---- Monitoring ----

    /// Raise one `SanitationOverdue` alert per overdue bed and return how
    /// many were raised. Beds that stay overdue are alerted again every call.
    pub fn raise_sanitation_alerts(&self) -> usize {
        let overdue = self.get_sanitation_overdue_beds();
        for bed in &overdue {
            self.add_alert(
                self.stamped_alert(
                    AlertType::SanitationOverdue,
                    format!("{} bed needs sanitation", bed.ward_name),
                )
                .with_bed(bed.description()),
            );
        }
        overdue.len()
    }

    pub fn census(&self) -> Census {
        let now = self.now();
        let mut census = Census {
            total_patients: 0,
            critical_patients: 0,
            available_beds: 0,
            overdue_beds: 0,
            unread_alerts: 0,
        };

        for patient in self.patients.iter() {
            census.total_patients += 1;
            if patient.is_critical {
                census.critical_patients += 1;
            }
        }
        for bed in self.beds.iter() {
            if bed.is_available(now) {
                census.available_beds += 1;
            }
            if bed.needs_sanitation(now) {
                census.overdue_beds += 1;
            }
        }
        census.unread_alerts = self.alerts.iter().filter(|e| !e.alert.is_read).count();

        census
    }
}
